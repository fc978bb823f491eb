use crate::error::Error;
use crate::models::from_timestamp;
use time::UtcDateTime;

/// A resolved audio URL and when it was resolved.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StreamCacheEntry {
    pub video_id: String,
    pub audio_url: String,
    pub cached_at: UtcDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct StreamRow {
    video_id: String,
    audio_url: String,
    cached_at: i64,
}
impl TryFrom<StreamRow> for StreamCacheEntry {
    type Error = Error;
    fn try_from(row: StreamRow) -> Result<Self, Self::Error> {
        Ok(Self { video_id: row.video_id, audio_url: row.audio_url, cached_at: from_timestamp(row.cached_at, "cache date")? })
    }
}
