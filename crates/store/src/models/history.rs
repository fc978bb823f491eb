use crate::error::{Error, ErrorKind};
use crate::models::from_timestamp;
use exn::ResultExt;
use time::UtcDateTime;

/// One playback in a user's listening history.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HistoryEntry {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    /// Length in seconds, `0` when unknown.
    pub duration: u32,
    pub viewed_at: UtcDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct HistoryRow {
    video_id: String,
    title: String,
    channel: String,
    duration: i64,
    viewed_at: i64,
}
impl TryFrom<HistoryRow> for HistoryEntry {
    type Error = Error;
    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            video_id: row.video_id,
            title: row.title,
            channel: row.channel,
            duration: u32::try_from(row.duration).or_raise(|| ErrorKind::InvalidData("duration"))?,
            viewed_at: from_timestamp(row.viewed_at, "view date")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_duration_is_rejected() {
        let row = HistoryRow {
            video_id: "abc123".to_string(),
            title: String::new(),
            channel: String::new(),
            duration: -5,
            viewed_at: 0,
        };
        let err = HistoryEntry::try_from(row).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("duration")));
    }
}
