//! Video search and audio resolution.
//!
//! The rest of the system only sees the [`Resolver`] trait; [`YtDlp`] is the
//! production implementation, shelling out to the `yt-dlp` executable.

pub mod error;
mod models;
pub mod parse;
mod ytdlp;

use crate::error::Result;
use async_trait::async_trait;

pub use crate::models::{DateFilter, SearchResult, VideoId, VideoMetadata};
pub use crate::ytdlp::{Timeouts, YtDlp};

#[async_trait]
pub trait Resolver: Send + Sync {
    /// Search for videos. An empty query yields no results without doing any work.
    async fn search(&self, query: &str, filter: Option<DateFilter>) -> Result<Vec<SearchResult>>;

    async fn metadata(&self, video_id: &VideoId) -> Result<VideoMetadata>;

    /// A direct, short-lived URL to the best available audio stream.
    async fn audio_url(&self, video_id: &VideoId) -> Result<String>;
}
