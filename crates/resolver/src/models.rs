use crate::error::{Error, ErrorKind, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const MAX_VIDEO_ID_LENGTH: usize = 20;

/// A syntactically valid YouTube video id.
///
/// Anything reaching a command line goes through this type first, so a video
/// id can never be mistaken for a yt-dlp option or a different URL.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);
impl VideoId {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        let valid = !raw.is_empty()
            && raw.len() <= MAX_VIDEO_ID_LENGTH
            && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid {
            exn::bail!(ErrorKind::InvalidVideoId);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        watch_url(&self.0)
    }
}
impl FromStr for VideoId {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}
impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn watch_url(id: &str) -> String {
    format!("https://youtube.com/watch?v={id}")
}

/// Restricts search results to recent uploads.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DateFilter {
    Today,
    Week,
    Month,
    Year,
}
impl DateFilter {
    /// The value of YouTube's `sp` search parameter for this filter.
    pub fn sp(&self) -> &'static str {
        match self {
            Self::Today => "EgIIAg==",
            Self::Week => "EgIIAw==",
            Self::Month => "EgIIBA==",
            Self::Year => "EgIIBQ==",
        }
    }
}
impl FromStr for DateFilter {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "today" => Self::Today,
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            _ => exn::bail!(ErrorKind::InvalidDateFilter),
        })
    }
}

/// One entry of a flat search listing.
///
/// Upload date and view fields are placeholders here; a flat listing does not
/// carry them and clients fill them in from [`VideoMetadata`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub duration: Option<u64>,
    pub duration_raw: u64,
    pub upload_date: String,
    pub upload_timestamp: i64,
    pub views: String,
    pub view_count: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub id: VideoId,
    /// `YYYY-MM-DD`, or empty when unknown.
    pub upload_date: String,
    /// Midnight UTC of the upload date, or `0` when unknown.
    pub upload_timestamp: i64,
    /// Humanized view count, e.g. `1.2M views`.
    pub views: String,
    pub view_count: u64,
}
