//! Interpreting yt-dlp output.
//!
//! Kept free of any process handling so the edge cases of yt-dlp's JSON can
//! be exercised directly.

use crate::error::{ErrorKind, Result};
use crate::models::{SearchResult, VideoId, VideoMetadata, watch_url};
use exn::{OptionExt, ResultExt};
use serde_json::Value;
use time::{Date, Month};

const UNKNOWN_CHANNEL: &str = "Unknown";

/// Parse line-delimited JSON from a flat search listing.
///
/// Blank lines, lines that aren't JSON objects, and entries without an id are
/// skipped.
pub fn search_results(stdout: &str) -> Vec<SearchResult> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(value) => search_result(&value),
            Err(err) => {
                tracing::debug!(error = %err, "Skipping malformed search output line");
                None
            },
        })
        .collect()
}

fn search_result(value: &Value) -> Option<SearchResult> {
    let id = value.get("id")?.as_str()?.to_string();
    let duration = value.get("duration").and_then(Value::as_f64).map(|d| d.max(0.0).round() as u64);
    Some(SearchResult {
        url: watch_url(&id),
        title: string_field(value, "title").unwrap_or_default(),
        channel: string_field(value, "channel")
            .or_else(|| string_field(value, "uploader"))
            .unwrap_or_else(|| UNKNOWN_CHANNEL.to_string()),
        duration,
        duration_raw: duration.unwrap_or(0),
        upload_date: String::new(),
        upload_timestamp: 0,
        views: String::new(),
        view_count: 0,
        id,
    })
}

/// Non-empty string value of `key`.
fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Parse the single JSON document printed by `--dump-json` for one video.
pub fn metadata(id: VideoId, stdout: &str) -> Result<VideoMetadata> {
    let value: Value = serde_json::from_str(stdout.trim()).or_raise(|| ErrorKind::Malformed)?;
    if !value.is_object() {
        exn::bail!(ErrorKind::Malformed);
    }
    let raw_date = value.get("upload_date").and_then(Value::as_str).unwrap_or_default();
    let (upload_date, upload_timestamp) = upload_date(raw_date);
    let view_count = value.get("view_count").and_then(Value::as_u64).unwrap_or(0);
    Ok(VideoMetadata { id, upload_date, upload_timestamp, views: humanize_views(view_count), view_count })
}

/// Turn yt-dlp's `YYYYMMDD` into `YYYY-MM-DD` and the unix timestamp of
/// midnight UTC on that day.
///
/// Anything not shaped like `YYYYMMDD` is passed through with a zero
/// timestamp; a well-shaped but impossible date is reformatted but still gets
/// a zero timestamp.
pub fn upload_date(raw: &str) -> (String, i64) {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return (raw.to_string(), 0);
    }
    let (year, rest) = raw.split_at(4);
    let (month, day) = rest.split_at(2);
    let timestamp = calendar_date(year, month, day).map_or(0, |date| date.midnight().assume_utc().unix_timestamp());
    (format!("{year}-{month}-{day}"), timestamp)
}

fn calendar_date(year: &str, month: &str, day: &str) -> Option<Date> {
    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
    Date::from_calendar_date(year.parse().ok()?, month, day.parse().ok()?).ok()
}

/// `1.2M views`, `3.4K views`, `12 views`, or empty for zero.
pub fn humanize_views(views: u64) -> String {
    match views {
        0 => String::new(),
        1..1_000 => format!("{views} views"),
        1_000..1_000_000 => format!("{:.1}K views", views as f64 / 1_000.0),
        _ => format!("{:.1}M views", views as f64 / 1_000_000.0),
    }
}

/// The first non-empty line printed by `-g`.
pub fn audio_url(stdout: &str) -> Result<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_raise(|| ErrorKind::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_search_results_skip_malformed_lines() {
        let stdout = concat!(
            r#"{"id": "aaa", "title": "First", "channel": "Chan", "duration": 213.0}"#,
            "\n",
            "this is not json\n",
            "\n",
            r#"{"id": "bbb", "title": "Second", "uploader": "Uploader", "duration": null}"#,
            "\n",
            r#"{"title": "No id"}"#,
            "\n",
            r#"{"id": "ccc", "title": "Third", "channel": ""}"#,
            "\n",
        );
        let results = search_results(stdout);
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].id, "aaa");
        assert_eq!(results[0].channel, "Chan");
        assert_eq!(results[0].duration, Some(213));
        assert_eq!(results[0].duration_raw, 213);
        assert_eq!(results[0].url, "https://youtube.com/watch?v=aaa");

        assert_eq!(results[1].channel, "Uploader");
        assert_eq!(results[1].duration, None);
        assert_eq!(results[1].duration_raw, 0);

        assert_eq!(results[2].channel, "Unknown");
    }

    #[test]
    fn test_search_results_of_empty_output() {
        assert!(search_results("").is_empty());
        assert!(search_results("\n\n").is_empty());
    }

    #[test]
    fn test_search_result_placeholders() {
        let results = search_results(r#"{"id": "aaa", "title": "t"}"#);
        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["upload_date"], "");
        assert_eq!(json["upload_timestamp"], 0);
        assert_eq!(json["views"], "");
        assert_eq!(json["view_count"], 0);
    }

    #[rstest]
    #[case(0, "")]
    #[case(1, "1 views")]
    #[case(12, "12 views")]
    #[case(999, "999 views")]
    #[case(1_000, "1.0K views")]
    #[case(3_400, "3.4K views")]
    #[case(1_000_000, "1.0M views")]
    #[case(1_234_567, "1.2M views")]
    fn test_humanize_views(#[case] views: u64, #[case] expected: &str) {
        assert_eq!(humanize_views(views), expected);
    }

    #[rstest]
    #[case("20240115", "2024-01-15", 1_705_276_800)]
    #[case("19700101", "1970-01-01", 0)]
    #[case("20241399", "2024-13-99", 0)]
    #[case("", "", 0)]
    #[case("2024-01", "2024-01", 0)]
    fn test_upload_date(#[case] raw: &str, #[case] date: &str, #[case] timestamp: i64) {
        assert_eq!(upload_date(raw), (date.to_string(), timestamp));
    }

    #[test]
    fn test_metadata() {
        let id = VideoId::parse("abc123").unwrap();
        let stdout = r#"{"id": "abc123", "upload_date": "20240115", "view_count": 1234567}"#;
        let metadata = metadata(id.clone(), stdout).unwrap();
        assert_eq!(metadata.id, id);
        assert_eq!(metadata.upload_date, "2024-01-15");
        assert_eq!(metadata.upload_timestamp, 1_705_276_800);
        assert_eq!(metadata.views, "1.2M views");
        assert_eq!(metadata.view_count, 1_234_567);
    }

    #[test]
    fn test_metadata_with_missing_fields() {
        let metadata = metadata(VideoId::parse("abc123").unwrap(), r#"{"view_count": null}"#).unwrap();
        assert_eq!(metadata.upload_date, "");
        assert_eq!(metadata.views, "");
        assert_eq!(metadata.view_count, 0);
    }

    #[rstest]
    #[case("")]
    #[case("not json")]
    #[case("[1, 2]")]
    fn test_metadata_malformed(#[case] stdout: &str) {
        let err = metadata(VideoId::parse("abc123").unwrap(), stdout).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Malformed));
    }

    #[test]
    fn test_audio_url_takes_first_line() {
        let stdout = "\nhttps://cdn.example/audio?sig=1\nhttps://cdn.example/other\n";
        assert_eq!(audio_url(stdout).unwrap(), "https://cdn.example/audio?sig=1");
        assert!(matches!(&*audio_url("  \n").unwrap_err(), ErrorKind::Malformed));
    }
}
