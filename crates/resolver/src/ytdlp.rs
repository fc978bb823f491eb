use crate::error::{ErrorKind, Result};
use crate::models::{DateFilter, SearchResult, VideoId, VideoMetadata};
use crate::{Resolver, parse};
use async_trait::async_trait;
use audiotube_config::ResolverConfig;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::instrument;
use url::Url;

const EXECUTABLE: &str = "yt-dlp";
const RESULTS_URL: &str = "https://www.youtube.com/results";

/// Deadlines for each kind of yt-dlp invocation.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub search: Duration,
    pub metadata: Duration,
    pub stream: Duration,
}
impl Default for Timeouts {
    fn default() -> Self {
        Self { search: Duration::from_secs(30), metadata: Duration::from_secs(15), stream: Duration::from_secs(30) }
    }
}

/// Resolves videos by running the `yt-dlp` executable.
///
/// Every invocation is a fresh child process with a deadline; on timeout the
/// child is killed rather than left running in the background.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    search_results: u32,
    timeouts: Timeouts,
}
impl YtDlp {
    pub fn new(program: impl Into<PathBuf>, search_results: u32, timeouts: Timeouts) -> Self {
        Self { program: program.into(), search_results, timeouts }
    }

    /// Locate yt-dlp (the configured path, else `PATH`) and apply the
    /// configured limits.
    pub fn discover(config: &ResolverConfig) -> Result<Self> {
        let program = match &config.binary {
            Some(path) => which::which(path),
            None => which::which(EXECUTABLE),
        };
        let program = program.or_raise(|| ErrorKind::NotFound)?;
        tracing::debug!(path = %program.display(), "Discovered yt-dlp");
        let timeouts = Timeouts {
            search: config.search_timeout(),
            metadata: config.metadata_timeout(),
            stream: config.stream_timeout(),
        };
        Ok(Self::new(program, config.search_results, timeouts))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for a search, optionally restricted by upload date.
    fn search_args(&self, query: &str, filter: Option<DateFilter>) -> Result<Vec<String>> {
        let mut args = match filter {
            Some(filter) => {
                let url = Url::parse_with_params(RESULTS_URL, [("search_query", query), ("sp", filter.sp())])
                    .or_raise(|| ErrorKind::Malformed)?;
                vec![url.to_string()]
            },
            None => vec![format!("ytsearch{}:{query}", self.search_results)],
        };
        args.extend(["--flat-playlist", "--dump-json", "--no-warnings"].map(String::from));
        if filter.is_some() {
            args.extend(["--playlist-end".to_string(), self.search_results.to_string()]);
        }
        Ok(args)
    }

    async fn execute(&self, args: &[String], timeout: Duration) -> Result<Output> {
        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .or_raise(|| ErrorKind::Spawn)?;
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output.or_raise(|| ErrorKind::Spawn),
            Err(_) => {
                tracing::warn!(timeout_ms = timeout.as_millis(), "yt-dlp timed out; process killed");
                exn::bail!(ErrorKind::Timeout)
            },
        }
    }

    /// Run yt-dlp and return its stdout, failing on a non-zero exit.
    async fn run(&self, args: &[String], timeout: Duration) -> Result<String> {
        let output = self.execute(args, timeout).await?;
        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            tracing::warn!(code, stderr = %String::from_utf8_lossy(&output.stderr).trim(), "yt-dlp failed");
            exn::bail!(ErrorKind::Failed(code));
        }
        String::from_utf8(output.stdout).or_raise(|| ErrorKind::Malformed)
    }
}

#[async_trait]
impl Resolver for YtDlp {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, filter: Option<DateFilter>) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let args = self.search_args(query, filter)?;
        let output = self.execute(&args, self.timeouts.search).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let results = parse::search_results(&stdout);
        if !output.status.success() {
            // A single unavailable entry fails the whole run but the rest of
            // the listing is still printed.
            let code = output.status.code().unwrap_or(-1);
            if results.is_empty() {
                exn::bail!(ErrorKind::Failed(code));
            }
            tracing::warn!(code, results = results.len(), "yt-dlp search exited with an error; using partial results");
        }
        tracing::debug!(results = results.len(), "Search complete");
        Ok(results)
    }

    #[instrument(skip_all, fields(video_id = %video_id))]
    async fn metadata(&self, video_id: &VideoId) -> Result<VideoMetadata> {
        let args = [video_id.watch_url(), "--dump-json".into(), "--no-warnings".into(), "--no-download".into()];
        let stdout = self.run(&args, self.timeouts.metadata).await?;
        parse::metadata(video_id.clone(), &stdout)
    }

    #[instrument(skip_all, fields(video_id = %video_id))]
    async fn audio_url(&self, video_id: &VideoId) -> Result<String> {
        let args = [video_id.watch_url(), "-f".into(), "bestaudio".into(), "-g".into(), "--no-warnings".into()];
        let stdout = self.run(&args, self.timeouts.stream).await?;
        parse::audio_url(&stdout)
    }
}
