//! Log subscriber set-up for the binary.

use crate::error::{ErrorKind, Result};
use audiotube_config::{LogFormat, LoggingConfig};
use exn::ResultExt;
use tracing_subscriber::EnvFilter;

/// Dependencies that are chatty at `info` and below.
const NOISY: &[(&str, &str)] = &[
    ("sqlx", "warn"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("reqwest", "warn"),
    ("h2", "warn"),
    ("rustls", "warn"),
];

/// Build the filter from the configured level, capping noisy dependencies.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    let directives = std::iter::once(level.to_string())
        .chain(NOISY.iter().map(|(target, level)| format!("{target}={level}")))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(&directives).or_raise(|| ErrorKind::Logging)
}

/// Install the global subscriber. `RUST_LOG`, when set and valid, replaces
/// the configured filter entirely.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => env_filter(&config.level)?,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match config.format {
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.compact().finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
    .or_raise(|| ErrorKind::Logging)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_caps_noisy_crates() {
        let filter = env_filter("debug").unwrap().to_string();
        assert!(filter.contains("sqlx=warn"), "{filter}");
        assert!(filter.contains("debug"), "{filter}");
    }

    #[test]
    fn test_env_filter_rejects_garbage() {
        let err = env_filter("audiotube=loud").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Logging));
    }
}
