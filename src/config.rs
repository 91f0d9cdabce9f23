use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::Level;

use crate::api::DEFAULT_BASE_URL;
use crate::subscription::http::QueryConfig;

/// Command-line arguments for the bookcase binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "bookcase", version, about = "Browse and edit a book catalog in the terminal")]
pub struct Config {
    /// Base URL of the book service.
    #[arg(long = "api-url", env = "BOOKCASE_API_URL", default_value = DEFAULT_BASE_URL, value_name = "URL")]
    pub api_url: String,

    /// Seconds fetched book data counts as fresh.
    #[arg(long = "stale-secs", env = "BOOKCASE_STALE_SECS", default_value_t = 300, value_name = "SECONDS")]
    pub stale_secs: u64,

    /// Refresh the book list every this many seconds.
    #[arg(
        long = "poll-secs",
        env = "BOOKCASE_POLL_SECS",
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_secs: Option<u64>,

    /// Frames drawn per second.
    #[arg(
        long = "frame-rate",
        default_value_t = 30,
        value_parser = clap::value_parser!(u32).range(1..=240)
    )]
    pub frame_rate: u32,

    /// Write logs to this file. Without it nothing is logged, since the
    /// terminal belongs to the interface.
    #[arg(long = "log-file", env = "BOOKCASE_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Base log level (trace|debug|info|warn|error). `RUST_LOG` takes precedence.
    #[arg(long = "log-level", env = "BOOKCASE_LOG", default_value = "info", value_name = "LEVEL")]
    pub log_level: Level,
}

impl Config {
    #[must_use]
    pub const fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }

    #[must_use]
    pub const fn query_config(&self) -> QueryConfig {
        QueryConfig::new(self.stale_time())
    }

    #[must_use]
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(std::iter::once("bookcase").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).expect("defaults parse");
        assert_eq!(config.api_url, "http://localhost:3004");
        assert_eq!(config.stale_time(), Duration::from_secs(300));
        assert_eq!(config.query_config(), QueryConfig::new(Duration::from_secs(300)));
        assert_eq!(config.poll_interval(), None);
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--api-url",
            "http://books.internal:8080",
            "--stale-secs",
            "10",
            "--poll-secs",
            "5",
            "--frame-rate",
            "60",
            "--log-file",
            "/tmp/bookcase.log",
            "--log-level",
            "debug",
        ])
        .expect("overrides parse");

        assert_eq!(config.api_url, "http://books.internal:8080");
        assert_eq!(config.stale_time(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Some(Duration::from_secs(5)));
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/bookcase.log")));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(parse(&["--frame-rate", "0"]).is_err());
        assert!(parse(&["--frame-rate", "241"]).is_err());
        assert!(parse(&["--poll-secs", "0"]).is_err());
        assert!(parse(&["--log-level", "loud"]).is_err());
    }
}
