//! Monitor configuration: an optional RON file, overridden by CLI flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use monitor_logging::LogDestination;
use queue_engine::ChannelSettings;
use ron::extensions::Extensions;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "queue_monitor.ron";
const DEFAULT_BASE_URL: &str = "http://localhost:8081";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_LOG_FILE: &str = "queue_monitor.log";
/// `log_file` value that sends logs to the terminal instead.
const TERMINAL_LOG: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
pub enum SortOrder {
    /// Newest id first, like the admin table.
    #[default]
    IdDescending,
    /// Order the server listed the jobs in.
    Arrival,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid base url {url:?}: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

/// On-disk shape. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    poll_interval_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    authorization: Option<String>,
    log_file: Option<String>,
    log_level: Option<String>,
    sort: Option<SortOrder>,
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub channel: ChannelSettings,
    pub poll_interval: Duration,
    pub sort: SortOrder,
    pub log_destination: LogDestination,
    pub log_level: LevelFilter,
}

impl MonitorConfig {
    /// A missing file means defaults; an unreadable or malformed one is an error.
    pub fn load(path: &Path, overrides: Overrides) -> Result<Self, ConfigError> {
        let file = read_file_config(path)?;
        Self::resolve(file, overrides)
    }

    fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self, ConfigError> {
        let raw_url = overrides
            .base_url
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&raw_url)?;

        let interval_ms = overrides
            .poll_interval_ms
            .or(file.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let level_name = overrides
            .log_level
            .or(file.log_level)
            .unwrap_or_else(|| "info".to_string());
        let log_level = monitor_logging::parse_level(&level_name)
            .ok_or(ConfigError::LogLevel(level_name))?;

        let log_file = overrides
            .log_file
            .or(file.log_file)
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        let log_destination = if log_file == TERMINAL_LOG {
            LogDestination::Terminal
        } else {
            LogDestination::File(PathBuf::from(log_file))
        };

        let mut channel = ChannelSettings::new(base_url);
        channel.request_timeout = file
            .request_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        channel.authorization = file.authorization;

        Ok(Self {
            channel,
            poll_interval: Duration::from_millis(interval_ms),
            sort: overrides.sort.or(file.sort).unwrap_or_default(),
            log_destination,
            log_level,
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::Options::default()
        .with_default_extension(Extensions::IMPLICIT_SOME)
        .from_str(&content)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|err| ConfigError::BaseUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::BaseUrl {
            url: raw.to_string(),
            reason: "scheme must be http or https".to_string(),
        });
    }
    Ok(url)
}
