use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use report_core::{PollConfig, SubmissionConfig, DEFAULT_LANGUAGE, DEFAULT_MODEL};
use report_engine::TransportSettings;
use serde::{Deserialize, Serialize};

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "report_client.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Client settings read from a RON file. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub session_token: Option<String>,
    pub default_model: String,
    pub default_language: String,
    pub log_destination: LogDestination,
    pub timings: Timings,
}

/// Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub request_timeout_ms: u64,
    pub progress_every_ms: u64,
    pub retry_delay_ms: u64,
    pub max_retries: u32,
    pub poll_interval_ms: u64,
    pub status_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: TransportSettings::default().base_url,
            session_token: None,
            default_model: DEFAULT_MODEL.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            log_destination: LogDestination::default(),
            timings: Timings::default(),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        let submission = SubmissionConfig::default();
        let transport = TransportSettings::default();
        Self {
            request_timeout_ms: millis(submission.timeout),
            progress_every_ms: millis(submission.progress_every),
            retry_delay_ms: millis(submission.retry_delay),
            max_retries: submission.max_retries,
            poll_interval_ms: millis(PollConfig::default().interval),
            status_timeout_ms: millis(transport.status_timeout),
            connect_timeout_ms: millis(transport.connect_timeout),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ClientConfig {
    /// Reads `path`, or `./report_client.ron` when none is given.
    ///
    /// Only the implicit default file may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::read(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn submission_config(&self) -> SubmissionConfig {
        SubmissionConfig {
            timeout: Duration::from_millis(self.timings.request_timeout_ms),
            progress_every: Duration::from_millis(self.timings.progress_every_ms),
            retry_delay: Duration::from_millis(self.timings.retry_delay_ms),
            max_retries: self.timings.max_retries,
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.timings.poll_interval_ms),
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.timings.connect_timeout_ms),
            // Must outlast the local watchdog.
            request_timeout: Duration::from_millis(self.timings.request_timeout_ms)
                + Duration::from_secs(5),
            status_timeout: Duration::from_millis(self.timings.status_timeout_ms),
            session_token: self.session_token.clone(),
            ..TransportSettings::default()
        }
    }
}
