//! Settings loaded from a RON file next to the working directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use filedrop_engine::{ChannelSettings, EngineSettings, UploadSettings};
use filedrop_logging::{filedrop_info, LogDestination};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "filedrop.ron";

/// `Both` sends warnings to the terminal and everything to the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LogTarget {
    File,
    Terminal,
    #[default]
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the server, `http://` or `https://`.
    pub server_url: String,
    pub upload_path: String,
    pub channel_path: String,
    pub connect_timeout_secs: Option<u64>,
    /// Unset means uploads never time out.
    pub request_timeout_secs: Option<u64>,
    pub log_destination: LogTarget,
    pub log_level: String,
    /// Where the session history is written; unset disables it.
    pub history_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            upload_path: "/upload".to_string(),
            channel_path: "/fromurl".to_string(),
            connect_timeout_secs: None,
            request_timeout_secs: None,
            log_destination: LogTarget::Both,
            log_level: "info".to_string(),
            history_dir: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid server url {url:?}: {message}")]
    ServerUrl { url: String, message: String },
}

/// Loads settings from `path`.
///
/// A missing file yields defaults unless `required` is set.
pub fn load(path: &Path, required: bool) -> Result<Settings, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
            filedrop_info!("No config at {:?}; using defaults", path);
            return Ok(Settings::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

impl Settings {
    fn server(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.server_url).map_err(|err| self.server_error(err.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(self.server_error(format!("unsupported scheme {other}"))),
        }
    }

    fn server_error(&self, message: String) -> ConfigError {
        ConfigError::ServerUrl {
            url: self.server_url.clone(),
            message,
        }
    }

    pub fn upload_endpoint(&self) -> Result<String, ConfigError> {
        let endpoint = self
            .server()?
            .join(&self.upload_path)
            .map_err(|err| self.server_error(err.to_string()))?;
        Ok(endpoint.to_string())
    }

    /// The duplex channel lives on the same host, over `ws` or `wss`.
    pub fn channel_url(&self) -> Result<String, ConfigError> {
        let mut url = self
            .server()?
            .join(&self.channel_path)
            .map_err(|err| self.server_error(err.to_string()))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| self.server_error(format!("cannot switch to {scheme}")))?;
        Ok(url.to_string())
    }

    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let connect_timeout = self.connect_timeout_secs.map(Duration::from_secs);
        Ok(EngineSettings {
            upload: UploadSettings {
                endpoint: self.upload_endpoint()?,
                connect_timeout,
                request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            },
            channel: ChannelSettings {
                url: Some(self.channel_url()?),
                connect_timeout,
            },
        })
    }
}
