use crate::client::{OutputMode, DEFAULT_LANGUAGE};
use crate::error::LivecapError;
use crate::i18n::Language;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub captions: Captions,
    pub ui: Ui,
    pub logging: Logging,
}

impl Config {
    /// Reads `path`, or `./livecap.toml` when no path is given and it exists.
    pub fn load(path_opt: Option<&Path>) -> Result<Self> {
        let default_path = Path::new("livecap.toml");
        let path = match path_opt {
            Some(p) => Some(p),
            None if default_path.exists() => Some(default_path),
            None => None,
        };

        let cfg = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed reading config file: {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("failed parsing TOML config: {}", path.display()))?
            }
            None => Config::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> std::result::Result<(), LivecapError> {
        if self.captions.poll_interval_ms == 0 {
            return Err(LivecapError::Config(
                "captions.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.server.base_url.trim().is_empty() {
            return Err(LivecapError::Config("server.base_url is empty".to_string()));
        }
        Ok(())
    }

    pub fn to_toml_pretty(&self) -> Result<String> {
        let s = toml::to_string_pretty(self).context("failed serializing config as TOML")?;
        Ok(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub base_url: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Captions {
    pub poll_interval_ms: u64,
    pub enabled: bool,
    pub output: OutputMode,
    /// Spoken language of the uploaded video, passed to the transcriber.
    pub language: String,
}

impl Captions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for Captions {
    fn default() -> Self {
        Self {
            poll_interval_ms: 120,
            enabled: true,
            output: OutputMode::default(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ui {
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub format: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Logs go to stderr so captions printed to stdout stay readable.
pub fn init_tracing(logging: &Logging, cli_override_level: Option<&str>) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = cli_override_level.unwrap_or(logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let is_json = logging.format.to_lowercase() == "json";

    if is_json {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .event_format(fmt::format().json())
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .pretty()
            .init();
    }

    tracing::debug!(
        level = level,
        format = logging.format.as_str(),
        "logging initialized"
    );

    Ok(())
}
