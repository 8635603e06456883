use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{LinkcardError, Result};

const APP_DIR: &str = "linkcard";
const CONFIG_FILE: &str = "config.toml";
const SESSION_FILE: &str = "session.json";

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client settings, read from `<config dir>/linkcard/config.toml` and then
/// overridden by `LINKCARD_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: Url,
    /// Base of the public card pages, e.g. `https://cards.example.com/`.
    pub public_base_url: Url,
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: parse_default(DEFAULT_API_URL),
            public_base_url: parse_default(DEFAULT_PUBLIC_URL),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_file: None,
        }
    }
}

fn parse_default(url: &str) -> Url {
    Url::parse(url).expect("Default url must be valid")
}

impl ClientConfig {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file() {
            Some(path) => Self::load_from(&path)?,
            None => {
                log::warn!("config: no config directory, using defaults");
                Self::default()
            }
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        log::debug!("config: loaded {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Apply `LINKCARD_API_URL`, `LINKCARD_PUBLIC_URL`,
    /// `LINKCARD_DEBOUNCE_MS` and `LINKCARD_SESSION_FILE`. Malformed values
    /// are logged and ignored.
    pub fn apply_env(&mut self) {
        if let Some(url) = env_override::<Url>("LINKCARD_API_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = env_override::<Url>("LINKCARD_PUBLIC_URL") {
            self.public_base_url = url;
        }
        if let Some(ms) = env_override::<u64>("LINKCARD_DEBOUNCE_MS") {
            self.debounce_ms = ms;
        }
        if let Some(path) = env_override::<PathBuf>("LINKCARD_SESSION_FILE") {
            self.session_file = Some(path);
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Where the signed-in session is kept between runs.
    pub fn session_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.session_file {
            return Ok(path.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR).join(SESSION_FILE))
            .ok_or_else(|| {
                LinkcardError::Config(
                    "unable to determine a data directory".to_owned(),
                )
            })
    }
}

fn env_override<T: FromStr>(key: &str) -> Option<T>
where
    T::Err: Display,
{
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => {
            log::info!("config: {key} overridden from environment");
            Some(value)
        }
        Err(e) => {
            log::warn!("config: invalid {key} value: {e}");
            None
        }
    }
}
