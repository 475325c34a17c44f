//! Settings for the finder.
//!
//! Layered with figment: built-in defaults, then `generic-meds.toml`, then
//! environment variables. `API_KEY` and `GEMINI_API_KEY` set the backend key;
//! any field can be overridden with a `GENERIC_MEDS_` variable, using `__` to
//! reach nested tables (e.g. `GENERIC_MEDS_LOGGING__DEFAULT=debug`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use generic_meds_llm::{BackendConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};

/// Settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "generic-meds.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Gemini API key
    pub api_key: String,
    /// Model name, e.g. "gemini-2.5-flash"
    pub model: String,
    /// Sampling temperature; kept low for repeatable answers
    pub temperature: f32,
    /// API root, overridable for proxies and tests
    pub base_url: String,
    /// SQLite file holding the saved list
    pub database_path: PathBuf,
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_BASE_URL.to_string(),
            database_path: PathBuf::from(".generic-meds/saved.db"),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for everything not listed in `modules`
    pub default: String,
    /// Per-target overrides, e.g. `generic_meds_llm = "debug"`
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: "warn".to_string(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load from `generic-meds.toml` in the working directory (if present) and the environment.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from(SETTINGS_FILE)
    }

    /// Load from a specific settings file (if present) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::raw().only(&["API_KEY"]).map(|_| "api_key".into()))
            .merge(Env::raw().only(&["GEMINI_API_KEY"]).map(|_| "api_key".into()))
            .merge(Env::prefixed("GENERIC_MEDS_").split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// Backend connection settings.
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            base_url: self.base_url.clone(),
        }
    }
}
