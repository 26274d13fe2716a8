use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::summarize::DEFAULT_MODEL;

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const PROXY_ENV: &str = "PROXY_URL";

/// Contents of ~/.config/ytnotes/config.toml
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigFile {
    pub default_lang: Option<String>,
    pub model: Option<String>,
    pub proxy_url: Option<String>,
    pub google_api_key: Option<String>,
}

impl ConfigFile {
    /// Load config from ~/.config/ytnotes/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: ConfigFile = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(ConfigFile::default())
        }
    }
}

/// Settings for one run, built once in `main` and handed to the fetcher and summarizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub google_api_key: Option<String>,
    pub proxy_url: Option<String>,
    pub model: String,
    pub default_lang: String,
}

impl Config {
    /// Merge the config file with the environment; the environment wins.
    pub fn resolve<F>(file: ConfigFile, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Config {
            google_api_key: non_empty(env(API_KEY_ENV)).or(non_empty(file.google_api_key)),
            proxy_url: non_empty(env(PROXY_ENV)).or(non_empty(file.proxy_url)),
            model: non_empty(file.model).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            default_lang: non_empty(file.default_lang).unwrap_or_else(|| "en".to_string()),
        }
    }

    pub fn from_env(file: ConfigFile) -> Self {
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Apply command-line overrides, which win over file and environment
    pub fn apply_cli(&mut self, model: Option<&str>, proxy_url: Option<&str>) {
        if let Some(model) = model {
            self.model = model.to_string();
        }
        if let Some(proxy_url) = proxy_url {
            self.proxy_url = Some(proxy_url.to_string());
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytnotes")
        .join("config.toml")
}
