//! `config.toml` loading.
//!
//! Every field has a default, so a partial file (or none at all) is valid.
//! `0` for either limit means unbounded.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::workbench::Limits;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: String,
    pub db_path: String,
    pub history_limit: usize,
    pub version_limit: usize,
    pub assistant: AssistantConfig,
    pub github: GithubConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    pub raw_base: String,
    pub token_env: String,
    pub max_files: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            db_path: ".revbench/projects.db".to_owned(),
            history_limit: 0,
            version_limit: 0,
            assistant: AssistantConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            api_key_env: "OPENAI_API_KEY".to_owned(),
            temperature: 0.2,
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_owned(),
            raw_base: "https://raw.githubusercontent.com".to_owned(),
            token_env: "GITHUB_TOKEN".to_owned(),
            max_files: crate::ingest::MAX_FILES,
        }
    }
}

impl Config {
    /// Retention caps for the workbench.
    pub fn limits(&self) -> Limits {
        let cap = |n: usize| (n > 0).then_some(n);
        Limits { history: cap(self.history_limit), versions: cap(self.version_limit) }
    }
}

impl AssistantConfig {
    /// The API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        read_env(&self.api_key_env)
    }
}

impl GithubConfig {
    pub fn token(&self) -> Option<String> {
        read_env(&self.token_env)
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Returns the path to the revbench config file.
///
/// Prefers `$XDG_CONFIG_HOME/revbench/config.toml`; falls back to
/// `~/.config/revbench/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("revbench").join("config.toml")
}

/// Parses the config at `path`. A missing file yields the defaults.
///
/// # Errors
///
/// Returns `ConfigError::Read` for I/O failures other than "not found" and
/// `ConfigError::Parse` for invalid TOML.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => {
            return Err(ConfigError::Read { path: path.display().to_string(), source });
        }
    };
    parse(&raw).map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })
}

pub fn parse(raw: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(raw)
}
