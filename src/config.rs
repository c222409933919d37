//! Runtime configuration.
//!
//! Sources, in precedence order:
//! 1. Environment variables (`KEYTURN_BASE_URL`, `KEYTURN_API_TOKEN`)
//! 2. `~/.keyturn/config.toml`
//!
//! The base URL and API token are required; everything else has a
//! default. The cache file lives next to the config file unless
//! overridden.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Resolved configuration used by the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity provider base URL (e.g. https://example.okta.com).
    pub base_url: String,
    /// Provider API token, sent as `Authorization: SSWS <token>`.
    pub api_token: String,
    /// Path of the session cache file.
    pub cache_path: PathBuf,
}

/// On-disk layout of `~/.keyturn/config.toml`. All fields optional;
/// the environment fills the gaps.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    base_url: Option<String>,
    api_token: Option<String>,
    cache_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the config file and the environment.
    pub fn load() -> Result<Self> {
        let dir = config_dir();
        let file = match &dir {
            Some(dir) => read_file_config(&dir.join("config.toml"))?,
            None => FileConfig::default(),
        };

        let base_url = std::env::var("KEYTURN_BASE_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .or(file.base_url)
            .ok_or_else(|| {
                Error::Config(
                    "no identity provider base URL; set KEYTURN_BASE_URL or base_url in config.toml"
                        .to_string(),
                )
            })?;

        let api_token = std::env::var("KEYTURN_API_TOKEN")
            .ok()
            .filter(|v| !v.is_empty())
            .or(file.api_token)
            .ok_or_else(|| {
                Error::Config(
                    "no API token; set KEYTURN_API_TOKEN or api_token in config.toml".to_string(),
                )
            })?;

        let cache_path = file
            .cache_path
            .or_else(|| dir.map(|d| d.join("session.json")))
            .ok_or_else(|| {
                Error::Config("could not resolve a home directory for the session cache".to_string())
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            cache_path,
        })
    }
}

/// `~/.keyturn`, or `None` when no home directory can be resolved.
fn config_dir() -> Option<PathBuf> {
    directories::UserDirs::new().map(|dirs| dirs.home_dir().join(".keyturn"))
}

fn read_file_config(path: &std::path::Path) -> Result<FileConfig> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(FileConfig::default())
        }
        Err(err) => return Err(err.into()),
    };
    toml::from_str(&contents)
        .map_err(|err| Error::Config(format!("could not parse {}: {err}", path.display())))
}
