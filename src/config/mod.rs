use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnicatError, Result};

/// Extensions searched for when no `--file-types` override is given.
pub const DEFAULT_FILE_TYPES: &str = ".avi,.mp4,.mkv,.ogv,.rmbv";

pub const DEFAULT_COMMAND_DELAY_MS: u64 = 4000;

/// Delay used with `--fast-command-delay`. Short bursts are tolerated by the
/// service; sustained traffic at this rate risks flood protection.
pub const FAST_COMMAND_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub client: ClientConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub command_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "api.anidb.net".to_string(),
            port: 9000,
            timeout_secs: 10,
            command_delay_ms: DEFAULT_COMMAND_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub file_types: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_dir = directories::ProjectDirs::from("", "", "anicat").map_or_else(
            || PathBuf::from(".anicat"),
            |d| d.config_dir().to_path_buf(),
        );
        Self::from_file(&config_dir.join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| AnicatError::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Resolves credentials with flag/env values first, then the `--login`
    /// file, then the config file.
    pub fn resolve(
        username: Option<String>,
        password: Option<String>,
        login_file: Option<&Path>,
        config: &Config,
    ) -> Result<Self> {
        let file_auth = login_file.map(load_login_file).transpose()?;

        let username = username
            .or_else(|| file_auth.as_ref().and_then(|a| a.username.clone()))
            .or_else(|| config.auth.username.clone());
        let password = password
            .or_else(|| file_auth.as_ref().and_then(|a| a.password.clone()))
            .or_else(|| config.auth.password.clone());

        match (username, password) {
            (Some(username), Some(password)) => Ok(Self { username, password }),
            _ => Err(AnicatError::MissingCredentials),
        }
    }
}

fn load_login_file(path: &Path) -> Result<AuthConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| AnicatError::Config(format!("{}: {e}", path.display())))
}
