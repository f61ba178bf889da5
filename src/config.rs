use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ExportError, Result};

/// Settings for both halves of the pipeline, deserialised once at startup
/// and passed by reference into the tunnel connector. Nothing in the crate
/// reads configuration from global state.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub ssh: SshConfig,
    pub database: DatabaseConfig,
}

/// Bastion host settings for the forwarding tunnel.
#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    pub ssh_host: String,
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
    pub ssh_username: String,
    /// Private key used for authentication. When absent, `ssh_password` is
    /// used instead.
    pub ssh_key_path: Option<PathBuf>,
    pub ssh_private_key_password: Option<String>,
    pub ssh_password: Option<String>,
}

/// Credentials for the database reached through the tunnel. The host/port
/// pair names the database as seen from the bastion, not from this machine.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub db_host: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    #[serde(default = "default_charset")]
    pub charset: String,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_db_port() -> u16 {
    3306
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

impl AppConfig {
    /// Loads the configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ExportError::Config {
                path: path.to_path_buf(),
                message: "configuration file not found".to_string(),
            });
        }
        let source = fs::read_to_string(path)?;
        toml::from_str(&source).map_err(|error| ExportError::Config {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }
}
