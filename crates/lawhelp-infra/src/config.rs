//! Server configuration loader for LawHelp.
//!
//! Reads `lawhelp.toml` (by default from the data directory) into
//! [`ServerConfig`], then applies environment overrides. A missing file means
//! defaults; a file that fails to parse is an error.

use std::path::{Path, PathBuf};

use lawhelp_types::config::ServerConfig;
use secrecy::SecretString;
use thiserror::Error;

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "lawhelp.toml";

pub const ENV_JWT_SECRET: &str = "LAWHELP_JWT_SECRET";
pub const ENV_ANSWER_API_KEY: &str = "LAWHELP_ANSWER_API_KEY";
pub const ENV_DATABASE_URL: &str = "LAWHELP_DATABASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{0} is not configured (set it in lawhelp.toml or the {1} environment variable)")]
    MissingSecret(&'static str, &'static str),
}

/// Default config path: `{data_dir}/lawhelp.toml`.
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

/// Load configuration from `path` and the process environment.
pub async fn load_server_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let mut config = read_config_file(path).await?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

async fn read_config_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(ServerConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str::<ServerConfig>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay non-empty environment values onto `config`.
pub fn apply_env_overrides(config: &mut ServerConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(secret) = get(ENV_JWT_SECRET) {
        config.auth.jwt_secret = Some(SecretString::from(secret));
    }
    if let Some(key) = get(ENV_ANSWER_API_KEY) {
        config.answer.api_key = Some(SecretString::from(key));
    }
    if let Some(url) = get(ENV_DATABASE_URL) {
        config.database_url = Some(url);
    }
}

/// The JWT signing secret, or an error naming how to provide it.
pub fn require_jwt_secret(config: &ServerConfig) -> Result<&SecretString, ConfigError> {
    config
        .auth
        .jwt_secret
        .as_ref()
        .ok_or(ConfigError::MissingSecret("auth.jwt_secret", ENV_JWT_SECRET))
}

/// The answer engine API key, or an error naming how to provide it.
pub fn require_answer_api_key(config: &ServerConfig) -> Result<&SecretString, ConfigError> {
    config
        .answer
        .api_key
        .as_ref()
        .ok_or(ConfigError::MissingSecret("answer.api_key", ENV_ANSWER_API_KEY))
}
