//! Data directory layout for LawHelp.
//!
//! The data directory holds `lawhelp.toml` and the default `lawhelp.db`.

use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "LAWHELP_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `LAWHELP_DATA_DIR` environment variable
/// 2. `~/.lawhelp`
/// 3. `.lawhelp` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    data_dir_from(std::env::var(ENV_DATA_DIR).ok(), dirs::home_dir())
}

fn data_dir_from(env_value: Option<String>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_value.filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }

    if let Some(home) = home {
        return home.join(".lawhelp");
    }

    PathBuf::from(".lawhelp")
}

/// Create the data directory if it does not exist yet.
pub async fn ensure_data_dir(dir: &Path) -> Result<(), std::io::Error> {
    tokio::fs::create_dir_all(dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_env_value_wins() {
        let dir = data_dir_from(
            Some("/tmp/test-lawhelp".to_string()),
            Some(PathBuf::from("/home/user")),
        );
        assert_eq!(dir, PathBuf::from("/tmp/test-lawhelp"));
    }

    #[test]
    fn test_home_fallback() {
        let dir = data_dir_from(None, Some(PathBuf::from("/home/user")));
        assert_eq!(dir, PathBuf::from("/home/user/.lawhelp"));
        let dir = data_dir_from(Some(String::new()), Some(PathBuf::from("/home/user")));
        assert_eq!(dir, PathBuf::from("/home/user/.lawhelp"));
    }

    #[test]
    fn test_last_resort_is_relative() {
        assert_eq!(data_dir_from(None, None), PathBuf::from(".lawhelp"));
    }

    #[tokio::test]
    async fn test_ensure_data_dir_creates_nested() {
        let tmp = tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_data_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
