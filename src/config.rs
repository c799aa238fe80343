use crate::persistence::{find_local_data_dir, DATA_DIR_NAME, DEFAULT_STORAGE_KEY};
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Where and under which key the state blob lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub storage_key: String,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// Resolve the data directory: an explicit override wins, then the nearest
    /// local `.taskflow` directory, then `~/.taskflow`.
    pub fn resolve(data_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = data_dir {
            return Ok(Self::new(dir));
        }

        let current_dir = env::current_dir().context("Could not determine current directory")?;
        Self::resolve_from(&current_dir)
    }

    fn resolve_from(start_dir: &Path) -> Result<Self> {
        if let Some(local_dir) = find_local_data_dir(start_dir) {
            return Ok(Self::new(local_dir));
        }

        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(Self::new(home.join(DATA_DIR_NAME)))
    }
}

/// Initialize a local data directory inside `dir`
pub fn init_local_data_dir(dir: &Path) -> Result<PathBuf> {
    let data_dir = dir.join(DATA_DIR_NAME);

    if data_dir.exists() {
        anyhow::bail!("Data directory already exists: {}", data_dir.display());
    }

    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create directory: {}", data_dir.display()))?;

    Ok(data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dir_wins() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/somewhere"))).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/somewhere"));
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_local_dir_found_from_nested_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = init_local_data_dir(temp_dir.path()).unwrap();
        let nested = temp_dir.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::resolve_from(&nested).unwrap();
        assert_eq!(config.data_dir, data_dir);
    }

    #[test]
    fn test_init_twice_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        init_local_data_dir(temp_dir.path()).unwrap();
        assert!(init_local_data_dir(temp_dir.path()).is_err());
    }
}
