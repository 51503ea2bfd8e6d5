//! Configuration for `lockst`: an optional `lockst.toml` (or a file named by
//! `$LOCKST_CONFIG`) overriding the defaults for the `--vm` and `--no-color`
//! flags. Command-line flags always win over the file.

use crate::error::{LockstError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "lockst.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub vm: bool,

    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_color() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self { vm: false, color: true }
    }
}

impl Config {
    /// Looks for `$LOCKST_CONFIG`, then `./lockst.toml`; falls back to
    /// defaults if neither exists.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("LOCKST_CONFIG") {
            return Self::load_from_path(Path::new(&path));
        }
        let default_path = PathBuf::from(CONFIG_FILE_NAME);
        if default_path.exists() {
            Self::load_from_path(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| LockstError::Config(format!("failed to parse {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_tree_walk_and_color() {
        let config = Config::default();
        assert!(!config.vm);
        assert!(config.color);
    }

    #[test]
    fn loads_overrides_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "vm = true\ncolor = false\n").unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.vm);
        assert!(!config.color);
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "vm = \"not a bool\"\n").unwrap();
        assert!(Config::load_from_path(&path).is_err());
    }
}
