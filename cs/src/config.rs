//! Configuration for casestore

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the journal document
    #[serde(default = "default_store_path", rename = "store-path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("legalease")
        .join(crate::DEFAULT_FILE_NAME)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            return Ok(config);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("legalease").join("casestore.yml")),
            Some(PathBuf::from("casestore.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_path() {
        let config = Config::default();
        assert!(config.store_path.ends_with("legalease/cases.json"));
    }

    #[test]
    fn test_deserialize_store_path() {
        let config: Config = serde_yaml::from_str("store-path: /tmp/x/cases.json\n").unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/x/cases.json"));
    }

    #[test]
    fn test_empty_yaml_uses_default() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.store_path, default_store_path());
    }
}
