use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_ALBUMS_MANIFEST: &str = "albums.json";
const DEFAULT_ALBUM_REFERENCES: &str = "references.json";

/// Import settings, stored as `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportConfig {
    /// Reserved name of the album manifest under `albums/`
    #[serde(default = "default_albums_manifest")]
    pub albums_manifest: String,

    /// Reserved name of the photo → album references under `albums/`
    #[serde(default = "default_album_references")]
    pub album_references: String,
}

fn default_albums_manifest() -> String {
    DEFAULT_ALBUMS_MANIFEST.to_string()
}

fn default_album_references() -> String {
    DEFAULT_ALBUM_REFERENCES.to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            albums_manifest: default_albums_manifest(),
            album_references: default_album_references(),
        }
    }
}

impl ImportConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ImportConfig::default();
        assert_eq!(config.albums_manifest, "albums.json");
        assert_eq!(config.album_references, "references.json");
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = ImportConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config, ImportConfig::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            r#"{"albums_manifest": "manifest"}"#,
        )
        .unwrap();

        let config = ImportConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.albums_manifest, "manifest");
        assert_eq!(config.album_references, "references.json");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("nested");
        let config = ImportConfig {
            albums_manifest: "manifest".to_string(),
            album_references: "references".to_string(),
        };
        config.save(&nested).unwrap();

        assert_eq!(ImportConfig::load(&nested).unwrap(), config);
    }
}
