use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    magic::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAYLOAD_LEN, ENV_CODEC_CONFIG_PATH},
    utils::error::{CodecError, CodecResult},
};

/// Limits applied by the read and write contexts of a [`TaggedCodec`](crate::tagged::TaggedCodec).
///
/// Missing keys fall back to their defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecSettings {
    /// How many tagged values may be nested inside each other.
    pub max_depth: usize,
    /// Largest length prefix (bytes or element count) a decoder will honor.
    pub max_payload_len: usize,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

impl CodecSettings {
    /// Get the default path to the codec settings file.
    pub fn default_path() -> PathBuf {
        if let Ok(config_path) = std::env::var(ENV_CODEC_CONFIG_PATH) {
            return config_path.into();
        }

        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }
        }

        path.push("hybind");
        path.push("codec.toml");
        path
    }

    /// Parse settings from a TOML document.
    pub fn from_toml_str(toml_str: &str) -> CodecResult<Self> {
        toml::from_str(toml_str).map_err(|e| CodecError::ConfigParse {
            source: e,
            file: "<inline>".to_string(),
        })
    }

    /// Load settings from a TOML file.
    pub fn load_from_toml(path: &Path) -> CodecResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;

        toml::from_str(&toml_str).map_err(|e| CodecError::ConfigParse {
            source: e,
            file: path.display().to_string(),
        })
    }

    /// Save settings to a TOML file, creating parent directories as needed.
    pub fn save_to_toml(&self, path: &Path) -> CodecResult<()> {
        let toml_str = toml::to_string(self).map_err(|e| {
            CodecError::Unknown(format!(
                "Failed during serialization of TOML to path `{}`: {}",
                path.display(),
                e
            ))
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Ok(std::fs::write(path, toml_str)?)
    }
}
