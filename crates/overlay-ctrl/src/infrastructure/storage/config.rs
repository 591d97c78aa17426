//! TOML-based configuration for the overlay controller.
//!
//! Read from `$XDG_CONFIG_HOME/overlayctl/config.toml` (falling back to
//! `~/.config/overlayctl/config.toml`), or from an explicit path.
//!
//! ```toml
//! [device]
//! path_template = "/dev/graphics/fb{}"
//! index = 0
//!
//! [limits]
//! magnification_limit = 20
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section or a
//! missing key all fall back to the values shown above.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::pipe_control::DEFAULT_MAGNIFICATION_LIMIT;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is not usable.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level controller configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OverlayConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which framebuffer node to open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Node path with `{}` standing for the device index.
    #[serde(default = "default_path_template")]
    pub path_template: String,
    /// Device index passed to `init`.
    #[serde(default)]
    pub index: u32,
}

/// Hardware scaling limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitsConfig {
    /// Maximum upscale factor per axis.
    #[serde(default = "default_magnification_limit")]
    pub magnification_limit: u32,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_path_template() -> String {
    "/dev/graphics/fb{}".to_string()
}
fn default_magnification_limit() -> u32 {
    DEFAULT_MAGNIFICATION_LIMIT
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path_template: default_path_template(),
            index: 0,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            magnification_limit: default_magnification_limit(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl OverlayConfig {
    /// Checks values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero magnification limit or a
    /// path template without an index placeholder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.magnification_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "limits.magnification_limit",
                reason: "must be at least 1",
            });
        }
        if !self.device.path_template.contains("{}") {
            return Err(ConfigError::Invalid {
                field: "device.path_template",
                reason: "must contain a {} placeholder for the device index",
            });
        }
        Ok(())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the default config file path.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if neither `XDG_CONFIG_HOME`
/// nor `HOME` is set.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or(ConfigError::NoPlatformConfigDir)?;
    Ok(base.join("overlayctl").join("config.toml"))
}

/// Loads and validates the config at `path`, returning defaults if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::Invalid`] if a value is unusable.
pub fn load_config(path: &Path) -> Result<OverlayConfig, ConfigError> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<OverlayConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => OverlayConfig::default(),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &OverlayConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_fb0_with_limit_20() {
        let cfg = OverlayConfig::default();
        assert_eq!(cfg.device.path_template, "/dev/graphics/fb{}");
        assert_eq!(cfg.device.index, 0);
        assert_eq!(cfg.limits.magnification_limit, 20);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        // Arrange
        let toml_str = "[limits]\nmagnification_limit = 8\n";

        // Act
        let cfg: OverlayConfig = toml::from_str(toml_str).expect("parse");

        // Assert
        assert_eq!(cfg.limits.magnification_limit, 8);
        assert_eq!(cfg.device, DeviceConfig::default());
        assert_eq!(cfg.logging, LoggingConfig::default());
    }

    #[test]
    fn test_config_serializes_and_deserializes_round_trip() {
        let mut cfg = OverlayConfig::default();
        cfg.device.index = 1;
        cfg.logging.level = "debug".to_string();

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: OverlayConfig = toml::from_str(&toml_str).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_validate_rejects_zero_magnification_limit() {
        let mut cfg = OverlayConfig::default();
        cfg.limits.magnification_limit = 0;

        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid {
                field: "limits.magnification_limit",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_template_without_placeholder() {
        let mut cfg = OverlayConfig::default();
        cfg.device.path_template = "/dev/fb0".to_string();

        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_config_returns_default_when_file_missing() {
        let dir = tempfile::tempdir().expect("tempdir");

        let cfg = load_config(&dir.path().join("absent.toml")).expect("load");

        assert_eq!(cfg, OverlayConfig::default());
    }

    #[test]
    fn test_save_then_load_returns_same_config() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = OverlayConfig::default();
        cfg.limits.magnification_limit = 4;

        // Act
        save_config(&path, &cfg).expect("save");
        let loaded = load_config(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_load_config_reports_malformed_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[limits\nmagnification_limit = ").expect("write");

        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }
}
