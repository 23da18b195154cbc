//! Viewer configuration from docview.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "docview.toml";

/// Main viewer configuration
///
/// Every field has a default, so an empty or partial file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site-wide settings
    pub site: SiteConfig,

    /// Table of contents settings
    pub toc: TocConfig,

    /// Notes section settings
    pub annotations: AnnotationsConfig,

    /// Math typesetting settings
    pub math: MathConfig,
}

/// Site-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Title shown in the page header
    pub title: String,

    /// Directory holding the Markdown sources
    pub docs_root: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Docs Viewer".to_string(),
            docs_root: PathBuf::from("docs"),
        }
    }
}

/// Table of contents settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    /// Deepest ordinary heading level included in the outline
    pub max_level: u8,

    /// Level assigned to entries synthesized from `column-toc` directives
    pub column_level: u8,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            max_level: 3,
            column_level: 4,
        }
    }
}

/// Notes section settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationsConfig {
    /// Heading text of the appended notes section
    pub heading: String,

    /// Anchor id of the notes section heading
    pub section_id: String,

    /// Prefix of each annotation's label title (`<prefix> <n>`)
    pub title_prefix: String,
}

impl Default for AnnotationsConfig {
    fn default() -> Self {
        Self {
            heading: "Notes".to_string(),
            section_id: "annotations".to_string(),
            title_prefix: "Note".to_string(),
        }
    }
}

/// Math typesetting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathConfig {
    /// Typeset formulas to SVG; when off, formulas render as source text
    pub enabled: bool,

    /// Font size in points
    pub font_size: f64,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            font_size: 11.0,
        }
    }
}

impl Config {
    /// Load configuration from a docview.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(ConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(ConfigError::IoError)?;

        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        Ok(config)
    }

    /// Load an explicit config file, or `docview.toml` when present, or defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    log::info!("Using configuration from {}", fallback.display());
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a docview.toml file
    ///
    /// # Parameters
    /// * `path` - Path where the configuration file will be written
    ///
    /// # Returns
    /// * `Ok(())` - Successfully saved configuration
    /// * `Err(ConfigError)` - Error serializing or writing the configuration file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        fs::write(&path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// IO error when reading or writing file
    #[error("IO error: {0}")]
    IoError(#[source] std::io::Error),

    /// Error parsing TOML
    #[error("TOML parse error: {0}")]
    ParseError(#[source] toml::de::Error),

    /// Error serializing to TOML
    #[error("TOML serialize error: {0}")]
    SerializeError(#[source] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.site.title = "Handbook".to_string();
        config.toc.max_level = 2;
        config.math.enabled = false;

        // Serialize to TOML
        let toml_str = toml::to_string_pretty(&config).unwrap();

        // Deserialize back
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_content = r#"
[annotations]
heading = "脚注"

[toc]
column_level = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();

        assert_eq!(config.annotations.heading, "脚注");
        assert_eq!(config.annotations.section_id, "annotations");
        assert_eq!(config.annotations.title_prefix, "Note");
        assert_eq!(config.toc.max_level, 3);
        assert_eq!(config.toc.column_level, 3);
        assert_eq!(config.site.title, "Docs Viewer");
        assert!(config.math.enabled);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let mut config = Config::default();
        config.math.font_size = 14.0;

        // Act
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        // Assert
        assert_eq!(loaded.math.font_size, 14.0);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = Config::load("/nonexistent/docview.toml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[toc\nmax_level = ").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::ParseError(_))));
    }
}
