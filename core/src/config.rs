//! Mapper configuration.
//!
//! Controls the parameter sigil plans use when naming slots and how the
//! compiler treats two fields that target the same name. Every field has a
//! default, so an empty YAML document is a valid configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! parameter_sigil: "@"
//! duplicate_targets: first_wins
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the compiler does when two fields share a target name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first declaration and drop later ones with a warning.
    #[default]
    FirstWins,
    /// Fail compilation with [`DuplicateTarget`](crate::MappingError::DuplicateTarget).
    Reject,
}

fn default_sigil() -> char {
    '@'
}

/// Configuration shared by every plan a [`PlanCache`](crate::PlanCache)
/// compiles.
///
/// # Examples
///
/// ```
/// use tabmap_core::{DuplicatePolicy, MapperConfig};
///
/// let config: MapperConfig = serde_yaml::from_str("duplicate_targets: reject").unwrap();
/// assert_eq!(config.parameter_sigil, '@');
/// assert_eq!(config.duplicate_targets, DuplicatePolicy::Reject);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Sigil prefixed to parameter names (`@`, `:` or `$`).
    #[serde(default = "default_sigil")]
    pub parameter_sigil: char,
    /// Duplicate target handling.
    #[serde(default)]
    pub duplicate_targets: DuplicatePolicy,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            parameter_sigil: default_sigil(),
            duplicate_targets: DuplicatePolicy::default(),
        }
    }
}

impl MapperConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::MappingError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::MappingError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::MappingError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::MappingError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: MapperConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, MapperConfig::default());
        assert_eq!(config.parameter_sigil, '@');
        assert_eq!(config.duplicate_targets, DuplicatePolicy::FirstWins);
    }

    #[test]
    fn test_deserialize_complete() {
        let yaml = r#"
parameter_sigil: ":"
duplicate_targets: reject
"#;
        let config: MapperConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.parameter_sigil, ':');
        assert_eq!(config.duplicate_targets, DuplicatePolicy::Reject);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result: std::result::Result<MapperConfig, _> =
            serde_yaml::from_str("duplicate_targets: last_wins");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabmap.yml");

        let original = MapperConfig {
            parameter_sigil: '$',
            duplicate_targets: DuplicatePolicy::Reject,
        };
        original.save(&path).unwrap();

        let loaded = MapperConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MapperConfig::load(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, crate::MappingError::IoError(_)));
    }
}
