//! Configuration loading and management

use crate::core::error::JoinError;
use crate::core::naming::FieldNaming;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Engine configuration
///
/// ```yaml
/// field_naming: camel_case
/// concurrent_root_fields: true
/// concurrent_relationships: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinConfig {
    /// How attribute names become public field names
    #[serde(default)]
    pub field_naming: FieldNaming,

    /// Resolve the root fields of a query concurrently
    ///
    /// Mutation root fields always run one after the other.
    #[serde(default = "default_true")]
    pub concurrent_root_fields: bool,

    /// Resolve the relationships of one level concurrently
    #[serde(default = "default_true")]
    pub concurrent_relationships: bool,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            field_naming: FieldNaming::default(),
            concurrent_root_fields: true,
            concurrent_relationships: true,
        }
    }
}

impl JoinConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, JoinError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            JoinError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, JoinError> {
        serde_yaml::from_str(yaml).map_err(|e| JoinError::Config(e.to_string()))
    }

    /// Configuration that resolves everything one step at a time
    pub fn sequential() -> Self {
        Self {
            concurrent_root_fields: false,
            concurrent_relationships: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = JoinConfig::default();

        assert_eq!(config.field_naming, FieldNaming::CamelCase);
        assert!(config.concurrent_root_fields);
        assert!(config.concurrent_relationships);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config = JoinConfig::from_yaml_str("concurrent_relationships: false\n").unwrap();

        assert_eq!(config.field_naming, FieldNaming::CamelCase);
        assert!(config.concurrent_root_fields);
        assert!(!config.concurrent_relationships);
    }

    #[test]
    fn test_yaml_serialization() {
        let config = JoinConfig {
            field_naming: FieldNaming::Preserve,
            ..JoinConfig::sequential()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();

        let parsed = JoinConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = JoinConfig::from_yaml_str("field_naming: kebab\n").unwrap_err();

        assert!(matches!(err, JoinError::Config(_)));
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "field_naming: preserve").unwrap();

        let config = JoinConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.field_naming, FieldNaming::Preserve);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = JoinConfig::from_yaml_file("/nonexistent/joiner.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
