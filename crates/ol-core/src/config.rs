//! Outliner configuration
//!
//! Stored as RON. Every field has a default, so a config file only needs the
//! settings it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    OPERATION_DEEP_RENAME, OPERATION_EXPLODE, OPERATION_TOGGLE_VISIBLE, OPERATION_UPDATE,
};

/// Generation and command settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlinerConfig {
    /// List entities whose own visibility is off
    pub include_hidden_entities: bool,
    /// List entities on hidden layers
    pub include_hidden_layers: bool,
    /// Generate every node expanded
    pub expand_all: bool,
    /// Names of the undoable host operations
    pub operations: OperationNames,
}

impl Default for OutlinerConfig {
    fn default() -> Self {
        Self {
            include_hidden_entities: true,
            include_hidden_layers: true,
            expand_all: false,
            operations: OperationNames::default(),
        }
    }
}

/// Names shown in the host's undo history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationNames {
    pub update: String,
    pub toggle_visible: String,
    pub explode: String,
    pub deep_rename: String,
}

impl Default for OperationNames {
    fn default() -> Self {
        Self {
            update: OPERATION_UPDATE.to_string(),
            toggle_visible: OPERATION_TOGGLE_VISIBLE.to_string(),
            explode: OPERATION_EXPLODE.to_string(),
            deep_rename: OPERATION_DEEP_RENAME.to_string(),
        }
    }
}

impl OutlinerConfig {
    /// Load from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Parse from RON text
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = OutlinerConfig::from_ron_str("(expand_all: true)").unwrap();
        assert!(config.expand_all);
        assert!(config.include_hidden_entities);
        assert_eq!(config.operations.explode, OPERATION_EXPLODE);
    }

    #[test]
    fn test_operation_names_override() {
        let config =
            OutlinerConfig::from_ron_str("(operations: (deep_rename: \"Rename parts\"))").unwrap();
        assert_eq!(config.operations.deep_rename, "Rename parts");
        assert_eq!(config.operations.update, OPERATION_UPDATE);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            OutlinerConfig::from_ron_str("(expand_all: 3)"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outliner.ron");
        let config = OutlinerConfig {
            include_hidden_layers: false,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(OutlinerConfig::load(&path).unwrap(), config);

        assert!(matches!(
            OutlinerConfig::load(dir.path().join("missing.ron")),
            Err(ConfigError::Io(_))
        ));
    }
}
