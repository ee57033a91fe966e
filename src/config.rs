//! Viewer configuration, optionally read from a TOML file.
//!
//! ```toml
//! [session]
//! failure_policy = "ClearOnFailure"
//!
//! [engine]
//! sort_by = "InstanceNumber"
//! interpolation = "Bilinear"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::enums::{FailurePolicy, Interpolation, SortBy};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub sort_by: SortBy,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub session: SessionConfig,
    pub engine: EngineConfig,
}

impl ViewerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.session.failure_policy, FailurePolicy::RetainLastGood);
        assert_eq!(config.engine.sort_by, SortBy::ImagePositionPatient);
        assert_eq!(config.engine.interpolation, Interpolation::None);
    }

    #[test]
    fn sections_override_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [session]
            failure_policy = "ClearOnFailure"

            [engine]
            sort_by = "InstanceNumber"
            "#,
        )
        .unwrap();
        assert_eq!(config.session.failure_policy, FailurePolicy::ClearOnFailure);
        assert_eq!(config.engine.sort_by, SortBy::InstanceNumber);
        assert_eq!(config.engine.interpolation, Interpolation::None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = ViewerConfig::from_toml_str("[session]\nretries = 3\n").unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn config_is_loaded_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        std::fs::write(&path, "[engine]\ninterpolation = \"Bilinear\"\n").unwrap();
        let config = ViewerConfig::load(&path).unwrap();
        assert_eq!(config.engine.interpolation, Interpolation::Bilinear);

        assert!(matches!(
            ViewerConfig::load(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
