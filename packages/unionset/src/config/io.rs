//! Configuration I/O (YAML loading)

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::{HydrationConfig, ProjectionColumns, SqlDialect, UnionConfig};

const SUPPORTED_VERSIONS: [u32; 1] = [1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    pub version: Option<u32>,
    pub columns: ProjectionColumns,
    pub dialect: SqlDialect,
    pub subquery_alias: String,
    pub hydration: HydrationConfig,
    pub warn_unbounded: bool,
}

impl Default for ConfigFileV1 {
    fn default() -> Self {
        Self {
            version: None,
            ..Self::versioned(UnionConfig::default())
        }
    }
}

impl ConfigFileV1 {
    fn versioned(config: UnionConfig) -> Self {
        Self {
            version: Some(1),
            columns: config.columns,
            dialect: config.dialect,
            subquery_alias: config.subquery_alias,
            hydration: config.hydration,
            warn_unbounded: config.warn_unbounded,
        }
    }

    fn into_config(self) -> UnionConfig {
        UnionConfig {
            columns: self.columns,
            dialect: self.dialect,
            subquery_alias: self.subquery_alias,
            hydration: self.hydration,
            warn_unbounded: self.warn_unbounded,
        }
    }
}

impl UnionConfig {
    /// Load and validate a YAML configuration file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML configuration text
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;

        match file.version {
            None => return Err(ConfigError::MissingVersion),
            Some(found) if !SUPPORTED_VERSIONS.contains(&found) => {
                return Err(ConfigError::UnsupportedVersion {
                    found,
                    supported: SUPPORTED_VERSIONS.to_vec(),
                });
            }
            Some(_) => {}
        }

        let config = file.into_config();
        config.validate()?;
        Ok(config)
    }

    /// Export as versioned YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(&ConfigFileV1::versioned(self.clone()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_yaml_loading() {
        let yaml_content = r#"
version: 1
dialect: ansi
columns:
  sort_key: created_at
hydration:
  concurrent_loads: false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = UnionConfig::from_yaml(temp_file.path()).unwrap();
        assert_eq!(config.dialect, SqlDialect::Ansi);
        assert_eq!(config.columns.sort_key, "created_at");
        assert_eq!(config.columns.primary_key, "id");
        assert!(!config.hydration.concurrent_loads);
        assert_eq!(config.hydration.max_keys_per_load, 500);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = UnionConfig::default().sort_column("created_at");
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("sort_key: created_at"));

        let parsed = UnionConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_version() {
        let err = UnionConfig::from_yaml_str("dialect: sqlite\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingVersion));
    }

    #[test]
    fn test_unsupported_version() {
        let err = UnionConfig::from_yaml_str("version: 2\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedVersion { found: 2, .. }
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = UnionConfig::from_yaml_str("version: 1\nordering: posted\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_invalid_values_rejected_after_parse() {
        let yaml = "version: 1\ncolumns:\n  type_tag: id\n";
        let err = UnionConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = UnionConfig::from_yaml("/nonexistent/union.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
