//! Union configuration
//!
//! Controls how the merge query is rendered and how hydration is scheduled.
//!
//! # Examples
//!
//! ```rust,ignore
//! use unionset::config::{SqlDialect, UnionConfig};
//!
//! // In code
//! let config = UnionConfig::default()
//!     .sort_column("created_at")
//!     .dialect(SqlDialect::Ansi);
//!
//! // From YAML (version: 1)
//! let config = UnionConfig::from_yaml("union.yaml")?;
//! ```

pub mod error;
pub mod io;

pub use error::{ConfigError, ConfigResult};
pub use io::ConfigFileV1;

use serde::{Deserialize, Serialize};

/// Largest host-parameter count accepted by bundled SQLite
const MAX_BIND_PARAMS: usize = 32766;

/// Names of the three projected columns every source must produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionColumns {
    /// Primary key column (position 0)
    pub primary_key: String,

    /// Constant type tag column (position 1)
    pub type_tag: String,

    /// Global sort column (position 2)
    pub sort_key: String,
}

impl Default for ProjectionColumns {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            type_tag: "model".to_string(),
            sort_key: "posted".to_string(),
        }
    }
}

impl ProjectionColumns {
    /// Column names in projection order
    pub fn as_slice(&self) -> [&str; 3] {
        [&self.primary_key, &self.type_tag, &self.sort_key]
    }
}

/// Pagination rendering style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// `LIMIT ? OFFSET ?`; an offset without a stop becomes `LIMIT -1 OFFSET ?`
    #[default]
    Sqlite,
    /// `OFFSET ? LIMIT ?`, each clause optional (PostgreSQL)
    Ansi,
}

/// Hydration scheduling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HydrationConfig {
    /// Issue per-type bulk loads concurrently
    pub concurrent_loads: bool,

    /// Maximum keys bound into one `IN (...)` list (1..=32766)
    pub max_keys_per_load: usize,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            concurrent_loads: true,
            max_keys_per_load: 500,
        }
    }
}

/// Complete union configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnionConfig {
    pub columns: ProjectionColumns,
    pub dialect: SqlDialect,

    /// Alias of the merged subquery in the outer SELECT
    pub subquery_alias: String,

    pub hydration: HydrationConfig,

    /// Log a warning for slices without an upper bound
    pub warn_unbounded: bool,
}

impl Default for UnionConfig {
    fn default() -> Self {
        Self {
            columns: ProjectionColumns::default(),
            dialect: SqlDialect::default(),
            subquery_alias: "merged".to_string(),
            hydration: HydrationConfig::default(),
            warn_unbounded: true,
        }
    }
}

impl UnionConfig {
    pub fn primary_key_column(mut self, name: impl Into<String>) -> Self {
        self.columns.primary_key = name.into();
        self
    }

    pub fn type_tag_column(mut self, name: impl Into<String>) -> Self {
        self.columns.type_tag = name.into();
        self
    }

    pub fn sort_column(mut self, name: impl Into<String>) -> Self {
        self.columns.sort_key = name.into();
        self
    }

    pub fn dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn subquery_alias(mut self, alias: impl Into<String>) -> Self {
        self.subquery_alias = alias.into();
        self
    }

    pub fn concurrent_loads(mut self, enabled: bool) -> Self {
        self.hydration.concurrent_loads = enabled;
        self
    }

    pub fn max_keys_per_load(mut self, max: usize) -> Self {
        self.hydration.max_keys_per_load = max;
        self
    }

    pub fn warn_unbounded(mut self, enabled: bool) -> Self {
        self.warn_unbounded = enabled;
        self
    }

    /// Check field ranges and column-name consistency
    pub fn validate(&self) -> ConfigResult<()> {
        let named = [
            ("columns.primary_key", &self.columns.primary_key),
            ("columns.type_tag", &self.columns.type_tag),
            ("columns.sort_key", &self.columns.sort_key),
            ("subquery_alias", &self.subquery_alias),
        ];
        for (field, value) in named {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(field, "must not be empty"));
            }
        }

        let [pk, tag, sort] = self.columns.as_slice();
        if pk == tag || pk == sort || tag == sort {
            return Err(ConfigError::invalid(
                "columns",
                format!("projected columns must be distinct, got ({pk}, {tag}, {sort})"),
            ));
        }

        let max = self.hydration.max_keys_per_load;
        if max == 0 || max > MAX_BIND_PARAMS {
            return Err(ConfigError::invalid(
                "hydration.max_keys_per_load",
                format!("{max} not in 1..={MAX_BIND_PARAMS}"),
            ));
        }

        Ok(())
    }
}
