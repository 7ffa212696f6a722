//! unionset - one ordered, paginated view over several filtered SQL sources
//!
//! > "Merge in the database, hydrate in bulk."
//!
//! ## Core Principles
//!
//! 1. **One round trip per page**: every source is projected to
//!    `(primary_key, type_tag, sort_key)`, the projections are joined with
//!    `UNION ALL`, and ordering plus pagination happen in a single query.
//! 2. **One bulk load per type**: the page is grouped by type tag and each
//!    type's loader is called once, then objects are put back in page order.
//! 3. **Immutable unions**: `filter`, `extra`, `select_related` and `order_by`
//!    return a new union.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use unionset::infrastructure::{SqliteBackend, SqliteBulkLoader, TableSource};
//! use unionset::{LoaderRegistry, Union, UnionConfig};
//!
//! let backend = Arc::new(SqliteBackend::open("blog.db")?);
//! let registry = LoaderRegistry::builder()
//!     .register(Arc::new(post_loader))
//!     .register(Arc::new(comment_loader))
//!     .build()?;
//!
//! let feed = Union::builder(backend, Arc::new(registry))
//!     .config(UnionConfig::from_yaml("union.yaml")?)
//!     .source(Arc::new(TableSource::new("blog.post", "posts", "created_at")))
//!     .source(Arc::new(TableSource::new("blog.comment", "comments", "created_at")))
//!     .build()?;
//!
//! let page = feed.slice(0..20).await?;
//! ```

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod infrastructure;
pub mod union;

#[cfg(test)]
mod test_support;

pub use error::{ErrorKind, Result, UnionError};

pub use config::{
    ConfigError, ConfigFileV1, HydrationConfig, ProjectionColumns, SqlDialect, UnionConfig,
};
pub use domain::{
    BulkLoader, CompiledQuery, EntityTypeTag, ExtraClause, Filter, FilterOp, PrimaryKey,
    QueryBackend, Reference, SliceRequest, SourceQuery, SqlParam,
};
pub use engine::{Hydrator, LoaderRegistry, LoaderRegistryBuilder, QueryCompiler, SourceAdapter};
pub use union::{Union, UnionBuilder};
