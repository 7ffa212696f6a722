//! Union Ports (Trait Interfaces)
//!
//! The union engine only talks to its collaborators through these traits:
//! - `SourceQuery`: one filtered, already-authorized query of a single type
//! - `QueryBackend`: executes parameterized SQL (SQLite adapter in `infrastructure`)
//! - `BulkLoader`: turns a key set of one type into loaded objects

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::models::{
    CompiledQuery, EntityTypeTag, ExtraClause, Filter, PrimaryKey, ProjectedQuery, Reference,
};
use crate::config::ProjectionColumns;
use crate::Result;

/// Filtered query of one entity type
///
/// Sources are immutable: every transform returns a new source.
pub trait SourceQuery: fmt::Debug + Send + Sync {
    /// Tag projected as the constant type column
    fn type_tag(&self) -> &EntityTypeTag;

    /// Project to exactly `(primary_key, type_tag, sort_key)`, in that order,
    /// without any ORDER BY, LIMIT or OFFSET.
    ///
    /// # Errors
    ///
    /// Configuration error if the source carries its own ordering or limit.
    fn projection(&self, columns: &ProjectionColumns) -> Result<ProjectedQuery>;

    /// Query returning a single integer: this source's row count
    fn count_query(&self) -> Result<CompiledQuery>;

    fn filter(&self, filter: &Filter) -> Result<Arc<dyn SourceQuery>>;

    fn extra(&self, clause: &ExtraClause) -> Result<Arc<dyn SourceQuery>>;

    /// Record relations the loader should fetch alongside each row
    fn select_related(&self, relations: &[String]) -> Result<Arc<dyn SourceQuery>>;
}

/// Storage backend executing parameterized SQL
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Run a query whose rows are `(type_tag, primary_key)`, preserving row order
    async fn fetch_references(&self, query: &CompiledQuery) -> Result<Vec<Reference>>;

    /// Run a query returning one integer
    async fn fetch_count(&self, query: &CompiledQuery) -> Result<u64>;
}

/// Batch loader for one entity type
///
/// Keys that cannot be resolved (deleted rows, permission changes) are
/// simply left out of the returned map.
#[async_trait]
pub trait BulkLoader<O>: Send + Sync {
    fn type_tag(&self) -> &EntityTypeTag;

    async fn bulk_load(&self, keys: &[PrimaryKey]) -> Result<HashMap<PrimaryKey, Arc<O>>>;
}
