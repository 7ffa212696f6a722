//! SQLite bulk loader
//!
//! Loads one table's rows by key with `WHERE key IN (...)`, split into chunks
//! so a page never exceeds SQLite's bind-parameter limit.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params_from_iter, Row};
use tracing::debug;

use super::sqlite_backend::{read_key, SqliteBackend};
use crate::config::{HydrationConfig, UnionConfig};
use crate::domain::{quote_ident, BulkLoader, EntityTypeTag, PrimaryKey, SqlParam};
use crate::Result;

type RowMapper<O> = dyn Fn(&Row<'_>) -> rusqlite::Result<O> + Send + Sync;

/// Table-backed loader for one entity type
///
/// Every row is selected as `key, <columns>`: the mapper sees the key at
/// index 0 and the requested columns from index 1 (or all columns when none
/// were requested).
pub struct SqliteBulkLoader<O> {
    backend: SqliteBackend,
    tag: EntityTypeTag,
    table: String,
    key_column: String,
    columns: Vec<String>,
    chunk_size: usize,
    mapper: Arc<RowMapper<O>>,
}

impl<O> SqliteBulkLoader<O> {
    pub fn new<F>(
        backend: SqliteBackend,
        tag: impl Into<EntityTypeTag>,
        table: impl Into<String>,
        mapper: F,
    ) -> Self
    where
        F: Fn(&Row<'_>) -> rusqlite::Result<O> + Send + Sync + 'static,
    {
        Self {
            backend,
            tag: tag.into(),
            table: table.into(),
            key_column: "id".to_string(),
            columns: Vec::new(),
            chunk_size: HydrationConfig::default().max_keys_per_load,
            mapper: Arc::new(mapper),
        }
    }

    pub fn key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    pub fn columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Keys bound per statement (at least 1)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Take the chunk size from `hydration.max_keys_per_load`
    pub fn with_config(self, config: &UnionConfig) -> Self {
        self.chunk_size(config.hydration.max_keys_per_load)
    }

    pub fn keys_per_statement(&self) -> usize {
        self.chunk_size
    }

    fn select_sql(&self, keys: usize) -> String {
        let selected = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let key = quote_ident(&self.key_column);
        format!(
            "SELECT {}, {} FROM {} WHERE {} IN ({})",
            key,
            selected,
            quote_ident(&self.table),
            key,
            vec!["?"; keys].join(", ")
        )
    }
}

#[async_trait]
impl<O: Send + Sync + 'static> BulkLoader<O> for SqliteBulkLoader<O> {
    fn type_tag(&self) -> &EntityTypeTag {
        &self.tag
    }

    async fn bulk_load(&self, keys: &[PrimaryKey]) -> Result<HashMap<PrimaryKey, Arc<O>>> {
        let mut loaded = HashMap::with_capacity(keys.len());
        if keys.is_empty() {
            return Ok(loaded);
        }

        let chunks = keys.chunks(self.chunk_size);
        debug!(
            type_tag = %self.tag,
            keys = keys.len(),
            statements = chunks.len(),
            "sqlite bulk load"
        );

        for chunk in chunks {
            let sql = self.select_sql(chunk.len());
            let params: Vec<SqlParam> = chunk.iter().map(SqlParam::from).collect();

            let rows = self.backend.with_connection(|conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
                    Ok((read_key(row, 0)?, (self.mapper)(row)?))
                })?;
                let rows = rows.collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })?;

            loaded.extend(rows.into_iter().map(|(key, object)| (key, Arc::new(object))));
        }

        Ok(loaded)
    }
}
