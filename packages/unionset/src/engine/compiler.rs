//! Merge query compiler
//!
//! Builds one statement out of N projected sources:
//!
//! ```text
//! SELECT "model", "id" FROM (
//!     <source 1> UNION ALL <source 2> UNION ALL ...
//! ) AS "merged" ORDER BY "posted" DESC [LIMIT ?] [OFFSET ?]
//! ```
//!
//! Ordering and pagination live only in the outer query. Limiting a branch
//! would drop rows that belong in the global top-K.

use tracing::debug;

use super::source::SourceAdapter;
use crate::config::{ProjectionColumns, SqlDialect, UnionConfig};
use crate::domain::{quote_ident, CompiledQuery, SqlParam};
use crate::{Result, UnionError};

/// Compiles sources plus a `[start, stop)` window into one parameterized query
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    columns: ProjectionColumns,
    dialect: SqlDialect,
    subquery_alias: String,
}

impl QueryCompiler {
    pub fn new(config: &UnionConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            dialect: config.dialect,
            subquery_alias: config.subquery_alias.clone(),
        }
    }

    /// Compile the merge query
    ///
    /// `start` defaults to 0; without `stop` no limit is applied.
    ///
    /// # Errors
    ///
    /// - Validation error if `sources` is empty or `stop < start`
    /// - Configuration error if a source cannot be projected
    pub fn compile(
        &self,
        sources: &[SourceAdapter],
        start: Option<usize>,
        stop: Option<usize>,
    ) -> Result<CompiledQuery> {
        if sources.is_empty() {
            return Err(UnionError::validation("Cannot compile a union of no sources"));
        }
        let offset = start.unwrap_or(0);
        let limit = match stop {
            Some(stop) if stop < offset => {
                return Err(UnionError::validation(format!(
                    "Slice stop ({}) is before start ({})",
                    stop, offset
                )));
            }
            Some(stop) => Some(stop - offset),
            None => None,
        };

        let mut branches = Vec::with_capacity(sources.len());
        let mut params = Vec::new();
        for source in sources {
            let projected = source.project(&self.columns)?;
            branches.push(projected.sql);
            params.extend(projected.params);
        }

        let mut sql = format!(
            "SELECT {}, {} FROM ({}) AS {} ORDER BY {} DESC",
            quote_ident(&self.columns.type_tag),
            quote_ident(&self.columns.primary_key),
            branches.join(" UNION ALL "),
            quote_ident(&self.subquery_alias),
            quote_ident(&self.columns.sort_key),
        );

        let offset = (offset > 0).then_some(offset);
        self.push_pagination(&mut sql, &mut params, offset, limit)?;

        debug!(
            sources = sources.len(),
            params = params.len(),
            sql = %sql,
            "compiled union query"
        );
        Ok(CompiledQuery::new(sql, params))
    }

    fn push_pagination(
        &self,
        sql: &mut String,
        params: &mut Vec<SqlParam>,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<()> {
        match self.dialect {
            SqlDialect::Ansi => {
                if let Some(offset) = offset {
                    sql.push_str(" OFFSET ?");
                    params.push(bind_count(offset)?);
                }
                if let Some(limit) = limit {
                    sql.push_str(" LIMIT ?");
                    params.push(bind_count(limit)?);
                }
            }
            SqlDialect::Sqlite => {
                match limit {
                    Some(limit) => {
                        sql.push_str(" LIMIT ?");
                        params.push(bind_count(limit)?);
                    }
                    // SQLite only accepts OFFSET after a LIMIT
                    None if offset.is_some() => sql.push_str(" LIMIT -1"),
                    None => {}
                }
                if let Some(offset) = offset {
                    sql.push_str(" OFFSET ?");
                    params.push(bind_count(offset)?);
                }
            }
        }
        Ok(())
    }
}

fn bind_count(value: usize) -> Result<SqlParam> {
    i64::try_from(value)
        .map(SqlParam::Integer)
        .map_err(|_| UnionError::validation(format!("Slice bound {} overflows i64", value)))
}
