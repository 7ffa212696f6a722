//! SQLite Query Backend
//!
//! Executes compiled union queries on a single shared connection.
use async_trait::async_trait;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, Row, ToSql};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::trace;

use crate::domain::{CompiledQuery, PrimaryKey, QueryBackend, Reference, SqlParam};
use crate::{Result, UnionError};

/// SQLite-based QueryBackend implementation
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_connection(Connection::open(db_path)?))
    }

    /// In-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` with the connection locked, e.g. to create or seed tables
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock()?;
        Ok(f(&conn)?)
    }
}

#[async_trait]
impl QueryBackend for SqliteBackend {
    async fn fetch_references(&self, query: &CompiledQuery) -> Result<Vec<Reference>> {
        trace!(sql = %query.sql, "fetch references");
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(&query.sql)?;

        let rows = stmt.query_map(params_from_iter(query.params.iter()), |row| {
            let tag: String = row.get(0)?;
            Ok(Reference::new(tag, read_key(row, 1)?))
        })?;

        let references = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(references)
    }

    async fn fetch_count(&self, query: &CompiledQuery) -> Result<u64> {
        trace!(sql = %query.sql, "fetch count");
        let conn = self.conn.lock()?;
        let count: i64 = conn.query_row(&query.sql, params_from_iter(query.params.iter()), |row| {
            row.get(0)
        })?;

        u64::try_from(count)
            .map_err(|_| UnionError::backend(format!("Negative row count: {}", count)))
    }
}

/// Read an INTEGER or TEXT primary key from column `idx`
pub(crate) fn read_key(row: &Row<'_>, idx: usize) -> rusqlite::Result<PrimaryKey> {
    match row.get_ref(idx)? {
        ValueRef::Integer(key) => Ok(PrimaryKey::Int(key)),
        ValueRef::Text(key) => {
            let key = std::str::from_utf8(key).map_err(rusqlite::Error::Utf8Error)?;
            Ok(PrimaryKey::Text(key.to_string()))
        }
        other => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "primary_key".to_string(),
            other.data_type(),
        )),
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            SqlParam::Null => ValueRef::Null,
            SqlParam::Integer(v) => ValueRef::Integer(*v),
            SqlParam::Real(v) => ValueRef::Real(*v),
            SqlParam::Text(v) => ValueRef::Text(v.as_bytes()),
            SqlParam::Blob(v) => ValueRef::Blob(v.as_slice()),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}
