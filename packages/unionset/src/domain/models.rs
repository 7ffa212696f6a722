//! Union Domain Models
//!
//! Value types shared by the compiler, executor and hydrator.

use std::fmt;
use std::ops::{Bound, RangeBounds};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, UnionError};

// ═══════════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════════

/// Stable identifier of a source's entity type (e.g. `"blog.post"`)
///
/// Rendered into the projection as a string literal and used to find the
/// bulk loader for hydration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityTypeTag(String);

impl EntityTypeTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityTypeTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for EntityTypeTag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

/// Primary key of a referenced row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Int(i64),
    Text(String),
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Int(id) => write!(f, "{}", id),
            PrimaryKey::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for PrimaryKey {
    fn from(id: i64) -> Self {
        PrimaryKey::Int(id)
    }
}

impl From<i32> for PrimaryKey {
    fn from(id: i32) -> Self {
        PrimaryKey::Int(i64::from(id))
    }
}

impl From<&str> for PrimaryKey {
    fn from(id: &str) -> Self {
        PrimaryKey::Text(id.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(id: String) -> Self {
        PrimaryKey::Text(id)
    }
}

impl From<&PrimaryKey> for SqlParam {
    fn from(key: &PrimaryKey) -> Self {
        match key {
            PrimaryKey::Int(id) => SqlParam::Integer(*id),
            PrimaryKey::Text(id) => SqlParam::Text(id.clone()),
        }
    }
}

/// One row of the merged page, without its payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub type_tag: EntityTypeTag,
    pub primary_key: PrimaryKey,
}

impl Reference {
    pub fn new(type_tag: impl Into<EntityTypeTag>, primary_key: impl Into<PrimaryKey>) -> Self {
        Self {
            type_tag: type_tag.into(),
            primary_key: primary_key.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Query Text
// ═══════════════════════════════════════════════════════════════════════════

/// Backend-neutral bind value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlParam {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Integer(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Integer(i64::from(v))
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Integer(i64::from(v))
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Real(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<Vec<u8>> for SqlParam {
    fn from(v: Vec<u8>) -> Self {
        SqlParam::Blob(v)
    }
}

/// Timestamps bind as UNIX seconds
impl From<DateTime<Utc>> for SqlParam {
    fn from(v: DateTime<Utc>) -> Self {
        SqlParam::Integer(v.timestamp())
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlParam::Null, Into::into)
    }
}

/// SQL text with positional `?` parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// A source's projection: query text plus the column names it yields
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedQuery {
    pub query: CompiledQuery,
    pub columns: Vec<String>,
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a string literal, doubling embedded quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// ═══════════════════════════════════════════════════════════════════════════
// Source Transforms
// ═══════════════════════════════════════════════════════════════════════════

/// Comparison operator of a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    IsNull,
    NotNull,
}

/// Column predicate forwarded to every source of a union
///
/// The union never interprets it; each source renders it in its own terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub values: Vec<SqlParam>,
}

impl Filter {
    fn binary(column: impl Into<String>, op: FilterOp, value: impl Into<SqlParam>) -> Self {
        Self {
            column: column.into(),
            op,
            values: vec![value.into()],
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        Self::binary(column, FilterOp::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        Self::binary(column, FilterOp::Ne, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        Self::binary(column, FilterOp::Lt, value)
    }

    pub fn lte(column: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        Self::binary(column, FilterOp::Lte, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        Self::binary(column, FilterOp::Gt, value)
    }

    pub fn gte(column: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        Self::binary(column, FilterOp::Gte, value)
    }

    pub fn is_in<V: Into<SqlParam>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::In,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::IsNull,
            values: Vec::new(),
        }
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::NotNull,
            values: Vec::new(),
        }
    }
}

/// Raw parameterized predicate appended to every source's WHERE clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraClause {
    pub where_sql: String,
    pub params: Vec<SqlParam>,
}

impl ExtraClause {
    pub fn new(where_sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            where_sql: where_sql.into(),
            params,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Slicing
// ═══════════════════════════════════════════════════════════════════════════

/// Window over the merged collection, `[start, stop)` with an optional step
///
/// Any range converts into a request; a step can only be set explicitly and
/// is always rejected by [`Union`](crate::Union).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceRequest {
    pub start: Option<usize>,
    pub stop: Option<usize>,
    pub step: Option<usize>,
}

impl SliceRequest {
    pub fn new(start: Option<usize>, stop: Option<usize>) -> Self {
        Self {
            start,
            stop,
            step: None,
        }
    }

    /// # Errors
    ///
    /// Validation error if an inclusive or excluded bound sits at `usize::MAX`
    /// and cannot be made half-open.
    pub fn from_range(range: impl RangeBounds<usize>) -> Result<Self> {
        let start = match range.start_bound() {
            Bound::Included(&s) => Some(s),
            Bound::Excluded(&s) => Some(past(s, "start")?),
            Bound::Unbounded => None,
        };
        let stop = match range.end_bound() {
            Bound::Included(&e) => Some(past(e, "stop")?),
            Bound::Excluded(&e) => Some(e),
            Bound::Unbounded => None,
        };
        Ok(Self::new(start, stop))
    }

    pub fn with_step(mut self, step: usize) -> Self {
        self.step = Some(step);
        self
    }
}

fn past(bound: usize, name: &str) -> Result<usize> {
    bound.checked_add(1).ok_or_else(|| {
        UnionError::validation(format!("Slice {} bound {} overflows usize", name, bound))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_tag() {
        let tag = EntityTypeTag::new("blog.post");
        assert_eq!(tag.as_str(), "blog.post");
        assert_eq!(tag.to_string(), "blog.post");
        assert_eq!(EntityTypeTag::from("blog.post"), tag);
    }

    #[test]
    fn test_primary_key_display_and_param() {
        assert_eq!(PrimaryKey::from(42).to_string(), "42");
        assert_eq!(PrimaryKey::from("a-1").to_string(), "a-1");
        assert_eq!(SqlParam::from(&PrimaryKey::Int(7)), SqlParam::Integer(7));
        assert_eq!(
            SqlParam::from(&PrimaryKey::Text("x".into())),
            SqlParam::Text("x".into())
        );
    }

    #[test]
    fn test_reference_serde() {
        let reference = Reference::new("blog.post", 3);
        let json = serde_json::to_string(&reference).unwrap();
        assert_eq!(json, r#"{"type_tag":"blog.post","primary_key":3}"#);

        let back: Reference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reference);
    }

    #[test]
    fn test_sql_param_conversions() {
        assert_eq!(SqlParam::from(true), SqlParam::Integer(1));
        assert_eq!(SqlParam::from(None::<i64>), SqlParam::Null);
        assert_eq!(SqlParam::from(Some("a")), SqlParam::Text("a".into()));

        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(SqlParam::from(ts), SqlParam::Integer(1_700_000_000));
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_ident("posted"), "\"posted\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("blog.post"), "'blog.post'");
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
    }

    #[test]
    fn test_filter_constructors() {
        let filter = Filter::is_in("author_id", [1i64, 2, 3]);
        assert_eq!(filter.op, FilterOp::In);
        assert_eq!(filter.values.len(), 3);

        let filter = Filter::is_null("deleted_at");
        assert!(filter.values.is_empty());
    }

    #[test]
    fn test_slice_request_from_range() {
        assert_eq!(
            SliceRequest::from_range(2..5).unwrap(),
            SliceRequest::new(Some(2), Some(5))
        );
        assert_eq!(
            SliceRequest::from_range(..10).unwrap(),
            SliceRequest::new(None, Some(10))
        );
        assert_eq!(
            SliceRequest::from_range(3..).unwrap(),
            SliceRequest::new(Some(3), None)
        );
        assert_eq!(
            SliceRequest::from_range(0..=4).unwrap(),
            SliceRequest::new(Some(0), Some(5))
        );
        assert_eq!(
            SliceRequest::from_range((Bound::Excluded(2), Bound::Excluded(6))).unwrap(),
            SliceRequest::new(Some(3), Some(6))
        );
        assert_eq!(SliceRequest::from_range(..).unwrap(), SliceRequest::default());
    }

    #[test]
    fn test_slice_request_bound_at_usize_max() {
        let err = SliceRequest::from_range(0..=usize::MAX).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
        assert!(err.message.contains("stop"));

        let err = SliceRequest::from_range((Bound::Excluded(usize::MAX), Bound::Unbounded))
            .unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
        assert!(err.message.contains("start"));

        // Half-open ranges ending at usize::MAX need no adjustment
        assert_eq!(
            SliceRequest::from_range(0..usize::MAX).unwrap().stop,
            Some(usize::MAX)
        );
    }

    #[test]
    fn test_slice_request_step() {
        let request = SliceRequest::from_range(0..10).unwrap().with_step(2);
        assert_eq!(request.step, Some(2));
    }
}
