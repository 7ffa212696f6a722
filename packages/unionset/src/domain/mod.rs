//! Union Domain Layer
//!
//! Value types and the port traits implemented by storage adapters

pub mod models;
pub mod ports;

pub use models::{
    quote_ident, quote_literal, CompiledQuery, EntityTypeTag, ExtraClause, Filter, FilterOp,
    PrimaryKey, ProjectedQuery, Reference, SliceRequest, SqlParam,
};
pub use ports::{BulkLoader, QueryBackend, SourceQuery};
