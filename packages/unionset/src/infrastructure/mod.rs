//! Union Infrastructure
//!
//! Adapters implementing the domain ports:
//! - `InMemoryBulkLoader`: HashMap-backed loader
//! - `SqliteBackend`, `TableSource`, `SqliteBulkLoader`: SQLite (feature `sqlite`)

mod memory_loader;

#[cfg(feature = "sqlite")]
mod sqlite_backend;
#[cfg(feature = "sqlite")]
mod sqlite_loader;
#[cfg(feature = "sqlite")]
mod sqlite_source;

pub use memory_loader::InMemoryBulkLoader;

#[cfg(feature = "sqlite")]
pub use sqlite_backend::SqliteBackend;
#[cfg(feature = "sqlite")]
pub use sqlite_loader::SqliteBulkLoader;
#[cfg(feature = "sqlite")]
pub use sqlite_source::TableSource;
