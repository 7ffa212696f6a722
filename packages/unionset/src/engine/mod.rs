//! Union engine
//!
//! ```text
//! SourceAdapter ×N ─→ QueryCompiler ─→ UnionExecutor ─→ Hydrator
//!   (projection)      (UNION ALL +      (one round      (one bulk load
//!                      ORDER/LIMIT)      trip)           per type)
//! ```

pub mod compiler;
pub mod executor;
pub mod hydrator;
pub mod registry;
pub mod source;

pub use compiler::QueryCompiler;
pub use executor::UnionExecutor;
pub use hydrator::Hydrator;
pub use registry::{LoaderRegistry, LoaderRegistryBuilder};
pub use source::SourceAdapter;
