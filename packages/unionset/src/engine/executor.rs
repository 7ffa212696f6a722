//! Union executor: one round trip per compiled query

use std::sync::Arc;

use tracing::debug;

use crate::domain::{CompiledQuery, QueryBackend, Reference};
use crate::Result;

/// Runs compiled queries against the backend without retries or caching
#[derive(Clone)]
pub struct UnionExecutor {
    backend: Arc<dyn QueryBackend>,
}

impl UnionExecutor {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self { backend }
    }

    /// Page of references in the order the backend returned them
    pub async fn execute(&self, query: &CompiledQuery) -> Result<Vec<Reference>> {
        let page = self.backend.fetch_references(query).await?;
        debug!(rows = page.len(), "union page fetched");
        Ok(page)
    }

    pub async fn count(&self, query: &CompiledQuery) -> Result<u64> {
        self.backend.fetch_count(query).await
    }
}
