//! Hydrator: references → loaded objects, one bulk load per type
//!
//! # Algorithm
//! 1. Group the page by type tag (first-appearance order), distinct keys per type
//! 2. Resolve every tag before loading anything
//! 3. One `bulk_load` per type, concurrently or in group order
//! 4. Re-walk the page: `Some(object)` or `None` per position
//!
//! A `(type, key)` repeated in the page is loaded once and every position
//! receives the same shared object.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::registry::LoaderRegistry;
use crate::domain::{BulkLoader, EntityTypeTag, PrimaryKey, Reference};
use crate::Result;

type Loaded<O> = HashMap<PrimaryKey, Arc<O>>;

/// Batched, order-preserving hydration of a reference page
pub struct Hydrator<O> {
    registry: Arc<LoaderRegistry<O>>,
    concurrent: bool,
}

impl<O> Clone for Hydrator<O> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            concurrent: self.concurrent,
        }
    }
}

impl<O: Send + Sync + 'static> Hydrator<O> {
    pub fn new(registry: Arc<LoaderRegistry<O>>) -> Self {
        Self {
            registry,
            concurrent: true,
        }
    }

    pub fn concurrent(mut self, enabled: bool) -> Self {
        self.concurrent = enabled;
        self
    }

    /// Output has exactly one entry per reference, in page order
    ///
    /// # Errors
    ///
    /// - `UnknownType` for a tag without a loader (no load is issued)
    /// - the first loader error otherwise
    pub async fn hydrate(&self, page: &[Reference]) -> Result<Vec<Option<Arc<O>>>> {
        if page.is_empty() {
            return Ok(Vec::new());
        }

        let groups = group_references(page);
        let mut jobs = Vec::with_capacity(groups.len());
        for (tag, keys) in &groups {
            jobs.push((self.registry.resolve(tag)?, keys.as_slice()));
        }

        let loaded: Vec<Loaded<O>> = if self.concurrent {
            try_join_all(jobs.iter().map(|(loader, keys)| load(loader, keys))).await?
        } else {
            let mut loaded = Vec::with_capacity(jobs.len());
            for (loader, keys) in &jobs {
                loaded.push(load(loader, keys).await?);
            }
            loaded
        };

        let by_tag: FxHashMap<&EntityTypeTag, Loaded<O>> = groups
            .iter()
            .map(|(tag, _)| *tag)
            .zip(loaded)
            .collect();

        let objects: Vec<Option<Arc<O>>> = page
            .iter()
            .map(|reference| {
                by_tag
                    .get(&reference.type_tag)
                    .and_then(|objects| objects.get(&reference.primary_key))
                    .cloned()
            })
            .collect();

        let missing = objects.iter().filter(|o| o.is_none()).count();
        if missing > 0 {
            debug!(missing, page = page.len(), "unresolved references in page");
        }
        Ok(objects)
    }
}

async fn load<O>(loader: &Arc<dyn BulkLoader<O>>, keys: &[PrimaryKey]) -> Result<Loaded<O>> {
    debug!(type_tag = %loader.type_tag(), keys = keys.len(), "bulk load");
    loader.bulk_load(keys).await
}

/// Distinct keys per tag, tags in order of first appearance
fn group_references(page: &[Reference]) -> Vec<(&EntityTypeTag, Vec<PrimaryKey>)> {
    let mut index: FxHashMap<&EntityTypeTag, usize> = FxHashMap::default();
    let mut seen: FxHashSet<&Reference> = FxHashSet::default();
    let mut groups: Vec<(&EntityTypeTag, Vec<PrimaryKey>)> = Vec::new();

    for reference in page {
        if !seen.insert(reference) {
            continue;
        }
        let slot = *index.entry(&reference.type_tag).or_insert_with(|| {
            groups.push((&reference.type_tag, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(reference.primary_key.clone());
    }

    groups
}
