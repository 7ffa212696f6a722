//! Loader registry: type tag → bulk loader
//!
//! Built once at startup, immutable afterwards, and handed to the hydrator.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::{BulkLoader, EntityTypeTag};
use crate::{Result, UnionError};

/// Immutable mapping from type tag to its bulk loader
pub struct LoaderRegistry<O> {
    loaders: HashMap<EntityTypeTag, Arc<dyn BulkLoader<O>>>,
}

impl<O: Send + Sync + 'static> LoaderRegistry<O> {
    pub fn builder() -> LoaderRegistryBuilder<O> {
        LoaderRegistryBuilder {
            loaders: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// # Errors
    ///
    /// `UnknownType` if no loader was registered under `tag`.
    pub fn resolve(&self, tag: &EntityTypeTag) -> Result<&Arc<dyn BulkLoader<O>>> {
        self.loaders
            .get(tag)
            .ok_or_else(|| UnionError::unknown_type(tag))
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&EntityTypeTag> {
        let mut tags: Vec<_> = self.loaders.keys().collect();
        tags.sort();
        tags
    }
}

impl<O> fmt::Debug for LoaderRegistry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.loaders.keys().map(EntityTypeTag::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("LoaderRegistry").field("tags", &tags).finish()
    }
}

/// Collects loaders; duplicate tags are reported by [`build`](Self::build)
pub struct LoaderRegistryBuilder<O> {
    loaders: HashMap<EntityTypeTag, Arc<dyn BulkLoader<O>>>,
    duplicates: Vec<EntityTypeTag>,
}

impl<O: Send + Sync + 'static> LoaderRegistryBuilder<O> {
    pub fn register(mut self, loader: Arc<dyn BulkLoader<O>>) -> Self {
        let tag = loader.type_tag().clone();
        if self.loaders.contains_key(&tag) {
            self.duplicates.push(tag);
        } else {
            self.loaders.insert(tag, loader);
        }
        self
    }

    /// # Errors
    ///
    /// Configuration error if two loaders claimed the same tag.
    pub fn build(self) -> Result<LoaderRegistry<O>> {
        if !self.duplicates.is_empty() {
            let tags: Vec<_> = self.duplicates.iter().map(EntityTypeTag::as_str).collect();
            return Err(UnionError::configuration(format!(
                "Bulk loader registered twice for: {}",
                tags.join(", ")
            )));
        }
        Ok(LoaderRegistry {
            loaders: self.loaders,
        })
    }
}
