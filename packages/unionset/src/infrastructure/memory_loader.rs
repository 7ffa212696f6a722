//! In-memory bulk loader
//!
//! HashMap-backed loader for tests and for callers that already hold the objects.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::domain::{BulkLoader, EntityTypeTag, PrimaryKey};
use crate::Result;

pub struct InMemoryBulkLoader<O> {
    tag: EntityTypeTag,
    objects: Arc<RwLock<HashMap<PrimaryKey, Arc<O>>>>,
}

impl<O> InMemoryBulkLoader<O> {
    pub fn new(tag: impl Into<EntityTypeTag>) -> Self {
        Self {
            tag: tag.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<EntityTypeTag>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Insert or replace the object stored under `key`
    pub fn insert(&self, key: impl Into<PrimaryKey>, object: O) -> Result<()> {
        self.objects.write()?.insert(key.into(), Arc::new(object));
        Ok(())
    }

    pub fn remove(&self, key: &PrimaryKey) -> Result<Option<Arc<O>>> {
        Ok(self.objects.write()?.remove(key))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.objects.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.objects.read()?.is_empty())
    }
}

impl<O> Clone for InMemoryBulkLoader<O> {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            objects: Arc::clone(&self.objects),
        }
    }
}

impl<O, K> FromIterator<(K, O)> for InMemoryBulkLoader<O>
where
    K: Into<PrimaryKey>,
{
    /// Unnamed loader; use [`InMemoryBulkLoader::with_tag`] to name it
    fn from_iter<I: IntoIterator<Item = (K, O)>>(iter: I) -> Self {
        let objects = iter
            .into_iter()
            .map(|(k, o)| (k.into(), Arc::new(o)))
            .collect();
        Self {
            tag: EntityTypeTag::new(""),
            objects: Arc::new(RwLock::new(objects)),
        }
    }
}

#[async_trait]
impl<O: Send + Sync + 'static> BulkLoader<O> for InMemoryBulkLoader<O> {
    fn type_tag(&self) -> &EntityTypeTag {
        &self.tag
    }

    async fn bulk_load(&self, keys: &[PrimaryKey]) -> Result<HashMap<PrimaryKey, Arc<O>>> {
        let objects = self.objects.read()?;
        Ok(keys
            .iter()
            .filter_map(|key| objects.get(key).map(|o| (key.clone(), Arc::clone(o))))
            .collect())
    }
}
