//! Source adapter: projects one filtered source for the merge query

use std::fmt;
use std::sync::Arc;

use crate::config::ProjectionColumns;
use crate::domain::{CompiledQuery, EntityTypeTag, SourceQuery};
use crate::{Result, UnionError};

/// Wraps one source and guarantees the projection shape the compiler relies on
#[derive(Clone)]
pub struct SourceAdapter {
    source: Arc<dyn SourceQuery>,
}

impl SourceAdapter {
    pub fn new(source: Arc<dyn SourceQuery>) -> Self {
        Self { source }
    }

    pub fn type_tag(&self) -> &EntityTypeTag {
        self.source.type_tag()
    }

    /// Projected `(primary_key, type_tag, sort_key)` query text
    ///
    /// # Errors
    ///
    /// Configuration error if the source refuses to project or reports any
    /// column list other than `columns`, in order.
    pub fn project(&self, columns: &ProjectionColumns) -> Result<CompiledQuery> {
        let projected = self.source.projection(columns)?;

        let expected = columns.as_slice();
        let matches = projected.columns.len() == expected.len()
            && projected
                .columns
                .iter()
                .zip(expected)
                .all(|(got, want)| got == want);
        if !matches {
            return Err(UnionError::configuration(format!(
                "Source '{}' projects columns {:?}, expected {:?}",
                self.type_tag(),
                projected.columns,
                expected
            )));
        }

        Ok(projected.query)
    }

    pub fn count_query(&self) -> Result<CompiledQuery> {
        self.source.count_query()
    }

    /// New adapter around the transformed source
    pub fn map<F>(&self, transform: F) -> Result<Self>
    where
        F: FnOnce(&dyn SourceQuery) -> Result<Arc<dyn SourceQuery>>,
    {
        Ok(Self::new(transform(self.source.as_ref())?))
    }
}

impl fmt::Debug for SourceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceAdapter")
            .field("source", &self.source)
            .finish()
    }
}
