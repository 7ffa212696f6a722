//! In-crate test doubles for the port traits

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::ProjectionColumns;
use crate::domain::{
    quote_ident, quote_literal, BulkLoader, CompiledQuery, EntityTypeTag, ExtraClause, Filter,
    PrimaryKey, ProjectedQuery, QueryBackend, Reference, SourceQuery, SqlParam,
};
use crate::{Result, UnionError};

/// Source with fixed SQL; transforms are only recorded
#[derive(Debug, Clone)]
pub struct StaticSource {
    tag: EntityTypeTag,
    param: i64,
    columns: Option<Vec<String>>,
    projectable: bool,
    pub transforms: Vec<String>,
}

impl StaticSource {
    pub fn new(tag: &str, param: i64) -> Self {
        Self {
            tag: EntityTypeTag::new(tag),
            param,
            columns: None,
            projectable: true,
            transforms: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn unprojectable(mut self) -> Self {
        self.projectable = false;
        self
    }

    fn table(&self) -> String {
        self.tag.as_str().replace('.', "_")
    }

    fn transformed(&self, entry: String) -> Arc<dyn SourceQuery> {
        let mut next = self.clone();
        next.transforms.push(entry);
        Arc::new(next)
    }
}

impl SourceQuery for StaticSource {
    fn type_tag(&self) -> &EntityTypeTag {
        &self.tag
    }

    fn projection(&self, columns: &ProjectionColumns) -> Result<ProjectedQuery> {
        if !self.projectable {
            return Err(UnionError::configuration(format!(
                "Source '{}' is already ordered",
                self.tag
            )));
        }
        let sql = format!(
            "SELECT {} AS {}, {} AS {}, {} AS {} FROM {} WHERE \"flag\" = ?",
            quote_ident("id"),
            quote_ident(&columns.primary_key),
            quote_literal(self.tag.as_str()),
            quote_ident(&columns.type_tag),
            quote_ident("created"),
            quote_ident(&columns.sort_key),
            quote_ident(&self.table()),
        );
        let reported = self.columns.clone().unwrap_or_else(|| {
            columns.as_slice().iter().map(|c| c.to_string()).collect()
        });
        Ok(ProjectedQuery {
            query: CompiledQuery::new(sql, vec![SqlParam::Integer(self.param)]),
            columns: reported,
        })
    }

    fn count_query(&self) -> Result<CompiledQuery> {
        Ok(CompiledQuery::new(
            format!("SELECT COUNT(*) FROM {}", quote_ident(&self.table())),
            Vec::new(),
        ))
    }

    fn filter(&self, filter: &Filter) -> Result<Arc<dyn SourceQuery>> {
        Ok(self.transformed(format!("filter:{}", filter.column)))
    }

    fn extra(&self, clause: &ExtraClause) -> Result<Arc<dyn SourceQuery>> {
        Ok(self.transformed(format!("extra:{}", clause.where_sql)))
    }

    fn select_related(&self, relations: &[String]) -> Result<Arc<dyn SourceQuery>> {
        Ok(self.transformed(format!("select_related:{}", relations.join(","))))
    }
}

/// Backend returning canned rows and recording every query it receives
#[derive(Default)]
pub struct RecordingBackend {
    pub references: Vec<Reference>,
    pub counts: HashMap<String, u64>,
    pub fail: bool,
    pub queries: Mutex<Vec<CompiledQuery>>,
}

impl RecordingBackend {
    pub fn with_references(references: Vec<Reference>) -> Self {
        Self {
            references,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    fn record(&self, query: &CompiledQuery) -> Result<()> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(UnionError::backend("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl QueryBackend for RecordingBackend {
    async fn fetch_references(&self, query: &CompiledQuery) -> Result<Vec<Reference>> {
        self.record(query)?;
        Ok(self.references.clone())
    }

    async fn fetch_count(&self, query: &CompiledQuery) -> Result<u64> {
        self.record(query)?;
        Ok(self
            .counts
            .iter()
            .find(|(table, _)| query.sql.contains(table.as_str()))
            .map(|(_, count)| *count)
            .unwrap_or(0))
    }
}

/// Loader over a fixed map that records each key batch it is asked for
pub struct RecordingLoader {
    tag: EntityTypeTag,
    objects: HashMap<PrimaryKey, Arc<String>>,
    pub calls: Mutex<Vec<Vec<PrimaryKey>>>,
}

impl RecordingLoader {
    /// Objects are named `"<tag>#<key>"`
    pub fn new(tag: &str, keys: &[i64]) -> Self {
        let objects = keys
            .iter()
            .map(|&k| (PrimaryKey::Int(k), Arc::new(format!("{}#{}", tag, k))))
            .collect();
        Self {
            tag: EntityTypeTag::new(tag),
            objects,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl BulkLoader<String> for RecordingLoader {
    fn type_tag(&self) -> &EntityTypeTag {
        &self.tag
    }

    async fn bulk_load(&self, keys: &[PrimaryKey]) -> Result<HashMap<PrimaryKey, Arc<String>>> {
        self.calls.lock().unwrap().push(keys.to_vec());
        Ok(keys
            .iter()
            .filter_map(|k| self.objects.get(k).map(|o| (k.clone(), Arc::clone(o))))
            .collect())
    }
}
