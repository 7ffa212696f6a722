//! Table-backed source
//!
//! One table, one entity type. Filters and extra clauses accumulate into the
//! WHERE clause; related hints are only recorded for the matching loader.

use std::sync::Arc;

use crate::config::ProjectionColumns;
use crate::domain::{
    quote_ident, quote_literal, CompiledQuery, EntityTypeTag, ExtraClause, Filter, FilterOp,
    ProjectedQuery, SourceQuery, SqlParam,
};
use crate::{Result, UnionError};

#[derive(Debug, Clone)]
pub struct TableSource {
    tag: EntityTypeTag,
    table: String,
    primary_key: String,
    sort_column: String,
    filters: Vec<Filter>,
    extras: Vec<ExtraClause>,
    related: Vec<String>,
    ordering: Vec<String>,
    limit: Option<usize>,
}

impl TableSource {
    /// Source over `table` whose rows sort by `sort_column`; the key column is `id`
    pub fn new(
        tag: impl Into<EntityTypeTag>,
        table: impl Into<String>,
        sort_column: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            sort_column: sort_column.into(),
            filters: Vec::new(),
            extras: Vec::new(),
            related: Vec::new(),
            ordering: Vec::new(),
            limit: None,
        }
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// An ordered source can still be counted but not merged
    pub fn order_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ordering = columns.into_iter().map(Into::into).collect();
        self
    }

    /// A limited source can still be counted but not merged
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Relations requested through `select_related`
    pub fn related(&self) -> &[String] {
        &self.related
    }

    fn where_clause(&self) -> (String, Vec<SqlParam>) {
        let mut predicates = Vec::with_capacity(self.filters.len() + self.extras.len());
        let mut params = Vec::new();

        for filter in &self.filters {
            predicates.push(render_filter(filter));
            params.extend(filter.values.iter().cloned());
        }
        for extra in &self.extras {
            predicates.push(format!("({})", extra.where_sql));
            params.extend(extra.params.iter().cloned());
        }

        if predicates.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", predicates.join(" AND ")), params)
        }
    }

    fn with(&self, edit: impl FnOnce(&mut Self)) -> Arc<dyn SourceQuery> {
        let mut next = self.clone();
        edit(&mut next);
        Arc::new(next)
    }
}

fn render_filter(filter: &Filter) -> String {
    let column = quote_ident(&filter.column);
    match filter.op {
        FilterOp::Eq => format!("{} = ?", column),
        FilterOp::Ne => format!("{} <> ?", column),
        FilterOp::Lt => format!("{} < ?", column),
        FilterOp::Lte => format!("{} <= ?", column),
        FilterOp::Gt => format!("{} > ?", column),
        FilterOp::Gte => format!("{} >= ?", column),
        // Empty IN matches nothing
        FilterOp::In if filter.values.is_empty() => "0 = 1".to_string(),
        FilterOp::In => {
            let marks = vec!["?"; filter.values.len()].join(", ");
            format!("{} IN ({})", column, marks)
        }
        FilterOp::IsNull => format!("{} IS NULL", column),
        FilterOp::NotNull => format!("{} IS NOT NULL", column),
    }
}

fn check_arity(filter: &Filter) -> Result<()> {
    let expected = match filter.op {
        FilterOp::In => return Ok(()),
        FilterOp::IsNull | FilterOp::NotNull => 0,
        _ => 1,
    };
    if filter.values.len() != expected {
        return Err(UnionError::validation(format!(
            "Filter {:?} on '{}' takes {} value(s), got {}",
            filter.op,
            filter.column,
            expected,
            filter.values.len()
        )));
    }
    Ok(())
}

/// `?` markers outside quoted literals and identifiers
fn count_placeholders(sql: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut count = 0;
    for c in sql.chars() {
        match (quote, c) {
            // A doubled quote closes and reopens the span
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '?') => count += 1,
            (None, _) => {}
        }
    }
    count
}

impl SourceQuery for TableSource {
    fn type_tag(&self) -> &EntityTypeTag {
        &self.tag
    }

    fn projection(&self, columns: &ProjectionColumns) -> Result<ProjectedQuery> {
        if !self.ordering.is_empty() || self.limit.is_some() {
            return Err(UnionError::configuration(format!(
                "Source '{}' is ordered or limited and cannot be merged",
                self.tag
            )));
        }

        let (where_sql, params) = self.where_clause();
        let sql = format!(
            "SELECT {} AS {}, {} AS {}, {} AS {} FROM {}{}",
            quote_ident(&self.primary_key),
            quote_ident(&columns.primary_key),
            quote_literal(self.tag.as_str()),
            quote_ident(&columns.type_tag),
            quote_ident(&self.sort_column),
            quote_ident(&columns.sort_key),
            quote_ident(&self.table),
            where_sql,
        );

        Ok(ProjectedQuery {
            query: CompiledQuery::new(sql, params),
            columns: columns.as_slice().iter().map(|c| c.to_string()).collect(),
        })
    }

    fn count_query(&self) -> Result<CompiledQuery> {
        let (where_sql, mut params) = self.where_clause();
        let table = quote_ident(&self.table);

        let sql = match self.limit {
            None => format!("SELECT COUNT(*) FROM {}{}", table, where_sql),
            Some(limit) => {
                let limit = i64::try_from(limit)
                    .map_err(|_| UnionError::validation(format!("Limit too large: {}", limit)))?;
                params.push(SqlParam::Integer(limit));
                format!(
                    "SELECT COUNT(*) FROM (SELECT 1 FROM {}{} LIMIT ?)",
                    table, where_sql
                )
            }
        };

        Ok(CompiledQuery::new(sql, params))
    }

    fn filter(&self, filter: &Filter) -> Result<Arc<dyn SourceQuery>> {
        check_arity(filter)?;
        Ok(self.with(|next| next.filters.push(filter.clone())))
    }

    fn extra(&self, clause: &ExtraClause) -> Result<Arc<dyn SourceQuery>> {
        let markers = count_placeholders(&clause.where_sql);
        if markers != clause.params.len() {
            return Err(UnionError::validation(format!(
                "Extra clause has {} placeholder(s) but {} param(s)",
                markers,
                clause.params.len()
            )));
        }
        Ok(self.with(|next| next.extras.push(clause.clone())))
    }

    fn select_related(&self, relations: &[String]) -> Result<Arc<dyn SourceQuery>> {
        Ok(self.with(|next| {
            for relation in relations {
                if !next.related.contains(relation) {
                    next.related.push(relation.clone());
                }
            }
        }))
    }
}
