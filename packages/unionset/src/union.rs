//! Union façade: several filtered sources as one ordered, paginated collection
//!
//! # Examples
//!
//! ```rust,ignore
//! use unionset::{Filter, Union};
//!
//! let feed = Union::builder(backend, registry)
//!     .source(posts)
//!     .source(comments)
//!     .build()?;
//!
//! let total = feed.count().await?;
//! let first_page = feed.slice(0..20).await?;
//!
//! // Transforms return a new union; `feed` is unchanged
//! let mine = feed.filter(Filter::eq("author_id", 7))?;
//! ```

use std::fmt;
use std::ops::RangeBounds;
use std::sync::Arc;

use tracing::warn;

use crate::config::UnionConfig;
use crate::domain::{CompiledQuery, ExtraClause, Filter, QueryBackend, SliceRequest, SourceQuery};
use crate::engine::{Hydrator, LoaderRegistry, QueryCompiler, SourceAdapter, UnionExecutor};
use crate::{Result, UnionError};

/// Virtual collection over N sources, merged by descending sort key
///
/// Immutable: `filter`, `extra`, `select_related` and `order_by` all return a
/// new union with freshly mapped sources.
pub struct Union<O> {
    sources: Vec<SourceAdapter>,
    ordering: Option<Vec<String>>,
    compiler: QueryCompiler,
    executor: UnionExecutor,
    hydrator: Hydrator<O>,
    config: UnionConfig,
}

impl<O: Send + Sync + 'static> Union<O> {
    pub fn builder(
        backend: Arc<dyn QueryBackend>,
        registry: Arc<LoaderRegistry<O>>,
    ) -> UnionBuilder<O> {
        UnionBuilder {
            backend,
            registry,
            config: UnionConfig::default(),
            sources: Vec::new(),
        }
    }

    pub fn sources(&self) -> &[SourceAdapter] {
        &self.sources
    }

    /// Validated configuration the union was built with
    pub fn config(&self) -> &UnionConfig {
        &self.config
    }

    /// Ordering recorded by [`order_by`](Self::order_by)
    pub fn ordering(&self) -> Option<&[String]> {
        self.ordering.as_deref()
    }

    /// Sum of every source's own count
    ///
    /// Rows matched by two sources are counted twice, as `UNION ALL` returns them twice.
    pub async fn count(&self) -> Result<u64> {
        let mut total = 0u64;
        for source in &self.sources {
            total += self.executor.count(&source.count_query()?).await?;
        }
        Ok(total)
    }

    /// Hydrated objects in `range`, newest first
    ///
    /// `None` marks a row that was referenced by the merge query but not
    /// returned by its loader.
    pub async fn slice<R>(&self, range: R) -> Result<Vec<Option<Arc<O>>>>
    where
        R: RangeBounds<usize>,
    {
        self.get(SliceRequest::from_range(range)?).await
    }

    /// Like [`slice`](Self::slice), for an explicit request
    ///
    /// # Errors
    ///
    /// - `UnsupportedOperation` if the request carries a step (nothing is executed)
    /// - `Validation` if `stop < start`
    /// - `UnknownType` / `Backend` from hydration and execution
    pub async fn get(&self, request: SliceRequest) -> Result<Vec<Option<Arc<O>>>> {
        let query = self.compile(request)?;
        if request.stop.is_none() && self.config.warn_unbounded {
            warn!(
                start = request.start.unwrap_or(0),
                sources = self.sources.len(),
                "unbounded union slice"
            );
        }

        let page = self.executor.execute(&query).await?;
        self.hydrator.hydrate(&page).await
    }

    /// Merge query a request would execute
    pub fn compile(&self, request: SliceRequest) -> Result<CompiledQuery> {
        if let Some(step) = request.step {
            return Err(UnionError::unsupported(format!(
                "Only simple slices supported, got step {}",
                step
            )));
        }
        self.compiler
            .compile(&self.sources, request.start, request.stop)
    }

    pub fn filter(&self, filter: Filter) -> Result<Self> {
        self.map_sources(|source| source.filter(&filter))
    }

    pub fn extra(&self, clause: ExtraClause) -> Result<Self> {
        self.map_sources(|source| source.extra(&clause))
    }

    pub fn select_related<S: AsRef<str>>(&self, relations: &[S]) -> Result<Self> {
        let relations: Vec<String> = relations.iter().map(|r| r.as_ref().to_string()).collect();
        self.map_sources(|source| source.select_related(&relations))
    }

    /// Record an ordering on the returned union
    ///
    /// The merge query always orders by the configured sort column descending;
    /// the recorded keys are not applied.
    pub fn order_by<I, S>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut clone = self.clone();
        clone.ordering = Some(keys.into_iter().map(Into::into).collect());
        clone
    }

    fn map_sources<F>(&self, transform: F) -> Result<Self>
    where
        F: Fn(&dyn SourceQuery) -> Result<Arc<dyn SourceQuery>>,
    {
        let sources = self
            .sources
            .iter()
            .map(|adapter| adapter.map(&transform))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sources,
            ..self.clone()
        })
    }
}

impl<O> Clone for Union<O> {
    fn clone(&self) -> Self {
        Self {
            sources: self.sources.clone(),
            ordering: self.ordering.clone(),
            compiler: self.compiler.clone(),
            executor: self.executor.clone(),
            hydrator: self.hydrator.clone(),
            config: self.config.clone(),
        }
    }
}

impl<O> fmt::Debug for Union<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Union")
            .field("sources", &self.sources)
            .field("ordering", &self.ordering)
            .finish()
    }
}

/// Builder for [`Union`]
pub struct UnionBuilder<O> {
    backend: Arc<dyn QueryBackend>,
    registry: Arc<LoaderRegistry<O>>,
    config: UnionConfig,
    sources: Vec<Arc<dyn SourceQuery>>,
}

impl<O: Send + Sync + 'static> UnionBuilder<O> {
    pub fn config(mut self, config: UnionConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a source; sources keep insertion order
    pub fn source(mut self, source: Arc<dyn SourceQuery>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn SourceQuery>>,
    {
        self.sources.extend(sources);
        self
    }

    /// # Errors
    ///
    /// Configuration error for an invalid config or an empty source list.
    pub fn build(self) -> Result<Union<O>> {
        self.config.validate()?;
        if self.sources.is_empty() {
            return Err(UnionError::configuration("Union should be non-empty"));
        }

        Ok(Union {
            sources: self.sources.into_iter().map(SourceAdapter::new).collect(),
            ordering: None,
            compiler: QueryCompiler::new(&self.config),
            executor: UnionExecutor::new(self.backend),
            hydrator: Hydrator::new(self.registry)
                .concurrent(self.config.hydration.concurrent_loads),
            config: self.config,
        })
    }
}
