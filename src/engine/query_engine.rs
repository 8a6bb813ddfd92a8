use crate::backend::QueryBackend;
use crate::config::EngineConfig;
use crate::engine::plan::QueryPlan;
use crate::engine::validation::SearchValidator;
use crate::models::{Query, QueryResult, SearchError, SearchJob, SearchJobResult};
use dashmap::DashMap;
use futures::StreamExt;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Top-level search orchestrator
///
/// Drives the query plan of a job: validate, generate, and execute each
/// planned query, concurrently across queries, and aggregate the per-query
/// results into the job result. Queries share no state, so the only
/// synchronization point is the concurrency-safe result map.
pub struct QueryEngine<B: QueryBackend> {
    backend: Arc<B>,
    validator: SearchValidator,
    max_concurrent_queries: usize,
}

impl<B: QueryBackend> QueryEngine<B> {
    /// Create an engine over the given backend
    pub fn new(backend: Arc<B>, config: &EngineConfig) -> Self {
        Self {
            backend,
            validator: SearchValidator::new(),
            max_concurrent_queries: config.max_concurrent_queries.max(1),
        }
    }

    /// Execute a search job and aggregate its results
    pub async fn run(&self, job: &SearchJob) -> SearchJobResult {
        let started = Instant::now();
        let plan = QueryPlan::create(&job.search);
        debug!(
            job_id = %job.id,
            search_id = %job.search.id,
            queries = plan.len(),
            "Executing search job"
        );

        let results: DashMap<String, QueryResult> = DashMap::new();
        futures::stream::iter(plan.queries())
            .for_each_concurrent(self.max_concurrent_queries, |query| {
                let results = &results;
                async move {
                    let result = self.run_query(job, query).await;
                    results.insert(query.id.clone(), result);
                }
            })
            .await;

        SearchJobResult {
            id: job.id,
            search_id: job.search.id.clone(),
            owner: job.owner.clone(),
            results: results.into_iter().collect(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn run_query(&self, job: &SearchJob, query: &Query) -> QueryResult {
        let validation_errors = self.validator.validate(query);
        if !validation_errors.is_empty() {
            warn!(
                query_id = %query.id,
                job_id = %job.id,
                errors = validation_errors.len(),
                "Query failed validation, skipping execution"
            );
            return QueryResult::failed(&query.id, validation_errors);
        }

        let context = match self.backend.generate(job, query).await {
            Ok(context) => context,
            Err(e) => return QueryResult::failed(&query.id, query_error(query, e)),
        };
        match self.backend.execute(job, query, context).await {
            Ok(result) => result,
            Err(e) => QueryResult::failed(&query.id, query_error(query, e)),
        }
    }
}

fn query_error(query: &Query, error: crate::error::AppError) -> BTreeSet<SearchError> {
    BTreeSet::from([SearchError::query(&query.id, error.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::models::{Search, SearchType, SeriesSpec, TimeRange};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Answers every query with an empty result, failing ids on demand
    struct StubBackend {
        fail_query_id: Option<String>,
    }

    #[async_trait]
    impl QueryBackend for StubBackend {
        type Context = ();

        async fn generate(&self, _job: &SearchJob, query: &Query) -> Result<()> {
            if self.fail_query_id.as_deref() == Some(query.id.as_str()) {
                return Err(AppError::Backend("generation broke".to_string()));
            }
            Ok(())
        }

        async fn execute(
            &self,
            _job: &SearchJob,
            query: &Query,
            _context: (),
        ) -> Result<QueryResult> {
            Ok(QueryResult {
                query_id: query.id.clone(),
                search_types: HashMap::new(),
                errors: BTreeSet::new(),
                stats: Default::default(),
            })
        }
    }

    fn engine(fail_query_id: Option<&str>) -> QueryEngine<StubBackend> {
        QueryEngine::new(
            Arc::new(StubBackend {
                fail_query_id: fail_query_id.map(str::to_string),
            }),
            &EngineConfig::default(),
        )
    }

    fn scoped_query(id: &str) -> Query {
        Query::new(id, TimeRange::relative(300), "source:gateway")
            .with_streams(vec!["s1".to_string()])
            .with_search_types(vec![SearchType::message_list(format!("{}-st", id))])
    }

    #[tokio::test]
    async fn test_results_are_keyed_by_query_id() {
        let search = Search::new("s1", vec![scoped_query("q1"), scoped_query("q2")]);
        let job = SearchJob::new(search, "admin");

        let result = engine(None).run(&job).await;
        assert_eq!(result.results.len(), 2);
        assert!(result.results.contains_key("q1"));
        assert!(result.results.contains_key("q2"));
        assert!(!result.has_errors());
    }

    #[tokio::test]
    async fn test_search_with_only_root_query_yields_empty_result() {
        let root = Query::new("root", TimeRange::relative(300), "*");
        let job = SearchJob::new(Search::new("s1", vec![root]), "admin");

        let result = engine(None).run(&job).await;
        assert!(result.results.is_empty());
        assert!(!result.has_errors());
    }

    #[tokio::test]
    async fn test_failing_query_does_not_block_siblings() {
        let search = Search::new("s1", vec![scoped_query("q1"), scoped_query("q2")]);
        let job = SearchJob::new(search, "admin");

        let result = engine(Some("q1")).run(&job).await;
        assert!(result.results["q1"].has_errors());
        assert!(!result.results["q2"].has_errors());
    }

    #[tokio::test]
    async fn test_invalid_query_is_skipped_but_siblings_run() {
        let invalid = Query::new("q1", TimeRange::relative(300), "*").with_search_types(vec![
            SearchType::pivot("st1", vec![], Vec::<SeriesSpec>::new()),
        ]);
        let search = Search::new("s1", vec![invalid, scoped_query("q2")]);
        let job = SearchJob::new(search, "admin");

        let result = engine(None).run(&job).await;
        assert!(result.results["q1"].has_errors());
        assert!(result.results["q1"].search_types.is_empty());
        assert!(!result.results["q2"].has_errors());
    }
}
