//! Elasticsearch/OpenSearch-compatible query backend
//!
//! One query becomes one `_msearch` round trip with one sub-request per
//! search type. Every sub-request body carries the root query string under
//! `query.bool.must[0].bool.filter[0]`, followed by the time range and
//! stream clauses; a search-type-level override query string is appended as
//! the last `must` clause.

mod client;
mod context;
mod response;
mod search_types;

pub use client::{ElasticsearchClient, MultiSearchEntry};
pub use context::{EsGeneratedQueryContext, GeneratedSearchType};
pub use response::SEARCH_ERROR_PREFIX;

use crate::backend::QueryBackend;
use crate::error::Result;
use crate::lookup::{FieldTypesLookup, IndexLookup};
use crate::models::{
    ExecutionStats, Filter, promote_identical_errors, Query, QueryResult, SearchError, SearchJob,
    TimeRange,
};
use crate::parser::QueryStringDecorators;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Query backend talking to an Elasticsearch/OpenSearch-compatible engine
pub struct ElasticsearchBackend {
    client: ElasticsearchClient,
    index_lookup: Arc<dyn IndexLookup>,
    field_types: FieldTypesLookup,
    decorators: QueryStringDecorators,
    allow_leading_wildcard: bool,
}

impl ElasticsearchBackend {
    /// Create a backend with the given collaborators
    pub fn new(
        client: ElasticsearchClient,
        index_lookup: Arc<dyn IndexLookup>,
        field_types: FieldTypesLookup,
        decorators: QueryStringDecorators,
        allow_leading_wildcard: bool,
    ) -> Self {
        Self {
            client,
            index_lookup,
            field_types,
            decorators,
            allow_leading_wildcard,
        }
    }

    /// Translate a query string into its backend clause; an empty string and
    /// the bare match-all are normalized to `match_all`
    fn translate_query_string(&self, query_string: &str) -> Value {
        if query_string.is_empty() || query_string.trim() == "*" {
            json!({"match_all": {}})
        } else {
            json!({
                "query_string": {
                    "query": query_string,
                    "allow_leading_wildcard": self.allow_leading_wildcard
                }
            })
        }
    }

    /// Fold the structural filter tree into a backend clause
    ///
    /// Stream filters are skipped here; stream scoping is extracted into the
    /// dedicated terms clause instead.
    fn generate_filter_clause(
        &self,
        filter: Option<&Filter>,
        job: &SearchJob,
        query: &Query,
    ) -> Option<Value> {
        match filter? {
            Filter::And { filters } => {
                let clauses: Vec<Value> = filters
                    .iter()
                    .filter_map(|child| self.generate_filter_clause(Some(child), job, query))
                    .collect();
                Some(json!({"bool": {"must": clauses}}))
            }
            Filter::Or { filters } => {
                let clauses: Vec<Value> = filters
                    .iter()
                    .filter_map(|child| self.generate_filter_clause(Some(child), job, query))
                    .collect();
                Some(json!({"bool": {"should": clauses}}))
            }
            Filter::QueryString { query: filter_query } => {
                let decorated = self.decorators.decorate(filter_query, job, query);
                Some(self.translate_query_string(decorated.decorated()))
            }
            Filter::Stream { .. } => None,
        }
    }

    fn time_range_clause(&self, range: &TimeRange) -> Value {
        let (from, to) = range.resolve(Utc::now());
        json!({
            "range": {
                "timestamp": {
                    "gte": from.to_rfc3339_opts(SecondsFormat::Millis, true),
                    "lte": to.to_rfc3339_opts(SecondsFormat::Millis, true)
                }
            }
        })
    }
}

#[async_trait]
impl QueryBackend for ElasticsearchBackend {
    type Context = EsGeneratedQueryContext;

    async fn generate(&self, job: &SearchJob, query: &Query) -> Result<Self::Context> {
        let decorated_root = self.decorators.decorate(&query.query, job, query);
        let mut root_filters = vec![self.translate_query_string(decorated_root.decorated())];
        if let Some(clause) = self.generate_filter_clause(query.filter.as_ref(), job, query) {
            root_filters.push(clause);
        }

        let mut context = EsGeneratedQueryContext::new(self.field_types.clone());
        for search_type in &query.search_types {
            let streams = query.effective_streams(search_type);
            let range = query.effective_time_range(search_type);

            let mut must = vec![
                json!({"bool": {"filter": root_filters.clone()}}),
                self.time_range_clause(&range),
            ];
            if !streams.is_empty() {
                must.push(json!({"terms": {"streams": streams}}));
            }
            if let Some(override_query) = &search_type.query {
                // decorated on its own, never composed with the root string
                let decorated = self.decorators.decorate(override_query, job, query);
                must.push(self.translate_query_string(decorated.decorated()));
            }

            let base_query = json!({"bool": {"must": must}});
            let body = search_types::generate_search_type_body(
                &search_type.spec,
                base_query,
                &streams,
                context.field_types(),
            )
            .await?;

            let indices = self
                .index_lookup
                .index_names_for_streams_in_time_range(&streams, &range)
                .await?;

            context.register(GeneratedSearchType {
                search_type_id: search_type.id.clone(),
                body,
                indices,
            });
        }

        debug!(
            query_id = %query.id,
            job_id = %job.id,
            sub_requests = context.searches().len(),
            "Generated query"
        );
        Ok(context)
    }

    async fn execute(
        &self,
        job: &SearchJob,
        query: &Query,
        context: Self::Context,
    ) -> Result<QueryResult> {
        let started = Instant::now();
        let effective_indices = context.effective_indices();

        if context.searches().is_empty() {
            return Ok(QueryResult {
                query_id: query.id.clone(),
                search_types: HashMap::new(),
                errors: context.errors().clone(),
                stats: ExecutionStats {
                    duration_ms: started.elapsed().as_millis() as u64,
                    effective_indices,
                },
            });
        }

        debug!(query_id = %query.id, job_id = %job.id, "Running query");

        let entries: Vec<MultiSearchEntry> = context
            .searches()
            .iter()
            .map(|search| {
                // an empty index set must not fall back to searching
                // everything; the single empty name yields an empty result
                let indices: Vec<String> = if search.indices.is_empty() {
                    vec![String::new()]
                } else {
                    search.indices.iter().cloned().collect()
                };
                MultiSearchEntry {
                    header: json!({
                        "index": indices,
                        "allow_no_indices": false,
                        "ignore_unavailable": false
                    }),
                    body: search.body.clone(),
                }
            })
            .collect();

        let mut errors = context.errors().clone();

        let responses = match self.client.msearch(&entries).await {
            Ok(responses) => responses,
            Err(e) => {
                // the whole batch failed; no shard-level detail to inspect
                error!(query_id = %query.id, job_id = %job.id, error = %e, "Multi-search request failed");
                errors.insert(SearchError::query(
                    &query.id,
                    format!("{}{}", SEARCH_ERROR_PREFIX, e),
                ));
                return Ok(QueryResult {
                    query_id: query.id.clone(),
                    search_types: HashMap::new(),
                    errors,
                    stats: ExecutionStats {
                        duration_ms: started.elapsed().as_millis() as u64,
                        effective_indices,
                    },
                });
            }
        };

        let mut results_map = HashMap::new();
        for (position, generated) in context.searches().iter().enumerate() {
            let search_type = match query.search_type(&generated.search_type_id) {
                Some(search_type) => search_type,
                None => continue,
            };

            let item = match responses.get(position) {
                Some(item) => item,
                None => {
                    errors.insert(SearchError::search_type(
                        &query.id,
                        &generated.search_type_id,
                        format!("{}Missing response at position {}", SEARCH_ERROR_PREFIX, position),
                    ));
                    continue;
                }
            };

            if let Some(message) = response::check_sub_response(item) {
                errors.insert(SearchError::search_type(
                    &query.id,
                    &generated.search_type_id,
                    message,
                ));
            } else {
                results_map.insert(
                    generated.search_type_id.clone(),
                    search_types::extract_result(&search_type.spec, item),
                );
            }
        }

        debug!(query_id = %query.id, job_id = %job.id, "Query ran");

        Ok(QueryResult {
            query_id: query.id.clone(),
            search_types: results_map,
            errors: promote_identical_errors(query, errors),
            stats: ExecutionStats {
                duration_ms: started.elapsed().as_millis() as u64,
                effective_indices,
            },
        })
    }
}
