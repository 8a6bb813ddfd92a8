//! Backend abstraction and the Elasticsearch/OpenSearch implementation
//!
//! A backend turns one query into one batched request against a concrete
//! search engine. Generation builds one backend-native sub-request per search
//! type into a short-lived context; execution merges the sub-requests into a
//! single round trip and reconciles the positional multi-response into typed
//! results and deduplicated errors.

pub mod elasticsearch;

use crate::error::Result;
use crate::models::{Query, QueryResult, SearchJob};
use async_trait::async_trait;

/// A search engine capable of running one query in a single round trip
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Per-query generation state, exclusively owned by one execution
    type Context: Send;

    /// Build one backend-native sub-request per search type, resolving
    /// override/inherit rules, decorating query strings, and resolving
    /// concrete index names
    async fn generate(&self, job: &SearchJob, query: &Query) -> Result<Self::Context>;

    /// Execute the batched request and reconcile results and errors
    async fn execute(
        &self,
        job: &SearchJob,
        query: &Query,
        context: Self::Context,
    ) -> Result<QueryResult>;
}

pub use elasticsearch::{ElasticsearchBackend, ElasticsearchClient, EsGeneratedQueryContext};
