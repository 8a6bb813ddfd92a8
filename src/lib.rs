//! Query planning and batched execution engine for LogHive search
//!
//! This crate turns a logical search description — a time range, a
//! free-text/boolean query string, a set of streams, and one or more result
//! shapes — into batched requests against an Elasticsearch/OpenSearch-
//! compatible engine, and reconciles the raw, possibly partially failed
//! responses back into typed per-search-type results and deduplicated
//! errors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 QueryEngine                      │
//! │   plan → validate → generate → execute → fan-in  │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │            ElasticsearchBackend                  │
//! ├─────────────────────────────────────────────────┤
//! │  - override/inherit resolution per search type  │
//! │  - query string decoration                      │
//! │  - index + field type lookups                   │
//! │  - one _msearch round trip per query            │
//! │  - shard error dedup + promotion                │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │       Elasticsearch / OpenSearch cluster         │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Queries within one search are independent and run concurrently; each
//! query performs exactly one network round trip. Failures are folded into
//! the result at the finest granularity that still avoids repetition: shard
//! failures deduplicate within a search type, and error sets identical
//! across every search type of a query are promoted to a single query-level
//! error.
//!
//! # Example
//!
//! ```no_run
//! use loghive_search::backend::{ElasticsearchBackend, ElasticsearchClient};
//! use loghive_search::config::Config;
//! use loghive_search::engine::QueryEngine;
//! use loghive_search::lookup::{FieldTypesLookup, MemoryFieldTypesProvider, MemoryIndexLookup};
//! use loghive_search::models::{Query, Search, SearchJob, SearchType, TimeRange};
//! use loghive_search::parser::QueryStringDecorators;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = ElasticsearchClient::new(&config.backend)?;
//!     let backend = Arc::new(ElasticsearchBackend::new(
//!         client,
//!         Arc::new(MemoryIndexLookup::default()),
//!         FieldTypesLookup::new(Arc::new(MemoryFieldTypesProvider::default())),
//!         QueryStringDecorators::none(),
//!         config.backend.allow_leading_wildcard,
//!     ));
//!     let engine = QueryEngine::new(backend, &config.engine);
//!
//!     let query = Query::new("q1", TimeRange::relative(300), "source:gateway")
//!         .with_streams(vec!["stream-1".to_string()])
//!         .with_search_types(vec![SearchType::message_list("st1")]);
//!     let job = SearchJob::new(Search::new("s1", vec![query]), "admin");
//!
//!     let result = engine.run(&job).await;
//!     println!("queries run: {}", result.results.len());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod models;
pub mod parser;

pub use error::{AppError, Result};
