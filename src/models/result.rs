use crate::models::{SearchError, TimeRange};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Outcome of one executed query
///
/// A search type missing from `search_types` simply produced no payload in
/// the backend response; that is an absence, not an error. Errors and partial
/// results coexist: a failing search type never suppresses a sibling's
/// successful result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Id of the query this result belongs to
    pub query_id: String,

    /// Typed result payloads keyed by search type id
    #[serde(default)]
    pub search_types: HashMap<String, SearchTypeResult>,

    /// Deduplicated errors at query or search type granularity
    #[serde(default)]
    pub errors: BTreeSet<SearchError>,

    /// Execution statistics, recorded regardless of success
    #[serde(default)]
    pub stats: ExecutionStats,
}

impl QueryResult {
    /// Result without payloads, carrying the given errors
    pub fn failed(query_id: impl Into<String>, errors: BTreeSet<SearchError>) -> Self {
        Self {
            query_id: query_id.into(),
            search_types: HashMap::new(),
            errors,
            stats: ExecutionStats::default(),
        }
    }

    /// Whether any error was recorded
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Execution statistics of one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Wall-clock duration of generation plus execution, in milliseconds
    pub duration_ms: u64,

    /// Union of index names the batched request touched
    pub effective_indices: BTreeSet<String>,
}

/// Typed per-search-type result payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchTypeResult {
    MessageList(MessageListResult),
    Pivot(PivotResult),
}

/// Result of a message list search type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageListResult {
    /// Total number of matching messages before paging
    pub total: u64,

    /// The requested page of messages
    pub messages: Vec<ResultMessage>,
}

/// One message of a message list result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    /// Index the message was read from
    pub index: String,

    /// The message document
    pub message: serde_json::Value,
}

/// Result of a pivot search type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotResult {
    /// Total number of matching messages
    pub total: u64,

    /// Rows in bucket order; the rollup row carries an empty key
    pub rows: Vec<PivotRow>,

    /// Absolute window the aggregated data actually covers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_timerange: Option<TimeRange>,
}

/// One row of a pivot result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    /// Bucket keys, one per row group; empty for the rollup row
    pub key: Vec<String>,

    /// Series values in series order
    pub values: Vec<PivotValue>,
}

/// One series value of a pivot row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotValue {
    /// Series identifier, e.g. `avg(took_ms)`
    pub key: String,

    /// Computed value; absent when the backend produced none
    pub value: Option<f64>,
}
