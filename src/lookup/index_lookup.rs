use crate::error::Result;
use crate::models::TimeRange;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Resolves streams and a time range to concrete index names
///
/// Implementations are pure lookups against external index metadata: no side
/// effects, safe for unsynchronized concurrent reads. Results may be cached
/// for the lifetime of one job, never across jobs.
#[async_trait]
pub trait IndexLookup: Send + Sync {
    /// Index names whose retention window intersects `range` and which carry
    /// at least one of `stream_ids`. An empty stream set yields an empty
    /// result, not an error.
    async fn index_names_for_streams_in_time_range(
        &self,
        stream_ids: &BTreeSet<String>,
        range: &TimeRange,
    ) -> Result<BTreeSet<String>>;
}

/// Retention window and stream membership of one concrete index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRangeEntry {
    /// Concrete index name
    pub index_name: String,

    /// Oldest message timestamp covered by the index
    pub begin: DateTime<Utc>,

    /// Newest message timestamp covered by the index
    pub end: DateTime<Utc>,

    /// Streams with messages in the index
    pub stream_ids: BTreeSet<String>,
}

/// In-memory lookup over index range metadata
#[derive(Debug, Clone, Default)]
pub struct MemoryIndexLookup {
    entries: Vec<IndexRangeEntry>,
}

impl MemoryIndexLookup {
    /// Create a lookup over the given entries
    pub fn new(entries: Vec<IndexRangeEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl IndexLookup for MemoryIndexLookup {
    async fn index_names_for_streams_in_time_range(
        &self,
        stream_ids: &BTreeSet<String>,
        range: &TimeRange,
    ) -> Result<BTreeSet<String>> {
        if stream_ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let (from, to) = range.resolve(Utc::now());
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.begin <= to && entry.end >= from)
            .filter(|entry| !entry.stream_ids.is_disjoint(stream_ids))
            .map(|entry| entry.index_name.clone())
            .collect())
    }
}
