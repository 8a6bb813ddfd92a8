use crate::models::{Filter, SearchType, TimeRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Top-level immutable container of queries submitted together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Search {
    /// Search identifier
    pub id: String,

    /// Queries in submission order; ids are unique within the search
    #[serde(default)]
    pub queries: Vec<Query>,
}

impl Search {
    /// Create a new search
    pub fn new(id: impl Into<String>, queries: Vec<Query>) -> Self {
        Self {
            id: id.into(),
            queries,
        }
    }

    /// Look up a query by id
    pub fn query(&self, id: &str) -> Option<&Query> {
        self.queries.iter().find(|query| query.id == id)
    }
}

/// One independently executable unit of a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Identifier, unique within the search
    pub id: String,

    /// Time window of the query
    pub timerange: TimeRange,

    /// Raw query string; decoration happens at generation time
    pub query: String,

    /// Stream scope; empty means all permitted streams
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub streams: BTreeSet<String>,

    /// Optional structural filter combined with the query string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,

    /// Requested result shapes; ids are unique within the query
    #[serde(default)]
    pub search_types: Vec<SearchType>,
}

impl Query {
    /// Create a new query
    pub fn new(id: impl Into<String>, timerange: TimeRange, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timerange,
            query: query.into(),
            streams: BTreeSet::new(),
            filter: None,
            search_types: Vec::new(),
        }
    }

    /// Set the stream scope
    pub fn with_streams(mut self, streams: impl IntoIterator<Item = String>) -> Self {
        self.streams = streams.into_iter().collect();
        self
    }

    /// Set the structural filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the search types
    pub fn with_search_types(mut self, search_types: Vec<SearchType>) -> Self {
        self.search_types = search_types;
        self
    }

    /// Look up a search type by id
    pub fn search_type(&self, id: &str) -> Option<&SearchType> {
        self.search_types.iter().find(|st| st.id == id)
    }

    /// Stream ids the query is scoped to, including stream filters in the
    /// filter tree
    pub fn used_stream_ids(&self) -> BTreeSet<String> {
        let mut ids = self.streams.clone();
        if let Some(filter) = &self.filter {
            ids.extend(filter.stream_ids());
        }
        ids
    }

    /// Stream scope of a search type: its own non-empty override, otherwise
    /// the query's streams
    pub fn effective_streams(&self, search_type: &SearchType) -> BTreeSet<String> {
        if search_type.streams.is_empty() {
            self.used_stream_ids()
        } else {
            search_type.streams.clone()
        }
    }

    /// Time range of a search type: its own override, otherwise the query's
    pub fn effective_time_range(&self, search_type: &SearchType) -> TimeRange {
        search_type
            .timerange
            .clone()
            .unwrap_or_else(|| self.timerange.clone())
    }

    /// True for the synthetic placeholder a search submission carries when no
    /// root query was supplied; such a query never reaches the backend
    pub fn is_empty_root(&self) -> bool {
        self.search_types.is_empty()
            && self.streams.is_empty()
            && self.filter.is_none()
            && (self.query.trim().is_empty() || self.query.trim() == "*")
    }
}
