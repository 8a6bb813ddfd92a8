use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Structural filter attached to a query, combined with its query string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// All child filters must match
    And { filters: Vec<Filter> },

    /// At least one child filter must match
    Or { filters: Vec<Filter> },

    /// Nested query string clause
    QueryString { query: String },

    /// Scopes the query to one stream; extracted into the stream term filter
    /// during generation instead of being rendered in place
    Stream { stream_id: String },
}

impl Filter {
    /// Create a conjunction of filters
    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And { filters }
    }

    /// Create a disjunction of filters
    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or { filters }
    }

    /// Create a query string filter
    pub fn query_string(query: impl Into<String>) -> Self {
        Self::QueryString {
            query: query.into(),
        }
    }

    /// Create a stream filter
    pub fn stream(stream_id: impl Into<String>) -> Self {
        Self::Stream {
            stream_id: stream_id.into(),
        }
    }

    /// Stream ids referenced anywhere in the filter tree
    pub fn stream_ids(&self) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        self.collect_stream_ids(&mut ids);
        ids
    }

    fn collect_stream_ids(&self, ids: &mut BTreeSet<String>) {
        match self {
            Self::And { filters } | Self::Or { filters } => {
                for filter in filters {
                    filter.collect_stream_ids(ids);
                }
            }
            Self::Stream { stream_id } => {
                ids.insert(stream_id.clone());
            }
            Self::QueryString { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_ids_from_nested_tree() {
        let filter = Filter::and(vec![
            Filter::query_string("source:gateway"),
            Filter::or(vec![Filter::stream("s1"), Filter::stream("s2")]),
        ]);

        let ids = filter.stream_ids();
        assert_eq!(ids, BTreeSet::from(["s1".to_string(), "s2".to_string()]));
    }

    #[test]
    fn test_filter_serialization_tag() {
        let filter = Filter::query_string("*");
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["type"], "query_string");
        assert_eq!(json["query"], "*");
    }
}
