use crate::models::TimeRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One requested result shape within a query
///
/// A search type may override the time range, query string, or stream scope
/// of its parent query. An absent override (or an empty stream set) means the
/// parent query's value applies; resolution happens at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchType {
    /// Identifier, unique within the parent query
    pub id: String,

    /// Override window; absent means the parent query's range applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timerange: Option<TimeRange>,

    /// Override query string; absent means the parent query's string applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Override stream scope; empty means the parent query's streams apply
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub streams: BTreeSet<String>,

    /// The requested result shape
    #[serde(flatten)]
    pub spec: SearchTypeSpec,
}

impl SearchType {
    /// Create a message list search type
    pub fn message_list(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timerange: None,
            query: None,
            streams: BTreeSet::new(),
            spec: SearchTypeSpec::MessageList {
                limit: default_limit(),
                offset: 0,
            },
        }
    }

    /// Create a pivot search type with the given series
    pub fn pivot(id: impl Into<String>, row_groups: Vec<String>, series: Vec<SeriesSpec>) -> Self {
        Self {
            id: id.into(),
            timerange: None,
            query: None,
            streams: BTreeSet::new(),
            spec: SearchTypeSpec::Pivot {
                row_groups,
                series,
                rollup: true,
            },
        }
    }

    /// Set the override time range
    pub fn with_timerange(mut self, timerange: TimeRange) -> Self {
        self.timerange = Some(timerange);
        self
    }

    /// Set the override query string
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the override stream scope
    pub fn with_streams(mut self, streams: impl IntoIterator<Item = String>) -> Self {
        self.streams = streams.into_iter().collect();
        self
    }
}

/// Closed set of search type variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchTypeSpec {
    /// Raw message listing with paging
    MessageList {
        #[serde(default = "default_limit")]
        limit: usize,
        #[serde(default)]
        offset: usize,
    },

    /// Aggregation over row groupings with one or more series
    Pivot {
        #[serde(default)]
        row_groups: Vec<String>,
        series: Vec<SeriesSpec>,
        /// Whether series are additionally computed over all rows
        #[serde(default = "default_rollup")]
        rollup: bool,
    },
}

/// One aggregation series of a pivot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    /// Aggregation function
    pub function: SeriesFunction,

    /// Field the function is applied to; count works without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl SeriesSpec {
    /// Create a series
    pub fn new(function: SeriesFunction, field: Option<String>) -> Self {
        Self { function, field }
    }

    /// Count of documents, optionally of a single field
    pub fn count(field: Option<String>) -> Self {
        Self::new(SeriesFunction::Count, field)
    }

    /// Average of a numeric field
    pub fn average(field: impl Into<String>) -> Self {
        Self::new(SeriesFunction::Average, Some(field.into()))
    }

    /// Maximum of a numeric field
    pub fn max(field: impl Into<String>) -> Self {
        Self::new(SeriesFunction::Max, Some(field.into()))
    }

    /// Readable identifier, used as the key of the series in results
    pub fn literal(&self) -> String {
        let function = match self.function {
            SeriesFunction::Count => "count",
            SeriesFunction::Average => "avg",
            SeriesFunction::Sum => "sum",
            SeriesFunction::Min => "min",
            SeriesFunction::Max => "max",
            SeriesFunction::Cardinality => "card",
        };
        match &self.field {
            Some(field) => format!("{}({})", function, field),
            None => format!("{}()", function),
        }
    }
}

/// Aggregation functions supported for pivot series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesFunction {
    Count,
    Average,
    Sum,
    Min,
    Max,
    Cardinality,
}

fn default_limit() -> usize {
    150
}

fn default_rollup() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_literal() {
        assert_eq!(SeriesSpec::count(None).literal(), "count()");
        assert_eq!(SeriesSpec::average("took_ms").literal(), "avg(took_ms)");
        assert_eq!(SeriesSpec::max("facility").literal(), "max(facility)");
    }

    #[test]
    fn test_search_type_deserialization() {
        let search_type: SearchType = serde_json::from_value(serde_json::json!({
            "id": "st1",
            "type": "message_list",
            "offset": 10
        }))
        .unwrap();

        assert_eq!(search_type.id, "st1");
        assert!(search_type.timerange.is_none());
        assert!(search_type.streams.is_empty());
        match search_type.spec {
            SearchTypeSpec::MessageList { limit, offset } => {
                assert_eq!(limit, 150);
                assert_eq!(offset, 10);
            }
            _ => panic!("expected message list"),
        }
    }

    #[test]
    fn test_pivot_deserialization() {
        let search_type: SearchType = serde_json::from_value(serde_json::json!({
            "id": "st2",
            "type": "pivot",
            "row_groups": ["source"],
            "series": [{"function": "average", "field": "took_ms"}]
        }))
        .unwrap();

        match search_type.spec {
            SearchTypeSpec::Pivot {
                row_groups,
                series,
                rollup,
            } => {
                assert_eq!(row_groups, vec!["source".to_string()]);
                assert_eq!(series.len(), 1);
                assert!(rollup);
            }
            _ => panic!("expected pivot"),
        }
    }
}
