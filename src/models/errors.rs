use crate::models::Query;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An error surfaced while running one query
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchError {
    /// Applies to the whole query
    Query { query_id: String, message: String },

    /// Tagged to a single search type
    SearchType {
        query_id: String,
        search_type_id: String,
        message: String,
    },
}

impl SearchError {
    /// Create a query-level error
    pub fn query(query_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            query_id: query_id.into(),
            message: message.into(),
        }
    }

    /// Create a search-type-level error
    pub fn search_type(
        query_id: impl Into<String>,
        search_type_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SearchType {
            query_id: query_id.into(),
            search_type_id: search_type_id.into(),
            message: message.into(),
        }
    }

    /// The query this error belongs to
    pub fn query_id(&self) -> &str {
        match self {
            Self::Query { query_id, .. } | Self::SearchType { query_id, .. } => query_id,
        }
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        match self {
            Self::Query { message, .. } | Self::SearchType { message, .. } => message,
        }
    }
}

/// Collapse identical per-search-type error sets into query-level errors.
///
/// When every search type of a multi-search-type query surfaced exactly the
/// same set of messages, the failure is a property of the query, not of any
/// single search type. The per-search-type errors are then replaced by one
/// query-level error per message. Queries with a single search type keep the
/// search-type tagging so callers can still attribute the failure.
pub fn promote_identical_errors(
    query: &Query,
    errors: BTreeSet<SearchError>,
) -> BTreeSet<SearchError> {
    if query.search_types.len() < 2 {
        return errors;
    }

    let mut per_search_type: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for error in &errors {
        if let SearchError::SearchType {
            search_type_id,
            message,
            ..
        } = error
        {
            per_search_type
                .entry(search_type_id.as_str())
                .or_default()
                .insert(message.as_str());
        }
    }

    if per_search_type.len() != query.search_types.len() {
        return errors;
    }

    let mut sets = per_search_type.values();
    let first = match sets.next() {
        Some(set) if !set.is_empty() => set.clone(),
        _ => return errors,
    };
    if !sets.all(|set| *set == first) {
        return errors;
    }

    let promoted: BTreeSet<SearchError> = first
        .into_iter()
        .map(|message| SearchError::query(&query.id, message))
        .collect();

    errors
        .into_iter()
        .filter(|error| matches!(error, SearchError::Query { .. }))
        .chain(promoted)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SearchType, TimeRange};

    fn query_with_search_types(ids: &[&str]) -> Query {
        Query::new("q1", TimeRange::relative(300), "*").with_search_types(
            ids.iter().map(|id| SearchType::message_list(*id)).collect(),
        )
    }

    #[test]
    fn test_identical_errors_promote_to_query_level() {
        let query = query_with_search_types(&["st1", "st2"]);
        let errors = BTreeSet::from([
            SearchError::search_type("q1", "st1", "broken"),
            SearchError::search_type("q1", "st2", "broken"),
        ]);

        let promoted = promote_identical_errors(&query, errors);
        assert_eq!(
            promoted,
            BTreeSet::from([SearchError::query("q1", "broken")])
        );
    }

    #[test]
    fn test_single_failing_search_type_stays_tagged() {
        let query = query_with_search_types(&["st1", "st2"]);
        let errors = BTreeSet::from([SearchError::search_type("q1", "st1", "broken")]);

        let result = promote_identical_errors(&query, errors.clone());
        assert_eq!(result, errors);
    }

    #[test]
    fn test_differing_messages_stay_tagged() {
        let query = query_with_search_types(&["st1", "st2"]);
        let errors = BTreeSet::from([
            SearchError::search_type("q1", "st1", "broken"),
            SearchError::search_type("q1", "st2", "differently broken"),
        ]);

        let result = promote_identical_errors(&query, errors.clone());
        assert_eq!(result, errors);
    }

    #[test]
    fn test_single_search_type_query_keeps_tagging() {
        let query = query_with_search_types(&["st1"]);
        let errors = BTreeSet::from([SearchError::search_type("q1", "st1", "broken")]);

        let result = promote_identical_errors(&query, errors.clone());
        assert_eq!(result, errors);
    }

    #[test]
    fn test_existing_query_errors_survive_promotion() {
        let query = query_with_search_types(&["st1", "st2"]);
        let errors = BTreeSet::from([
            SearchError::query("q1", "fatal"),
            SearchError::search_type("q1", "st1", "broken"),
            SearchError::search_type("q1", "st2", "broken"),
        ]);

        let result = promote_identical_errors(&query, errors);
        assert_eq!(
            result,
            BTreeSet::from([
                SearchError::query("q1", "fatal"),
                SearchError::query("q1", "broken"),
            ])
        );
    }
}
