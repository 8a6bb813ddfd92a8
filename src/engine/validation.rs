use crate::models::{Query, SearchError, SearchTypeSpec, TimeRange};
use std::collections::{BTreeSet, HashSet};

/// Pre-execution validation of a planned query
///
/// A query that fails validation never reaches the backend; its errors are
/// recorded in the result and sibling queries run unaffected.
#[derive(Debug, Clone, Default)]
pub struct SearchValidator;

impl SearchValidator {
    /// Create a validator
    pub fn new() -> Self {
        Self
    }

    /// Validate one query; an empty set means the query may run
    pub fn validate(&self, query: &Query) -> BTreeSet<SearchError> {
        let mut errors = BTreeSet::new();

        if let Some(message) = invalid_range(&query.timerange) {
            errors.insert(SearchError::query(&query.id, message));
        }

        let mut seen = HashSet::new();
        for search_type in &query.search_types {
            if !seen.insert(search_type.id.as_str()) {
                errors.insert(SearchError::query(
                    &query.id,
                    format!("Duplicate search type id '{}'", search_type.id),
                ));
            }

            if let Some(range) = &search_type.timerange {
                if let Some(message) = invalid_range(range) {
                    errors.insert(SearchError::search_type(
                        &query.id,
                        &search_type.id,
                        message,
                    ));
                }
            }

            match &search_type.spec {
                SearchTypeSpec::MessageList { limit, .. } => {
                    if *limit == 0 {
                        errors.insert(SearchError::search_type(
                            &query.id,
                            &search_type.id,
                            "Message list limit must be positive",
                        ));
                    }
                }
                SearchTypeSpec::Pivot { series, .. } => {
                    if series.is_empty() {
                        errors.insert(SearchError::search_type(
                            &query.id,
                            &search_type.id,
                            "Pivot requires at least one series",
                        ));
                    }
                }
            }
        }

        errors
    }
}

fn invalid_range(range: &TimeRange) -> Option<String> {
    match range {
        TimeRange::Absolute { from, to } if from > to => Some(format!(
            "Invalid time range: {} is after {}",
            from.to_rfc3339(),
            to.to_rfc3339()
        )),
        _ => None,
    }
}
