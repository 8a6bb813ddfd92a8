use crate::models::{QueryResult, Search, SearchError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One execution of a search on behalf of a user
///
/// Jobs are transient: created per execution, discarded after the result has
/// been delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchJob {
    /// Job identifier
    pub id: Uuid,

    /// The search being executed
    pub search: Search,

    /// Identity of the executing user
    pub owner: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl SearchJob {
    /// Create a new job for the given search
    pub fn new(search: Search, owner: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            search,
            owner: owner.into(),
            created_at: Utc::now(),
        }
    }
}

/// Aggregate outcome of one search job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchJobResult {
    /// Id of the executed job
    pub id: Uuid,

    /// Id of the executed search
    pub search_id: String,

    /// Identity of the executing user
    pub owner: String,

    /// Per-query results keyed by query id
    pub results: HashMap<String, QueryResult>,

    /// Wall-clock duration of the whole job, in milliseconds
    pub duration_ms: u64,
}

impl SearchJobResult {
    /// All errors across all query results
    pub fn errors(&self) -> impl Iterator<Item = &SearchError> {
        self.results.values().flat_map(|result| result.errors.iter())
    }

    /// Whether any query recorded an error
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Query, QueryResult, TimeRange};
    use std::collections::BTreeSet;

    #[test]
    fn test_job_ids_are_unique() {
        let search = Search::new(
            "s1",
            vec![Query::new("q1", TimeRange::relative(300), "*")],
        );
        let first = SearchJob::new(search.clone(), "admin");
        let second = SearchJob::new(search, "admin");

        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_job_result_error_aggregation() {
        let mut results = HashMap::new();
        results.insert(
            "q1".to_string(),
            QueryResult::failed(
                "q1",
                BTreeSet::from([SearchError::query("q1", "boom")]),
            ),
        );

        let job_result = SearchJobResult {
            id: Uuid::new_v4(),
            search_id: "s1".to_string(),
            owner: "admin".to_string(),
            results,
            duration_ms: 0,
        };

        assert!(job_result.has_errors());
        assert_eq!(job_result.errors().count(), 1);
    }
}
