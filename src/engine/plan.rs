use crate::models::{Query, Search};
use std::collections::HashSet;

/// Ordered, deduplicated list of queries that must actually run
///
/// The synthetic content-free root query a submission may carry is dropped;
/// it never reaches the backend. Remaining queries keep submission order.
/// Since queries are mutually independent, execution order is observable
/// only through result aggregation, which is keyed by id and therefore
/// order-insensitive.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    queries: Vec<Query>,
}

impl QueryPlan {
    /// Compute the plan of a search
    pub fn create(search: &Search) -> Self {
        let mut seen = HashSet::new();
        let queries = search
            .queries
            .iter()
            .filter(|query| seen.insert(query.id.clone()))
            .filter(|query| !query.is_empty_root())
            .cloned()
            .collect();
        Self { queries }
    }

    /// Planned queries in execution order
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Whether nothing needs to run
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Number of planned queries
    pub fn len(&self) -> usize {
        self.queries.len()
    }
}
