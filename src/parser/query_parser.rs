use crate::error::{AppError, Result};
use crate::models::{Search, SearchJob};
use crate::parser::decorators::{PositionMapping, QueryStringDecorators};
use std::collections::{HashMap, HashSet};

/// Structural parser for submitted search payloads
///
/// Turns a raw payload into the `Search`/`Query`/`SearchType` graph and
/// enforces id uniqueness. Query strings are run through the decorator
/// pipeline once, purely to record position mappings for later error
/// reporting; the rewritten text is discarded here and produced again at
/// generation time.
pub struct QueryParser {
    decorators: QueryStringDecorators,
}

/// Per-query syntax metadata recorded at parse time
#[derive(Debug, Clone, Default)]
pub struct QueryMetadata {
    /// Position mappings of the decorated root query string
    pub mappings: Vec<PositionMapping>,
}

/// A parsed search plus its per-query metadata
#[derive(Debug, Clone)]
pub struct ParsedSearch {
    pub search: Search,
    pub metadata: HashMap<String, QueryMetadata>,
}

impl QueryParser {
    /// Create a parser with the given decorator pipeline
    pub fn new(decorators: QueryStringDecorators) -> Self {
        Self { decorators }
    }

    /// Parse a submitted payload into a search
    pub fn parse(&self, payload: serde_json::Value) -> Result<ParsedSearch> {
        let search: Search = serde_json::from_value(payload)
            .map_err(|e| AppError::Parse(format!("Invalid search payload: {}", e)))?;

        let mut query_ids = HashSet::new();
        for query in &search.queries {
            if !query_ids.insert(query.id.as_str()) {
                return Err(AppError::Parse(format!(
                    "Duplicate query id '{}'",
                    query.id
                )));
            }

            let mut search_type_ids = HashSet::new();
            for search_type in &query.search_types {
                if !search_type_ids.insert(search_type.id.as_str()) {
                    return Err(AppError::Parse(format!(
                        "Duplicate search type id '{}' in query '{}'",
                        search_type.id, query.id
                    )));
                }
            }
        }

        // syntax-position bookkeeping only; the decorated text is rebuilt at
        // generation time with the real job
        let bookkeeping_job = SearchJob::new(search.clone(), "system");
        let metadata = search
            .queries
            .iter()
            .map(|query| {
                let decorated =
                    self.decorators
                        .decorate(&query.query, &bookkeeping_job, query);
                (
                    query.id.clone(),
                    QueryMetadata {
                        mappings: decorated.mappings().to_vec(),
                    },
                )
            })
            .collect();

        Ok(ParsedSearch { search, metadata })
    }
}
