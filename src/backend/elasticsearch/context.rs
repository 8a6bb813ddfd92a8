use crate::lookup::FieldTypesLookup;
use crate::models::SearchError;
use serde_json::Value;
use std::collections::BTreeSet;

/// One generated sub-request, ready to be merged into the batch
#[derive(Debug, Clone)]
pub struct GeneratedSearchType {
    /// Id of the search type the sub-request belongs to
    pub search_type_id: String,

    /// The backend-native request body
    pub body: Value,

    /// Concrete index names the sub-request is scoped to
    pub indices: BTreeSet<String>,
}

/// Per-query generation state
///
/// Owned by exactly one execution: created in generate, consumed by execute,
/// discarded afterwards. Sub-requests keep their registration order because
/// the wire protocol correlates responses positionally.
pub struct EsGeneratedQueryContext {
    field_types: FieldTypesLookup,
    searches: Vec<GeneratedSearchType>,
    errors: BTreeSet<SearchError>,
}

impl EsGeneratedQueryContext {
    /// Create an empty context
    pub fn new(field_types: FieldTypesLookup) -> Self {
        Self {
            field_types,
            searches: Vec::new(),
            errors: BTreeSet::new(),
        }
    }

    /// The field type lookup available to generation
    pub fn field_types(&self) -> &FieldTypesLookup {
        &self.field_types
    }

    /// Register a generated sub-request
    pub fn register(&mut self, search: GeneratedSearchType) {
        self.searches.push(search);
    }

    /// Record an error detected during generation
    pub fn add_error(&mut self, error: SearchError) {
        self.errors.insert(error);
    }

    /// Generated sub-requests in registration order
    pub fn searches(&self) -> &[GeneratedSearchType] {
        &self.searches
    }

    /// Errors recorded so far
    pub fn errors(&self) -> &BTreeSet<SearchError> {
        &self.errors
    }

    /// Body of the sub-request generated for one search type
    pub fn search_body(&self, search_type_id: &str) -> Option<&Value> {
        self.searches
            .iter()
            .find(|search| search.search_type_id == search_type_id)
            .map(|search| &search.body)
    }

    /// Resolved indices of the sub-request generated for one search type
    pub fn search_indices(&self, search_type_id: &str) -> Option<&BTreeSet<String>> {
        self.searches
            .iter()
            .find(|search| search.search_type_id == search_type_id)
            .map(|search| &search.indices)
    }

    /// Union of index names across all sub-requests
    pub fn effective_indices(&self) -> BTreeSet<String> {
        self.searches
            .iter()
            .flat_map(|search| search.indices.iter().cloned())
            .collect()
    }
}
