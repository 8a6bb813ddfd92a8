use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Declared physical type of one field in one index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTypeEntry {
    pub field_name: String,
    pub physical_type: String,
}

impl FieldTypeEntry {
    /// Create an entry
    pub fn new(field_name: impl Into<String>, physical_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            physical_type: physical_type.into(),
        }
    }
}

/// Field type declarations of one index, associated with a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexFieldTypes {
    pub index_name: String,
    pub stream_id: String,
    pub fields: Vec<FieldTypeEntry>,
}

/// Source of field type declarations, backed by the index metadata registry
#[async_trait]
pub trait IndexFieldTypesProvider: Send + Sync {
    /// All field type records of indices belonging to the given streams
    async fn find_for_stream_ids(
        &self,
        stream_ids: &BTreeSet<String>,
    ) -> Result<Vec<IndexFieldTypes>>;
}

/// In-memory provider over a fixed record set
#[derive(Debug, Clone, Default)]
pub struct MemoryFieldTypesProvider {
    records: Vec<IndexFieldTypes>,
}

impl MemoryFieldTypesProvider {
    /// Create a provider over the given records
    pub fn new(records: Vec<IndexFieldTypes>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl IndexFieldTypesProvider for MemoryFieldTypesProvider {
    async fn find_for_stream_ids(
        &self,
        stream_ids: &BTreeSet<String>,
    ) -> Result<Vec<IndexFieldTypes>> {
        Ok(self
            .records
            .iter()
            .filter(|record| stream_ids.contains(&record.stream_id))
            .cloned()
            .collect())
    }
}

/// Resolves the single unambiguous type of a field across streams
///
/// A field declared `long` in one index and `float` in another would make a
/// numeric aggregation silently wrong, so any ambiguity resolves to unknown
/// and the caller has to handle the absence explicitly.
#[derive(Clone)]
pub struct FieldTypesLookup {
    provider: Arc<dyn IndexFieldTypesProvider>,
}

impl FieldTypesLookup {
    /// Create a lookup over the given provider
    pub fn new(provider: Arc<dyn IndexFieldTypesProvider>) -> Self {
        Self { provider }
    }

    /// The declared type of `field` across all indices of `stream_ids`, or
    /// `None` when the stream set is empty, no record references the field,
    /// or the declarations disagree
    pub async fn field_type(
        &self,
        stream_ids: &BTreeSet<String>,
        field: &str,
    ) -> Result<Option<String>> {
        if stream_ids.is_empty() {
            return Ok(None);
        }

        let records = self.provider.find_for_stream_ids(stream_ids).await?;
        let mut types: BTreeSet<String> = records
            .iter()
            .flat_map(|record| record.fields.iter())
            .filter(|entry| entry.field_name == field)
            .map(|entry| entry.physical_type.clone())
            .collect();

        if types.len() == 1 {
            Ok(types.pop_first())
        } else {
            Ok(None)
        }
    }
}
