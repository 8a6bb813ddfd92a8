//! Common test utilities for the search engine tests

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use loghive_search::config::BackendConfig;
use loghive_search::error::Result;
use loghive_search::lookup::{
    FieldTypeEntry, FieldTypesLookup, IndexFieldTypes, IndexLookup, IndexRangeEntry,
    MemoryFieldTypesProvider, MemoryIndexLookup,
};
use loghive_search::models::{Query, SearchJob, TimeRange};
use loghive_search::parser::{DecoratedQueryString, QueryStringDecorator};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Index lookup that records every call before delegating
pub struct RecordingIndexLookup {
    inner: MemoryIndexLookup,
    calls: Mutex<Vec<(BTreeSet<String>, TimeRange)>>,
}

impl RecordingIndexLookup {
    pub fn new(entries: Vec<IndexRangeEntry>) -> Self {
        Self {
            inner: MemoryIndexLookup::new(entries),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// All recorded (streams, range) invocations in call order
    pub fn calls(&self) -> Vec<(BTreeSet<String>, TimeRange)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexLookup for RecordingIndexLookup {
    async fn index_names_for_streams_in_time_range(
        &self,
        stream_ids: &BTreeSet<String>,
        range: &TimeRange,
    ) -> Result<BTreeSet<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((stream_ids.clone(), range.clone()));
        self.inner
            .index_names_for_streams_in_time_range(stream_ids, range)
            .await
    }
}

/// Replaces every query string with a fixed text
pub struct FixedStringDecorator(pub &'static str);

impl QueryStringDecorator for FixedStringDecorator {
    fn decorate(
        &self,
        query_string: DecoratedQueryString,
        _job: &SearchJob,
        _query: &Query,
    ) -> DecoratedQueryString {
        query_string.replaced(self.0)
    }
}

/// Backend configuration pointing at a mock server
pub fn backend_config(url: &str) -> BackendConfig {
    BackendConfig {
        url: url.to_string(),
        timeout_secs: 5,
        allow_leading_wildcard: true,
    }
}

/// One index covering 2020-2099 for the given streams
pub fn index_entry(name: &str, streams: &[&str]) -> IndexRangeEntry {
    IndexRangeEntry {
        index_name: name.to_string(),
        begin: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap(),
        stream_ids: streams.iter().map(|s| s.to_string()).collect(),
    }
}

/// Field type lookup over fixed records
pub fn field_types(records: Vec<IndexFieldTypes>) -> FieldTypesLookup {
    FieldTypesLookup::new(Arc::new(MemoryFieldTypesProvider::new(records)))
}

/// A record declaring the given fields for one stream
pub fn field_type_record(stream: &str, fields: &[(&str, &str)]) -> IndexFieldTypes {
    IndexFieldTypes {
        index_name: format!("{}-index", stream),
        stream_id: stream.to_string(),
        fields: fields
            .iter()
            .map(|(name, ty)| FieldTypeEntry::new(*name, *ty))
            .collect(),
    }
}

/// A successful message list sub-response with the given messages
pub fn success_item(messages: &[(&str, Value)]) -> Value {
    let hits: Vec<Value> = messages
        .iter()
        .map(|(index, source)| json!({"_index": index, "_source": source}))
        .collect();
    json!({
        "took": 1,
        "_shards": {"total": 4, "successful": 4, "failed": 0},
        "hits": {"total": {"value": hits.len()}, "hits": hits}
    })
}

/// A sub-response where every shard failed with the same textual reason
pub fn shard_failure_item(reason: &str, shards: usize) -> Value {
    let failures: Vec<Value> = (0..shards)
        .map(|shard| {
            json!({
                "shard": shard,
                "index": "loghive_0",
                "reason": {"type": "query_shard_exception", "reason": reason}
            })
        })
        .collect();
    json!({
        "took": 1,
        "_shards": {"total": shards, "successful": 0, "failed": shards, "failures": failures},
        "hits": {"total": {"value": 0}, "hits": []}
    })
}

/// A sub-response with one structured numeric-type-mismatch shard failure
pub fn numeric_failure_item(field: &str, actual_type: &str) -> Value {
    json!({
        "took": 1,
        "_shards": {"total": 1, "successful": 0, "failed": 1, "failures": [
            {"shard": 0, "index": "loghive_0", "reason": {
                "type": "field_type_exception",
                "field": field,
                "actual_type": actual_type
            }}
        ]},
        "hits": {"total": {"value": 0}, "hits": []}
    })
}

/// The wire shape of a multi-search response
pub fn msearch_response(items: Vec<Value>) -> String {
    json!({"responses": items}).to_string()
}
