use crate::error::Result;
use crate::lookup::FieldTypesLookup;
use crate::models::{
    MessageListResult, PivotResult, PivotRow, PivotValue, ResultMessage, SearchTypeResult,
    SearchTypeSpec, SeriesFunction, SeriesSpec, TimeRange,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

/// Upper bound of term buckets requested per row group
const TERMS_BUCKET_LIMIT: usize = 15;

/// Build the sub-request body for one search type
///
/// Single dispatch point over the closed variant set; each variant has one
/// generation function.
pub(super) async fn generate_search_type_body(
    spec: &SearchTypeSpec,
    base_query: Value,
    streams: &BTreeSet<String>,
    field_types: &FieldTypesLookup,
) -> Result<Value> {
    match spec {
        SearchTypeSpec::MessageList { limit, offset } => {
            Ok(message_list_body(base_query, *limit, *offset))
        }
        SearchTypeSpec::Pivot {
            row_groups,
            series,
            rollup,
        } => pivot_body(base_query, row_groups, series, *rollup, streams, field_types).await,
    }
}

fn message_list_body(base_query: Value, limit: usize, offset: usize) -> Value {
    json!({
        "query": base_query,
        "from": offset,
        "size": limit,
        "sort": [{"timestamp": {"order": "desc"}}],
        "track_total_hits": true
    })
}

async fn pivot_body(
    base_query: Value,
    row_groups: &[String],
    series: &[SeriesSpec],
    rollup: bool,
    streams: &BTreeSet<String>,
    field_types: &FieldTypesLookup,
) -> Result<Value> {
    let mut aggs = Map::new();

    if rollup || row_groups.is_empty() {
        for spec in series {
            if let Some((name, aggregation)) = series_aggregation(spec) {
                aggs.insert(name, aggregation);
            }
        }
    }

    if !row_groups.is_empty() {
        let mut current: Option<Value> = None;
        for field in row_groups.iter().rev() {
            let term_field = terms_field(field, streams, field_types).await?;
            let mut sub_aggs = Map::new();
            match current.take() {
                Some(inner) => {
                    sub_aggs.insert("rows".to_string(), inner);
                }
                None => {
                    for spec in series {
                        if let Some((name, aggregation)) = series_aggregation(spec) {
                            sub_aggs.insert(name, aggregation);
                        }
                    }
                }
            }

            let mut aggregation = json!({
                "terms": {"field": term_field, "size": TERMS_BUCKET_LIMIT}
            });
            if !sub_aggs.is_empty() {
                aggregation["aggs"] = Value::Object(sub_aggs);
            }
            current = Some(aggregation);
        }
        if let Some(rows) = current {
            aggs.insert("rows".to_string(), rows);
        }
    }

    // window the aggregated data actually covers
    aggs.insert(
        "timestamp-min".to_string(),
        json!({"min": {"field": "timestamp"}}),
    );
    aggs.insert(
        "timestamp-max".to_string(),
        json!({"max": {"field": "timestamp"}}),
    );

    Ok(json!({
        "query": base_query,
        "from": 0,
        "size": 0,
        "track_total_hits": true,
        "aggs": aggs
    }))
}

/// Aggregation clause of one series; a plain document count needs none
fn series_aggregation(spec: &SeriesSpec) -> Option<(String, Value)> {
    let field = spec.field.as_deref();
    let aggregation = match (&spec.function, field) {
        (SeriesFunction::Count, None) => return None,
        (SeriesFunction::Count, Some(field)) => json!({"value_count": {"field": field}}),
        (SeriesFunction::Average, Some(field)) => json!({"avg": {"field": field}}),
        (SeriesFunction::Sum, Some(field)) => json!({"sum": {"field": field}}),
        (SeriesFunction::Min, Some(field)) => json!({"min": {"field": field}}),
        (SeriesFunction::Max, Some(field)) => json!({"max": {"field": field}}),
        (SeriesFunction::Cardinality, Some(field)) => json!({"cardinality": {"field": field}}),
        // a field-less variant other than count aggregates nothing
        (_, None) => return None,
    };
    Some((spec.literal(), aggregation))
}

/// Field a terms bucket aggregates over; text fields target their keyword
/// sub-field. Series fields stay untouched so the engine surfaces a numeric
/// type mismatch at execution instead of silently grouping on text.
async fn terms_field(
    field: &str,
    streams: &BTreeSet<String>,
    field_types: &FieldTypesLookup,
) -> Result<String> {
    let field_type = field_types.field_type(streams, field).await?;
    Ok(match field_type.as_deref() {
        Some("text") => format!("{}.keyword", field),
        _ => field.to_string(),
    })
}

/// Decode one successful sub-response into the search type's typed result
pub(super) fn extract_result(spec: &SearchTypeSpec, response: &Value) -> SearchTypeResult {
    match spec {
        SearchTypeSpec::MessageList { .. } => {
            SearchTypeResult::MessageList(extract_message_list(response))
        }
        SearchTypeSpec::Pivot {
            row_groups,
            series,
            rollup,
        } => SearchTypeResult::Pivot(extract_pivot(response, row_groups, series, *rollup)),
    }
}

fn extract_message_list(response: &Value) -> MessageListResult {
    let messages = response
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .map(|hit| ResultMessage {
                    index: hit
                        .get("_index")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    message: hit.get("_source").cloned().unwrap_or(Value::Null),
                })
                .collect()
        })
        .unwrap_or_default();

    MessageListResult {
        total: total_hits(response),
        messages,
    }
}

fn extract_pivot(
    response: &Value,
    row_groups: &[String],
    series: &[SeriesSpec],
    rollup: bool,
) -> PivotResult {
    let total = total_hits(response);
    let empty = Value::Object(Map::new());
    let aggregations = response.get("aggregations").unwrap_or(&empty);

    let mut rows = Vec::new();
    if rollup || row_groups.is_empty() {
        rows.push(PivotRow {
            key: Vec::new(),
            values: series_values(aggregations, series, Some(total as f64)),
        });
    }
    collect_bucket_rows(aggregations, &[], series, &mut rows);

    PivotResult {
        total,
        rows,
        effective_timerange: effective_timerange(aggregations),
    }
}

/// Walk nested term buckets depth first, emitting one row per leaf bucket
fn collect_bucket_rows(
    container: &Value,
    prefix: &[String],
    series: &[SeriesSpec],
    rows: &mut Vec<PivotRow>,
) {
    let buckets = match container.pointer("/rows/buckets").and_then(Value::as_array) {
        Some(buckets) => buckets,
        None => return,
    };

    for bucket in buckets {
        let key_text = match bucket.get("key_as_string").or_else(|| bucket.get("key")) {
            Some(Value::String(text)) => text.clone(),
            Some(value) => value.to_string(),
            None => String::new(),
        };
        let mut key = prefix.to_vec();
        key.push(key_text);

        if bucket.pointer("/rows/buckets").is_some() {
            collect_bucket_rows(bucket, &key, series, rows);
        } else {
            let doc_count = bucket.get("doc_count").and_then(Value::as_f64);
            rows.push(PivotRow {
                key,
                values: series_values(bucket, series, doc_count),
            });
        }
    }
}

/// Series values of one container (the aggregation root or a bucket)
fn series_values(container: &Value, series: &[SeriesSpec], doc_count: Option<f64>) -> Vec<PivotValue> {
    series
        .iter()
        .map(|spec| {
            let value = match (&spec.function, &spec.field) {
                (SeriesFunction::Count, None) => doc_count,
                _ => container
                    .get(spec.literal())
                    .and_then(|aggregation| aggregation.get("value"))
                    .and_then(Value::as_f64),
            };
            PivotValue {
                key: spec.literal(),
                value,
            }
        })
        .collect()
}

fn effective_timerange(aggregations: &Value) -> Option<TimeRange> {
    let min = aggregations
        .pointer("/timestamp-min/value")
        .and_then(Value::as_f64)?;
    let max = aggregations
        .pointer("/timestamp-max/value")
        .and_then(Value::as_f64)?;

    let from = Utc.timestamp_millis_opt(min as i64).single()?;
    let to = Utc.timestamp_millis_opt(max as i64).single()?;
    Some(TimeRange::absolute(from, to))
}

/// Total hit count; tolerates both the object form and the legacy number
fn total_hits(response: &Value) -> u64 {
    let total = match response.pointer("/hits/total") {
        Some(total) => total,
        None => return 0,
    };
    total
        .as_u64()
        .or_else(|| total.get("value").and_then(Value::as_u64))
        .unwrap_or(0)
}
