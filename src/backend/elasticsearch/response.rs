use serde_json::Value;

/// Prefix of every rendered execution error
pub const SEARCH_ERROR_PREFIX: &str = "Unable to perform search query: ";

/// Extract the failure of one positional sub-response, if any
///
/// A sub-response fails either outright (a top-level error object) or
/// partially, through shard-level failures. Shard failures are rendered to
/// messages, deduplicated within the sub-response, and joined under the
/// common prefix: a hundred shards reporting the identical parse error
/// collapse into one message.
pub fn check_sub_response(item: &Value) -> Option<String> {
    if let Some(error) = item.get("error") {
        let reason = error
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("Search type returned error");
        return Some(render_failure(&[reason.to_string()]));
    }

    let failed_shards = item
        .pointer("/_shards/failed")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if failed_shards == 0 {
        return None;
    }

    let failures = item
        .pointer("/_shards/failures")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut messages: Vec<String> = Vec::new();
    for failure in &failures {
        if let Some(message) = shard_failure_message(failure) {
            if !messages.contains(&message) {
                messages.push(message);
            }
        }
    }

    if messages.is_empty() {
        return None;
    }
    Some(render_failure(&messages))
}

/// Render one shard failure into a human-readable message
///
/// A failure reason is either textual, or a structured numeric-type-mismatch
/// description carrying the field and its actual type.
fn shard_failure_message(failure: &Value) -> Option<String> {
    let reason = failure.get("reason")?;

    if let (Some(field), Some(actual_type)) = (
        reason.get("field").and_then(Value::as_str),
        reason.get("actual_type").and_then(Value::as_str),
    ) {
        return Some(format!(
            "Expected numeric type on field [{}], but got [{}].",
            field, actual_type
        ));
    }

    reason
        .get("reason")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Join deduplicated messages under the common error prefix
pub fn render_failure(messages: &[String]) -> String {
    format!("{}\n\n{}", SEARCH_ERROR_PREFIX, messages.join("\n"))
}
