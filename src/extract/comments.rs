//! Comment payload shaping.
//!
//! `posts.select` returns the page's comment ids; `posts.get` returns a
//! struct keyed by id string. Batches flatten in ascending numeric key
//! order, and batches concatenate in request order.

use serde_json::Value;

use crate::error::ExtractionError;
use crate::models::CommentRecord;

/// Decode the id list from a `posts.select` payload.
pub fn comment_ids(payload: &Value) -> Result<Vec<i64>, ExtractionError> {
    let items = payload
        .as_array()
        .ok_or_else(|| ExtractionError::Payload(format!("posts.select returned {payload}")))?;

    items
        .iter()
        .map(|item| match item {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .map(|id| id.ok_or_else(|| ExtractionError::Payload("non-numeric post id".to_string())))
        .collect()
}

/// Flatten one keyed `posts.get` batch into records ordered by numeric key.
pub fn flatten_comment_batch(payload: Value) -> Result<Vec<CommentRecord>, ExtractionError> {
    let map = match payload {
        Value::Object(map) => map,
        other => {
            return Err(ExtractionError::Payload(format!(
                "posts.get returned {other}"
            )));
        }
    };

    let mut keyed: Vec<(i64, Value)> = map
        .into_iter()
        .map(|(key, value)| {
            key.trim()
                .parse::<i64>()
                .map(|id| (id, value))
                .map_err(|_| ExtractionError::Payload(format!("non-numeric post key {key:?}")))
        })
        .collect::<Result<_, _>>()?;
    keyed.sort_by_key(|(id, _)| *id);

    keyed
        .into_iter()
        .map(|(_, value)| {
            serde_json::from_value(value).map_err(|e| ExtractionError::Payload(e.to_string()))
        })
        .collect()
}
