//! Pulls source URLs out of the raw tool payloads of a research session.
//!
//! Payloads come from a third-party search API, so every level is read with
//! [`read_field`]: a field of the wrong shape is the same as a missing one.

use crate::models::Step;
use serde_json::Value;

const RESULTS_FIELD: &str = "results";
const URL_FIELD: &str = "url";

/// A JSON shape that can be borrowed out of a [`Value`].
pub trait JsonShape<'a>: Sized {
    fn from_json(value: &'a Value) -> Option<Self>;
}

impl<'a> JsonShape<'a> for &'a str {
    fn from_json(value: &'a Value) -> Option<Self> {
        value.as_str()
    }
}

impl<'a> JsonShape<'a> for &'a [Value] {
    fn from_json(value: &'a Value) -> Option<Self> {
        value.as_array().map(Vec::as_slice)
    }
}

/// Reads `key` from `value` as `T`, or `None` if `value` is not an object,
/// the key is absent, or the field has another shape.
pub fn read_field<'a, T: JsonShape<'a>>(value: &'a Value, key: &str) -> Option<T> {
    value.as_object()?.get(key).and_then(T::from_json)
}

/// URLs in step order, then result order. Duplicates are kept.
pub fn extract_sources(steps: &[Step]) -> Vec<String> {
    steps
        .iter()
        .flat_map(|step| &step.tool_results)
        .filter_map(|result| read_field::<&[Value]>(&result.payload, RESULTS_FIELD))
        .flatten()
        .filter_map(|entry| read_field::<&str>(entry, URL_FIELD))
        .map(str::to_string)
        .collect()
}
