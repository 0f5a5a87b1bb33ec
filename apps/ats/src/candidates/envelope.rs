//! Response envelope decoding for the candidate endpoints.
//!
//! The backend wraps list payloads in one of four shapes depending on the
//! route version. Each shape gets its own variant; anything else falls through
//! to `Unrecognized`, which decodes to an empty page instead of failing.

use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{Candidate, CandidateListResult};

#[derive(Debug, Clone, PartialEq)]
enum ListEnvelope {
    /// `[ ... ]`
    Bare(Vec<Value>),
    /// `{"data": {"items": [...], "total": n}}`
    NestedPage { items: Vec<Value>, total: Option<u64> },
    /// `{"data": [ ... ]}`
    DataArray(Vec<Value>),
    /// `{"items": [...], "total": n}`
    Page { items: Vec<Value>, total: Option<u64> },
    Unrecognized,
}

impl ListEnvelope {
    fn classify(body: Value) -> Self {
        let mut object = match body {
            Value::Array(items) => return ListEnvelope::Bare(items),
            Value::Object(object) => object,
            _ => return ListEnvelope::Unrecognized,
        };

        match object.remove("data") {
            Some(Value::Array(items)) => return ListEnvelope::DataArray(items),
            Some(Value::Object(mut data)) => {
                if let Some(Value::Array(items)) = data.remove("items") {
                    let total = data.get("total").and_then(decode_total);
                    return ListEnvelope::NestedPage { items, total };
                }
            }
            _ => {}
        }

        if let Some(Value::Array(items)) = object.remove("items") {
            let total = object.get("total").and_then(decode_total);
            return ListEnvelope::Page { items, total };
        }

        ListEnvelope::Unrecognized
    }

    fn into_result(self) -> CandidateListResult {
        let (raw_items, total) = match self {
            ListEnvelope::Bare(items) | ListEnvelope::DataArray(items) => (items, None),
            ListEnvelope::NestedPage { items, total } | ListEnvelope::Page { items, total } => {
                (items, total)
            }
            ListEnvelope::Unrecognized => {
                warn!("Unrecognized candidate list envelope; showing an empty page");
                return CandidateListResult::default();
            }
        };

        let received = raw_items.len();
        let items: Vec<Candidate> = raw_items
            .into_iter()
            .filter_map(Candidate::from_value)
            .collect();
        if items.len() != received {
            debug!(
                "Skipped {} non-object entries in candidate list",
                received - items.len()
            );
        }

        let total = total.unwrap_or(items.len() as u64);
        CandidateListResult { items, total }
    }
}

/// Normalizes any list response body into items plus total. Never fails.
pub fn decode_list(body: Value) -> CandidateListResult {
    ListEnvelope::classify(body).into_result()
}

/// Unwraps a single-record response: `{"data": record}` or a bare record.
pub fn decode_record(body: Value) -> Option<Candidate> {
    match body {
        Value::Object(mut object) => {
            let wrapped = !object.contains_key("id")
                && matches!(object.get("data"), Some(Value::Object(_)));
            if wrapped {
                object.remove("data").and_then(Candidate::from_value)
            } else if object.is_empty() {
                None
            } else {
                Some(Candidate::from_fields(object))
            }
        }
        _ => None,
    }
}

fn decode_total(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
