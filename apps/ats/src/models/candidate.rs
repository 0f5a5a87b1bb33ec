use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Prefix of ids minted client-side for optimistic placeholders.
pub const TEMP_ID_PREFIX: &str = "tmp-";

/// Canonical candidate identifier.
///
/// The backend sends ids as JSON numbers or strings depending on the endpoint;
/// both collapse to one string form here so comparisons are plain equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    /// Client-side id for a record the server has not confirmed yet.
    pub fn temporary() -> Self {
        Self(format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4()))
    }

    /// Canonicalizes a raw JSON id. Empty strings, null and non-scalar values are rejected.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self::new(s.as_str())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CandidateId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<u64> for CandidateId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for CandidateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CandidateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        CandidateId::from_value(&raw)
            .ok_or_else(|| serde::de::Error::custom("candidate id must be a string or number"))
    }
}

/// A candidate record exactly as the server sent it.
///
/// Only `id`, `status` and `parsed_resume` are interpreted; every other field
/// passes through untouched. The canonical id is computed once on decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    id: Option<CandidateId>,
    fields: Map<String, Value>,
}

impl Candidate {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let id = fields.get("id").and_then(CandidateId::from_value);
        Self { id, fields }
    }

    /// Decodes a JSON object. Any other JSON value yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::from_fields(fields)),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<&CandidateId> {
        self.id.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.fields.get("status").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Server-side parsing is done once `parsed_resume` is an object with at least one key.
    pub fn has_parsed_resume(&self) -> bool {
        matches!(self.fields.get("parsed_resume"), Some(Value::Object(map)) if !map.is_empty())
    }

    /// Rewrites only the `status` field.
    pub fn set_status(&mut self, status: &str) {
        self.fields
            .insert("status".to_string(), Value::String(status.to_string()));
    }

    /// Assigns an id to a record that arrived without one.
    pub fn ensure_id(&mut self) -> &CandidateId {
        let fields = &mut self.fields;
        self.id.get_or_insert_with(|| {
            let id = CandidateId::temporary();
            fields.insert("id".to_string(), Value::String(id.to_string()));
            id
        })
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Serialize for Candidate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Candidate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::deserialize(deserializer)?;
        Ok(Self::from_fields(fields))
    }
}
