use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// One spreadsheet row that failed server-side validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowErrorGroup {
    /// `None` when the server sent no usable row number.
    pub row: Option<u64>,
    pub email: String,
    pub name: Option<String>,
    pub errors: Vec<String>,
}

impl RowErrorGroup {
    /// Row numbers may arrive as numbers or numeric strings; non-string
    /// entries in `errors` are dropped.
    fn from_value(value: &Value) -> Self {
        Self {
            row: value.get("row").and_then(decode_count),
            email: value
                .get("email")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            name: value
                .get("name")
                .and_then(Value::as_str)
                .map(String::from),
            errors: value
                .get("errors")
                .and_then(Value::as_array)
                .map(|errors| {
                    errors
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// Structured 422 body from `POST /bulk/upload`, found under `detail`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkValidationError {
    pub details: Vec<RowErrorGroup>,
    /// Falls back to the number of row groups when the server omits it.
    pub invalid_rows: u64,
    pub total_rows: Option<u64>,
}

impl BulkValidationError {
    /// Recognizes the structured shape: `{"detail": {"details": [...], ...}}`.
    /// Returns `None` for every other body so callers fall back to a flat message.
    pub fn from_body(body: &Value) -> Option<Self> {
        let detail = body.get("detail")?;
        let rows = detail.get("details")?.as_array()?;
        let details: Vec<RowErrorGroup> = rows.iter().map(RowErrorGroup::from_value).collect();

        let invalid_rows = detail
            .get("invalid_rows")
            .and_then(decode_count)
            .unwrap_or(details.len() as u64);
        let total_rows = detail.get("total_rows").and_then(decode_count);

        Some(Self {
            details,
            invalid_rows,
            total_rows,
        })
    }

    pub fn summary(&self) -> String {
        match self.total_rows {
            Some(total) => format!("{} of {} rows failed validation", self.invalid_rows, total),
            None => format!("{} rows failed validation", self.invalid_rows),
        }
    }
}

fn decode_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl fmt::Display for BulkValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl fmt::Display for RowErrorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "Row {row}")?,
            None => f.write_str("Row ?")?,
        }
        match &self.name {
            Some(name) if !name.is_empty() => write!(f, " ({name}, {})", self.email)?,
            _ if !self.email.is_empty() => write!(f, " ({})", self.email)?,
            _ => {}
        }
        write!(f, ": {}", self.errors.join("; "))
    }
}
