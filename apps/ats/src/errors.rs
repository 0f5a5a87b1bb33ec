use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::models::bulk::BulkValidationError;

/// Application-level error type.
/// Every variant maps to a human-readable string via [`AppError::user_message`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Bulk upload rejected: {0}")]
    BulkValidation(BulkValidationError),

    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Builds an error from a non-success HTTP response body.
    ///
    /// A 422 carrying `detail.details` becomes [`AppError::BulkValidation`];
    /// anything else collapses to a single message via [`extract_message`].
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            if let Some(report) = BulkValidationError::from_body(&parsed) {
                return AppError::BulkValidation(report);
            }
        }

        if status == StatusCode::NOT_FOUND {
            return AppError::NotFound(
                extract_message(&parsed).unwrap_or_else(|| "Record not found".to_string()),
            );
        }

        let message = extract_message(&parsed)
            .or_else(|| plain_text_message(body))
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

        AppError::Api {
            status: status.as_u16(),
            message,
        }
    }

    /// The string a caller should show to a person. Never empty, never a raw object dump.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Transport(e) if e.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            AppError::Transport(_) => {
                "Network error: could not reach the server. Check your connection.".to_string()
            }
            AppError::Api { message, .. } => message.clone(),
            AppError::BulkValidation(report) => report.summary(),
            AppError::Decode(_) => "The server returned an unexpected response.".to_string(),
            AppError::Io(e) => format!("Could not read the file: {e}"),
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
        }
    }

    /// Structured per-row feedback, present only for bulk validation failures.
    pub fn validation_report(&self) -> Option<&BulkValidationError> {
        match self {
            AppError::BulkValidation(report) => Some(report),
            _ => None,
        }
    }
}

/// Pulls a readable message out of an error body.
///
/// Precedence: `detail.message` → `error.message` (or `error` string) →
/// top-level `message` → `detail` string (or joined `detail[].msg`).
pub fn extract_message(body: &Value) -> Option<String> {
    let detail = body.get("detail");

    detail
        .and_then(|d| d.get("message"))
        .and_then(non_blank)
        .or_else(|| {
            body.get("error").and_then(|e| match e {
                Value::Object(_) => e.get("message").and_then(non_blank),
                other => non_blank(other),
            })
        })
        .or_else(|| body.get("message").and_then(non_blank))
        .or_else(|| detail.and_then(detail_text))
}

/// Fallback for non-JSON bodies such as a proxy's plain-text error page.
fn plain_text_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('<') || trimmed.starts_with('{') {
        return None;
    }
    Some(trimmed.chars().take(300).collect())
}

fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::String(_) => non_blank(detail),
        // FastAPI-style request validation: [{"loc": [...], "msg": "..."}]
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(non_blank))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

fn non_blank(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
