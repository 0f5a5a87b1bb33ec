//! Spreadsheet bulk import.
//!
//! Row-level validation failures come back as a 422 with per-row detail and
//! surface as [`AppError::BulkValidation`] so the caller can render a report
//! instead of a single string.

use bytes::Bytes;
use serde_json::Value;
use tracing::{info, warn};

use crate::api_client::multipart::RESUME_FIELD;
use crate::api_client::{ApiClient, MultipartPayload};
use crate::errors::{extract_message, AppError};

const UPLOAD_PATH: &str = "bulk/upload";
const TEMPLATE_PATH: &str = "bulk/template/download";

#[derive(Clone)]
pub struct BulkClient {
    api: ApiClient,
}

impl BulkClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Uploads a spreadsheet sent under the `file` field. Returns the server's
    /// confirmation message.
    pub async fn upload(&self, payload: MultipartPayload) -> Result<String, AppError> {
        if !payload.has_file(RESUME_FIELD) {
            return Err(AppError::Validation(format!(
                "Bulk upload needs a spreadsheet in the '{RESUME_FIELD}' field"
            )));
        }

        let form = payload.into_form()?;
        let body = match self.api.send_json(self.api.post(UPLOAD_PATH).multipart(form)).await {
            Ok(body) => body,
            Err(AppError::BulkValidation(report)) => {
                warn!("Bulk upload rejected: {}", report.summary());
                return Err(AppError::BulkValidation(report));
            }
            Err(e) => return Err(e),
        };

        let message = success_message(&body);
        info!("Bulk upload accepted: {message}");
        Ok(message)
    }

    /// Fetches the blank import spreadsheet.
    pub async fn download_template(&self) -> Result<Bytes, AppError> {
        let bytes = self.api.send_bytes(self.api.get(TEMPLATE_PATH)).await?;
        info!("Downloaded bulk template ({} bytes)", bytes.len());
        Ok(bytes)
    }
}

fn success_message(body: &Value) -> String {
    match body {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        other => extract_message(other).unwrap_or_else(|| "Bulk upload completed".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn bulk_for(server: &Server) -> BulkClient {
        let api = ApiClient::with_timeout(server.url(), None, Duration::from_secs(5)).unwrap();
        BulkClient::new(api)
    }

    fn sheet() -> MultipartPayload {
        MultipartPayload::new().file("file", "candidates.xlsx", Bytes::from_static(b"PK\x03\x04"))
    }

    #[tokio::test]
    async fn test_upload_returns_server_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/bulk/upload")
            .match_body(Matcher::Regex(
                r#"name="file"; filename="candidates.xlsx""#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"message": "12 candidates imported", "created": 12}"#)
            .create_async()
            .await;

        let message = bulk_for(&server).upload(sheet()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(message, "12 candidates imported");
    }

    #[tokio::test]
    async fn test_upload_422_yields_row_report() {
        let mut server = Server::new_async().await;
        let body = json!({
            "detail": {
                "message": "Validation failed",
                "details": [
                    {"row": 2, "email": "bad-at-x", "name": "Ann", "errors": ["Invalid email"]},
                    {"row": 5, "email": "bo@x.com", "errors": ["Missing phone", "Unknown job"]}
                ],
                "invalid_rows": 2,
                "total_rows": 9
            }
        });
        let _mock = server
            .mock("POST", "/bulk/upload")
            .with_status(422)
            .with_body(body.to_string())
            .create_async()
            .await;

        let err = bulk_for(&server).upload(sheet()).await.unwrap_err();

        let report = err.validation_report().expect("structured report");
        assert_eq!(report.total_rows, Some(9));
        assert_eq!(report.details.len(), 2);
        assert_eq!(report.details[0].row, Some(2));
        assert_eq!(report.details[1].name, None);
        assert_eq!(report.details[1].errors, vec!["Missing phone", "Unknown job"]);
    }

    #[tokio::test]
    async fn test_flat_422_collapses_to_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/bulk/upload")
            .with_status(422)
            .with_body(r#"{"detail": "Unsupported spreadsheet format"}"#)
            .create_async()
            .await;

        let err = bulk_for(&server).upload(sheet()).await.unwrap_err();

        assert!(err.validation_report().is_none());
        assert_eq!(err.user_message(), "Unsupported spreadsheet format");
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected_locally() {
        let server = Server::new_async().await;
        let err = bulk_for(&server)
            .upload(MultipartPayload::new().text("note", "no sheet"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_template_download_returns_bytes() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/bulk/template/download")
            .with_status(200)
            .with_header(
                "content-type",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            )
            .with_body(b"PK\x03\x04template".as_slice())
            .create_async()
            .await;

        let bytes = bulk_for(&server).download_template().await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_success_message_fallbacks() {
        assert_eq!(success_message(&json!("Imported")), "Imported");
        assert_eq!(success_message(&Value::Null), "Bulk upload completed");
        assert_eq!(success_message(&json!({"created": 3})), "Bulk upload completed");
    }
}
