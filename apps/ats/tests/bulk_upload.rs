use mockito::Server;
use serde_json::json;

use ats::api_client::ApiClient;
use ats::bulk::BulkClient;
use ats::MultipartPayload;

#[tokio::test]
async fn row_report_is_renderable() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/bulk/upload")
        .with_status(422)
        .with_body(
            json!({
                "detail": {
                    "details": [
                        {"row": 3, "email": "x@y", "errors": ["Invalid email"]}
                    ],
                    "total_rows": 4
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let bulk = BulkClient::new(ApiClient::new(server.url(), None).unwrap());
    let payload = MultipartPayload::new().file("file", "import.csv", b"name,email\n".to_vec());
    let err = bulk.upload(payload).await.unwrap_err();

    let report = err.validation_report().unwrap();
    assert_eq!(report.invalid_rows, 1);
    assert_eq!(report.summary(), "1 of 4 rows failed validation");
    assert!(report.details[0].to_string().starts_with("Row 3"));
}

#[tokio::test]
async fn unknown_error_shape_falls_back_to_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/bulk/upload")
        .with_status(502)
        .with_body(r#"{"unexpected": {"nested": 1}}"#)
        .create_async()
        .await;

    let bulk = BulkClient::new(ApiClient::new(server.url(), None).unwrap());
    let payload = MultipartPayload::new().file("file", "import.csv", b"a".to_vec());
    let err = bulk.upload(payload).await.unwrap_err();

    assert_eq!(err.user_message(), "Request failed with status 502");
}
