pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::resume::handlers;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself,
/// so a file just over the limit still reaches the validator.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = (state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES) as usize;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/resume/upload", post(handlers::handle_upload))
        .route("/api/resume/analyze", post(handlers::handle_analyze))
        .route("/api/resume/cleanup", post(handlers::handle_cleanup))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{default_extensions, Config, DEFAULT_MAX_UPLOAD_BYTES};
    use crate::doc_intel::{AnalysisError, AnalysisResult, DocumentAnalyzer, ExtractedField};

    const BOUNDARY: &str = "----resume-api-test-boundary";

    enum Reply {
        Success,
        Rejected,
        Broken,
    }

    struct MockAnalyzer {
        calls: AtomicUsize,
        reply: Reply,
    }

    impl MockAnalyzer {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentAnalyzer for MockAnalyzer {
        async fn analyze(&self, _data: &[u8]) -> Result<AnalysisResult, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Success => Ok(AnalysisResult {
                    content: "Jane Doe\nEmail: jane@example.com\nPhone:".to_string(),
                    fields: vec![
                        ExtractedField {
                            key: Some("Email:".to_string()),
                            value: Some("jane@example.com".to_string()),
                        },
                        ExtractedField {
                            key: Some("Phone:".to_string()),
                            value: None,
                        },
                    ],
                }),
                Reply::Rejected => Err(AnalysisError::Rejected {
                    status: Some(401),
                    message: "Access denied due to invalid subscription key.".to_string(),
                }),
                Reply::Broken => Err(AnalysisError::MalformedResponse(
                    "connection reset".to_string(),
                )),
            }
        }
    }

    fn test_config(upload_dir: PathBuf) -> Config {
        Config {
            doc_intel_endpoint: "https://example.cognitiveservices.azure.com".to_string(),
            doc_intel_api_key: "test-key".to_string(),
            upload_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: default_extensions(),
            retention: Duration::from_secs(24 * 60 * 60),
            analysis_timeout: Duration::from_secs(5),
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn create_test_app(
        reply: Reply,
    ) -> (tempfile::TempDir, PathBuf, Arc<MockAnalyzer>, Router) {
        let dir = tempfile::TempDir::new().unwrap();
        let uploads = dir.path().join("Uploads");
        let analyzer = MockAnalyzer::new(reply);
        let state = AppState::new(test_config(uploads.clone()), analyzer.clone());
        (dir, uploads, analyzer, build_router(state))
    }

    fn multipart_request(uri: &str, file_name: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn empty_post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn error_message(body: &Value) -> &str {
        body["error"]["message"].as_str().unwrap()
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    fn age_file(path: &Path, age: Duration) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let (_dir, _uploads, _analyzer, app) = create_test_app(Reply::Success);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_valid_pdf_stores_file() {
        let (_dir, uploads, _analyzer, app) = create_test_app(Reply::Success);

        let response = app
            .oneshot(multipart_request(
                "/api/resume/upload",
                "resume.pdf",
                &[b'%'; 2048],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Resume uploaded successfully");
        let file_name = body["fileName"].as_str().unwrap();
        assert!(file_name.ends_with(".pdf"), "{file_name}");
        let stored = uploads.join(file_name);
        assert_eq!(std::fs::metadata(stored).unwrap().len(), 2048);
    }

    #[tokio::test]
    async fn test_two_identical_uploads_get_distinct_names() {
        let (_dir, uploads, _analyzer, app) = create_test_app(Reply::Success);

        let first = app
            .clone()
            .oneshot(multipart_request("/api/resume/upload", "cv.docx", b"same"))
            .await
            .unwrap();
        let second = app
            .oneshot(multipart_request("/api/resume/upload", "cv.docx", b"same"))
            .await
            .unwrap();

        let a = body_json(first).await["fileName"].as_str().unwrap().to_string();
        let b = body_json(second).await["fileName"].as_str().unwrap().to_string();
        assert_ne!(a, b);
        assert_eq!(file_count(&uploads), 2);
    }

    #[tokio::test]
    async fn test_upload_skips_text_fields_before_the_file() {
        let (_dir, uploads, _analyzer, app) = create_test_app(Reply::Success);
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\n");
        body.extend_from_slice(b"please review");
        body.extend_from_slice(format!("\r\n--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"resume\"; filename=\"cv.rtf\"\r\n\r\n",
        );
        body.extend_from_slice(b"{\\rtf1 Jane}");
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        let request = Request::builder()
            .method("POST")
            .uri("/api/resume/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let file_name = body["fileName"].as_str().unwrap();
        assert!(file_name.ends_with(".rtf"), "{file_name}");
        let stored = std::fs::read(uploads.join(file_name)).unwrap();
        assert_eq!(stored, b"{\\rtf1 Jane}");
    }

    #[tokio::test]
    async fn test_validation_error_uses_error_envelope() {
        let (_dir, _uploads, _analyzer, app) = create_test_app(Reply::Success);

        let response = app
            .oneshot(multipart_request("/api/resume/analyze", "resume.exe", b"MZ"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].is_string());
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn test_upload_empty_file_is_rejected() {
        let (_dir, uploads, _analyzer, app) = create_test_app(Reply::Success);

        let response = app
            .oneshot(multipart_request("/api/resume/upload", "resume.pdf", b""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            error_message(&body),
            "Invalid file. Please upload a valid resume."
        );
        assert_eq!(file_count(&uploads), 0);
    }

    #[tokio::test]
    async fn test_upload_without_multipart_body_is_rejected_as_missing_file() {
        let (_dir, _uploads, _analyzer, app) = create_test_app(Reply::Success);

        let response = app.oneshot(empty_post("/api/resume/upload")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            error_message(&body),
            "Invalid file. Please upload a valid resume."
        );
    }

    #[tokio::test]
    async fn test_upload_just_over_limit_reports_size() {
        let (_dir, uploads, _analyzer, app) = create_test_app(Reply::Success);
        let data = vec![b'a'; DEFAULT_MAX_UPLOAD_BYTES as usize + 1];

        let response = app
            .oneshot(multipart_request("/api/resume/upload", "resume.txt", &data))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(error_message(&body), "File size exceeds 10MB.");
        assert_eq!(file_count(&uploads), 0);
    }

    #[tokio::test]
    async fn test_body_past_multipart_limit_reports_size() {
        let (_dir, _uploads, analyzer, app) = create_test_app(Reply::Success);
        let data = vec![b'a'; 11 * 1024 * 1024];

        let response = app
            .oneshot(multipart_request("/api/resume/analyze", "resume.exe", &data))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(error_message(&body), "File size exceeds 10MB.");
        assert_eq!(analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_disallowed_type_is_rejected() {
        let (_dir, uploads, _analyzer, app) = create_test_app(Reply::Success);

        let response = app
            .oneshot(multipart_request("/api/resume/upload", "resume.png", b"img"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            error_message(&body),
            "File type not allowed. Allowed types: .pdf, .docx, .doc, .txt, .rtf"
        );
        assert_eq!(file_count(&uploads), 0);
    }

    #[tokio::test]
    async fn test_analyze_returns_text_and_fields_with_nulls() {
        let (_dir, uploads, analyzer, app) = create_test_app(Reply::Success);

        let response = app
            .oneshot(multipart_request("/api/resume/analyze", "resume.PDF", b"%PDF"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["text"], "Jane Doe\nEmail: jane@example.com\nPhone:");
        let fields = body["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0]["Key"], "Email:");
        assert_eq!(fields[0]["Value"], "jane@example.com");
        assert_eq!(fields[1]["Key"], "Phone:");
        assert!(fields[1]["Value"].is_null());
        assert_eq!(analyzer.calls(), 1);
        assert_eq!(file_count(&uploads), 0);
    }

    #[tokio::test]
    async fn test_analyze_disallowed_type_never_calls_service() {
        let (_dir, _uploads, analyzer, app) = create_test_app(Reply::Success);

        let response = app
            .oneshot(multipart_request("/api/resume/analyze", "resume.exe", b"MZ"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(error_message(&body).contains(".pdf, .docx, .doc, .txt, .rtf"));
        assert_eq!(analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_service_rejection_is_bad_request_with_message() {
        let (_dir, _uploads, _analyzer, app) = create_test_app(Reply::Rejected);

        let response = app
            .oneshot(multipart_request("/api/resume/analyze", "resume.pdf", b"%PDF"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "DOCUMENT_ANALYSIS_FAILED");
        assert_eq!(
            error_message(&body),
            "Document analysis failed: Access denied due to invalid subscription key."
        );
    }

    #[tokio::test]
    async fn test_analyze_unexpected_failure_is_internal_error() {
        let (_dir, _uploads, _analyzer, app) = create_test_app(Reply::Broken);

        let response = app
            .oneshot(multipart_request("/api/resume/analyze", "resume.pdf", b"%PDF"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!error_message(&body).contains("connection reset"));
    }

    #[tokio::test]
    async fn test_cleanup_without_directory_reports_nothing_to_do() {
        let (_dir, _uploads, _analyzer, app) = create_test_app(Reply::Success);

        let response = app.oneshot(empty_post("/api/resume/cleanup")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"No files to clean up.");
    }

    #[tokio::test]
    async fn test_cleanup_removes_stale_uploads_once() {
        let (_dir, uploads, _analyzer, app) = create_test_app(Reply::Success);
        let mut stored = Vec::new();
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(multipart_request("/api/resume/upload", "cv.txt", b"hello"))
                .await
                .unwrap();
            let name = body_json(response).await["fileName"]
                .as_str()
                .unwrap()
                .to_string();
            stored.push(uploads.join(name));
        }
        age_file(&stored[0], Duration::from_secs(25 * 60 * 60));
        age_file(&stored[1], Duration::from_secs(48 * 60 * 60));

        let first = app
            .clone()
            .oneshot(empty_post("/api/resume/cleanup"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            body_json(first).await["message"],
            "Cleanup completed. 2 files removed."
        );
        assert!(stored[2].exists());

        let second = app.oneshot(empty_post("/api/resume/cleanup")).await.unwrap();
        assert_eq!(
            body_json(second).await["message"],
            "Cleanup completed. 0 files removed."
        );
    }
}
