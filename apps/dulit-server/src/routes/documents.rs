//! Pass generation and template management routes

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};

use super::MessageResponse;
use crate::error::{AppError, Result};
use crate::pipeline::{DocumentRequest, DocumentRequestBody, GeneratedPass, PipelineError};
use crate::state::AppState;

/// Largest template accepted by `/upload-template`
const MAX_TEMPLATE_SIZE: usize = 20 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-doc", post(generate_doc))
        .route(
            "/upload-template",
            post(upload_template).layer(DefaultBodyLimit::max(MAX_TEMPLATE_SIZE)),
        )
}

/// Generate a personalized pass and return its URL
///
/// Unreadable bodies are treated like missing fields.
async fn generate_doc(
    State(state): State<AppState>,
    body: Option<Json<DocumentRequestBody>>,
) -> Result<Json<GeneratedPass>> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let request = DocumentRequest::from_body(&body)
        .ok_or_else(|| AppError::BadRequest("Missing firstName or dayNumber".to_string()))?;

    let pass = state.generator().generate(&request).await?;
    Ok(Json(pass))
}

/// Replace the pass template
async fn upload_template(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read upload: {}", e))
    })? {
        if field.name() != Some("template") {
            continue;
        }

        let data = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read template data: {}", e);
            AppError::BadRequest(format!("Failed to read template data: {}", e))
        })?;
        tracing::debug!("Read {} bytes of template data", data.len());

        return match state.generator().renderer().replace(&data).await {
            Ok(()) => Ok(Json(MessageResponse::new("Template uploaded"))),
            Err(PipelineError::Template(msg)) => Err(AppError::BadRequest(msg)),
            Err(e) => Err(e.into()),
        };
    }

    tracing::warn!("No template field found in multipart upload");
    Err(AppError::BadRequest(
        "No file provided. Use field name 'template'".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{write_docx, MockOutcome, UNIQUE_ID_LEN};
    use crate::routes::test_support::{multipart_body, multipart_request, TestApp};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    fn temp_dir_entries(app: &TestApp) -> usize {
        std::fs::read_dir(app.temp_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_generate_doc_returns_url_and_id() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send_json("POST", "/generate-doc", serde_json::json!({ "firstName": "Ada", "dayNumber": 2 }))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], "https://files.example/pass.pdf");
        assert_eq!(body["uniqueId"].as_str().unwrap().len(), UNIQUE_ID_LEN);
        assert_eq!(temp_dir_entries(&app), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_rejected_before_any_io() {
        let app = TestApp::new().await;

        for body in [
            serde_json::json!({ "firstName": "Ada" }),
            serde_json::json!({ "dayNumber": "1" }),
            serde_json::json!({ "firstName": "", "dayNumber": "1" }),
            serde_json::json!({}),
        ] {
            let (status, reply) = app.send_json("POST", "/generate-doc", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(reply["error"], "Missing firstName or dayNumber");
        }

        assert!(!app.temp_dir().exists());
    }

    #[tokio::test]
    async fn test_unparseable_body_is_bad_request() {
        let app = TestApp::new().await;
        let request = Request::builder()
            .method("POST")
            .uri("/generate-doc")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_conversion_failure_is_generic_500() {
        let app = TestApp::with_outcome(MockOutcome::Fail, None).await;
        let (status, body) = app
            .send_json("POST", "/generate-doc", serde_json::json!({ "firstName": "Ada", "dayNumber": "2" }))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
        assert_eq!(temp_dir_entries(&app), 0);
    }

    #[tokio::test]
    async fn test_upload_template_replaces_file() {
        let app = TestApp::new().await;
        let source = app.dir.path().join("new.docx");
        write_docx(&source, "<w:t>Hello {{FirstName}}, day {{DayNumber}}</w:t>");
        let data = std::fs::read(&source).unwrap();

        let request = multipart_request(
            "/upload-template",
            multipart_body("template", "new.docx", "application/octet-stream", &data),
        );
        let (status, body) = app.send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Template uploaded");
        let stored = std::fs::read(app.dir.path().join("templates").join("Dulit-pass.docx")).unwrap();
        assert_eq!(stored, data);
    }

    #[tokio::test]
    async fn test_upload_template_rejects_non_docx() {
        let app = TestApp::new().await;
        let request = multipart_request(
            "/upload-template",
            multipart_body("template", "notes.txt", "text/plain", b"plain text"),
        );

        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("DOCX"));
    }

    #[tokio::test]
    async fn test_upload_template_requires_field() {
        let app = TestApp::new().await;
        let request = multipart_request(
            "/upload-template",
            multipart_body("file", "a.docx", "application/octet-stream", b"x"),
        );

        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
