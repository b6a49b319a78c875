//! Route modules for Dulit Server

pub mod documents;
pub mod health;
pub mod images;
pub mod programmes;
pub mod speakers;

use serde::Serialize;

/// `{ "message": ... }` reply used by mutating endpoints
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message, id: None }
    }

    pub fn created(message: &'static str, id: String) -> Self {
        Self {
            message,
            id: Some(id),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::media::ImageHost;
    use crate::pipeline::{write_docx, MockConverter, MockOutcome, PassGenerator, TemplateRenderer};
    use crate::state::AppState;

    /// Router over an in-memory store and a mock conversion backend
    pub struct TestApp {
        pub dir: TempDir,
        pub router: Router,
    }

    impl TestApp {
        pub async fn new() -> Self {
            Self::with_outcome(MockOutcome::Hosted("https://files.example/pass.pdf".to_string()), None).await
        }

        pub async fn with_outcome(outcome: MockOutcome, image_endpoint: Option<String>) -> Self {
            let dir = TempDir::new().unwrap();
            let template_path = dir.path().join("templates").join("Dulit-pass.docx");
            std::fs::create_dir_all(template_path.parent().unwrap()).unwrap();
            write_docx(&template_path, "<w:t>Welcome {{FirstName}}</w:t>");

            let mut config = Config::default();
            config.documents.template_path = template_path.clone();
            config.documents.temp_dir = dir.path().join("temp");

            let shutdown = CancellationToken::new();
            let generator = PassGenerator::new(
                TemplateRenderer::new(template_path),
                Arc::new(MockConverter { outcome }),
                None,
                config.documents.temp_dir.clone(),
                shutdown.clone(),
            );
            let image_host = ImageHost::new(
                reqwest::Client::new(),
                image_endpoint.unwrap_or_else(|| "http://127.0.0.1:9/1/upload".to_string()),
                Some("img-key".to_string()),
            );

            let db = crate::db::test_pool().await;
            let state = AppState::from_parts(config, db, generator, image_host, shutdown);
            Self {
                dir,
                router: crate::app(state),
            }
        }

        pub fn temp_dir(&self) -> PathBuf {
            self.dir.path().join("temp")
        }

        pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = if bytes.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
            };
            (status, body)
        }

        pub async fn send_json(
            &self,
            method: &str,
            uri: &str,
            body: serde_json::Value,
        ) -> (StatusCode, serde_json::Value) {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.send(request).await
        }

        pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
            self.send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
        }

        pub async fn delete(&self, uri: &str) -> (StatusCode, serde_json::Value) {
            self.send(
                Request::builder()
                    .method("DELETE")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
        }
    }

    pub const BOUNDARY: &str = "dulit-test-boundary";

    /// Build a single-part multipart body
    pub fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }
}
