//! Image hosting
//!
//! Speaker portraits are not stored locally; they are forwarded to imgBB and
//! only the returned URL is kept on the speaker record.

use crate::pipeline::PipelineError;

/// Client for the imgBB upload API
#[derive(Clone)]
pub struct ImageHost {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ImageHost {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    /// Upload an image and return its public URL
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<String, PipelineError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PipelineError::Upload("Image hosting API key is not configured".to_string()))?;

        let mut part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(mime) = content_type {
            part = part
                .mime_str(mime)
                .map_err(|e| PipelineError::Upload(format!("Invalid content type {}: {}", mime, e)))?;
        }
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::Upload(format!("Failed to reach image host: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Upload(format!(
                "Image host returned {}: {}",
                status, body
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Upload(format!("Failed to parse response: {}", e)))?;

        result["data"]["url"]
            .as_str()
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or_else(|| PipelineError::Upload(format!("Image host response has no URL: {}", result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn host(server: &MockServer, key: Option<&str>) -> ImageHost {
        ImageHost::new(
            reqwest::Client::new(),
            format!("{}/1/upload", server.uri()),
            key.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_upload_returns_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/upload"))
            .and(query_param("key", "img-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "url": "https://i.ibb.co/abc/speaker.png" },
                "success": true
            })))
            .mount(&server)
            .await;

        let url = host(&server, Some("img-key"))
            .upload("speaker.png", Some("image/png"), vec![0x89, 0x50])
            .await
            .unwrap();
        assert_eq!(url, "https://i.ibb.co/abc/speaker.png");
    }

    #[tokio::test]
    async fn test_rejection_is_upload_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invalid API v1 key"))
            .mount(&server)
            .await;

        let result = host(&server, Some("bad")).upload("a.png", None, vec![1]).await;
        assert!(matches!(result, Err(PipelineError::Upload(_))));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let server = MockServer::start().await;
        let result = host(&server, None).upload("a.png", None, vec![1]).await;
        assert!(matches!(result, Err(PipelineError::Upload(_))));
    }
}
