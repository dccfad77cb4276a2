//! Ollama implementation of the LlmGateway port

use super::protocol::{GenerateRequest, GenerateResponse, TagsResponse, VersionResponse};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use themis_application::ports::llm_gateway::{GatewayError, LlmGateway};
use themis_domain::Model;
use tracing::debug;

/// `http://<host>:<port>`; a host that already carries a scheme is kept.
pub fn base_url(host: &str, port: u16) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

/// LLM gateway backed by a local Ollama server
pub struct OllamaGateway {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl OllamaGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            debug!("Request to {} timed out after {:?}", self.base_url, self.timeout);
            GatewayError::Timeout
        } else if e.is_connect() {
            GatewayError::ConnectionError(format!("cannot reach Ollama at {}", self.base_url))
        } else {
            GatewayError::ConnectionError(e.to_string())
        }
    }

    /// Turn a non-success status into the matching error
    async fn check_status(response: Response, model: Option<&Model>) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if let Some(model) = model
            && (status.as_u16() == 404 || body.contains("not found"))
        {
            return Err(GatewayError::ModelNotAvailable(model.to_string()));
        }
        Err(GatewayError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl LlmGateway for OllamaGateway {
    async fn complete(&self, model: &Model, prompt: &str) -> Result<String, GatewayError> {
        let body = GenerateRequest {
            model: model.as_str(),
            prompt,
            stream: false,
        };

        debug!(model = %model, prompt_chars = prompt.len(), "POST /api/generate");
        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response, Some(model)).await?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if parsed.response.trim().is_empty() {
            return Err(GatewayError::EmptyResponse);
        }
        Ok(parsed.response)
    }

    async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response, None).await?;

        let parsed: TagsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| Model::new(m.name)).collect())
    }

    async fn server_version(&self) -> Result<String, GatewayError> {
        let response = self
            .client
            .get(self.url("/api/version"))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response, None).await?;

        let parsed: VersionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok(parsed.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response; resolves to the raw request.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (url, handle)
    }

    fn gateway(url: &str) -> OllamaGateway {
        OllamaGateway::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("localhost", 11434), "http://localhost:11434");
        assert_eq!(base_url("http://gpu-box/", 8080), "http://gpu-box:8080");
    }

    #[tokio::test]
    async fn test_complete_posts_generate_request() {
        let (url, server) = serve_once("200 OK", r#"{"response":"Wire fraud.","done":true}"#).await;

        let answer = gateway(&url)
            .complete(&Model::new("mistral"), "What are the charges?")
            .await
            .unwrap();
        let request = server.await.unwrap();

        assert_eq!(answer, "Wire fraud.");
        assert!(request.starts_with("POST /api/generate"));
        assert!(request.contains(r#""model":"mistral""#));
        assert!(request.contains(r#""stream":false"#));
    }

    #[tokio::test]
    async fn test_missing_model_is_not_available() {
        let (url, _server) = serve_once(
            "404 Not Found",
            r#"{"error":"model 'ghost' not found, try pulling it first"}"#,
        )
        .await;

        let result = gateway(&url).complete(&Model::new("ghost"), "Hi").await;

        assert_eq!(result, Err(GatewayError::ModelNotAvailable("ghost".into())));
    }

    #[tokio::test]
    async fn test_server_error_keeps_status() {
        let (url, _server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;

        let result = gateway(&url).complete(&Model::new("mistral"), "Hi").await;

        match result {
            Err(e @ GatewayError::Http { status: 500, .. }) => assert!(e.is_retryable()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_completion_is_empty_response() {
        let (url, _server) = serve_once("200 OK", r#"{"response":"  "}"#).await;

        let result = gateway(&url).complete(&Model::new("mistral"), "Hi").await;

        assert_eq!(result, Err(GatewayError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_lists_models() {
        let (url, _server) = serve_once(
            "200 OK",
            r#"{"models":[{"name":"llama3:latest"},{"name":"mistral:7b"}]}"#,
        )
        .await;

        let models = gateway(&url).available_models().await.unwrap();

        assert_eq!(
            models,
            vec![Model::new("llama3:latest"), Model::new("mistral:7b")]
        );
    }

    #[tokio::test]
    async fn test_server_version() {
        let (url, _server) = serve_once("200 OK", r#"{"version":"0.3.12"}"#).await;

        assert_eq!(gateway(&url).server_version().await.unwrap(), "0.3.12");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let result = gateway(&url).server_version().await;

        assert!(matches!(result, Err(GatewayError::ConnectionError(_))));
    }
}
