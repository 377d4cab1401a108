//! Groq chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Anything that turns a prompt into reply text.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

pub struct Client {
    api_key: String,
    endpoint: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl Client {
    pub fn new(
        api_key: String,
        endpoint: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            endpoint,
            model,
            http,
        })
    }
}

#[async_trait]
impl Completer for Client {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ApiRequest {
            model: &self.model,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!("groq: POST {} model={}", self.endpoint, self.model);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(CompletionError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(CompletionError::from_transport)?;

        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        extract_reply(&body)
    }
}

/// Pull `choices[0].message.content` out of a completion response body.
///
/// Blank content counts as no content: Telegram refuses to send empty text.
pub fn extract_reply(body: &str) -> Result<String, CompletionError> {
    let parsed: ApiResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::Parse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(CompletionError::Empty)
}

#[derive(Debug)]
pub enum CompletionError {
    Network(String),
    Timeout,
    Status { status: u16, body: String },
    Parse(String),
    Empty,
}

impl CompletionError {
    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Network(e.to_string())
        }
    }
}

impl std::fmt::Display for CompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionError::Network(e) => write!(f, "HTTP error: {e}"),
            CompletionError::Timeout => write!(f, "request timed out"),
            CompletionError::Status { status, body } => write!(f, "API error {status}: {body}"),
            CompletionError::Parse(e) => write!(f, "Parse error: {e}"),
            CompletionError::Empty => write!(f, "Empty response"),
        }
    }
}

impl std::error::Error for CompletionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    /// Serve `app` on an ephemeral port and return its URL.
    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1/chat/completions")
    }

    fn client(endpoint: String, timeout: Duration) -> Client {
        Client::new("gsk_test".into(), endpoint, "llama3-8b-8192".into(), timeout).unwrap()
    }

    #[test]
    fn test_extract_reply() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Привіт!"}}]}"#;
        assert_eq!(extract_reply(body).unwrap(), "Привіт!");
    }

    #[test]
    fn test_extract_reply_no_choices() {
        assert!(matches!(extract_reply(r#"{"choices":[]}"#), Err(CompletionError::Empty)));
        assert!(matches!(extract_reply(r#"{"id":"x"}"#), Err(CompletionError::Empty)));
    }

    #[test]
    fn test_extract_reply_missing_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant"}}]}"#;
        assert!(matches!(extract_reply(body), Err(CompletionError::Empty)));

        let body = r#"{"choices":[{"message":{"role":"assistant","content":""}}]}"#;
        assert!(matches!(extract_reply(body), Err(CompletionError::Empty)));

        let body = r#"{"choices":[{"message":{"role":"assistant","content":" \n\t "}}]}"#;
        assert!(matches!(extract_reply(body), Err(CompletionError::Empty)));
    }

    #[tokio::test]
    async fn test_complete_blank_content_is_empty() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({"choices":[{"message":{"role":"assistant","content":""}}]})) }),
        );
        let endpoint = spawn_server(app).await;

        let err = client(endpoint, Duration::from_secs(5)).complete("hi").await.unwrap_err();
        assert!(matches!(err, CompletionError::Empty), "got {err:?}");
    }

    #[test]
    fn test_extract_reply_malformed() {
        assert!(matches!(extract_reply("<html>"), Err(CompletionError::Parse(_))));
    }

    #[tokio::test]
    async fn test_complete_sends_expected_request() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer gsk_test");
                assert_eq!(body["model"], "llama3-8b-8192");
                assert_eq!(body["messages"][0]["role"], "user");
                let content = body["messages"][0]["content"].as_str().unwrap().to_string();
                Json(json!({"choices":[{"message":{"role":"assistant","content": format!("echo: {content}")}}]}))
            }),
        );
        let endpoint = spawn_server(app).await;

        let reply = client(endpoint, Duration::from_secs(5)).complete("hello").await.unwrap();
        assert_eq!(reply, "echo: hello");
    }

    #[tokio::test]
    async fn test_complete_non_success_status() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let endpoint = spawn_server(app).await;

        let err = client(endpoint, Duration::from_secs(5)).complete("hi").await.unwrap_err();
        match err {
            CompletionError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_timeout() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "too late"
            }),
        );
        let endpoint = spawn_server(app).await;

        let err = client(endpoint, Duration::from_millis(200)).complete("hi").await.unwrap_err();
        assert!(matches!(err, CompletionError::Timeout), "got {err:?}");
    }

    #[tokio::test]
    async fn test_complete_connection_refused() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}/"), Duration::from_secs(5))
            .complete("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Network(_)), "got {err:?}");
    }
}
