//! Webhook endpoint Telegram delivers updates to.
//!
//! Every well-formed or malformed update is acknowledged with `200` so
//! Telegram never retries; processing failures only show up in the logs.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::bot::{IncomingText, MessageRouter};

pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Telegram Update object (only the fields we route on).
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    pub from: Option<TelegramUser>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

impl TelegramUpdate {
    /// The text message carried by this update, if it has one.
    pub fn into_incoming(self) -> Option<IncomingText> {
        let message = self.message?;
        let user = message.from?;
        let text = message.text?;

        Some(IncomingText {
            chat_id: message.chat.id,
            user_id: user.id,
            username: user.username.unwrap_or(user.first_name),
            text,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    fn ok() -> Self {
        Self { ok: true, error: None }
    }
}

#[derive(Clone)]
struct WebhookState {
    router: Arc<MessageRouter>,
    secret: Option<Arc<str>>,
}

/// Build the axum router.
pub fn build_router(router: Arc<MessageRouter>, secret: Option<String>) -> axum::Router {
    let state = WebhookState {
        router,
        secret: secret.map(Arc::from),
    };

    axum::Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(addr: &str, app: axum::Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /webhook`
async fn webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookAck>) {
    if let Some(ref secret) = state.secret {
        let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if provided != Some(&**secret) {
            warn!("Rejected webhook call with missing or wrong secret");
            return (
                StatusCode::UNAUTHORIZED,
                Json(WebhookAck {
                    ok: false,
                    error: Some("unauthorized".to_string()),
                }),
            );
        }
    }

    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            warn!("Malformed update: {e}");
            return (
                StatusCode::OK,
                Json(WebhookAck {
                    ok: true,
                    error: Some(format!("malformed update: {e}")),
                }),
            );
        }
    };

    let update_id = update.update_id;
    match update.into_incoming() {
        Some(incoming) => state.router.handle(&incoming).await,
        None => debug!("Update {update_id} has no text message, ignoring"),
    }

    (StatusCode::OK, Json(WebhookAck::ok()))
}
