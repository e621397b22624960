//! Gateway HTTP server: webhook verification, inbound messages, document sends.

use crate::channels::{InboundEvent, MessageKind, ReplySender, WebhookPayload, WhatsAppChannel};
use crate::config::{Config, Credentials};
use crate::gateway::dispatch::{Dispatcher, Outcome};
use crate::llm::{CompletionBackend, GeminiClient};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const VERIFY_MODE: &str = "subscribe";
const DEFAULT_DOCUMENT_CAPTION: &str = "Here is the document you requested.";
const INTERNAL_ERROR: &str = "Internal Server Error";

/// Shared state for the gateway. Built once at startup; handlers only read it.
#[derive(Clone)]
pub struct GatewayState {
    /// Expected `hub.verify_token`.
    pub verify_token: Arc<str>,
    /// Port reported by the health check.
    pub port: u16,
    pub sender: Arc<dyn ReplySender>,
    pub dispatcher: Dispatcher,
}

impl GatewayState {
    /// Construct the WhatsApp and Gemini clients from config and wire them into a dispatcher.
    pub fn from_config(config: &Config, credentials: &Credentials) -> Self {
        let channel = Arc::new(WhatsAppChannel::new(
            &config.whatsapp.api_url,
            &credentials.phone_number_id,
            &credentials.access_token,
        ));
        let completion: Arc<dyn CompletionBackend> = Arc::new(GeminiClient::new(
            &config.gemini.base_url,
            &credentials.gemini_api_key,
            &config.gemini.model,
        ));
        Self {
            verify_token: Arc::from(credentials.verify_token.as_str()),
            port: config.server.port,
            sender: channel.clone(),
            dispatcher: Dispatcher::new(channel.clone(), channel, completion),
        }
    }
}

/// Routes served by the gateway.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/send-document", post(send_document))
        .with_state(state)
}

/// Run the gateway server; binds to config.server.bind:config.server.port.
/// Fails before binding when a credential is missing. Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let credentials = config.credentials()?;
    let state = GatewayState::from_config(&config, &credentials);
    log::info!(
        "relaying to gemini model {} via {}",
        config.gemini.model,
        config.gemini.base_url
    );

    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

#[derive(Debug, Deserialize)]
struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// GET /webhook — subscription handshake. Echoes hub.challenge when mode and token match.
async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let mode_ok = params.mode.as_deref() == Some(VERIFY_MODE);
    let token_ok = params.verify_token.as_deref() == Some(&*state.verify_token);
    if mode_ok && token_ok {
        log::info!("webhook verified");
        (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
    } else {
        log::warn!("webhook verification failed (mode {:?})", params.mode);
        StatusCode::FORBIDDEN.into_response()
    }
}

fn kind_label(kind: &MessageKind) -> &str {
    match kind {
        MessageKind::Text(_) => "text",
        MessageKind::Document(_) => "document",
        MessageKind::Unsupported(typ) => typ,
    }
}

/// POST /webhook — first message of the payload is answered through the dispatcher.
async fn receive_webhook(
    State(state): State<GatewayState>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("webhook body is not a valid payload: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid payload.");
        }
    };
    let Some(message) = payload.first_message() else {
        return (StatusCode::BAD_REQUEST, "No message received.");
    };
    let event = InboundEvent::from(message);
    let request_id = uuid::Uuid::new_v4();
    log::info!(
        "[{}] received {} message from {}",
        request_id,
        kind_label(&event.kind),
        event.from
    );

    match state.dispatcher.handle(&event).await {
        Ok(Outcome::Replied) => {
            log::info!("[{}] reply sent to {}", request_id, event.from);
            (StatusCode::OK, "Message processed.")
        }
        Ok(Outcome::Ignored) => (StatusCode::OK, "Message processed."),
        Err(e) => {
            log::error!("[{}] error handling webhook: {}", request_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendDocumentRequest {
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    document_url: Option<String>,
    #[serde(default)]
    caption: Option<String>,
}

/// POST /send-document — send a document link to a user.
async fn send_document(
    State(state): State<GatewayState>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let req: SendDocumentRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid payload."),
    };
    let to = req.to.filter(|s| !s.trim().is_empty());
    let link = req.document_url.filter(|s| !s.trim().is_empty());
    let (Some(to), Some(link)) = (to, link) else {
        return (StatusCode::BAD_REQUEST, "Missing to or documentUrl.");
    };
    let caption = req
        .caption
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_DOCUMENT_CAPTION.to_string());

    match state.sender.send_document(&to, &link, &caption).await {
        Ok(()) => {
            log::info!("document sent to {}", to);
            (StatusCode::OK, "Document sent.")
        }
        Err(e) => {
            log::error!("error sending document: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
        }
    }
}

/// GET / returns a simple health JSON.
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.port,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::dispatch::fakes::{RecordingSender, ScriptedCompletion, StaticMedia};

    fn state_with(sender: Arc<RecordingSender>, reply: Option<&str>) -> GatewayState {
        let completion = Arc::new(ScriptedCompletion {
            reply: reply.map(str::to_string),
            ..Default::default()
        });
        GatewayState {
            verify_token: Arc::from("secret"),
            port: 3000,
            sender: sender.clone(),
            dispatcher: Dispatcher::new(sender, Arc::new(StaticMedia::default()), completion),
        }
    }

    fn params(mode: Option<&str>, token: Option<&str>, challenge: Option<&str>) -> VerifyParams {
        VerifyParams {
            mode: mode.map(str::to_string),
            verify_token: token.map(str::to_string),
            challenge: challenge.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn verify_accepts_matching_token() {
        let state = state_with(Arc::new(RecordingSender::default()), None);
        let res = verify_webhook(
            State(state),
            Query(params(Some("subscribe"), Some("secret"), Some("1158201444"))),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn verify_rejects_wrong_token_or_mode() {
        let state = state_with(Arc::new(RecordingSender::default()), None);
        let wrong_token = verify_webhook(
            State(state.clone()),
            Query(params(Some("subscribe"), Some("nope"), Some("1"))),
        )
        .await;
        assert_eq!(wrong_token.status(), StatusCode::FORBIDDEN);

        let missing_mode =
            verify_webhook(State(state), Query(params(None, Some("secret"), Some("1")))).await;
        assert_eq!(missing_mode.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn webhook_without_message_is_bad_request() {
        let state = state_with(Arc::new(RecordingSender::default()), None);
        let body = Bytes::from_static(br#"{"entry":[{"changes":[{"value":{}}]}]}"#);
        let (status, text) = receive_webhook(State(state), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "No message received.");
    }

    #[tokio::test]
    async fn webhook_with_invalid_json_is_bad_request() {
        let state = state_with(Arc::new(RecordingSender::default()), None);
        let (status, _) = receive_webhook(State(state), Bytes::from_static(b"not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_failure_is_generic_500() {
        let state = state_with(Arc::new(RecordingSender::default()), None);
        let body = Bytes::from(
            serde_json::to_vec(&json!({
                "entry": [{ "changes": [{ "value": { "messages": [{
                    "from": "1",
                    "type": "document",
                    "document": { "id": "M", "filename": "empty.pdf" }
                }] } }] }]
            }))
            .unwrap(),
        );
        let (status, text) = receive_webhook(State(state), body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text, INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn send_document_defaults_caption() {
        let sender = Arc::new(RecordingSender::default());
        let state = state_with(sender.clone(), None);
        let body = Bytes::from_static(br#"{"to":"1555","documentUrl":"https://example.com/a.pdf"}"#);
        let (status, text) = send_document(State(state), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "Document sent.");
        assert_eq!(
            *sender.documents.lock().unwrap(),
            vec![(
                "1555".to_string(),
                "https://example.com/a.pdf".to_string(),
                DEFAULT_DOCUMENT_CAPTION.to_string()
            )]
        );
    }

    #[tokio::test]
    async fn send_document_requires_recipient_and_link() {
        let sender = Arc::new(RecordingSender::default());
        let state = state_with(sender.clone(), None);
        let (status, _) =
            send_document(State(state), Bytes::from_static(br#"{"caption":"x"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(sender.documents.lock().unwrap().is_empty());
    }
}
