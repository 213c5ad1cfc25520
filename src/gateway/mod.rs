pub mod payload;
pub mod signature;
pub mod verify;

use crate::message::ChannelKind;
use crate::pipeline;
use crate::state::AppState;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Acknowledgement body Twilio expects: an empty TwiML document, so no
/// synchronous reply is rendered to the sender.
const EMPTY_TWIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhooks/twilio", post(twilio_webhook))
        .route(
            "/webhooks/whatsapp",
            post(whatsapp_webhook).get(whatsapp_verify),
        )
        .route(
            "/webhooks/messenger",
            post(messenger_webhook).get(messenger_verify),
        )
        .route("/api/health", get(health))
        .with_state(state)
}

/// Bind the configured address and serve webhook traffic until shutdown.
pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!(
        "{}:{}",
        state.config.gateway.host, state.config.gateway.port
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("gateway listening on {addr}");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    axum::Json(json!({ "status": "ok" }))
}

fn bad_request(err: crate::errors::RelayError) -> Response {
    warn!(stage = err.stage(), "rejected webhook payload: {err}");
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

async fn twilio_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let cfg = &state.config.channels.twilio;
    // Signature enforcement is keyed off the configured public URL; without
    // it the signature base string cannot be reconstructed.
    if !cfg.webhook_url.is_empty() {
        let params: HashMap<String, String> =
            form_urlencoded::parse(&body).into_owned().collect();
        let provided = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !signature::validate_twilio_signature(
            &cfg.auth_token,
            provided,
            &cfg.webhook_url,
            &params,
        ) {
            warn!("rejected twilio webhook with invalid signature");
            return (
                StatusCode::FORBIDDEN,
                axum::Json(json!({ "error": "invalid signature" })),
            )
                .into_response();
        }
    }

    match payload::parse(ChannelKind::Twilio, &body) {
        Ok(messages) => {
            for message in messages {
                pipeline::spawn(state.clone(), message);
            }
            ([(header::CONTENT_TYPE, "text/xml")], EMPTY_TWIML).into_response()
        }
        Err(e) => bad_request(e),
    }
}

async fn whatsapp_webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    event_webhook(state, ChannelKind::WhatsApp, &body)
}

async fn messenger_webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    event_webhook(state, ChannelKind::Messenger, &body)
}

/// Shared handler body for Meta-style event deliveries. Every extracted
/// message becomes its own background job; the acknowledgement goes out as
/// soon as scheduling is done.
fn event_webhook(state: Arc<AppState>, channel: ChannelKind, body: &[u8]) -> Response {
    match payload::parse(channel, body) {
        Ok(messages) => {
            for message in messages {
                pipeline::spawn(state.clone(), message);
            }
            "EVENT_RECEIVED".into_response()
        }
        Err(e) => bad_request(e),
    }
}

async fn whatsapp_verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    handshake(&params, &state.config.channels.whatsapp.verify_token)
}

async fn messenger_verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    handshake(&params, &state.config.channels.messenger.verify_token)
}

fn handshake(params: &HashMap<String, String>, expected_token: &str) -> Response {
    match verify::check(params, expected_token) {
        verify::VerifyOutcome::Accepted(challenge) => {
            info!("subscription verification accepted");
            challenge.into_response()
        }
        verify::VerifyOutcome::Forbidden => (
            StatusCode::FORBIDDEN,
            axum::Json(json!({ "error": "verification token mismatch" })),
        )
            .into_response(),
        verify::VerifyOutcome::BadRequest => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({ "error": "missing hub.mode or hub.challenge" })),
        )
            .into_response(),
    }
}
