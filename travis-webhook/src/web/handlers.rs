//! Webhook endpoint handlers.
//!
//! The Travis endpoint always answers `200 OK` with an empty body. Travis
//! would otherwise retry or flag the delivery, and none of the failures here
//! are something the sender can fix. Every outcome is logged instead.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Json,
};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::VerifyError;
use crate::notify::{ChatMessage, Notifier};
use crate::payload::BuildPayload;
use crate::web::body::{extract_payload, parse_body};
use crate::web::signature::{SignatureVerifier, Verification};
use crate::Config;

/// Header carrying the base64 payload signature.
pub const SIGNATURE_HEADER: &str = "signature";

/// Headers that may carry the `owner/name` repository slug, in lookup order.
pub const REPO_SLUG_HEADERS: [&str; 2] = ["travis-repo-slug", "repo-slug"];

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: SignatureVerifier,
    pub notifier: Notifier,
}

impl AppState {
    /// Build the state and the HTTP client shared by both outbound calls.
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let timeout = config.request_timeout();
        let verifier = SignatureVerifier::new(
            client.clone(),
            config.travis_config_url.clone(),
            timeout,
        );
        let notifier = Notifier::new(client, config.webhook_url.clone(), timeout);

        Ok(Self {
            config: Arc::new(config),
            verifier,
            notifier,
        })
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Travis Webhook
// =============================================================================

/// What happened to one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Signature valid and the chat card was delivered.
    Notified,
    /// Body had no usable `payload` field.
    MissingPayload,
    /// Signature check failed.
    Rejected(VerifyError),
    /// Signature valid but the payload is not a build object.
    MalformedPayload(String),
    /// Signature valid but posting the card failed.
    NotifyFailed(String),
}

/// Travis webhook endpoint.
///
/// Runs [`handle_travis`] and discards the outcome. A body that cannot be
/// read (too large, aborted) is handled as an empty one.
pub async fn travis_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> StatusCode {
    let body = body.unwrap_or_else(|rejection| {
        warn!(
            error = %rejection,
            status_code = rejection.status().as_u16(),
            "travis_body_unreadable"
        );
        Bytes::new()
    });

    let outcome = handle_travis(&state, &headers, &body).await;
    debug!(outcome = ?outcome, "travis_webhook_done");
    StatusCode::OK
}

/// Process one Travis delivery:
/// 1. Decode the body and pull out the `payload` field
/// 2. Verify the signature against a freshly fetched public key
/// 3. Format and post the chat card
pub async fn handle_travis(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Outcome {
    let signature = header_str(headers, SIGNATURE_HEADER);
    let repository_slug = REPO_SLUG_HEADERS
        .iter()
        .find_map(|name| header_str(headers, name));

    info!(
        repository = repository_slug.unwrap_or_default(),
        has_signature = signature.is_some(),
        body_length = body.len(),
        "travis_webhook_received"
    );

    let parsed = parse_body(header_str(headers, CONTENT_TYPE.as_str()), body);
    let Some(payload) = extract_payload(&parsed) else {
        warn!("travis_payload_missing");
        return Outcome::MissingPayload;
    };

    if let Verification::Invalid(reason) = state.verifier.verify(payload, signature).await {
        warn!(reason = %reason, "travis_webhook_rejected");
        return Outcome::Rejected(reason);
    }

    let build = match BuildPayload::from_json(payload) {
        Ok(build) => build,
        Err(e) => {
            error!(error = %e, "travis_payload_malformed");
            return Outcome::MalformedPayload(e.to_string());
        }
    };

    let repository_slug = repository_slug.unwrap_or_else(|| {
        warn!("travis_repo_slug_missing");
        "unknown"
    });

    let message = ChatMessage::for_build(&build, repository_slug, &state.config.card_image_url);

    if let Err(e) = state.notifier.send(&message).await {
        error!(
            error = %e,
            repository = repository_slug,
            build_number = %build.number,
            "notify_failed"
        );
        return Outcome::NotifyFailed(e.to_string());
    }

    info!(
        repository = repository_slug,
        build_number = %build.number,
        state = %build.state,
        branch = %build.branch,
        "travis_webhook_notified"
    );

    Outcome::Notified
}

/// Header value as text; names are matched case-insensitively.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
