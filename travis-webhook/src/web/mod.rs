//! Web server module for receiving Travis CI webhooks.
//!
//! This module provides the HTTP surface of the relay:
//! - Decodes the form or JSON body
//! - Verifies the Travis signature
//! - Posts the build notification to the chat webhook
//! - Always returns 200 OK to Travis

pub mod body;
pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use body::{extract_payload, parse_body, BodyKind};
pub use handlers::{handle_travis, health, travis_webhook, AppState, HealthResponse, Outcome};
pub use signature::{fetch_public_key, verify_signature, SignatureVerifier, Verification};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", post(travis_webhook))
        .route("/webhooks/travis", post(travis_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
