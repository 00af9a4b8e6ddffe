// Taskrelay HTTP server
// Decision: Library + thin main so the router can be driven in tests without a socket
// Decision: One shared AppState; the queue is reached through the relay

pub mod config;
pub mod health;
pub mod status;
pub mod webhook;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use taskrelay_core::WebhookRelay;

/// App state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<WebhookRelay>,
}

impl AppState {
    pub fn new(relay: WebhookRelay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}

/// Build the full router (without tracing layer)
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(status::status_page))
        .route("/health", get(health::health))
        .route("/receiveWebhook", post(webhook::receive_webhook))
        .with_state(state)
}
