//! Webhook request state machine.
//!
//! ```text
//! Received ─┬─ Handshake
//!           ├─ Rejected   (signature mismatch, 401)
//!           ├─ Malformed  (no recognised header or bad body, 400)
//!           └─ Verified ─┬─ Ignored
//!                        └─ Dispatched ── Enriching ─┬─ Forwarded
//!                                                    └─ Failed
//! ```
//!
//! Everything after `Dispatched` happens on the [`EnrichmentQueue`] and is
//! never visible to the caller.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{RelayError, Result};
use crate::event::{EventEnvelope, IgnoreReason, Selection};
use crate::queue::EnrichmentQueue;
use crate::secret::SecretStore;
use crate::signature::verify_signature;

/// Header carrying the handshake secret (request and response)
pub const SECRET_HEADER: &str = "x-hook-secret";
/// Header carrying the hex HMAC of a delivery body
pub const SIGNATURE_HEADER: &str = "x-hook-signature";

/// Classification of an inbound call, by header presence only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundRequest {
    Handshake(Vec<u8>),
    SignedDelivery(Vec<u8>),
    Unrecognized,
}

impl InboundRequest {
    /// Classify from raw header values. The handshake header wins when both are present.
    /// Values are taken as opaque bytes.
    pub fn classify(secret: Option<&[u8]>, signature: Option<&[u8]>) -> Self {
        match (secret, signature) {
            (Some(secret), _) => InboundRequest::Handshake(secret.to_vec()),
            (None, Some(signature)) => InboundRequest::SignedDelivery(signature.to_vec()),
            (None, None) => InboundRequest::Unrecognized,
        }
    }
}

/// Caller-visible result of a handled request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Secret stored; echo it back
    Handshake { secret: Vec<u8> },
    /// Enrichment job scheduled
    Dispatched { job_id: Uuid, gid: String },
    /// Verified but nothing to do
    Ignored(IgnoreReason),
}

/// Handshake, verification and dispatch over one shared secret
pub struct WebhookRelay {
    secrets: Arc<SecretStore>,
    queue: EnrichmentQueue,
}

impl WebhookRelay {
    pub fn new(secrets: Arc<SecretStore>, queue: EnrichmentQueue) -> Self {
        Self { secrets, queue }
    }

    pub fn secrets(&self) -> &SecretStore {
        &self.secrets
    }

    pub fn queue(&self) -> &EnrichmentQueue {
        &self.queue
    }

    /// Handle one inbound call. The body is only read for signed deliveries.
    pub fn handle(&self, request: InboundRequest, body: &[u8]) -> Result<WebhookOutcome> {
        match request {
            InboundRequest::Handshake(secret) => Ok(self.handshake(secret)),
            InboundRequest::SignedDelivery(signature) => self.deliver(&signature, body),
            InboundRequest::Unrecognized => Err(RelayError::UnrecognizedRequest),
        }
    }

    fn handshake(&self, secret: Vec<u8>) -> WebhookOutcome {
        tracing::info!(secret_len = secret.len(), "Webhook handshake, storing new secret");
        self.secrets.replace(secret.clone());
        WebhookOutcome::Handshake { secret }
    }

    fn deliver(&self, signature: &[u8], body: &[u8]) -> Result<WebhookOutcome> {
        let secret = self.secrets.current();
        if secret.is_empty() {
            tracing::warn!("Verifying delivery with an empty secret, no handshake has happened yet");
        }

        if !verify_signature(&secret, body, signature)? {
            tracing::warn!(body_len = body.len(), "Rejected delivery with invalid signature");
            return Err(RelayError::SignatureMismatch);
        }

        let envelope = EventEnvelope::parse(body)?;
        tracing::info!(event_count = envelope.events.len(), "Verified delivery");

        match envelope.select() {
            Selection::Task(gid) => {
                let job_id = self.queue.schedule(gid.clone())?;
                tracing::info!(gid = %gid, job_id = %job_id, "Scheduled task enrichment");
                Ok(WebhookOutcome::Dispatched { job_id, gid })
            }
            Selection::Ignored(reason) => {
                tracing::debug!(reason = %reason, "Delivery ignored");
                Ok(WebhookOutcome::Ignored(reason))
            }
        }
    }
}
