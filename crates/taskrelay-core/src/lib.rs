// Task Relay Core
//
// This crate receives Asana task webhooks and forwards each newly added task to
// an Airtable table. It is transport-agnostic: the server crate feeds it header
// values and body bytes.
//
// Key design decisions:
// - One explicit SecretStore instead of a global, shared by handshake and verifier
// - Signatures are checked over the raw body bytes with a constant-time compare
// - Outbound APIs are reached through TaskSource and RecordSink traits
// - Enrichment is deferred onto a bounded queue with an observable outcome channel
// - Custom fields are located through a configurable table, not fixed indices

pub mod client;
pub mod config;
pub mod enrich;
pub mod error;
pub mod event;
pub mod fields;
pub mod queue;
pub mod record;
pub mod secret;
pub mod signature;
pub mod task;
pub mod webhook;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use client::{AirtableClient, AsanaClient, RecordSink, TaskSource};
pub use config::{AirtableConfig, AsanaConfig, QueueConfig, RelayConfig};
pub use enrich::{Enricher, EnrichmentReport};
pub use error::{ErrorCategory, RelayError, Result};
pub use event::{EventEnvelope, EventRecord, IgnoreReason, Selection, CANONICAL_EVENT_INDEX};
pub use fields::{CustomFieldMap, CustomFieldRule, FieldLocator, ValueKind};
pub use queue::{EnrichmentQueue, JobOutcome, QueueStats};
pub use record::{CreateRecordsRequest, RecordFields};
pub use secret::SecretStore;
pub use task::TaskDetail;
pub use webhook::{InboundRequest, WebhookOutcome, WebhookRelay, SECRET_HEADER, SIGNATURE_HEADER};
