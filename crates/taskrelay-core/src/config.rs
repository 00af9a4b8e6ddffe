// Relay configuration
//
// Plain structs with defaults and builder-style setters. Loading from the
// environment lives in the server crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fields::CustomFieldMap;

/// Default Asana REST base URL
pub const DEFAULT_ASANA_API_URL: &str = "https://app.asana.com/api/1.0";
/// Default Airtable REST base URL
pub const DEFAULT_AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";

/// Read API (task source) settings
#[derive(Debug, Clone)]
pub struct AsanaConfig {
    pub base_url: String,
    pub token: String,
}

impl AsanaConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_ASANA_API_URL.to_string(),
            token: token.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Write API (record sink) settings
#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub base_url: String,
    pub base_id: String,
    /// Table id or table name
    pub table: String,
    pub token: String,
}

impl AirtableConfig {
    pub fn new(
        base_id: impl Into<String>,
        table: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: DEFAULT_AIRTABLE_API_URL.to_string(),
            base_id: base_id.into(),
            table: table.into(),
            token: token.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Deferred enrichment queue settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Wait between scheduling a job and fetching the task, so the upstream
    /// has time to make the task's data queryable
    pub delay: Duration,

    /// Maximum jobs in flight (including their delay wait)
    pub max_concurrency: usize,

    /// Maximum jobs waiting for a free slot
    pub queue_depth: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(30),
            max_concurrency: 16,
            queue_depth: 256,
        }
    }
}

impl QueueConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }
}

/// Everything the relay needs besides the listening socket
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub asana: AsanaConfig,
    pub airtable: AirtableConfig,
    pub queue: QueueConfig,
    pub custom_fields: CustomFieldMap,
    /// Timeout applied to each outbound request
    pub http_timeout: Duration,
}

impl RelayConfig {
    pub fn new(asana: AsanaConfig, airtable: AirtableConfig) -> Self {
        Self {
            asana,
            airtable,
            queue: QueueConfig::default(),
            custom_fields: CustomFieldMap::default(),
            http_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_queue(mut self, queue: QueueConfig) -> Self {
        self.queue = queue;
        self
    }

    pub fn with_custom_fields(mut self, custom_fields: CustomFieldMap) -> Self {
        self.custom_fields = custom_fields;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::new(
            AsanaConfig::new("t"),
            AirtableConfig::new("app", "tbl", "k"),
        );
        assert_eq!(config.asana.base_url, DEFAULT_ASANA_API_URL);
        assert_eq!(config.airtable.base_url, DEFAULT_AIRTABLE_API_URL);
        assert_eq!(config.queue.delay, Duration::from_secs(30));
        assert_eq!(config.custom_fields, CustomFieldMap::default());
    }

    #[test]
    fn test_queue_limits_are_at_least_one() {
        let queue = QueueConfig::new().with_max_concurrency(0).with_queue_depth(0);
        assert_eq!(queue.max_concurrency, 1);
        assert_eq!(queue.queue_depth, 1);
    }
}
