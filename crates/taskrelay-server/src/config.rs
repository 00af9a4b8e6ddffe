// Server configuration loaded from environment variables.
// Decision: Keep the legacy variable names (PORT, TOKEN, BASEID, TABLEID, AIRTABLETOKEN)
// so existing .env files keep working
// Decision: Queue limits and custom field locators are optional with safe defaults

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use taskrelay_core::config::{AirtableConfig, AsanaConfig, QueueConfig, RelayConfig};
use taskrelay_core::fields::{CustomFieldMap, FieldLocator};

const DEFAULT_PORT: u16 = 3000;

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port
    pub port: u16,
    pub relay: RelayConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup (used by tests)
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{} environment variable required", key));

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;

        let mut asana = AsanaConfig::new(required("TOKEN")?);
        if let Some(url) = get("ASANA_API_URL") {
            asana = asana.with_base_url(url);
        }

        let mut airtable = AirtableConfig::new(
            required("BASEID")?,
            required("TABLEID")?,
            required("AIRTABLETOKEN")?,
        );
        if let Some(url) = get("AIRTABLE_API_URL") {
            airtable = airtable.with_base_url(url);
        }

        let defaults = QueueConfig::default();
        let queue = QueueConfig::new()
            .with_delay(Duration::from_secs(parse_or(
                get("ENRICH_DELAY_SECS"),
                "ENRICH_DELAY_SECS",
                defaults.delay.as_secs(),
            )?))
            .with_max_concurrency(parse_or(
                get("ENRICH_MAX_CONCURRENCY"),
                "ENRICH_MAX_CONCURRENCY",
                defaults.max_concurrency,
            )?)
            .with_queue_depth(parse_or(
                get("ENRICH_QUEUE_DEPTH"),
                "ENRICH_QUEUE_DEPTH",
                defaults.queue_depth,
            )?);

        let mut custom_fields = CustomFieldMap::default();
        if let Some(locator) = get("CUSTOM_FIELD_PRIORITY") {
            custom_fields = custom_fields.with_priority(parse_locator(&locator, "CUSTOM_FIELD_PRIORITY")?);
        }
        if let Some(locator) = get("CUSTOM_FIELD_STATUS") {
            custom_fields = custom_fields.with_status(parse_locator(&locator, "CUSTOM_FIELD_STATUS")?);
        }
        if let Some(locator) = get("CUSTOM_FIELD_DESCRIPTION") {
            custom_fields =
                custom_fields.with_description(parse_locator(&locator, "CUSTOM_FIELD_DESCRIPTION")?);
        }

        let http_timeout = Duration::from_secs(parse_or(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", 30)?);

        Ok(Self {
            port,
            relay: RelayConfig::new(asana, airtable)
                .with_queue(queue)
                .with_custom_fields(custom_fields)
                .with_http_timeout(http_timeout),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v.parse().with_context(|| format!("{} has invalid value {:?}", key, v)),
        None => Ok(default),
    }
}

fn parse_locator(value: &str, key: &str) -> Result<FieldLocator> {
    FieldLocator::parse(value).with_context(|| format!("{} has invalid value {:?}", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("TOKEN", "asana-token"),
        ("BASEID", "appBase"),
        ("TABLEID", "Tasks"),
        ("AIRTABLETOKEN", "airtable-token"),
    ];

    #[test]
    fn test_minimal_config() {
        let config = ServerConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.relay.asana.token, "asana-token");
        assert_eq!(config.relay.asana.base_url, "https://app.asana.com/api/1.0");
        assert_eq!(config.relay.airtable.base_id, "appBase");
        assert_eq!(config.relay.airtable.table, "Tasks");
        assert_eq!(config.relay.queue.delay, Duration::from_secs(30));
        assert_eq!(config.relay.custom_fields, CustomFieldMap::default());
        assert_eq!(config.relay.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_required_variable_is_named() {
        let err = ServerConfig::from_lookup(lookup(&REQUIRED[..3])).unwrap_err();
        assert!(err.to_string().contains("AIRTABLETOKEN"));

        let mut blank = REQUIRED.to_vec();
        blank[0] = ("TOKEN", "  ");
        let err = ServerConfig::from_lookup(lookup(&blank)).unwrap_err();
        assert!(err.to_string().contains("TOKEN"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(&[
            ("PORT", "8080"),
            ("ASANA_API_URL", "http://localhost:1"),
            ("AIRTABLE_API_URL", "http://localhost:2"),
            ("ENRICH_DELAY_SECS", "0"),
            ("ENRICH_MAX_CONCURRENCY", "4"),
            ("ENRICH_QUEUE_DEPTH", "8"),
            ("CUSTOM_FIELD_PRIORITY", "Priority"),
            ("CUSTOM_FIELD_STATUS", "#3"),
            ("HTTP_TIMEOUT_SECS", "5"),
        ]);
        let config = ServerConfig::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.relay.asana.base_url, "http://localhost:1");
        assert_eq!(config.relay.airtable.base_url, "http://localhost:2");
        assert_eq!(config.relay.queue.delay, Duration::ZERO);
        assert_eq!(config.relay.queue.max_concurrency, 4);
        assert_eq!(config.relay.queue.queue_depth, 8);
        assert_eq!(
            config.relay.custom_fields.priority.locator,
            FieldLocator::Name("Priority".to_string())
        );
        assert_eq!(
            config.relay.custom_fields.status.locator,
            FieldLocator::Position(3)
        );
        assert_eq!(
            config.relay.custom_fields.description.locator,
            FieldLocator::Position(2)
        );
        assert_eq!(config.relay.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        let err = ServerConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CUSTOM_FIELD_STATUS", "#x"));
        let err = ServerConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("CUSTOM_FIELD_STATUS"));
    }
}
