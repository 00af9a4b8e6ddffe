// Webhook event envelope and canonical event selection
//
// Decision: Asana delivers one "task added" change as two records (project scope
// then section scope) carrying the same task gid. Only CANONICAL_EVENT_INDEX is
// processed. The ordering is an upstream assumption that nothing here verifies.
// Decision: Only the canonical record is decoded. Other entries may hold any
// JSON, and a canonical record that is null or does not decode is ignored.

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// Position of the record treated as canonical within `events`
pub const CANONICAL_EVENT_INDEX: usize = 1;

/// Parsed body of a signed delivery
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub events: Vec<serde_json::Value>,
}

/// Reference to an upstream resource (task, section, project...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub gid: Option<String>,
}

/// A single change event
///
/// Missing or null fields decode as `None` so that an unexpected record is
/// ignored rather than rejecting the whole delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub parent: Option<ResourceRef>,
    #[serde(default)]
    pub resource: Option<ResourceRef>,
}

impl EventRecord {
    /// The task gid if this record is a task being added to a section
    pub fn added_task_gid(&self) -> Option<&str> {
        if self.action.as_deref() != Some("added") {
            return None;
        }
        let parent = self.parent.as_ref()?;
        if parent.resource_type.as_deref() != Some("section") {
            return None;
        }
        let resource = self.resource.as_ref()?;
        if resource.resource_type.as_deref() != Some("task") {
            return None;
        }
        resource.gid.as_deref().filter(|gid| !gid.is_empty())
    }
}

/// Why a verified delivery produced no enrichment job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Fewer records than the canonical position requires, or null there
    NoCanonicalEvent { event_count: usize },
    /// Canonical record is not an event object
    UnreadableEvent { reason: String },
    /// Canonical record is not a task added to a section
    NotTaskAdded { action: Option<String> },
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnoreReason::NoCanonicalEvent { event_count } => {
                write!(f, "no event at position {} ({} events)", CANONICAL_EVENT_INDEX, event_count)
            }
            IgnoreReason::UnreadableEvent { reason } => {
                write!(f, "event at position {} is unreadable: {}", CANONICAL_EVENT_INDEX, reason)
            }
            IgnoreReason::NotTaskAdded { action } => {
                write!(f, "event is not a task added to a section (action {:?})", action)
            }
        }
    }
}

/// Result of inspecting an envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Task(String),
    Ignored(IgnoreReason),
}

impl EventEnvelope {
    /// Parse a delivery body
    pub fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| RelayError::malformed(format!("invalid event envelope: {}", e)))
    }

    /// Pick the task to enrich, if any
    pub fn select(&self) -> Selection {
        let event = match self.events.get(CANONICAL_EVENT_INDEX) {
            Some(event) if !event.is_null() => event,
            _ => {
                return Selection::Ignored(IgnoreReason::NoCanonicalEvent {
                    event_count: self.events.len(),
                })
            }
        };

        let record = match EventRecord::deserialize(event) {
            Ok(record) => record,
            Err(e) => {
                return Selection::Ignored(IgnoreReason::UnreadableEvent {
                    reason: e.to_string(),
                })
            }
        };

        match record.added_task_gid() {
            Some(gid) => Selection::Task(gid.to_string()),
            None => Selection::Ignored(IgnoreReason::NotTaskAdded {
                action: record.action.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(action: &str, parent: &str, resource: &str, gid: &str) -> serde_json::Value {
        json!({
            "action": action,
            "parent": { "resource_type": parent, "gid": "900" },
            "resource": { "resource_type": resource, "gid": gid }
        })
    }

    fn envelope(events: Vec<serde_json::Value>) -> EventEnvelope {
        let body = serde_json::to_vec(&json!({ "events": events })).unwrap();
        EventEnvelope::parse(&body).unwrap()
    }

    #[test]
    fn test_selects_second_record() {
        let env = envelope(vec![
            record("added", "project", "task", "123"),
            record("added", "section", "task", "123"),
        ]);
        assert_eq!(env.select(), Selection::Task("123".to_string()));
    }

    #[test]
    fn test_first_record_alone_is_ignored() {
        let env = envelope(vec![record("added", "section", "task", "123")]);
        assert_eq!(
            env.select(),
            Selection::Ignored(IgnoreReason::NoCanonicalEvent { event_count: 1 })
        );
    }

    #[test]
    fn test_empty_events_is_ignored() {
        let env = envelope(vec![]);
        assert_eq!(
            env.select(),
            Selection::Ignored(IgnoreReason::NoCanonicalEvent { event_count: 0 })
        );
    }

    #[test]
    fn test_wrong_action_is_ignored() {
        let env = envelope(vec![
            record("added", "project", "task", "123"),
            record("changed", "section", "task", "123"),
        ]);
        assert!(matches!(
            env.select(),
            Selection::Ignored(IgnoreReason::NotTaskAdded { action }) if action.as_deref() == Some("changed")
        ));
    }

    #[test]
    fn test_wrong_parent_or_resource_type_is_ignored() {
        let env = envelope(vec![
            record("added", "project", "task", "1"),
            record("added", "project", "task", "1"),
        ]);
        assert!(matches!(env.select(), Selection::Ignored(_)));

        let env = envelope(vec![
            record("added", "project", "task", "1"),
            record("added", "section", "story", "1"),
        ]);
        assert!(matches!(env.select(), Selection::Ignored(_)));
    }

    #[test]
    fn test_empty_gid_is_ignored() {
        let env = envelope(vec![
            record("added", "project", "task", ""),
            record("added", "section", "task", ""),
        ]);
        assert!(matches!(env.select(), Selection::Ignored(_)));
    }

    #[test]
    fn test_missing_fields_decode_and_are_ignored() {
        let env = envelope(vec![json!({}), json!({ "action": "added" })]);
        assert!(matches!(
            env.select(),
            Selection::Ignored(IgnoreReason::NotTaskAdded { .. })
        ));
    }

    #[test]
    fn test_other_entries_are_not_decoded() {
        let env = envelope(vec![
            json!({ "action": null, "parent": 7 }),
            record("added", "section", "task", "123"),
        ]);
        assert_eq!(env.select(), Selection::Task("123".to_string()));
    }

    #[test]
    fn test_null_fields_in_canonical_record_are_ignored() {
        let env = envelope(vec![
            json!({}),
            json!({
                "action": null,
                "parent": { "resource_type": null },
                "resource": { "resource_type": "task", "gid": "123" }
            }),
        ]);
        assert_eq!(
            env.select(),
            Selection::Ignored(IgnoreReason::NotTaskAdded { action: None })
        );
    }

    #[test]
    fn test_null_canonical_record_is_ignored() {
        let env = envelope(vec![record("added", "project", "task", "123"), json!(null)]);
        assert_eq!(
            env.select(),
            Selection::Ignored(IgnoreReason::NoCanonicalEvent { event_count: 2 })
        );
    }

    #[test]
    fn test_non_object_canonical_record_is_ignored() {
        let env = envelope(vec![json!({}), json!("added")]);
        assert!(matches!(
            env.select(),
            Selection::Ignored(IgnoreReason::UnreadableEvent { .. })
        ));

        let env = envelope(vec![json!({}), json!({ "action": 5 })]);
        assert!(matches!(
            env.select(),
            Selection::Ignored(IgnoreReason::UnreadableEvent { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_non_envelope() {
        assert!(EventEnvelope::parse(b"not json").is_err());
        assert!(EventEnvelope::parse(b"{}").is_err());
        assert!(EventEnvelope::parse(br#"{"events": 5}"#).is_err());
    }
}
