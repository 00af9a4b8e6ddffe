// Custom field mapping
//
// Asana exposes project-specific attributes as an ordered custom_fields list.
// Decision: Locate each logical field through a configurable table rather than
// hard-coded indices. A locator is either a position ("#0") or a field name.
// Decision: A missing shape (no list, index out of range, unknown name) is
// reported as a ShapeMiss so callers can log it; the value falls back to the
// placeholder.

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};
use crate::task::CustomField;

/// Where to find a custom field within a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldLocator {
    Position(usize),
    Name(String),
}

impl FieldLocator {
    /// Parse `#N` as a position, anything else as a field name
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RelayError::config("custom field locator must not be empty"));
        }
        match s.strip_prefix('#') {
            Some(index) => index.parse().map(FieldLocator::Position).map_err(|_| {
                RelayError::config(format!("invalid custom field position: {:?}", s))
            }),
            None => Ok(FieldLocator::Name(s.to_string())),
        }
    }
}

impl std::fmt::Display for FieldLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldLocator::Position(i) => write!(f, "#{}", i),
            FieldLocator::Name(name) => write!(f, "{:?}", name),
        }
    }
}

/// Which property of the custom field carries the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    DisplayValue,
    TextValue,
}

/// Locator plus value kind for one logical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldRule {
    pub locator: FieldLocator,
    pub value: ValueKind,
}

/// The expected custom field is not where the rule says it is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMiss {
    pub field: &'static str,
    pub reason: String,
}

impl std::fmt::Display for ShapeMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl CustomFieldRule {
    pub fn new(locator: FieldLocator, value: ValueKind) -> Self {
        Self { locator, value }
    }

    /// Find the field and return its raw value.
    ///
    /// `Ok(None)` means the field exists but has no value set.
    pub fn extract<'a>(
        &self,
        field: &'static str,
        custom_fields: Option<&'a [CustomField]>,
    ) -> std::result::Result<Option<&'a str>, ShapeMiss> {
        let Some(custom_fields) = custom_fields else {
            return Err(ShapeMiss {
                field,
                reason: "task has no custom_fields".to_string(),
            });
        };

        let found = match &self.locator {
            FieldLocator::Position(i) => custom_fields.get(*i),
            FieldLocator::Name(name) => custom_fields
                .iter()
                .find(|f| f.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name))),
        };

        let Some(found) = found else {
            return Err(ShapeMiss {
                field,
                reason: format!(
                    "no custom field at {} ({} present)",
                    self.locator,
                    custom_fields.len()
                ),
            });
        };

        let value = match self.value {
            ValueKind::DisplayValue => found.display_value.as_deref(),
            ValueKind::TextValue => found.text_value.as_deref(),
        };
        Ok(value)
    }
}

/// Mapping from forwarded columns to task custom fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldMap {
    pub priority: CustomFieldRule,
    pub status: CustomFieldRule,
    pub description: CustomFieldRule,
}

impl Default for CustomFieldMap {
    fn default() -> Self {
        Self {
            priority: CustomFieldRule::new(FieldLocator::Position(0), ValueKind::DisplayValue),
            status: CustomFieldRule::new(FieldLocator::Position(1), ValueKind::DisplayValue),
            description: CustomFieldRule::new(FieldLocator::Position(2), ValueKind::TextValue),
        }
    }
}

impl CustomFieldMap {
    pub fn with_priority(mut self, locator: FieldLocator) -> Self {
        self.priority.locator = locator;
        self
    }

    pub fn with_status(mut self, locator: FieldLocator) -> Self {
        self.status.locator = locator;
        self
    }

    pub fn with_description(mut self, locator: FieldLocator) -> Self {
        self.description.locator = locator;
        self
    }
}
