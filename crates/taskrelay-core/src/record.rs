// Outbound Airtable record
//
// Decision: Column names are fixed by the destination table and serialized verbatim
// (note the space in "Due Date").

use serde::{Deserialize, Serialize};

use crate::fields::{CustomFieldMap, CustomFieldRule};
use crate::task::TaskDetail;

/// Placeholder for an unnamed task or empty description
pub const PLACEHOLDER_EMPTY: &str = "Empty";
/// Placeholder for a task without assignee
pub const PLACEHOLDER_UNASSIGNED: &str = "Yet To Be Assigned";
/// Placeholder for an unset enum custom field
pub const PLACEHOLDER_NOT_SELECTED: &str = "Not Selected";
/// Placeholder for a task without due date
pub const PLACEHOLDER_NOT_MENTIONED: &str = "Not Mentioned";

/// One row of the destination table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Assignee")]
    pub assignee: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Due Date")]
    pub due_date: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Description")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEntry {
    pub fields: RecordFields,
}

/// Body of `POST /{baseId}/{tableIdOrName}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecordsRequest {
    pub records: Vec<RecordEntry>,
}

impl CreateRecordsRequest {
    pub fn single(fields: RecordFields) -> Self {
        Self {
            records: vec![RecordEntry { fields }],
        }
    }
}

/// Normalized record plus any custom-field shape problems found on the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub fields: RecordFields,
    pub shape_warnings: Vec<String>,
}

fn or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(placeholder)
        .to_string()
}

/// Build the outbound row for a task, substituting placeholders for absent values
pub fn normalize(gid: &str, task: &TaskDetail, map: &CustomFieldMap) -> Normalized {
    let custom_fields = task.custom_fields.as_deref();
    let mut shape_warnings = Vec::new();

    let mut custom = |field: &'static str, rule: &CustomFieldRule| {
        match rule.extract(field, custom_fields) {
            Ok(value) => value,
            Err(miss) => {
                shape_warnings.push(miss.to_string());
                None
            }
        }
    };

    let priority = custom("priority", &map.priority);
    let status = custom("status", &map.status);
    let description = custom("description", &map.description);

    let fields = RecordFields {
        id: or_placeholder(task.gid.as_deref(), gid),
        name: or_placeholder(task.name.as_deref(), PLACEHOLDER_EMPTY),
        assignee: or_placeholder(
            task.assignee.as_ref().and_then(|a| a.name.as_deref()),
            PLACEHOLDER_UNASSIGNED,
        ),
        priority: or_placeholder(priority, PLACEHOLDER_NOT_SELECTED),
        due_date: or_placeholder(task.due_on.as_deref(), PLACEHOLDER_NOT_MENTIONED),
        status: or_placeholder(status, PLACEHOLDER_NOT_SELECTED),
        description: or_placeholder(description, PLACEHOLDER_EMPTY),
    };

    Normalized {
        fields,
        shape_warnings,
    }
}
