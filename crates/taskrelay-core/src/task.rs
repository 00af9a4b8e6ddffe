// Task detail as returned by the Asana read API
//
// Only the fields the relay forwards are modelled. Everything is optional:
// Asana sends explicit nulls for unset values (e.g. "assignee": null).

use serde::{Deserialize, Serialize};

/// Response wrapper for `GET /tasks/{gid}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub data: TaskDetail,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(default)]
    pub gid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assignee: Option<Assignee>,
    /// Due date as `YYYY-MM-DD`
    #[serde(default)]
    pub due_on: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<Vec<CustomField>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignee {
    #[serde(default)]
    pub gid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Project-defined attribute attached to a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(default)]
    pub gid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Human readable rendering (enum option name, number, ...)
    #[serde(default)]
    pub display_value: Option<String>,
    /// Raw value of text fields
    #[serde(default)]
    pub text_value: Option<String>,
}
