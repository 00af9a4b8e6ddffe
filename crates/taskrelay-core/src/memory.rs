// In-memory implementations for examples and testing
//
// These keep all data in memory so the relay can run without Asana or Airtable:
// - Unit and router tests
// - Local experiments

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::client::{RecordSink, TaskSource};
use crate::error::{RelayError, Result};
use crate::record::RecordFields;
use crate::task::TaskDetail;

// ============================================================================
// InMemoryTaskSource - Serves seeded tasks
// ============================================================================

/// In-memory task source
///
/// Unknown gids fail like a 404 from the read API. Every request is recorded.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTaskSource {
    tasks: Arc<RwLock<HashMap<String, TaskDetail>>>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl InMemoryTaskSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a task
    pub async fn seed(&self, gid: impl Into<String>, task: TaskDetail) {
        self.tasks.write().await.insert(gid.into(), task);
    }

    /// Gids requested so far, in order
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl TaskSource for InMemoryTaskSource {
    async fn fetch_task(&self, gid: &str) -> Result<TaskDetail> {
        self.requests.write().await.push(gid.to_string());
        self.tasks
            .read()
            .await
            .get(gid)
            .cloned()
            .ok_or_else(|| RelayError::task_source(format!("not found: task {}", gid)))
    }
}

// ============================================================================
// InMemoryRecordSink - Collects submitted rows
// ============================================================================

/// In-memory record sink
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordSink {
    records: Arc<RwLock<Vec<RecordFields>>>,
    failure: Option<String>,
}

impl InMemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every record with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Rows accepted so far
    pub async fn records(&self) -> Vec<RecordFields> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl RecordSink for InMemoryRecordSink {
    async fn create_record(&self, fields: &RecordFields) -> Result<serde_json::Value> {
        if let Some(message) = &self.failure {
            return Err(RelayError::record_sink(message.clone()));
        }

        let mut records = self.records.write().await;
        records.push(fields.clone());
        Ok(serde_json::json!({
            "records": [{ "id": format!("rec{}", records.len()), "fields": fields }]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_task_source_records_requests() {
        let source = InMemoryTaskSource::new();
        source
            .seed(
                "1",
                TaskDetail {
                    gid: Some("1".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(source.fetch_task("1").await.is_ok());
        assert!(matches!(
            source.fetch_task("2").await,
            Err(RelayError::TaskSource(_))
        ));
        assert_eq!(source.requests().await, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_failing_sink() {
        let sink = InMemoryRecordSink::failing("boom");
        let fields = RecordFields {
            id: "1".to_string(),
            name: "n".to_string(),
            assignee: "a".to_string(),
            priority: "p".to_string(),
            due_date: "d".to_string(),
            status: "s".to_string(),
            description: "x".to_string(),
        };
        assert!(sink.create_record(&fields).await.is_err());
        assert!(sink.records().await.is_empty());
    }
}
