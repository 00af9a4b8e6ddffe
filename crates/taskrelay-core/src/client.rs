// Outbound API clients
//
// Decision: The enricher talks to TaskSource and RecordSink traits so tests and
// alternative backends can stand in for Asana and Airtable.
// Decision: Clients share one reqwest::Client built by the caller (timeouts, TLS).

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::{AirtableConfig, AsanaConfig};
use crate::error::{RelayError, Result};
use crate::record::{CreateRecordsRequest, RecordFields};
use crate::task::{TaskDetail, TaskResponse};

/// Read side: fetch task detail by gid
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn fetch_task(&self, gid: &str) -> Result<TaskDetail>;
}

/// Write side: append one row to the destination table
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Returns the destination's response body
    async fn create_record(&self, fields: &RecordFields) -> Result<serde_json::Value>;
}

/// Asana REST client (read only)
pub struct AsanaClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl AsanaClient {
    pub fn new(http: reqwest::Client, config: &AsanaConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl TaskSource for AsanaClient {
    async fn fetch_task(&self, gid: &str) -> Result<TaskDetail> {
        let url = format!("{}/tasks/{}", self.base_url, gid);
        tracing::debug!(gid = %gid, "Fetching task detail");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| RelayError::task_source(format!("request failed: {}", e)))?;

        let body: TaskResponse = read_json(response)
            .await
            .map_err(|msg| RelayError::task_source(format!("task {}: {}", gid, msg)))?;
        Ok(body.data)
    }
}

/// Airtable REST client (create records)
pub struct AirtableClient {
    http: reqwest::Client,
    url: String,
    token: String,
}

impl AirtableClient {
    pub fn new(http: reqwest::Client, config: &AirtableConfig) -> Self {
        let url = format!(
            "{}/{}/{}",
            config.base_url.trim_end_matches('/'),
            config.base_id,
            config.table
        );
        Self {
            http,
            url,
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl RecordSink for AirtableClient {
    async fn create_record(&self, fields: &RecordFields) -> Result<serde_json::Value> {
        let body = CreateRecordsRequest::single(fields.clone());

        // .json() also sets Content-Type: application/json
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::record_sink(format!("request failed: {}", e)))?;

        read_json(response).await.map_err(RelayError::record_sink)
    }
}

/// Decode a successful JSON response or describe the failure
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> std::result::Result<T, String> {
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                format!("not authorized ({}): {}", status.as_u16(), message)
            }
            StatusCode::NOT_FOUND => format!("not found: {}", message),
            _ => format!("API error ({}): {}", status.as_u16(), message),
        });
    }

    response
        .json()
        .await
        .map_err(|e| format!("invalid response body: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn asana(server: &MockServer) -> AsanaClient {
        AsanaClient::new(
            reqwest::Client::new(),
            &AsanaConfig::new("asana-token").with_base_url(server.uri()),
        )
    }

    fn airtable(server: &MockServer) -> AirtableClient {
        AirtableClient::new(
            reqwest::Client::new(),
            &AirtableConfig::new("appBase", "tblTasks", "airtable-token").with_base_url(server.uri()),
        )
    }

    fn fields() -> RecordFields {
        RecordFields {
            id: "123".to_string(),
            name: "Write report".to_string(),
            assignee: "Yet To Be Assigned".to_string(),
            priority: "High".to_string(),
            due_date: "Not Mentioned".to_string(),
            status: "Not Selected".to_string(),
            description: "Empty".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_task_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/123"))
            .and(header("authorization", "Bearer asana-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "gid": "123", "name": "Write report", "assignee": null }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let task = asana(&server).fetch_task("123").await.unwrap();
        assert_eq!(task.gid.as_deref(), Some("123"));
        assert_eq!(task.name.as_deref(), Some("Write report"));
        assert!(task.assignee.is_none());
    }

    #[tokio::test]
    async fn test_fetch_task_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/404"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = asana(&server).fetch_task("404").await.unwrap_err();
        assert!(matches!(err, RelayError::TaskSource(ref msg) if msg.contains("not found")));
    }

    #[tokio::test]
    async fn test_fetch_task_invalid_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = asana(&server).fetch_task("1").await.unwrap_err();
        assert!(matches!(err, RelayError::TaskSource(_)));
    }

    #[tokio::test]
    async fn test_create_record_posts_single_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/appBase/tblTasks"))
            .and(header("authorization", "Bearer airtable-token"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "records": [{
                    "fields": {
                        "ID": "123",
                        "Name": "Write report",
                        "Assignee": "Yet To Be Assigned",
                        "Priority": "High",
                        "Due Date": "Not Mentioned",
                        "Status": "Not Selected",
                        "Description": "Empty"
                    }
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [{ "id": "rec1", "fields": {} }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = airtable(&server).create_record(&fields()).await.unwrap();
        assert_eq!(response["records"][0]["id"], "rec1");
    }

    #[tokio::test]
    async fn test_create_record_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = airtable(&server).create_record(&fields()).await.unwrap_err();
        assert!(matches!(err, RelayError::RecordSink(ref msg) if msg.contains("not authorized")));
    }
}
