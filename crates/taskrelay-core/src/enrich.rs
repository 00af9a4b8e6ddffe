// Fetch-normalize-forward for a single task

use std::sync::Arc;

use crate::client::{RecordSink, TaskSource};
use crate::error::Result;
use crate::fields::CustomFieldMap;
use crate::record::{normalize, RecordFields};

/// What a successful enrichment produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub fields: RecordFields,
    /// Custom fields that were not where the mapping expected them
    pub shape_warnings: Vec<String>,
}

/// Turns a task gid into a row in the destination table
pub struct Enricher {
    source: Arc<dyn TaskSource>,
    sink: Arc<dyn RecordSink>,
    custom_fields: CustomFieldMap,
}

impl Enricher {
    pub fn new(
        source: Arc<dyn TaskSource>,
        sink: Arc<dyn RecordSink>,
        custom_fields: CustomFieldMap,
    ) -> Self {
        Self {
            source,
            sink,
            custom_fields,
        }
    }

    /// Fetch the task, build exactly one record and submit it
    pub async fn enrich(&self, gid: &str) -> Result<EnrichmentReport> {
        let task = self.source.fetch_task(gid).await?;
        let normalized = normalize(gid, &task, &self.custom_fields);

        for warning in &normalized.shape_warnings {
            tracing::warn!(gid = %gid, warning = %warning, "Custom field shape mismatch, using placeholder");
        }

        tracing::info!(gid = %gid, record = ?normalized.fields, "Forwarding task record");
        let response = self.sink.create_record(&normalized.fields).await?;
        tracing::debug!(gid = %gid, response = %response, "Record created");

        Ok(EnrichmentReport {
            fields: normalized.fields,
            shape_warnings: normalized.shape_warnings,
        })
    }
}
