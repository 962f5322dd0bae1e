//! Kendra index lookups and out-of-band deletion

use super::context::{AwsContext, FromAwsContext};
use super::error::{AwsError, classify_sdk_error};
use crate::snapshot::{CapacityUnits, IndexSnapshot, IndexStatistics};
use crate::wait::{WaitConfig, wait_for_resource};
use anyhow::{Context, Result};
use aws_sdk_kendra::Client;
use aws_sdk_kendra::operation::describe_index::DescribeIndexOutput;
use aws_sdk_kendra::primitives::DateTime as SdkDateTime;
use chrono::{DateTime, Utc};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const RESOURCE_TYPE: &str = "kendra index";

/// Kendra client for reading and deleting indexes
#[derive(Clone)]
pub struct KendraClient {
    client: Client,
}

impl FromAwsContext for KendraClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.kendra_client(),
        }
    }
}

/// Summary of an index returned by ListIndices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub id: String,
    pub name: String,
}

fn to_chrono(dt: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

/// A response without an id yields an empty `id`, which never matches the
/// index that was asked for.
fn snapshot_from_output(out: &DescribeIndexOutput) -> IndexSnapshot {
    let capacity_units = out.capacity_units().map(|c| CapacityUnits {
        storage_capacity_units: c.storage_capacity_units(),
        query_capacity_units: c.query_capacity_units(),
    });

    let statistics = out.index_statistics().map(|s| IndexStatistics {
        indexed_question_answers_count: s
            .faq_statistics()
            .map(|f| f.indexed_question_answers_count())
            .unwrap_or_default(),
        indexed_text_documents_count: s
            .text_document_statistics()
            .map(|t| t.indexed_text_documents_count())
            .unwrap_or_default(),
        indexed_text_bytes: s
            .text_document_statistics()
            .map(|t| t.indexed_text_bytes())
            .unwrap_or_default(),
    });

    IndexSnapshot {
        id: out.id().unwrap_or_default().to_string(),
        name: out.name().unwrap_or_default().to_string(),
        description: out.description().map(str::to_string),
        role_arn: out.role_arn().map(str::to_string),
        edition: out.edition().map(|e| e.as_str().to_string()),
        status: out.status().map(|s| s.as_str().to_string()),
        created_at: out.created_at().and_then(to_chrono),
        updated_at: out.updated_at().and_then(to_chrono),
        capacity_units,
        statistics,
        user_context_policy: out.user_context_policy().map(|p| p.as_str().to_string()),
    }
}

impl KendraClient {
    /// Describe an index by id.
    ///
    /// Returns `AwsError::NotFound` once the index is gone.
    pub async fn describe_index(&self, id: &str) -> Result<IndexSnapshot, AwsError> {
        let out = self
            .client
            .describe_index()
            .id(id)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e).for_resource(RESOURCE_TYPE, id))?;

        Ok(snapshot_from_output(&out))
    }

    /// Request deletion of an index. Deletion continues asynchronously.
    pub async fn delete_index(&self, id: &str) -> Result<(), AwsError> {
        info!(index_id = %id, "Deleting Kendra index");
        self.client
            .delete_index()
            .id(id)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e).for_resource(RESOURCE_TYPE, id))?;
        Ok(())
    }

    /// List every index in the region
    pub async fn list_indices(&self) -> Result<Vec<IndexSummary>> {
        let mut indices = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_indices()
                .set_next_token(next_token.take())
                .max_results(100)
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))
                .context("Failed to list Kendra indices")?;

            for item in resp.index_configuration_summary_items() {
                if let (Some(id), Some(name)) = (item.id(), item.name()) {
                    indices.push(IndexSummary {
                        id: id.to_string(),
                        name: name.to_string(),
                    });
                }
            }

            match resp.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(count = indices.len(), "Listed Kendra indices");
        Ok(indices)
    }
}

/// Index operations the scenario checks depend on.
pub trait IndexApi: Send + Sync {
    /// Describe an index; `AwsError::NotFound` when it does not exist
    fn describe_index(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<IndexSnapshot, AwsError>> + Send;

    /// Start deleting an index
    fn delete_index(&self, id: &str) -> impl Future<Output = Result<(), AwsError>> + Send;

    /// Every index in the region
    fn list_indices(&self) -> impl Future<Output = Result<Vec<IndexSummary>>> + Send;
}

impl IndexApi for KendraClient {
    async fn describe_index(&self, id: &str) -> Result<IndexSnapshot, AwsError> {
        KendraClient::describe_index(self, id).await
    }

    async fn delete_index(&self, id: &str) -> Result<(), AwsError> {
        KendraClient::delete_index(self, id).await
    }

    async fn list_indices(&self) -> Result<Vec<IndexSummary>> {
        KendraClient::list_indices(self).await
    }
}

/// Delete an index and block until DescribeIndex reports it gone.
///
/// Cancelling `cancel` abandons the wait; the deletion itself has already
/// been requested.
pub async fn delete_index_and_wait<A: IndexApi>(
    api: &A,
    id: &str,
    wait: WaitConfig,
    cancel: Option<&CancellationToken>,
) -> Result<()> {
    api.delete_index(id)
        .await
        .with_context(|| format!("Failed to delete Kendra index {id}"))?;

    wait_for_resource(
        wait,
        cancel,
        || async move {
            match api.describe_index(id).await {
                Ok(snapshot) => {
                    debug!(index_id = %id, status = ?snapshot.status, "Index still present");
                    Ok(false)
                }
                Err(e) if e.is_not_found() => Ok(true),
                Err(e) if e.is_retryable() => Ok(false),
                Err(e) => Err(e.into()),
            }
        },
        "Kendra index deletion",
    )
    .await?;

    info!(index_id = %id, "Kendra index deleted");
    Ok(())
}
