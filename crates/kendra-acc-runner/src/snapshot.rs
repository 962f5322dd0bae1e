//! Remote index snapshots and the slot checks share them through

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Provisioned capacity beyond the edition's baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapacityUnits {
    pub storage_capacity_units: i32,
    pub query_capacity_units: i32,
}

/// Document and FAQ counters reported by DescribeIndex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStatistics {
    pub indexed_question_answers_count: i32,
    pub indexed_text_documents_count: i32,
    pub indexed_text_bytes: i64,
}

/// Copy of one DescribeIndex response
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexSnapshot {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub role_arn: Option<String>,
    /// `DEVELOPER_EDITION`, `ENTERPRISE_EDITION`, ...
    pub edition: Option<String>,
    /// `CREATING`, `ACTIVE`, `DELETING`, `FAILED`, `UPDATING`, ...
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub capacity_units: Option<CapacityUnits>,
    pub statistics: Option<IndexStatistics>,
    pub user_context_policy: Option<String>,
}

impl IndexSnapshot {
    /// Whether `other` describes the same, unmodified index.
    ///
    /// Counters and `updated_at` are excluded: they move on their own.
    pub fn same_resource_as(&self, other: &IndexSnapshot) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.description == other.description
            && self.role_arn == other.role_arn
            && self.edition == other.edition
            && self.created_at == other.created_at
            && self.capacity_units == other.capacity_units
            && self.user_context_policy == other.user_context_policy
    }
}

/// Last observed snapshot, shared between the checks of one scenario.
///
/// Each exists-check replaces the contents wholesale; later checks read it.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSlot(Arc<RwLock<Option<IndexSnapshot>>>);

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace(&self, snapshot: IndexSnapshot) {
        *self.0.write().await = Some(snapshot);
    }

    pub async fn get(&self) -> Option<IndexSnapshot> {
        self.0.read().await.clone()
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &Arc<RwLock<Option<IndexSnapshot>>> {
        &self.0
    }
}
