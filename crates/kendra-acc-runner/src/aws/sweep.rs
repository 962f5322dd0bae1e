//! Prefix-based sweep of leftover scenario fixtures
//!
//! Every fixture a scenario creates carries the shared name prefix. A run
//! that crashed before teardown leaves them behind; the sweeper finds them
//! by name and deletes them in dependency order.

use super::iam::RoleApi;
use super::kendra::{IndexApi, delete_index_and_wait};
use crate::wait::WaitConfig;
use anyhow::Result;
use kendra_acc_common::SweepKind;
use kendra_acc_common::resource_kind::sort_for_cleanup;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Sweep configuration
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Only names starting with this prefix are touched
    pub prefix: String,
    /// Actually delete resources (false = dry run)
    pub dry_run: bool,
    /// How long to wait for each index deletion to finish
    pub deletion_timeout: Duration,
    /// Stops the sweep; fixtures not yet reached are left in place
    pub cancel: CancellationToken,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            prefix: kendra_acc_common::defaults::RESOURCE_PREFIX.to_string(),
            dry_run: true,
            deletion_timeout: Duration::from_secs(
                kendra_acc_common::defaults::DEFAULT_DELETION_TIMEOUT_SECS,
            ),
            cancel: CancellationToken::new(),
        }
    }
}

/// A leftover fixture found by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepTarget {
    pub kind: SweepKind,
    /// Index id or role name
    pub id: String,
    pub name: String,
}

/// Report of sweep operations
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub total_found: usize,
    pub indexes: usize,
    pub roles: usize,
    pub deleted: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Finds and deletes leftover indexes and roles
pub struct Sweeper<K, R> {
    indexes: K,
    roles: R,
}

impl<K: IndexApi, R: RoleApi> Sweeper<K, R> {
    pub fn new(indexes: K, roles: R) -> Self {
        Self { indexes, roles }
    }

    /// Discover fixtures matching the prefix, in deletion order
    pub async fn scan(&self, prefix: &str) -> Result<Vec<SweepTarget>> {
        let (indexes, roles) = tokio::join!(
            self.indexes.list_indices(),
            self.roles.list_roles_with_prefix(prefix),
        );

        let mut targets: Vec<SweepTarget> = indexes?
            .into_iter()
            .filter(|i| i.name.starts_with(prefix))
            .map(|i| SweepTarget {
                kind: SweepKind::KendraIndex,
                id: i.id,
                name: i.name,
            })
            .chain(roles?.into_iter().map(|name| SweepTarget {
                kind: SweepKind::IamRole,
                id: name.clone(),
                name,
            }))
            .collect();

        sort_for_cleanup(&mut targets, |t| t.kind);
        Ok(targets)
    }

    /// Scan and optionally delete leftover fixtures
    pub async fn sweep(&self, config: &SweepConfig) -> Result<SweepReport> {
        info!(prefix = %config.prefix, dry_run = config.dry_run, "Scanning for leftover fixtures");

        let targets = self.scan(&config.prefix).await?;
        let mut report = SweepReport {
            total_found: targets.len(),
            ..Default::default()
        };

        if targets.is_empty() {
            info!("No leftover fixtures found");
            return Ok(report);
        }

        for target in &targets {
            match target.kind {
                SweepKind::KendraIndex => report.indexes += 1,
                SweepKind::IamRole => report.roles += 1,
            }

            if config.dry_run {
                info!(kind = %target.kind, id = %target.id, name = %target.name, "[DRY RUN] Would delete");
                report.skipped += 1;
                continue;
            }

            if config.cancel.is_cancelled() {
                info!(kind = %target.kind, id = %target.id, "Sweep interrupted, leaving in place");
                report.skipped += 1;
                continue;
            }

            let result = match target.kind {
                SweepKind::KendraIndex => {
                    delete_index_and_wait(
                        &self.indexes,
                        &target.id,
                        WaitConfig::for_index_deletion(config.deletion_timeout),
                        Some(&config.cancel),
                    )
                    .await
                }
                SweepKind::IamRole => self
                    .roles
                    .delete_role(&target.id)
                    .await
                    .map_err(anyhow::Error::from),
            };

            match result {
                Ok(()) => {
                    info!(kind = %target.kind, id = %target.id, "Deleted");
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!(kind = %target.kind, id = %target.id, error = ?e, "Failed to delete");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::IndexSnapshot;
    use crate::testing::{FakeIndexApi, FakeRoleApi};

    fn index(id: &str, name: &str) -> IndexSnapshot {
        IndexSnapshot {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    fn fixtures() -> (FakeIndexApi, FakeRoleApi) {
        let indexes = FakeIndexApi::new();
        indexes.insert(index("idx-1", "resource-test-terraform-1"));
        indexes.insert(index("idx-2", "production-search"));
        let roles = FakeRoleApi::new(["resource-test-terraform-2", "admin"]);
        (indexes, roles)
    }

    fn config(dry_run: bool) -> SweepConfig {
        SweepConfig {
            dry_run,
            deletion_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn scan_filters_by_prefix_and_orders_indexes_first() {
        let (indexes, roles) = fixtures();
        let sweeper = Sweeper::new(indexes, roles);
        let targets = sweeper.scan("resource-test-terraform").await.unwrap();

        let kinds: Vec<_> = targets.iter().map(|t| (t.kind, t.id.as_str())).collect();
        assert_eq!(
            kinds,
            [
                (SweepKind::KendraIndex, "idx-1"),
                (SweepKind::IamRole, "resource-test-terraform-2"),
            ]
        );
    }

    #[tokio::test]
    async fn dry_run_deletes_nothing() {
        let (indexes, roles) = fixtures();
        let sweeper = Sweeper::new(indexes.clone(), roles.clone());
        let report = sweeper.sweep(&config(true)).await.unwrap();

        assert_eq!(report.total_found, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.deleted, 0);
        assert!(indexes.describe_index("idx-1").await.is_ok());
        assert_eq!(roles.remaining().len(), 2);
    }

    #[tokio::test]
    async fn execute_deletes_matching_fixtures() {
        let (indexes, roles) = fixtures();
        let sweeper = Sweeper::new(indexes.clone(), roles.clone());
        let report = sweeper.sweep(&config(false)).await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                total_found: 2,
                indexes: 1,
                roles: 1,
                deleted: 2,
                failed: 0,
                skipped: 0,
            }
        );
        assert!(indexes.describe_index("idx-1").await.unwrap_err().is_not_found());
        assert!(indexes.describe_index("idx-2").await.is_ok());
        assert_eq!(roles.remaining(), ["admin"]);
    }

    #[tokio::test]
    async fn cancelled_sweep_leaves_remaining_fixtures() {
        let (indexes, roles) = fixtures();
        let sweeper = Sweeper::new(indexes.clone(), roles.clone());
        let config = config(false);
        config.cancel.cancel();

        let report = sweeper.sweep(&config).await.unwrap();

        assert_eq!(report.total_found, 2);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.skipped, 2);
        assert!(indexes.describe_index("idx-1").await.is_ok());
        assert_eq!(roles.remaining().len(), 2);
    }

    #[tokio::test]
    async fn nothing_found() {
        let sweeper = Sweeper::new(FakeIndexApi::new(), FakeRoleApi::new(Vec::<String>::new()));
        let report = sweeper.sweep(&config(false)).await.unwrap();
        assert_eq!(report, SweepReport::default());
    }
}
