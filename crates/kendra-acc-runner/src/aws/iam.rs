//! IAM role discovery and deletion for sweeping leftover fixtures
//!
//! Scenarios create their roles through terraform; this module only has to
//! find and remove the ones a crashed run left behind.

use super::context::{AwsContext, FromAwsContext};
use super::error::{AwsError, classify_sdk_error, ignore_not_found};
use anyhow::{Context, Result};
use aws_sdk_iam::Client;
use std::future::Future;
use tracing::{debug, info, warn};

/// IAM client for listing and deleting fixture roles
#[derive(Clone)]
pub struct IamClient {
    client: Client,
}

impl FromAwsContext for IamClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }
}

impl IamClient {
    /// Names of all roles starting with `prefix`
    pub async fn list_roles_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_roles()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))
                .context("Failed to list IAM roles")?;

            names.extend(
                resp.roles()
                    .iter()
                    .map(|r| r.role_name())
                    .filter(|name| name.starts_with(prefix))
                    .map(str::to_string),
            );

            match (resp.is_truncated(), resp.marker()) {
                (true, Some(m)) => marker = Some(m.to_string()),
                _ => break,
            }
        }

        debug!(prefix = %prefix, count = names.len(), "Listed IAM roles");
        Ok(names)
    }

    /// Delete a role after removing its inline policies
    pub async fn delete_role(&self, role_name: &str) -> Result<(), AwsError> {
        info!(role_name = %role_name, "Deleting IAM role");

        let policies = self
            .client
            .list_role_policies()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e).for_resource("iam role", role_name))?;

        for policy_name in policies.policy_names() {
            let result = self
                .client
                .delete_role_policy()
                .role_name(role_name)
                .policy_name(policy_name)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| classify_sdk_error(&e));

            // Already-removed policies are fine
            if let Err(e) = ignore_not_found(result) {
                warn!(
                    role_name = %role_name,
                    policy_name = %policy_name,
                    error = %e,
                    "Failed to delete role policy"
                );
                return Err(e);
            }
            debug!(role_name = %role_name, policy_name = %policy_name, "Inline policy deleted");
        }

        self.client
            .delete_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e).for_resource("iam role", role_name))?;

        info!(role_name = %role_name, "IAM role deleted");
        Ok(())
    }
}

/// Role operations used by the sweeper.
pub trait RoleApi: Send + Sync {
    /// Names of all roles starting with `prefix`
    fn list_roles_with_prefix(&self, prefix: &str)
    -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Delete a role and its inline policies
    fn delete_role(&self, role_name: &str) -> impl Future<Output = Result<(), AwsError>> + Send;
}

impl RoleApi for IamClient {
    async fn list_roles_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        IamClient::list_roles_with_prefix(self, prefix).await
    }

    async fn delete_role(&self, role_name: &str) -> Result<(), AwsError> {
        IamClient::delete_role(self, role_name).await
    }
}
