//! Post-step checks
//!
//! Checks are plain data so scenarios can be built, listed and rendered
//! without touching AWS. [`Check::run`] evaluates one against the state the
//! engine recorded and the live index API.

use crate::aws::{AwsError, IndexApi, delete_index_and_wait};
use crate::snapshot::SnapshotSlot;
use crate::wait::WaitConfig;
use kendra_acc_common::assertions::{check_attr, check_attr_pair, check_attr_set, primary_id};
use kendra_acc_common::{AssertionError, State};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Check failures
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Assertion(#[from] AssertionError),

    #[error("Describing Kendra Index ({id}): {source}")]
    Describe {
        id: String,
        #[source]
        source: AwsError,
    },

    #[error("{address}: no Kendra Index snapshot was recorded by an earlier check")]
    NoSnapshot { address: String },

    #[error("Kendra Index ({address}) recreated: id changed from {before} to {after}")]
    Recreated {
        address: String,
        before: String,
        after: String,
    },

    #[error("Kendra Index ({id}) changed since it was last described")]
    Changed { id: String },

    #[error("Kendra Index ({id}) name is {actual:?}, expected {expected:?}")]
    NameMismatch {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("Deleting Kendra Index ({id}) out of band: {source:#}")]
    Disappear {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Everything a check may read
pub struct CheckContext<'a, A> {
    pub state: &'a State,
    pub api: &'a A,
    /// Used when a check deletes the index itself
    pub deletion_wait: WaitConfig,
}

/// One post-step check
#[derive(Debug, Clone)]
pub enum Check {
    /// Fixed delay so new IAM roles become assumable by Kendra
    Sleep(Duration),
    /// Describe the index and record the response in `slot`
    IndexExists { address: String, slot: SnapshotSlot },
    /// The index id in state matches the one recorded in `slot`
    IndexNotRecreated { address: String, slot: SnapshotSlot },
    /// A fresh describe matches the snapshot recorded in `slot`
    IndexUnchanged { address: String, slot: SnapshotSlot },
    /// The snapshot recorded in `slot` for `address` carries `name`
    IndexNamed {
        address: String,
        slot: SnapshotSlot,
        name: String,
    },
    /// Delete the index behind the engine's back and wait until it is gone
    IndexDisappears { address: String },
    /// Attribute equals a literal value
    Attr {
        address: String,
        key: String,
        value: String,
    },
    /// Attribute is present and non-empty
    AttrSet { address: String, key: String },
    /// Attribute equals an attribute of another resource
    AttrPair {
        address: String,
        key: String,
        other_address: String,
        other_key: String,
    },
}

impl Check {
    pub fn attr(address: &str, key: &str, value: impl Into<String>) -> Self {
        Check::Attr {
            address: address.to_string(),
            key: key.to_string(),
            value: value.into(),
        }
    }

    pub fn attr_set(address: &str, key: &str) -> Self {
        Check::AttrSet {
            address: address.to_string(),
            key: key.to_string(),
        }
    }

    pub fn attr_pair(address: &str, key: &str, other_address: &str, other_key: &str) -> Self {
        Check::AttrPair {
            address: address.to_string(),
            key: key.to_string(),
            other_address: other_address.to_string(),
            other_key: other_key.to_string(),
        }
    }

    pub async fn run<A: IndexApi>(&self, ctx: &CheckContext<'_, A>) -> Result<(), CheckError> {
        match self {
            Check::Sleep(delay) => {
                debug!(
                    delay_secs = delay.as_secs(),
                    "Sleep to allow IAM role to become visible to Kendra"
                );
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            Check::IndexExists { address, slot } => {
                let id = primary_id(ctx.state, address)?;
                let snapshot = ctx
                    .api
                    .describe_index(id)
                    .await
                    .map_err(|source| CheckError::Describe {
                        id: id.to_string(),
                        source,
                    })?;
                debug!(
                    address = %address,
                    index_id = %id,
                    status = ?snapshot.status,
                    statistics = ?snapshot.statistics,
                    "Index exists"
                );
                slot.replace(snapshot).await;
                Ok(())
            }
            Check::IndexNotRecreated { address, slot } => {
                let before = slot.get().await.ok_or_else(|| CheckError::NoSnapshot {
                    address: address.clone(),
                })?;
                let after = primary_id(ctx.state, address)?;
                if before.id == after {
                    Ok(())
                } else {
                    Err(CheckError::Recreated {
                        address: address.clone(),
                        before: before.id,
                        after: after.to_string(),
                    })
                }
            }
            Check::IndexUnchanged { address, slot } => {
                let before = slot.get().await.ok_or_else(|| CheckError::NoSnapshot {
                    address: address.clone(),
                })?;
                let id = primary_id(ctx.state, address)?;
                let current = ctx
                    .api
                    .describe_index(id)
                    .await
                    .map_err(|source| CheckError::Describe {
                        id: id.to_string(),
                        source,
                    })?;
                if before.same_resource_as(&current) {
                    Ok(())
                } else {
                    Err(CheckError::Changed { id: id.to_string() })
                }
            }
            Check::IndexNamed {
                address,
                slot,
                name,
            } => {
                let snapshot = slot.get().await.ok_or_else(|| CheckError::NoSnapshot {
                    address: address.clone(),
                })?;
                if &snapshot.name == name {
                    Ok(())
                } else {
                    Err(CheckError::NameMismatch {
                        id: snapshot.id,
                        expected: name.clone(),
                        actual: snapshot.name,
                    })
                }
            }
            Check::IndexDisappears { address } => {
                let id = primary_id(ctx.state, address)?;
                delete_index_and_wait(ctx.api, id, ctx.deletion_wait.clone(), None)
                    .await
                    .map_err(|source| CheckError::Disappear {
                        id: id.to_string(),
                        source,
                    })
            }
            Check::Attr {
                address,
                key,
                value,
            } => Ok(check_attr(ctx.state, address, key, value)?),
            Check::AttrSet { address, key } => Ok(check_attr_set(ctx.state, address, key)?),
            Check::AttrPair {
                address,
                key,
                other_address,
                other_key,
            } => Ok(check_attr_pair(
                ctx.state,
                address,
                key,
                other_address,
                other_key,
            )?),
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Sleep(d) => write!(f, "sleep {}s", d.as_secs()),
            Check::IndexExists { address, .. } => write!(f, "exists {address}"),
            Check::IndexNotRecreated { address, .. } => write!(f, "not recreated {address}"),
            Check::IndexUnchanged { address, .. } => write!(f, "unchanged {address}"),
            Check::IndexNamed { address, name, .. } => write!(f, "{address} named {name}"),
            Check::IndexDisappears { address } => write!(f, "disappears {address}"),
            Check::Attr {
                address,
                key,
                value,
            } => write!(f, "{address}.{key} = {value:?}"),
            Check::AttrSet { address, key } => write!(f, "{address}.{key} is set"),
            Check::AttrPair {
                address,
                key,
                other_address,
                other_key,
            } => write!(f, "{address}.{key} = {other_address}.{other_key}"),
        }
    }
}
