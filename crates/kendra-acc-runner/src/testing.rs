//! Centralized test fixtures and fakes for the runner's unit tests.
//!
//! The fakes stand in for the terraform CLI and the AWS APIs so scenarios
//! can run end to end in memory.

use crate::aws::{AwsError, IndexApi, IndexSummary, RoleApi, classify_aws_error};
use crate::engine::{EngineError, PlanOutcome, ProvisioningEngine};
use crate::snapshot::IndexSnapshot;
use anyhow::Result;
use kendra_acc_common::defaults::{INDEX_ADDRESS, INDEX_RESOURCE_TYPE};
use kendra_acc_common::{ResourceState, State};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// State holding only `aws_kendra_index.test` with `id` plus `attrs`
pub fn index_state(id: &str, attrs: &[(&str, &str)]) -> State {
    let attributes = std::iter::once(("id", id)).chain(attrs.iter().copied());
    State::new(vec![ResourceState::managed(INDEX_ADDRESS, attributes)])
}

/// Add an `aws_iam_role.<local>` entry to `state`
pub fn with_role(state: State, local: &str, arn: &str) -> State {
    let mut resources = state.resources().to_vec();
    resources.push(ResourceState::managed(
        &format!("aws_iam_role.{local}"),
        [("id", local), ("arn", arn)],
    ));
    State::new(resources)
}

/// Snapshot the fake Kendra API reports for an applied index
fn mirrored_snapshot(index: &ResourceState) -> IndexSnapshot {
    IndexSnapshot {
        id: index.id().unwrap_or_default().to_string(),
        name: index.attribute("name").unwrap_or_default().to_string(),
        description: index.attribute("description").map(str::to_string),
        role_arn: index.attribute("role_arn").map(str::to_string),
        status: Some("ACTIVE".into()),
        ..Default::default()
    }
}

/// In-memory Kendra: a map of index id to snapshot
#[derive(Clone, Default)]
pub struct FakeIndexApi {
    indexes: Arc<Mutex<HashMap<String, IndexSnapshot>>>,
    describe_error: Arc<Mutex<Option<String>>>,
}

impl FakeIndexApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, snapshot: IndexSnapshot) {
        self.indexes
            .lock()
            .unwrap()
            .insert(snapshot.id.clone(), snapshot);
    }

    pub fn remove(&self, id: &str) {
        self.indexes.lock().unwrap().remove(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.indexes.lock().unwrap().contains_key(id)
    }

    /// Make every describe fail with the given AWS error code
    pub fn fail_describe_with_code(&self, code: &str) {
        *self.describe_error.lock().unwrap() = Some(code.to_string());
    }

    fn not_found(id: &str) -> AwsError {
        classify_aws_error(Some("ResourceNotFoundException"), Some("index not found"))
            .for_resource("kendra index", id)
    }
}

impl IndexApi for FakeIndexApi {
    async fn describe_index(&self, id: &str) -> Result<IndexSnapshot, AwsError> {
        if let Some(code) = self.describe_error.lock().unwrap().clone() {
            return Err(classify_aws_error(Some(&code), Some("injected failure")));
        }
        self.indexes
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn delete_index(&self, id: &str) -> Result<(), AwsError> {
        match self.indexes.lock().unwrap().remove(id) {
            Some(_) => Ok(()),
            None => Err(Self::not_found(id)),
        }
    }

    async fn list_indices(&self) -> Result<Vec<IndexSummary>> {
        let mut summaries: Vec<IndexSummary> = self
            .indexes
            .lock()
            .unwrap()
            .values()
            .map(|s| IndexSummary {
                id: s.id.clone(),
                name: s.name.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }
}

/// In-memory IAM: a list of role names
#[derive(Clone, Default)]
pub struct FakeRoleApi {
    roles: Arc<Mutex<Vec<String>>>,
}

impl FakeRoleApi {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: Arc::new(Mutex::new(roles.into_iter().map(Into::into).collect())),
        }
    }

    pub fn remaining(&self) -> Vec<String> {
        self.roles.lock().unwrap().clone()
    }
}

impl RoleApi for FakeRoleApi {
    async fn list_roles_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_role(&self, role_name: &str) -> Result<(), AwsError> {
        let mut roles = self.roles.lock().unwrap();
        match roles.iter().position(|r| r == role_name) {
            Some(i) => {
                roles.remove(i);
                Ok(())
            }
            None => Err(classify_aws_error(Some("NoSuchEntity"), Some(role_name))),
        }
    }
}

/// One call recorded by [`FakeEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Apply(String),
    Plan(String),
    Import {
        config: String,
        address: String,
        id: String,
    },
    Destroy(String),
}

#[derive(Default)]
struct FakeEngineInner {
    state: State,
    /// State produced by the nth successful apply; the last one repeats
    applied_states: Vec<State>,
    import_state: Option<State>,
    calls: Vec<EngineCall>,
    applies: usize,
    fail_apply: Option<(usize, String)>,
    fail_state: Option<String>,
    plan_changes: bool,
    plan_when_missing: Option<(FakeIndexApi, String)>,
    destroy_removes: Option<(FakeIndexApi, String)>,
    mirror: Option<FakeIndexApi>,
}

/// Scripted provisioning engine.
///
/// Applies move the state through a script (or keep a fixed one); plans are
/// empty unless told otherwise; destroy empties the state.
#[derive(Default)]
pub struct FakeEngine {
    inner: Mutex<FakeEngineInner>,
}

impl FakeEngine {
    /// Engine whose state is `state` from the start, whatever is applied
    pub fn new(state: State) -> Self {
        Self {
            inner: Mutex::new(FakeEngineInner {
                state,
                ..Default::default()
            }),
        }
    }

    /// Engine that starts empty; successful apply n records `states[n - 1]`
    pub fn with_states(states: Vec<State>) -> Self {
        Self {
            inner: Mutex::new(FakeEngineInner {
                applied_states: states,
                ..Default::default()
            }),
        }
    }

    /// Every applied index is published to `api` as an ACTIVE snapshot built
    /// from its `id`, `name`, `description` and `role_arn`; destroy removes them.
    pub fn mirror_to(&self, api: FakeIndexApi) {
        self.inner.lock().unwrap().mirror = Some(api);
    }

    /// Make every state read fail with `stderr`
    pub fn fail_state(&self, stderr: &str) {
        self.inner.lock().unwrap().fail_state = Some(stderr.to_string());
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Fail the `n`th apply (1-based) with `stderr`
    pub fn fail_apply_on(&self, n: usize, stderr: &str) {
        self.inner.lock().unwrap().fail_apply = Some((n, stderr.to_string()));
    }

    pub fn set_plan_changes(&self, changes: bool) {
        self.inner.lock().unwrap().plan_changes = changes;
    }

    /// State returned by import instead of the applied one
    pub fn set_import_state(&self, state: State) {
        self.inner.lock().unwrap().import_state = Some(state);
    }

    /// Plans show changes once `id` is gone from `api`
    pub fn plan_changes_when_missing(&self, api: FakeIndexApi, id: &str) {
        self.inner.lock().unwrap().plan_when_missing = Some((api, id.to_string()));
    }

    /// Destroy removes `id` from `api`
    pub fn on_destroy_remove(&self, api: FakeIndexApi, id: &str) {
        self.inner.lock().unwrap().destroy_removes = Some((api, id.to_string()));
    }
}

impl ProvisioningEngine for FakeEngine {
    async fn apply(&self, config: &str) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(EngineCall::Apply(config.to_string()));
        inner.applies += 1;
        let applies = inner.applies;
        if let Some((_, stderr)) = inner.fail_apply.as_ref().filter(|(n, _)| *n == applies) {
            return Err(EngineError::Failed {
                command: "terraform apply".to_string(),
                code: Some(1),
                stderr: stderr.clone(),
            });
        }

        let next = inner
            .applied_states
            .get(inner.applies - 1)
            .or(inner.applied_states.last())
            .cloned();
        if let Some(state) = next {
            inner.state = state;
        }
        if let Some(api) = &inner.mirror {
            for index in inner.state.resources_of_type(INDEX_RESOURCE_TYPE) {
                api.insert(mirrored_snapshot(index));
            }
        }
        Ok(())
    }

    async fn plan(&self, config: &str) -> Result<PlanOutcome, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(EngineCall::Plan(config.to_string()));
        let drifted = inner
            .plan_when_missing
            .as_ref()
            .is_some_and(|(api, id)| !api.contains(id));
        Ok(PlanOutcome {
            has_changes: inner.plan_changes || drifted,
        })
    }

    async fn state(&self) -> Result<State, EngineError> {
        let inner = self.inner.lock().unwrap();
        match &inner.fail_state {
            Some(stderr) => Err(EngineError::Failed {
                command: "terraform show -json".to_string(),
                code: Some(1),
                stderr: stderr.clone(),
            }),
            None => Ok(inner.state.clone()),
        }
    }

    async fn import(&self, config: &str, address: &str, id: &str) -> Result<State, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(EngineCall::Import {
            config: config.to_string(),
            address: address.to_string(),
            id: id.to_string(),
        });
        Ok(inner
            .import_state
            .clone()
            .unwrap_or_else(|| inner.state.clone()))
    }

    async fn destroy(&self, config: &str) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(EngineCall::Destroy(config.to_string()));
        if let Some((api, id)) = &inner.destroy_removes {
            api.remove(id);
        }
        if let Some(api) = &inner.mirror {
            for index in inner.state.resources_of_type(INDEX_RESOURCE_TYPE) {
                if let Some(id) = index.id() {
                    api.remove(id);
                }
            }
        }
        inner.state = State::default();
        Ok(())
    }
}
