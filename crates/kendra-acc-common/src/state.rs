//! Recorded engine state
//!
//! Parsed from `terraform show -json`. Only the root module is considered;
//! each resource's values are flattened into dotted keys (see [`crate::flatmap`]).

use crate::error::StateError;
use crate::flatmap;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Whether a state entry is a managed resource or a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    Managed,
    Data,
}

/// One resource in the recorded state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceState {
    /// Full address, e.g. `aws_kendra_index.test`
    pub address: String,
    pub mode: ResourceMode,
    /// Resource type, e.g. `aws_kendra_index`
    pub resource_type: String,
    /// Local name, e.g. `test`
    pub name: String,
    /// Flattened attributes
    pub attributes: BTreeMap<String, String>,
}

impl ResourceState {
    /// Build a managed resource entry from an address such as `aws_iam_role.access_cw`.
    pub fn managed<I, K, V>(address: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (resource_type, name) = address.split_once('.').unwrap_or((address, ""));
        Self {
            address: address.to_string(),
            mode: ResourceMode::Managed,
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Primary identifier (`id` attribute), if recorded and non-empty
    pub fn id(&self) -> Option<&str> {
        self.attributes
            .get("id")
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Look up a flattened attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Snapshot of the engine's recorded state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    resources: Vec<ResourceState>,
}

#[derive(Deserialize)]
struct ShowOutput {
    values: Option<ShowValues>,
}

#[derive(Deserialize)]
struct ShowValues {
    root_module: Option<ShowModule>,
}

#[derive(Deserialize)]
struct ShowModule {
    #[serde(default)]
    resources: Vec<ShowResource>,
}

#[derive(Deserialize)]
struct ShowResource {
    address: String,
    mode: ResourceMode,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    values: serde_json::Value,
}

impl State {
    pub fn new(resources: Vec<ResourceState>) -> Self {
        Self { resources }
    }

    /// Parse the JSON printed by `terraform show -json`.
    ///
    /// An empty workspace prints no `values`; that parses to an empty state.
    pub fn from_show_json(json: &str) -> Result<Self, StateError> {
        let output: ShowOutput = serde_json::from_str(json)?;
        let resources = output
            .values
            .and_then(|v| v.root_module)
            .map(|m| m.resources)
            .unwrap_or_default();

        let resources = resources
            .into_iter()
            .map(|r| {
                let attributes = match &r.values {
                    serde_json::Value::Object(map) => flatmap::flatten(map),
                    serde_json::Value::Null => BTreeMap::new(),
                    _ => {
                        return Err(StateError::MalformedValues { address: r.address });
                    }
                };
                Ok(ResourceState {
                    address: r.address,
                    mode: r.mode,
                    resource_type: r.resource_type,
                    name: r.name,
                    attributes,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { resources })
    }

    /// Find a resource by address
    pub fn resource(&self, address: &str) -> Option<&ResourceState> {
        self.resources.iter().find(|r| r.address == address)
    }

    /// All managed resources of a given type
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a ResourceState> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.mode == ResourceMode::Managed && r.resource_type == resource_type)
    }

    pub fn resources(&self) -> &[ResourceState] {
        &self.resources
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
