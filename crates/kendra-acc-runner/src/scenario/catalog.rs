//! The `aws_kendra_index` acceptance scenarios

use super::{Check, Scenario, Step};
use crate::snapshot::SnapshotSlot;
use clap::ValueEnum;
use kendra_acc_common::defaults::{DEFAULT_PROPAGATION_DELAY_SECS, INDEX_ADDRESS};
use kendra_acc_common::hcl::{base_config, index_config};
use kendra_acc_common::{IndexSpec, RoleVariant, ScenarioNames};
use std::time::Duration;

/// Scenario parameters that come from the command line
#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    /// Delay after the role fixtures are applied
    pub propagation_delay: Duration,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            propagation_delay: Duration::from_secs(DEFAULT_PROPAGATION_DELAY_SECS),
        }
    }
}

/// Available scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ScenarioKind {
    /// Create an index, check every attribute, import it
    Basic,
    /// Change the description in place
    UpdateDescription,
    /// Rename the index in place
    UpdateName,
    /// Swap the index role for the Secrets Manager one
    UpdateRoleArn,
    /// Delete the index out of band and expect drift
    Disappears,
}

impl ScenarioKind {
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::Basic,
            ScenarioKind::UpdateDescription,
            ScenarioKind::UpdateName,
            ScenarioKind::UpdateRoleArn,
            ScenarioKind::Disappears,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioKind::Basic => "basic",
            ScenarioKind::UpdateDescription => "update-description",
            ScenarioKind::UpdateName => "update-name",
            ScenarioKind::UpdateRoleArn => "update-role-arn",
            ScenarioKind::Disappears => "disappears",
        }
    }

    /// Build the scenario with freshly generated names
    pub fn build(self, settings: &ScenarioSettings) -> Scenario {
        self.build_with_names(ScenarioNames::generate(), settings)
    }

    pub fn build_with_names(self, names: ScenarioNames, settings: &ScenarioSettings) -> Scenario {
        let slot = SnapshotSlot::new();
        let b = Builder {
            names: &names,
            slot: &slot,
        };

        let steps = match self {
            ScenarioKind::Basic => {
                let description = "basic";
                let mut checks = vec![b.exists()];
                checks.extend(basic_attribute_checks(&names, description));
                vec![
                    b.base_step(settings),
                    Step::apply(b.config(&names.index, description, RoleVariant::CloudWatch), checks),
                    b.import(),
                ]
            }
            ScenarioKind::UpdateDescription => {
                let original = "original description";
                let updated = "updated description";
                vec![
                    b.base_step(settings),
                    Step::apply(
                        b.config(&names.index, original, RoleVariant::CloudWatch),
                        vec![b.exists(), Check::attr(INDEX_ADDRESS, "description", original)],
                    ),
                    b.import(),
                    Step::apply(
                        b.config(&names.index, updated, RoleVariant::CloudWatch),
                        vec![
                            b.not_recreated(),
                            b.exists(),
                            Check::attr(INDEX_ADDRESS, "description", updated),
                        ],
                    ),
                ]
            }
            ScenarioKind::UpdateName => {
                let description = "description";
                vec![
                    b.base_step(settings),
                    Step::apply(
                        b.config(&names.index, description, RoleVariant::CloudWatch),
                        vec![b.exists(), Check::attr(INDEX_ADDRESS, "name", &names.index)],
                    ),
                    b.import(),
                    Step::apply(
                        b.config(&names.index_renamed, description, RoleVariant::CloudWatch),
                        vec![
                            b.not_recreated(),
                            b.exists(),
                            Check::attr(INDEX_ADDRESS, "name", &names.index_renamed),
                            Check::IndexNamed {
                                address: INDEX_ADDRESS.to_string(),
                                slot: slot.clone(),
                                name: names.index_renamed.clone(),
                            },
                        ],
                    ),
                ]
            }
            ScenarioKind::UpdateRoleArn => {
                let description = "description";
                vec![
                    b.base_step(settings),
                    Step::apply(
                        b.config(&names.index, description, RoleVariant::CloudWatch),
                        vec![b.exists(), b.role_pair(RoleVariant::CloudWatch)],
                    ),
                    b.import(),
                    Step::apply(
                        b.config(&names.index, description, RoleVariant::SecretsManager),
                        vec![
                            b.not_recreated(),
                            b.exists(),
                            b.role_pair(RoleVariant::SecretsManager),
                        ],
                    ),
                ]
            }
            ScenarioKind::Disappears => {
                let description = "disappears";
                vec![
                    b.base_step(settings),
                    Step::apply(
                        b.config(&names.index, description, RoleVariant::CloudWatch),
                        vec![
                            b.exists(),
                            Check::IndexDisappears {
                                address: INDEX_ADDRESS.to_string(),
                            },
                        ],
                    )
                    .expect_non_empty_plan(),
                ]
            }
        };

        Scenario {
            name: self.as_str().to_string(),
            names,
            slot,
            steps,
        }
    }
}

/// Shorthand for the pieces every scenario shares
struct Builder<'a> {
    names: &'a ScenarioNames,
    slot: &'a SnapshotSlot,
}

impl Builder<'_> {
    /// Role fixtures alone, followed by the propagation delay
    fn base_step(&self, settings: &ScenarioSettings) -> Step {
        Step::apply(
            base_config(&self.names.cw_role, &self.names.sm_role),
            vec![Check::Sleep(settings.propagation_delay)],
        )
    }

    fn config(&self, index_name: &str, description: &str, role: RoleVariant) -> String {
        let spec = IndexSpec::new(index_name, description, role).with_tag("Key1", "Value1");
        index_config(&self.names.cw_role, &self.names.sm_role, &spec)
    }

    fn exists(&self) -> Check {
        Check::IndexExists {
            address: INDEX_ADDRESS.to_string(),
            slot: self.slot.clone(),
        }
    }

    fn not_recreated(&self) -> Check {
        Check::IndexNotRecreated {
            address: INDEX_ADDRESS.to_string(),
            slot: self.slot.clone(),
        }
    }

    fn import(&self) -> Step {
        Step::import_verify(
            INDEX_ADDRESS,
            vec![Check::IndexUnchanged {
                address: INDEX_ADDRESS.to_string(),
                slot: self.slot.clone(),
            }],
        )
    }

    fn role_pair(&self, role: RoleVariant) -> Check {
        Check::attr_pair(INDEX_ADDRESS, "role_arn", &role.address(), "arn")
    }
}

fn basic_attribute_checks(names: &ScenarioNames, description: &str) -> Vec<Check> {
    let a = INDEX_ADDRESS;
    vec![
        Check::attr_set(a, "arn"),
        Check::attr(a, "capacity_units.#", "1"),
        Check::attr(a, "capacity_units.0.query_capacity_units", "0"),
        Check::attr(a, "capacity_units.0.storage_capacity_units", "0"),
        Check::attr_set(a, "created_at"),
        Check::attr(a, "description", description),
        Check::attr(a, "document_metadata_configuration_updates.#", "13"),
        Check::attr(a, "edition", "ENTERPRISE_EDITION"),
        Check::attr(a, "index_statistics.#", "1"),
        Check::attr(a, "index_statistics.0.faq_statistics.#", "1"),
        Check::attr_set(a, "index_statistics.0.faq_statistics.0.indexed_question_answers_count"),
        Check::attr(a, "index_statistics.0.text_document_statistics.#", "1"),
        Check::attr_set(a, "index_statistics.0.text_document_statistics.0.indexed_text_bytes"),
        Check::attr_set(
            a,
            "index_statistics.0.text_document_statistics.0.indexed_text_documents_count",
        ),
        Check::attr(a, "name", &names.index),
        Check::attr_pair(a, "role_arn", &RoleVariant::CloudWatch.address(), "arn"),
        Check::attr(a, "status", "ACTIVE"),
        Check::attr_set(a, "updated_at"),
        Check::attr(a, "user_context_policy", "ATTRIBUTE_FILTER"),
        Check::attr(a, "user_group_resolution_configuration.#", "0"),
        Check::attr(a, "tags.%", "1"),
        Check::attr(a, "tags.Key1", "Value1"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> ScenarioNames {
        ScenarioNames {
            cw_role: "resource-test-terraform-1".into(),
            sm_role: "resource-test-terraform-2".into(),
            index: "resource-test-terraform-3".into(),
            index_renamed: "resource-test-terraform-4".into(),
        }
    }

    fn build(kind: ScenarioKind) -> Scenario {
        kind.build_with_names(names(), &ScenarioSettings::default())
    }

    #[test]
    fn every_scenario_starts_with_base_and_sleep() {
        for kind in ScenarioKind::all() {
            let scenario = build(*kind);
            let first = &scenario.steps[0];
            let config = first.config().unwrap();
            assert!(config.contains("resource \"aws_iam_role\" \"access_cw\""));
            assert!(!config.contains("aws_kendra_index"), "{}", scenario.name);
            assert!(matches!(first.checks(), [Check::Sleep(d)] if d.as_secs() == 30));
        }
    }

    #[test]
    fn basic_checks_every_attribute() {
        let scenario = build(ScenarioKind::Basic);
        assert_eq!(scenario.steps.len(), 3);
        let checks = scenario.steps[1].checks();
        assert!(matches!(checks[0], Check::IndexExists { .. }));
        assert_eq!(checks.len(), 23);
        assert!(matches!(scenario.steps[2], Step::Import { verify: true, .. }));

        let rendered: Vec<String> = checks.iter().map(ToString::to_string).collect();
        assert!(rendered.contains(
            &"aws_kendra_index.test.name = \"resource-test-terraform-3\"".to_string()
        ));
        assert!(rendered.contains(
            &"aws_kendra_index.test.role_arn = aws_iam_role.access_cw.arn".to_string()
        ));
    }

    #[test]
    fn update_name_renames_without_recreate() {
        let scenario = build(ScenarioKind::UpdateName);
        assert_eq!(scenario.steps.len(), 4);
        let before = scenario.steps[1].config().unwrap();
        let after = scenario.steps[3].config().unwrap();
        assert!(before.contains("\"resource-test-terraform-3\""));
        assert!(after.contains("\"resource-test-terraform-4\""));
        assert!(matches!(
            scenario.steps[3].checks()[0],
            Check::IndexNotRecreated { .. }
        ));
    }

    #[test]
    fn update_role_arn_swaps_role() {
        let scenario = build(ScenarioKind::UpdateRoleArn);
        let after = scenario.steps[3].config().unwrap();
        assert!(after.contains("role_arn    = aws_iam_role.access_sm.arn"));
        let rendered: Vec<String> = scenario.steps[3]
            .checks()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert!(rendered.contains(
            &"aws_kendra_index.test.role_arn = aws_iam_role.access_sm.arn".to_string()
        ));
    }

    #[test]
    fn update_description_changes_only_description() {
        let scenario = build(ScenarioKind::UpdateDescription);
        let before = scenario.steps[1].config().unwrap();
        let after = scenario.steps[3].config().unwrap();
        assert_eq!(
            before.replace("original description", "updated description"),
            after
        );
    }

    #[test]
    fn disappears_expects_drift() {
        let scenario = build(ScenarioKind::Disappears);
        assert_eq!(scenario.steps.len(), 2);
        assert!(matches!(
            scenario.steps[1],
            Step::Apply {
                expect_non_empty_plan: true,
                ..
            }
        ));
        assert!(matches!(
            scenario.steps[1].checks()[1],
            Check::IndexDisappears { .. }
        ));
    }

    #[test]
    fn checks_share_the_scenario_slot() {
        let scenario = build(ScenarioKind::UpdateName);
        for check in scenario.steps.iter().flat_map(Step::checks) {
            if let Check::IndexExists { slot, .. } | Check::IndexNotRecreated { slot, .. } = check {
                assert!(std::sync::Arc::ptr_eq(slot.inner(), scenario.slot.inner()));
            }
        }
    }

    #[test]
    fn names_match_value_enum() {
        for kind in ScenarioKind::all() {
            let value = kind.to_possible_value().unwrap();
            assert_eq!(value.get_name(), kind.as_str());
        }
    }

    #[test]
    fn propagation_delay_is_configurable() {
        let settings = ScenarioSettings {
            propagation_delay: Duration::from_secs(5),
        };
        let scenario = ScenarioKind::Basic.build_with_names(names(), &settings);
        assert!(matches!(scenario.steps[0].checks(), [Check::Sleep(d)] if d.as_secs() == 5));
    }
}
