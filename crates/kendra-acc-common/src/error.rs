//! Typed errors for state parsing and attribute assertions

use thiserror::Error;

/// Failure to interpret the engine's recorded state
#[derive(Debug, Error)]
pub enum StateError {
    /// Output of `terraform show -json` was not valid JSON of the expected shape
    #[error("Failed to parse state: {0}")]
    Parse(#[from] serde_json::Error),

    /// A resource entry had a `values` field that was not an object
    #[error("Resource '{address}' has malformed values")]
    MalformedValues { address: String },
}

/// Attribute assertion failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionError {
    /// Resource address not present in state
    #[error("Not found: {address}")]
    ResourceNotFound { address: String },

    /// Resource has no primary id recorded
    #[error("{address}: no primary ID is set")]
    NoPrimaryId { address: String },

    /// Attribute missing where a value was expected
    #[error("{address}: Attribute '{key}' not found")]
    AttributeNotFound { address: String, key: String },

    /// Attribute value differs from the expected one
    #[error("{address}: Attribute '{key}' expected {expected:?}, got {actual:?}")]
    AttributeMismatch {
        address: String,
        key: String,
        expected: String,
        actual: String,
    },

    /// Attribute expected to be set but absent or empty
    #[error("{address}: Attribute '{key}' expected to be set")]
    AttributeNotSet { address: String, key: String },

    /// Attribute pair where the checked side is absent but the other is set
    #[error("{address}: Attribute '{key}' not set, but '{other_key}' is set in {other_address} as {other_value:?}")]
    PairFirstUnset {
        address: String,
        key: String,
        other_address: String,
        other_key: String,
        other_value: String,
    },

    /// Attribute pair where the checked side is set but the other is absent
    #[error("{address}: Attribute '{key}' is {value:?}, but '{other_key}' is not set in {other_address}")]
    PairSecondUnset {
        address: String,
        key: String,
        value: String,
        other_address: String,
        other_key: String,
    },

    /// Attribute pair with differing values
    #[error(
        "{address}: Attribute '{key}' expected {expected:?} (from {other_address}.{other_key}), got {actual:?}"
    )]
    PairMismatch {
        address: String,
        key: String,
        other_address: String,
        other_key: String,
        expected: String,
        actual: String,
    },

    /// Imported state differs from the applied state
    #[error("ImportStateVerify attributes not equivalent for {address}:\n{}", format_diffs(.diffs))]
    ImportMismatch {
        address: String,
        diffs: Vec<AttributeDiff>,
    },
}

/// One differing key between two flattened attribute maps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDiff {
    pub key: String,
    pub applied: Option<String>,
    pub imported: Option<String>,
}

fn format_diffs(diffs: &[AttributeDiff]) -> String {
    diffs
        .iter()
        .map(|d| {
            format!(
                "  {}: applied={:?} imported={:?}",
                d.key,
                d.applied.as_deref().unwrap_or("<absent>"),
                d.imported.as_deref().unwrap_or("<absent>"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AssertionError::ResourceNotFound {
                address: "aws_kendra_index.test".into()
            }
            .to_string(),
            "Not found: aws_kendra_index.test"
        );
        assert_eq!(
            AssertionError::AttributeMismatch {
                address: "aws_kendra_index.test".into(),
                key: "status".into(),
                expected: "ACTIVE".into(),
                actual: "CREATING".into(),
            }
            .to_string(),
            r#"aws_kendra_index.test: Attribute 'status' expected "ACTIVE", got "CREATING""#
        );
    }

    #[test]
    fn test_import_mismatch_lists_keys() {
        let err = AssertionError::ImportMismatch {
            address: "aws_kendra_index.test".into(),
            diffs: vec![
                AttributeDiff {
                    key: "description".into(),
                    applied: Some("a".into()),
                    imported: Some("b".into()),
                },
                AttributeDiff {
                    key: "tags.Key1".into(),
                    applied: Some("Value1".into()),
                    imported: None,
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains(r#"description: applied="a" imported="b""#));
        assert!(msg.contains(r#"tags.Key1: applied="Value1" imported="<absent>""#));
    }
}
