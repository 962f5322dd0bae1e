//! Attribute assertions over recorded state
//!
//! Pure functions: they read a [`State`] and either succeed or describe the
//! mismatch. No I/O happens here.

use crate::error::{AssertionError, AttributeDiff};
use crate::state::{ResourceState, State};
use std::collections::BTreeSet;

/// Keys that an import never reproduces and is not expected to
const IMPORT_ALWAYS_IGNORED: &[&str] = &["timeouts"];

fn lookup<'a>(state: &'a State, address: &str) -> Result<&'a ResourceState, AssertionError> {
    state
        .resource(address)
        .ok_or_else(|| AssertionError::ResourceNotFound {
            address: address.to_string(),
        })
}

/// Primary id of the resource at `address`
pub fn primary_id<'a>(state: &'a State, address: &str) -> Result<&'a str, AssertionError> {
    lookup(state, address)?
        .id()
        .ok_or_else(|| AssertionError::NoPrimaryId {
            address: address.to_string(),
        })
}

fn is_count_key(key: &str) -> bool {
    key.ends_with(".#") || key.ends_with(".%")
}

/// Attribute `key` of `address` equals `expected`.
///
/// An absent collection count is accepted as `"0"`.
pub fn check_attr(
    state: &State,
    address: &str,
    key: &str,
    expected: &str,
) -> Result<(), AssertionError> {
    let resource = lookup(state, address)?;
    match resource.attribute(key) {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(AssertionError::AttributeMismatch {
            address: address.to_string(),
            key: key.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
        None if expected == "0" && is_count_key(key) => Ok(()),
        None => Err(AssertionError::AttributeNotFound {
            address: address.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Attribute `key` of `address` is present and non-empty.
pub fn check_attr_set(state: &State, address: &str, key: &str) -> Result<(), AssertionError> {
    let resource = lookup(state, address)?;
    match resource.attribute(key) {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(AssertionError::AttributeNotSet {
            address: address.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Attribute `key` of `address` equals attribute `other_key` of `other_address`.
///
/// Both absent counts as equal.
pub fn check_attr_pair(
    state: &State,
    address: &str,
    key: &str,
    other_address: &str,
    other_key: &str,
) -> Result<(), AssertionError> {
    let first = lookup(state, address)?.attribute(key);
    let second = lookup(state, other_address)?.attribute(other_key);

    match (first, second) {
        (None, None) => Ok(()),
        (None, Some(other_value)) => Err(AssertionError::PairFirstUnset {
            address: address.to_string(),
            key: key.to_string(),
            other_address: other_address.to_string(),
            other_key: other_key.to_string(),
            other_value: other_value.to_string(),
        }),
        (Some(value), None) => Err(AssertionError::PairSecondUnset {
            address: address.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            other_address: other_address.to_string(),
            other_key: other_key.to_string(),
        }),
        (Some(a), Some(b)) if a == b => Ok(()),
        (Some(a), Some(b)) => Err(AssertionError::PairMismatch {
            address: address.to_string(),
            key: key.to_string(),
            other_address: other_address.to_string(),
            other_key: other_key.to_string(),
            expected: b.to_string(),
            actual: a.to_string(),
        }),
    }
}

fn ignored(key: &str, ignore: &[&str]) -> bool {
    IMPORT_ALWAYS_IGNORED
        .iter()
        .chain(ignore)
        .any(|prefix| key == *prefix || key.starts_with(&format!("{}.", prefix)))
}

/// Compare the applied and imported attributes of one resource.
///
/// Keys equal to, or nested under, any prefix in `ignore` are skipped.
pub fn verify_import(
    applied: &ResourceState,
    imported: &ResourceState,
    ignore: &[&str],
) -> Result<(), AssertionError> {
    let keys: BTreeSet<&String> = applied
        .attributes
        .keys()
        .chain(imported.attributes.keys())
        .collect();

    let diffs: Vec<AttributeDiff> = keys
        .into_iter()
        .filter(|k| !ignored(k, ignore))
        .filter_map(|k| {
            let a = applied.attributes.get(k);
            let b = imported.attributes.get(k);
            (a != b).then(|| AttributeDiff {
                key: k.clone(),
                applied: a.cloned(),
                imported: b.cloned(),
            })
        })
        .collect();

    if diffs.is_empty() {
        Ok(())
    } else {
        Err(AssertionError::ImportMismatch {
            address: applied.address.clone(),
            diffs,
        })
    }
}
