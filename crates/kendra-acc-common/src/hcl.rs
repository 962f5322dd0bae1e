//! Terraform configuration rendering
//!
//! Every function here is a pure template over its arguments: identical
//! inputs always produce byte-identical text. User-supplied strings are
//! only ever emitted through [`quote`].

use crate::defaults::INDEX_ADDRESS;
use crate::policy;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Quote a string as an HCL string literal.
///
/// Escapes quotes, backslashes and control characters, and doubles the
/// template introducers `${` and `%{` so the value is never interpolated.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Concatenate configuration fragments into one configuration.
pub fn compose<S: AsRef<str>>(fragments: &[S]) -> String {
    fragments.iter().map(AsRef::as_ref).collect()
}

/// Render a JSON value as a `jsonencode(...)` expression.
///
/// HCL object constructors accept `:` separators, so pretty-printed JSON is
/// a valid expression. Continuation lines are indented by `indent`.
fn jsonencode(value: &Value, indent: &str) -> String {
    let pretty = format!("{:#}", value);
    let mut out = String::from("jsonencode(");
    for (i, line) in pretty.lines().enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(indent);
        }
        out.push_str(line);
    }
    out.push(')');
    out
}

/// The two IAM role fixtures an index can assume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleVariant {
    /// CloudWatch metrics and logs only
    CloudWatch,
    /// CloudWatch plus Secrets Manager and KMS decrypt
    SecretsManager,
}

impl RoleVariant {
    /// Local name of the `aws_iam_role` block
    pub fn local_name(self) -> &'static str {
        match self {
            RoleVariant::CloudWatch => "access_cw",
            RoleVariant::SecretsManager => "access_sm",
        }
    }

    /// Full resource address, e.g. `aws_iam_role.access_cw`
    pub fn address(self) -> String {
        format!("aws_iam_role.{}", self.local_name())
    }

    fn policy(self) -> Value {
        match self {
            RoleVariant::CloudWatch => policy::cloudwatch_access_policy(),
            RoleVariant::SecretsManager => policy::secrets_manager_access_policy(),
        }
    }
}

/// Provider requirements and configuration written next to every config.
pub fn provider_config(region: &str, provider_version: &str) -> String {
    format!(
        r#"terraform {{
  required_providers {{
    aws = {{
      source  = "hashicorp/aws"
      version = {version}
    }}
  }}
}}

provider "aws" {{
  region = {region}
}}
"#,
        version = quote(provider_version),
        region = quote(region),
    )
}

fn role_block(variant: RoleVariant, role_name: &str) -> String {
    let local = variant.local_name();
    format!(
        r#"
resource "aws_iam_role" "{local}" {{
  name               = {name}
  assume_role_policy = {trust}

  inline_policy {{
    name = "{local}"

    policy = {policy}
  }}
}}
"#,
        name = quote(role_name),
        trust = jsonencode(&policy::kendra_assume_role_policy(), "  "),
        policy = jsonencode(&variant.policy(), "    "),
    )
}

/// Shared fixtures: region/account data sources and both index roles.
pub fn base_config(cw_role: &str, sm_role: &str) -> String {
    compose(&[
        "\ndata \"aws_region\" \"current\" {}\ndata \"aws_caller_identity\" \"current\" {}\n"
            .to_string(),
        role_block(RoleVariant::CloudWatch, cw_role),
        role_block(RoleVariant::SecretsManager, sm_role),
    ])
}

/// Parameters of the `aws_kendra_index.test` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub description: String,
    pub role: RoleVariant,
    pub tags: BTreeMap<String, String>,
}

impl IndexSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, role: RoleVariant) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            role,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

fn index_block(spec: &IndexSpec) -> String {
    let (resource_type, local) = INDEX_ADDRESS
        .split_once('.')
        .unwrap_or((INDEX_ADDRESS, "test"));

    let mut out = format!(
        r#"
resource "{resource_type}" "{local}" {{
  name        = {name}
  description = {description}
  role_arn    = {role}.arn
"#,
        name = quote(&spec.name),
        description = quote(&spec.description),
        role = spec.role.address(),
    );

    if !spec.tags.is_empty() {
        out.push_str("\n  tags = {\n");
        for (key, value) in &spec.tags {
            let _ = writeln!(out, "    {} = {}", quote(key), quote(value));
        }
        out.push_str("  }\n");
    }

    out.push_str("}\n");
    out
}

/// Base fixtures plus the index under test.
pub fn index_config(cw_role: &str, sm_role: &str, spec: &IndexSpec) -> String {
    compose(&[base_config(cw_role, sm_role), index_block(spec)])
}
