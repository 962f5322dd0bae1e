//! IAM policy documents for the index role fixtures
//!
//! See <https://docs.aws.amazon.com/kendra/latest/dg/iam-roles.html>.
//! ARNs reference the current region and account through HCL interpolation,
//! so the documents are only meaningful once embedded in rendered config.

use serde_json::{Value, json};

/// Interpolation for the region of the current provider
pub const REGION_REF: &str = "${data.aws_region.current.name}";

/// Interpolation for the account id of the current credentials
pub const ACCOUNT_REF: &str = "${data.aws_caller_identity.current.account_id}";

/// Trust policy allowing Kendra to assume the role
pub fn kendra_assume_role_policy() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": {
                    "Service": "kendra.amazonaws.com"
                },
                "Action": "sts:AssumeRole"
            }
        ]
    })
}

fn log_group_arn() -> String {
    format!(
        "arn:aws:logs:{}:{}:log-group:/aws/kendra/*",
        REGION_REF, ACCOUNT_REF
    )
}

/// Statements every index role needs: CloudWatch metrics and Kendra log groups
fn cloudwatch_statements() -> Vec<Value> {
    vec![
        json!({
            "Action": ["cloudwatch:PutMetricData"],
            "Effect": "Allow",
            "Resource": "*",
            "Condition": {
                "StringEquals": {
                    "cloudwatch:namespace": "Kendra"
                }
            }
        }),
        json!({
            "Action": ["logs:DescribeLogGroups"],
            "Effect": "Allow",
            "Resource": "*"
        }),
        json!({
            "Action": ["logs:CreateLogGroup"],
            "Effect": "Allow",
            "Resource": log_group_arn()
        }),
        json!({
            "Action": [
                "logs:DescribeLogStreams",
                "logs:CreateLogStream",
                "logs:PutLogEvents"
            ],
            "Effect": "Allow",
            "Resource": format!("{}:log-stream:*", log_group_arn())
        }),
    ]
}

/// Inline policy for the CloudWatch-only role
pub fn cloudwatch_access_policy() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": cloudwatch_statements()
    })
}

/// Inline policy for the role that can also read a secret and decrypt it
pub fn secrets_manager_access_policy() -> Value {
    let mut statements = cloudwatch_statements();
    statements.push(json!({
        "Action": ["secretsmanager:GetSecretValue"],
        "Effect": "Allow",
        "Resource": format!(
            "arn:aws:secretsmanager:{}:{}:secret:example",
            REGION_REF, ACCOUNT_REF
        )
    }));
    statements.push(json!({
        "Action": ["kms:Decrypt"],
        "Effect": "Allow",
        "Resource": format!("arn:aws:kms:{}:{}:key/example", REGION_REF, ACCOUNT_REF),
        "Condition": {
            "StringLike": {
                "kms:ViaService": ["secretsmanager.*.amazonaws.com"]
            }
        }
    }));

    json!({
        "Version": "2012-10-17",
        "Statement": statements
    })
}
