//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_kendra::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// AWS error categories for existence checks and sweeping
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found (expected after deletion)
    #[error("Resource not found: {resource_type} '{resource_id}'")]
    NotFound {
        resource_type: &'static str,
        resource_id: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// Caller lacks permission for the operation
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Service or operation not offered to this account or region
    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// Resource is in use by another resource (e.g. role still assumed)
    #[error("Resource has dependent objects")]
    DependencyViolation,

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Throttled | AwsError::DependencyViolation)
    }

    /// Attach the resource that was being looked up to a not-found error
    pub fn for_resource(self, resource_type: &'static str, resource_id: &str) -> Self {
        match self {
            AwsError::NotFound { .. } => AwsError::NotFound {
                resource_type,
                resource_id: resource_id.to_string(),
            },
            other => other,
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["ResourceNotFoundException", "NoSuchEntity"];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "TooManyRequestsException"];

/// Known AWS error codes for permission failures
const ACCESS_DENIED_CODES: &[&str] = &["AccessDeniedException", "AccessDenied"];

/// Known AWS error codes for services not offered to the caller
const UNAVAILABLE_CODES: &[&str] = &[
    "SubscriptionRequiredException",
    "UnrecognizedClientException",
    "UnsupportedOperation",
    "ServiceQuotaExceededException",
];

/// Known AWS error codes for dependency violations (resource still in use)
const DEPENDENCY_CODES: &[&str] = &["DeleteConflict", "ConflictException"];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            resource_type: "resource",
            resource_id: message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        Some(c) if UNAVAILABLE_CODES.contains(&c) => AwsError::ServiceUnavailable { message },
        Some(c) if DEPENDENCY_CODES.contains(&c) => AwsError::DependencyViolation,
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK operation error.
///
/// Service errors carry a code and message. Transport failures (timeouts,
/// DNS, credentials) have neither, so the full error chain becomes the message.
pub fn classify_sdk_error<E>(err: &E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = match err.message() {
        Some(m) => m.to_string(),
        None => DisplayErrorContext(err).to_string(),
    };
    classify_aws_error(err.code(), Some(&message))
}

/// Treat "not found" as success, propagate everything else.
pub fn ignore_not_found(result: Result<(), AwsError>) -> Result<(), AwsError> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(err.is_retryable(), "Expected retryable for code: {code}");
            assert!(matches!(err, AwsError::Throttled));
        }
    }

    #[test]
    fn access_denied_codes() {
        for code in ACCESS_DENIED_CODES {
            let err = classify_aws_error(Some(code), Some("no kendra:DescribeIndex"));
            assert!(matches!(err, AwsError::AccessDenied { .. }));
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn unavailable_codes() {
        for code in UNAVAILABLE_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(matches!(err, AwsError::ServiceUnavailable { .. }));
        }
    }

    #[test]
    fn dependency_violation() {
        let err = classify_aws_error(Some("DeleteConflict"), Some("role in use"));
        assert!(err.is_retryable());
        assert!(matches!(err, AwsError::DependencyViolation));
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));

        let err3 = classify_aws_error(None, None);
        assert_eq!(err3.to_string(), "AWS error: Unknown error");
    }

    #[test]
    fn for_resource_only_rewrites_not_found() {
        let err = classify_aws_error(Some("ResourceNotFoundException"), Some("gone"))
            .for_resource("kendra index", "idx-1");
        assert_eq!(err.to_string(), "Resource not found: kendra index 'idx-1'");

        let err = AwsError::Throttled.for_resource("kendra index", "idx-1");
        assert!(matches!(err, AwsError::Throttled));
    }

    #[test]
    fn ignore_not_found_passes_other_errors() {
        let nf = classify_aws_error(Some("NoSuchEntity"), None);
        assert!(ignore_not_found(Err(nf)).is_ok());
        assert!(ignore_not_found(Err(AwsError::Throttled)).is_err());
        assert!(ignore_not_found(Ok(())).is_ok());
    }
}
