//! Error types for awsops
//!
//! All errors are derived from `thiserror`. A report generation either
//! completes fully or fails with one of these; there is no partial-result
//! salvage anywhere in the cost pipeline.

use thiserror::Error;

/// Boxed error used to carry vendor SDK failures through the boundary
/// traits without the core depending on the SDK crates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for awsops operations
#[derive(Error, Debug)]
pub enum AwsopsError {
    /// Malformed CLI-level input (e.g. `--months 0`)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure reaching the billing API (network, auth, throttling).
    /// Never retried at this layer; the caller decides on retry policy.
    #[error("billing API request failed: {0}")]
    Transport(#[source] BoxError),

    /// Failure reaching the compute API
    #[error("compute API request failed: {0}")]
    Compute(#[source] BoxError),

    /// A cost entry references an account id the directory does not know.
    /// Fatal for the current report; a silently mislabeled figure is worse
    /// than a hard failure.
    #[error("account id {0} missing from the account directory")]
    UnknownAccount(String),

    /// A monetary amount from the billing API did not parse as a decimal
    #[error("unparseable cost amount: {0}")]
    InvalidAmount(String),

    /// A billing record is structurally incomplete (missing period start
    /// or grouping keys)
    #[error("malformed billing record: {0}")]
    MalformedRecord(String),

    /// The pagination loop hit its safety cap without the upstream API
    /// ceasing to return continuation tokens
    #[error("billing API pagination exceeded {0} pages")]
    PaginationLimit(usize),

    /// Email building or SMTP delivery failure
    #[error("email delivery failed: {0}")]
    Email(String),

    /// Remote command execution failure
    #[error("remote command failed: {0}")]
    Remote(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in awsops
pub type Result<T> = std::result::Result<T, AwsopsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AwsopsError::UnknownAccount("123456789012".to_string());
        assert_eq!(
            error.to_string(),
            "account id 123456789012 missing from the account directory"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AwsopsError = io_error.into();
        assert!(matches!(err, AwsopsError::Io(_)));
    }
}
