//! awsops - Manage EC2 instances and AWS usage cost reports
//!
//! This crate provides the binary surface:
//! - CLI parsing and validation ([`cli`])
//! - console/JSON rendering of cost reports and instance listings
//!   ([`output`])
//! - SMTP delivery of rendered reports ([`email`])
//! - remote provisioning over the system ssh binary ([`remote`])
//!
//! The cost pipeline itself lives in `awsops-core`; the AWS-backed
//! collaborators live in `awsops-aws`.

pub mod cli;
pub mod email;
pub mod output;
pub mod remote;

// Re-export commonly used types
pub use awsops_core::{AwsopsError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
