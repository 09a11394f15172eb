//! awsops-core - the cost aggregation pipeline
//!
//! This crate implements everything between the billing API boundary and
//! the report sink:
//! - resolve CLI time selectors into a concrete date range
//! - build the linked-account directory for that range
//! - pull every page of grouped cost data
//! - fold the records into per-period, per-account summaries with exact
//!   decimal arithmetic
//!
//! The billing API itself is only a trait here ([`billing::BillingApi`]);
//! the AWS-backed implementation lives in `awsops-aws`, and tests run the
//! pipeline against scripted fakes.

pub mod accounts;
pub mod aggregation;
pub mod billing;
pub mod date_range;
pub mod error;
pub mod fetcher;
pub mod money;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use accounts::AccountDirectory;
pub use aggregation::{CostReport, PeriodLabel, PeriodicCostSummary, ServiceUsageCost};
pub use billing::{BillingApi, Grouping, COST_METRIC};
pub use date_range::{DateRange, PeriodSelector};
pub use error::{AwsopsError, BoxError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
