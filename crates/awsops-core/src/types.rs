//! Core domain types for awsops
//!
//! Strongly-typed records for the billing API boundary. The vendor API
//! answers with dynamic, map-shaped documents; the `awsops-aws` crate
//! decodes those into the types below before anything downstream sees
//! them, so the aggregation pipeline never operates on untyped maps.

use serde::Serialize;
use std::fmt;

/// Strongly-typed billing account identifier
///
/// Wraps the opaque 12-digit linked-account id the billing API uses as a
/// grouping key. The [`AccountDirectory`](crate::accounts::AccountDirectory)
/// maps these to human-readable descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new AccountId from any string-like type
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One grouped cost figure inside a raw period record
///
/// `keys` holds the grouping-dimension values in request order: the
/// linked-account id first, then the service name when per-service
/// grouping was requested. `amount` stays a string until the aggregator
/// parses it as an exact decimal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostGroup {
    /// Grouping key values, account id first
    pub keys: Vec<String>,
    /// Monetary amount, verbatim from the wire
    pub amount: String,
    /// Currency unit, e.g. "USD"
    pub unit: String,
}

/// One raw per-period record from the billing API
///
/// `start`/`end` are ISO `YYYY-MM-DD` strings when the upstream response
/// carried a well-formed time period, `None` otherwise. A missing start
/// disables descending sorting for the whole fetch result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodRecord {
    /// Period start date (ISO), if present upstream
    pub start: Option<String>,
    /// Period end date (ISO), if present upstream
    pub end: Option<String>,
    /// Grouped cost figures for this period
    pub groups: Vec<CostGroup>,
}

/// One page of a paginated cost query
#[derive(Debug, Clone, Default)]
pub struct CostPage {
    /// Raw period records carried by this page
    pub records: Vec<PeriodRecord>,
    /// Continuation token; `None` terminates the pagination loop
    pub next_token: Option<String>,
}

/// One page of a dimension-value lookup
#[derive(Debug, Clone, Default)]
pub struct DimensionPage {
    /// `(account id, description)` pairs
    pub values: Vec<(String, String)>,
    /// Continuation token; `None` terminates the merge loop
    pub next_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id() {
        let id = AccountId::new("111111111111");
        assert_eq!(id.as_str(), "111111111111");
        assert_eq!(id.to_string(), "111111111111");
    }

    #[test]
    fn test_period_record_default() {
        let record = PeriodRecord::default();
        assert!(record.start.is_none());
        assert!(record.groups.is_empty());
    }
}
