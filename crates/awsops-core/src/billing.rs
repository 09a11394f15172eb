//! Billing API boundary trait
//!
//! The cost pipeline talks to the metered-billing service only through
//! this trait, so the whole pipeline can be exercised against scripted
//! fakes. The production implementation lives in `awsops-aws`.

use async_trait::async_trait;

use crate::date_range::DateRange;
use crate::error::Result;
use crate::types::{CostPage, DimensionPage};

/// The single cost metric every query requests
pub const COST_METRIC: &str = "BlendedCost";

/// Grouping dimensions for a cost query
///
/// Costs are always bucketed by linked account; the service dimension is
/// added unless the caller asked to ignore per-service usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Group by linked account only
    ByAccount,
    /// Group by linked account, then by service
    ByAccountAndService,
}

impl Grouping {
    /// Whether cost groups carry a service name as their second key
    pub fn includes_service(&self) -> bool {
        matches!(self, Self::ByAccountAndService)
    }
}

/// Interface to the metered-billing API.
///
/// Both operations are single-page calls; pagination is driven by the
/// caller carrying `next_token` forward. Transport and auth failures
/// surface as [`AwsopsError::Transport`](crate::error::AwsopsError) and
/// are never retried at this layer.
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Fetch one page of grouped cost records at monthly granularity.
    async fn cost_and_usage(
        &self,
        range: &DateRange,
        grouping: Grouping,
        next_token: Option<&str>,
    ) -> Result<CostPage>;

    /// Fetch one page of linked-account dimension values for the range.
    async fn dimension_values(
        &self,
        range: &DateRange,
        next_token: Option<&str>,
    ) -> Result<DimensionPage>;
}
