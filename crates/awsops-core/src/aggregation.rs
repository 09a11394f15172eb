//! Aggregation of raw billing records into periodic cost summaries
//!
//! Folds the fetcher's raw period records into an ordered sequence of
//! per-period summaries, each broken down by account and, optionally, by
//! service. Amounts are parsed as exact decimals, rounded half-up to
//! cents, and accumulated into running totals; zero-amount entries are
//! dropped before they ever enter the model.
//!
//! The whole step is synchronous and in-memory; everything async (the
//! directory lookup and the paginated fetch) happens before it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::accounts::AccountDirectory;
use crate::billing::{BillingApi, Grouping};
use crate::date_range::DateRange;
use crate::error::{AwsopsError, Result};
use crate::fetcher::fetch_cost_records;
use crate::money;
use crate::types::{AccountId, PeriodRecord};

/// How period labels are derived from the raw period start date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodLabel {
    /// The literal ISO start date, used for day-count windows
    IsoDate,
    /// A human month-and-year label like "March 2024"
    MonthName,
}

/// Cost attributed to one (account, service) pair within one period
///
/// `service` is absent when per-service breakdown is disabled. `amount`
/// is always rounded to 2 fractional digits before storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceUsageCost {
    /// Resolved account description
    pub account: String,
    /// Service name, when per-service grouping was requested
    pub service: Option<String>,
    /// Rounded monetary amount
    pub amount: Decimal,
    /// Currency unit, e.g. "USD"
    pub unit: String,
}

/// Cost summary for one billing period
///
/// `costs_by_account` keys are resolved account descriptions; the map
/// iterates in ascending key order, which is the presentation order.
/// Totals are maintained incrementally during accumulation and are final
/// once the period's record has been folded in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PeriodicCostSummary {
    /// Period label ("March 2024" or an ISO date)
    pub period: String,
    /// Per-account cost entries, ascending by account
    pub costs_by_account: BTreeMap<String, Vec<ServiceUsageCost>>,
    /// Sum of every entry amount in the period
    pub total: Decimal,
    /// Per-account subtotals
    pub total_by_account: BTreeMap<String, Decimal>,
}

impl PeriodicCostSummary {
    /// Create an empty summary for a period
    pub fn new(period: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            ..Self::default()
        }
    }

    fn add_cost(&mut self, cost: ServiceUsageCost) {
        self.total += cost.amount;
        *self
            .total_by_account
            .entry(cost.account.clone())
            .or_default() += cost.amount;
        self.costs_by_account
            .entry(cost.account.clone())
            .or_default()
            .push(cost);
    }
}

/// A complete cost report: periodic summaries, most recent period first
#[derive(Debug, Clone, Default, Serialize)]
pub struct CostReport {
    /// Summaries in period order (inherited from the sorted raw records)
    pub periods: Vec<PeriodicCostSummary>,
}

/// Fold raw period records into a report.
///
/// Records are consumed in their given order (the fetcher has already
/// sorted them most recent first when it could); records sharing a
/// period label fold into one summary, since pagination can split a
/// period's groups across pages. An account id missing from the
/// directory aborts the whole report: a partially-labeled report is
/// never produced.
pub fn aggregate(
    records: Vec<PeriodRecord>,
    directory: &AccountDirectory,
    grouping: Grouping,
    label: PeriodLabel,
) -> Result<CostReport> {
    let mut periods: Vec<PeriodicCostSummary> = Vec::new();

    for record in records {
        let period = period_label(record.start.as_deref(), label)?;
        let index = match periods.iter().position(|summary| summary.period == period) {
            Some(index) => index,
            None => {
                periods.push(PeriodicCostSummary::new(period));
                periods.len() - 1
            }
        };

        for group in record.groups {
            let amount = money::parse_amount(&group.amount)?;
            if amount.is_zero() {
                continue;
            }
            let amount = money::round_half_up(amount);

            let id = group.keys.first().ok_or_else(|| {
                AwsopsError::MalformedRecord(format!(
                    "cost group without keys in period {}",
                    periods[index].period
                ))
            })?;
            let account = directory.describe(&AccountId::new(id.clone()))?.to_string();
            let service = if grouping.includes_service() {
                group.keys.get(1).cloned()
            } else {
                None
            };

            periods[index].add_cost(ServiceUsageCost {
                account,
                service,
                amount,
                unit: group.unit,
            });
        }
    }

    Ok(CostReport { periods })
}

/// Run the whole pipeline: directory, paginated fetch, aggregation.
///
/// Strictly sequential; the directory must be complete before any amount
/// can be attributed, and pagination is inherently serial.
pub async fn generate_report(
    api: &dyn BillingApi,
    range: &DateRange,
    grouping: Grouping,
    label: PeriodLabel,
) -> Result<CostReport> {
    let directory = AccountDirectory::resolve(api, range).await?;
    let records = fetch_cost_records(api, range, grouping).await?;
    aggregate(records, &directory, grouping, label)
}

fn period_label(start: Option<&str>, label: PeriodLabel) -> Result<String> {
    let start = start
        .ok_or_else(|| AwsopsError::MalformedRecord("period without a start date".to_string()))?;

    match label {
        PeriodLabel::IsoDate => Ok(start.to_string()),
        PeriodLabel::MonthName => NaiveDate::parse_from_str(start, "%Y-%m-%d")
            .map(|date| date.format("%B %Y").to_string())
            .map_err(|e| AwsopsError::MalformedRecord(format!("period start {start}: {e}"))),
    }
}
