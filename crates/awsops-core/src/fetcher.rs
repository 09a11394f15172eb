//! Paginated cost fetching
//!
//! Pulls every page of grouped cost data for a date range, stitches the
//! records into one sequence, and orders them most recent period first.

use chrono::NaiveDate;

use crate::billing::{BillingApi, Grouping};
use crate::date_range::DateRange;
use crate::error::{AwsopsError, Result};
use crate::types::PeriodRecord;

/// Safety cap on the pagination loop. The upstream contract is that the
/// API eventually stops returning a continuation token; this bounds the
/// damage if it does not.
pub const MAX_COST_PAGES: usize = 10_000;

/// Fetch all pages of grouped cost records for the range.
///
/// Pages are requested sequentially, each carrying the previous page's
/// continuation token, until no token is returned. Transport errors
/// propagate unmodified; nothing is retried here.
pub async fn fetch_cost_records(
    api: &dyn BillingApi,
    range: &DateRange,
    grouping: Grouping,
) -> Result<Vec<PeriodRecord>> {
    let mut records = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = api.cost_and_usage(range, grouping, token.as_deref()).await?;
        pages += 1;
        records.extend(page.records);

        match page.next_token {
            Some(next) => {
                if pages >= MAX_COST_PAGES {
                    return Err(AwsopsError::PaginationLimit(MAX_COST_PAGES));
                }
                token = Some(next);
            }
            None => break,
        }
    }

    tracing::debug!(pages, records = records.len(), "fetched cost pages");
    sort_by_start_desc(&mut records);
    Ok(records)
}

/// Sort records by period start, most recent first.
///
/// If any record lacks a well-formed start date the sort is skipped
/// entirely and the original order is preserved. That is a fallback,
/// not an error.
fn sort_by_start_desc(records: &mut [PeriodRecord]) {
    let all_parseable = records.iter().all(|r| start_key(r).is_some());
    if !all_parseable {
        return;
    }
    records.sort_by(|a, b| start_key(b).cmp(&start_key(a)));
}

fn start_key(record: &PeriodRecord) -> Option<NaiveDate> {
    record
        .start
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}
