//! Shared helpers for integration tests
//!
//! A scripted `BillingApi` fake plus record constructors. The core crate
//! keeps its own copy of a similar fake in its `test_utils` module;
//! integration tests are separate binaries and cannot reach it.

use std::sync::Mutex;

use async_trait::async_trait;

use awsops_core::billing::{BillingApi, Grouping};
use awsops_core::date_range::{DateRange, PeriodSelector};
use awsops_core::error::Result;
use awsops_core::types::{CostGroup, CostPage, DimensionPage, PeriodRecord};

/// Scripted in-memory billing API
#[derive(Default)]
pub struct ScriptedBilling {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    cost_pages: Vec<CostPage>,
    dimension_pages: Vec<DimensionPage>,
    cost_cursor: usize,
    dimension_cursor: usize,
    cost_calls: usize,
}

#[allow(dead_code)]
impl ScriptedBilling {
    pub fn with_cost_pages(self, pages: Vec<CostPage>) -> Self {
        self.state.lock().unwrap().cost_pages = pages;
        self
    }

    pub fn with_accounts(self, accounts: &[(&str, &str)]) -> Self {
        self.with_dimension_pages(vec![DimensionPage {
            values: accounts
                .iter()
                .map(|(id, description)| (id.to_string(), description.to_string()))
                .collect(),
            next_token: None,
        }])
    }

    pub fn with_dimension_pages(self, pages: Vec<DimensionPage>) -> Self {
        self.state.lock().unwrap().dimension_pages = pages;
        self
    }

    pub fn cost_calls(&self) -> usize {
        self.state.lock().unwrap().cost_calls
    }
}

#[async_trait]
impl BillingApi for ScriptedBilling {
    async fn cost_and_usage(
        &self,
        _range: &DateRange,
        _grouping: Grouping,
        _next_token: Option<&str>,
    ) -> Result<CostPage> {
        let mut state = self.state.lock().unwrap();
        state.cost_calls += 1;
        let page = state
            .cost_pages
            .get(state.cost_cursor)
            .cloned()
            .expect("scripted billing ran out of cost pages");
        state.cost_cursor += 1;
        Ok(page)
    }

    async fn dimension_values(
        &self,
        _range: &DateRange,
        _next_token: Option<&str>,
    ) -> Result<DimensionPage> {
        let mut state = self.state.lock().unwrap();
        let page = state
            .dimension_pages
            .get(state.dimension_cursor)
            .cloned()
            .expect("scripted billing ran out of dimension pages");
        state.dimension_cursor += 1;
        Ok(page)
    }
}

/// A fixed resolved range for tests that never hit the resolver logic
#[allow(dead_code)]
pub fn any_range() -> DateRange {
    DateRange::resolve_at(
        &PeriodSelector::default(),
        chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn group(keys: &[&str], amount: &str) -> CostGroup {
    CostGroup {
        keys: keys.iter().map(|k| k.to_string()).collect(),
        amount: amount.to_string(),
        unit: "USD".to_string(),
    }
}

#[allow(dead_code)]
pub fn record(start: &str, groups: Vec<CostGroup>) -> PeriodRecord {
    PeriodRecord {
        start: Some(start.to_string()),
        end: None,
        groups,
    }
}
