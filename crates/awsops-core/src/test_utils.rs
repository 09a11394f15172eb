//! Shared test utilities for unit tests
//!
//! Note: Integration tests (in tests/) cannot access this module because
//! it's marked with #[cfg(test)]; the root crate's integration tests keep
//! their own fake in tests/common/mod.rs.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::billing::{BillingApi, Grouping};
use crate::date_range::DateRange;
use crate::error::Result;
use crate::types::{CostPage, DimensionPage};

/// Scripted in-memory `BillingApi` for exercising the pipeline without a
/// network. Pages are served in order; requesting past the script panics,
/// which in a test means the fetcher looped more than the script allows.
#[derive(Default)]
pub struct FakeBilling {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    cost_pages: Vec<CostPage>,
    dimension_pages: Vec<DimensionPage>,
    cost_cursor: usize,
    dimension_cursor: usize,
    seen_tokens: Vec<Option<String>>,
    endless: bool,
}

impl FakeBilling {
    /// Script the cost pages served, in order.
    pub fn with_cost_pages(self, pages: Vec<CostPage>) -> Self {
        self.state.lock().unwrap().cost_pages = pages;
        self
    }

    /// Script the dimension pages served, in order.
    pub fn with_dimension_pages(self, pages: Vec<DimensionPage>) -> Self {
        self.state.lock().unwrap().dimension_pages = pages;
        self
    }

    /// Serve empty cost pages that always carry a continuation token.
    pub fn with_endless_cost_pages(self) -> Self {
        self.state.lock().unwrap().endless = true;
        self
    }

    /// Number of cost_and_usage calls made so far
    pub fn cost_calls(&self) -> usize {
        self.state.lock().unwrap().seen_tokens.len()
    }

    /// Continuation tokens received, in call order
    pub fn seen_tokens(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().seen_tokens.clone()
    }
}

#[async_trait]
impl BillingApi for FakeBilling {
    async fn cost_and_usage(
        &self,
        _range: &DateRange,
        _grouping: Grouping,
        next_token: Option<&str>,
    ) -> Result<CostPage> {
        let mut state = self.state.lock().unwrap();
        state.seen_tokens.push(next_token.map(str::to_string));

        if state.endless {
            return Ok(CostPage {
                records: Vec::new(),
                next_token: Some("more".to_string()),
            });
        }

        let page = state
            .cost_pages
            .get(state.cost_cursor)
            .cloned()
            .expect("fake billing ran out of scripted cost pages");
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
            .expect("fake billing ran out of scripted dimension pages");
        state.dimension_cursor += 1;
        Ok(page)
    }
}
