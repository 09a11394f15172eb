//! Cost Explorer implementation of the billing boundary
//!
//! Decodes the dynamic Cost Explorer response shapes into the typed
//! records the aggregation pipeline consumes. Transport and auth errors
//! are boxed and propagated unmodified; retry policy belongs to callers.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_costexplorer::types::{
    DateInterval, Dimension, Granularity, GroupDefinition, GroupDefinitionType, ResultByTime,
};
use aws_sdk_costexplorer::Client;

use awsops_core::billing::{BillingApi, Grouping, COST_METRIC};
use awsops_core::date_range::DateRange;
use awsops_core::error::{AwsopsError, Result};
use awsops_core::types::{CostGroup, CostPage, DimensionPage, PeriodRecord};

/// `BillingApi` over the AWS Cost Explorer service
pub struct CostExplorerBilling {
    client: Client,
}

impl CostExplorerBilling {
    /// Create a client from shared AWS configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl BillingApi for CostExplorerBilling {
    async fn cost_and_usage(
        &self,
        range: &DateRange,
        grouping: Grouping,
        next_token: Option<&str>,
    ) -> Result<CostPage> {
        let mut request = self
            .client
            .get_cost_and_usage()
            .time_period(date_interval(range)?)
            .granularity(Granularity::Monthly)
            .metrics(COST_METRIC)
            .group_by(dimension_group("LINKED_ACCOUNT"));

        if grouping.includes_service() {
            request = request.group_by(dimension_group("SERVICE"));
        }
        if let Some(token) = next_token {
            request = request.next_page_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AwsopsError::Transport(Box::new(e)))?;

        Ok(CostPage {
            records: response
                .results_by_time()
                .iter()
                .map(decode_period)
                .collect(),
            next_token: response.next_page_token().map(str::to_string),
        })
    }

    async fn dimension_values(
        &self,
        range: &DateRange,
        next_token: Option<&str>,
    ) -> Result<DimensionPage> {
        let mut request = self
            .client
            .get_dimension_values()
            .time_period(date_interval(range)?)
            .dimension(Dimension::LinkedAccount);

        if let Some(token) = next_token {
            request = request.next_page_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AwsopsError::Transport(Box::new(e)))?;

        let values = response
            .dimension_values()
            .iter()
            .filter_map(|entry| {
                let id = entry.value()?.to_string();
                // accounts occasionally come back without a description;
                // fall back to the raw id rather than dropping them
                let description = entry
                    .attributes()
                    .and_then(|attrs| attrs.get("description"))
                    .cloned()
                    .unwrap_or_else(|| id.clone());
                Some((id, description))
            })
            .collect();

        Ok(DimensionPage {
            values,
            next_token: response.next_page_token().map(str::to_string),
        })
    }
}

fn date_interval(range: &DateRange) -> Result<DateInterval> {
    DateInterval::builder()
        .start(range.start_str())
        .end(range.end_str())
        .build()
        .map_err(|e| AwsopsError::Transport(Box::new(e)))
}

fn dimension_group(key: &str) -> GroupDefinition {
    GroupDefinition::builder()
        .r#type(GroupDefinitionType::Dimension)
        .key(key)
        .build()
}

fn decode_period(result: &ResultByTime) -> PeriodRecord {
    PeriodRecord {
        start: result
            .time_period()
            .map(|period| period.start().to_string()),
        end: result.time_period().map(|period| period.end().to_string()),
        groups: result
            .groups()
            .iter()
            .map(|group| {
                let metric = group
                    .metrics()
                    .and_then(|metrics| metrics.get(COST_METRIC));
                CostGroup {
                    keys: group.keys().to_vec(),
                    amount: metric
                        .and_then(|m| m.amount())
                        .unwrap_or_default()
                        .to_string(),
                    unit: metric
                        .and_then(|m| m.unit())
                        .unwrap_or_default()
                        .to_string(),
                }
            })
            .collect(),
    }
}
