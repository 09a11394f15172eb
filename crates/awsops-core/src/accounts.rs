//! Account directory
//!
//! Resolves opaque linked-account ids to human-readable descriptions.
//! Built once per report generation, scoped to the same date range as the
//! cost fetch (linked-account membership can change over time), read-only
//! afterward.

use std::collections::HashMap;

use crate::billing::BillingApi;
use crate::date_range::DateRange;
use crate::error::{AwsopsError, Result};
use crate::types::AccountId;

/// Mapping from account id to description for one report generation
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    names: HashMap<AccountId, String>,
}

impl AccountDirectory {
    /// Build the directory from the billing API's dimension lookup.
    ///
    /// The vendor returns this in one page in practice, but if the
    /// collaborator does paginate, all pages are merged into one mapping
    /// with last-write-wins on duplicate ids.
    pub async fn resolve(api: &dyn BillingApi, range: &DateRange) -> Result<Self> {
        let mut names = HashMap::new();
        let mut token: Option<String> = None;

        loop {
            let page = api.dimension_values(range, token.as_deref()).await?;
            for (id, description) in page.values {
                names.insert(AccountId::new(id), description);
            }
            token = page.next_token;
            if token.is_none() {
                break;
            }
        }

        tracing::debug!(accounts = names.len(), "resolved account directory");
        Ok(Self { names })
    }

    /// Build a directory from in-memory pairs (fakes and tests).
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            names: entries
                .into_iter()
                .map(|(id, description)| (AccountId::new(id), description))
                .collect(),
        }
    }

    /// Look up the description for an account id.
    ///
    /// A miss means the directory and the cost data disagree about the
    /// window and is fatal for the report.
    pub fn describe(&self, id: &AccountId) -> Result<&str> {
        self.names
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| AwsopsError::UnknownAccount(id.to_string()))
    }

    /// Number of known accounts
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the directory is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeBilling;
    use crate::types::DimensionPage;

    fn range() -> DateRange {
        let selector = crate::date_range::PeriodSelector::default();
        DateRange::resolve_at(
            &selector,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_merges_all_dimension_pages() {
        let api = FakeBilling::default().with_dimension_pages(vec![
            DimensionPage {
                values: vec![("111111111111".into(), "Prod".into())],
                next_token: Some("t1".into()),
            },
            DimensionPage {
                values: vec![("222222222222".into(), "Staging".into())],
                next_token: None,
            },
        ]);

        let directory = AccountDirectory::resolve(&api, &range()).await.unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(
            directory.describe(&AccountId::new("222222222222")).unwrap(),
            "Staging"
        );
    }

    #[tokio::test]
    async fn test_duplicate_ids_keep_last_description() {
        let api = FakeBilling::default().with_dimension_pages(vec![
            DimensionPage {
                values: vec![("111111111111".into(), "Old".into())],
                next_token: Some("t1".into()),
            },
            DimensionPage {
                values: vec![("111111111111".into(), "New".into())],
                next_token: None,
            },
        ]);

        let directory = AccountDirectory::resolve(&api, &range()).await.unwrap();
        assert_eq!(directory.len(), 1);
        assert_eq!(
            directory.describe(&AccountId::new("111111111111")).unwrap(),
            "New"
        );
    }

    #[test]
    fn test_unknown_account_is_an_error() {
        let directory = AccountDirectory::from_entries([("111111111111".to_string(), "Prod".to_string())]);
        let err = directory
            .describe(&AccountId::new("999999999999"))
            .unwrap_err();
        assert!(matches!(err, AwsopsError::UnknownAccount(id) if id == "999999999999"));
    }
}
