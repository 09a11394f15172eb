//! Property-based tests for the money and aggregation invariants

mod common;

use std::collections::BTreeMap;

use common::{group, record};
use proptest::prelude::*;
use rust_decimal::Decimal;

use awsops_core::accounts::AccountDirectory;
use awsops_core::aggregation::{aggregate, PeriodLabel};
use awsops_core::billing::Grouping;
use awsops_core::money;

const ACCOUNTS: [(&str, &str); 3] = [
    ("111111111111", "Prod"),
    ("222222222222", "Staging"),
    ("333333333333", "Dev"),
];

fn directory() -> AccountDirectory {
    AccountDirectory::from_entries(
        ACCOUNTS
            .iter()
            .map(|(id, description)| (id.to_string(), description.to_string())),
    )
}

proptest! {
    #[test]
    fn rounding_lands_on_cents_and_is_idempotent(raw in -1_000_000_000i64..1_000_000_000i64) {
        let amount = Decimal::new(raw, 4);
        let rounded = money::round_half_up(amount);

        prop_assert!(rounded.scale() <= 2);
        prop_assert_eq!(money::round_half_up(rounded), rounded);
        // rounding never moves a value by more than half a cent
        prop_assert!((amount - rounded).abs() <= Decimal::new(5, 3));
    }

    #[test]
    fn totals_equal_the_sum_of_rounded_entries(
        entries in proptest::collection::vec((0usize..3, -1_000_000i64..1_000_000i64), 0..40)
    ) {
        let groups = entries
            .iter()
            .map(|(account, milli_cents)| {
                let amount = Decimal::new(*milli_cents, 3);
                group(&[ACCOUNTS[*account].0, "Some Service"], &amount.to_string())
            })
            .collect();

        let report = aggregate(
            vec![record("2024-03-01", groups)],
            &directory(),
            Grouping::ByAccountAndService,
            PeriodLabel::MonthName,
        )
        .unwrap();
        let summary = &report.periods[0];

        let mut expected_total = Decimal::ZERO;
        let mut expected_by_account: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut expected_entries = 0usize;
        for (account, milli_cents) in &entries {
            let amount = Decimal::new(*milli_cents, 3);
            if amount.is_zero() {
                continue;
            }
            let rounded = money::round_half_up(amount);
            expected_total += rounded;
            *expected_by_account
                .entry(ACCOUNTS[*account].1.to_string())
                .or_default() += rounded;
            expected_entries += 1;
        }

        prop_assert_eq!(summary.total, expected_total);
        prop_assert_eq!(&summary.total_by_account, &expected_by_account);

        let entry_count: usize = summary.costs_by_account.values().map(Vec::len).sum();
        prop_assert_eq!(entry_count, expected_entries);

        // account keys always come out in ascending order
        let keys: Vec<_> = summary.costs_by_account.keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }
}
