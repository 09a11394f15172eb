//! Exact decimal arithmetic for monetary amounts
//!
//! Every amount in the cost pipeline is a `rust_decimal::Decimal`; binary
//! floating point is never used, since repeated addition of rounded cents
//! must reproduce the same cumulative totals on every run. Rounding is
//! half-up (midpoint away from zero) at 2 fractional digits, independent
//! of platform locale.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{AwsopsError, Result};

/// Round a monetary amount to 2 fractional digits, half-up.
///
/// `0.005` rounds to `0.01`, not `0.00` (this is not banker's rounding),
/// and rounding an already-2-decimal value is a no-op.
pub fn round_half_up(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a wire-format amount string as an exact decimal.
///
/// Accepts plain decimal notation and, as a fallback, the scientific
/// notation the billing API occasionally emits for sub-cent figures.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| AwsopsError::InvalidAmount(format!("{raw}: {e}")))
}
