//! Loyalty-point arithmetic.
//!
//! Points are earned at a fixed rate of one point per [`EARN_UNIT`] pesos
//! spent, and redeemed in fixed decrements of [`REDEEM_COST`]. Balances are
//! plain integers and never go negative; the storage layer enforces the
//! floor with guarded updates, this module only does the arithmetic.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Pesos spent per point earned.
pub const EARN_UNIT: i64 = 5_000;

/// Points consumed by a single redemption.
pub const REDEEM_COST: i64 = 5;

/// Minimum accepted amount for a direct point purchase.
///
/// A purchase below one earn unit would yield zero points, so it is
/// rejected up front.
pub const MIN_PURCHASE_AMOUNT: i64 = EARN_UNIT;

/// Points earned for an amount spent: `floor(amount / EARN_UNIT)`.
///
/// Always non-negative; amounts below one earn unit (and any negative
/// amount) earn nothing.
#[must_use]
pub fn points_earned(amount: Decimal) -> i64 {
    let earned = (amount / Decimal::from(EARN_UNIT))
        .floor()
        .to_i64()
        .unwrap_or(0);
    earned.max(0)
}

/// Whether a balance can cover a redemption.
#[must_use]
pub const fn can_redeem(balance: i64) -> bool {
    balance >= REDEEM_COST
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("valid decimal literal")
    }

    #[test]
    fn earns_one_point_per_unit() {
        assert_eq!(points_earned(dec("5000")), 1);
        assert_eq!(points_earned(dec("9999.99")), 1);
        assert_eq!(points_earned(dec("10000")), 2);
    }

    #[test]
    fn order_of_12500_earns_two_points() {
        assert_eq!(points_earned(dec("12500")), 2);
    }

    #[test]
    fn small_totals_earn_nothing() {
        assert_eq!(points_earned(dec("0")), 0);
        assert_eq!(points_earned(dec("4999.99")), 0);
    }

    #[test]
    fn negative_amounts_never_earn_negative_points() {
        assert_eq!(points_earned(dec("-12500")), 0);
    }

    #[test]
    fn redemption_floor_is_five() {
        assert!(can_redeem(5));
        assert!(can_redeem(12));
        assert!(!can_redeem(4));
        assert!(!can_redeem(0));
    }
}
