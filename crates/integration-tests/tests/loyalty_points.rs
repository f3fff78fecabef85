//! Loyalty-point arithmetic scenarios.
//!
//! The balance mutations themselves are single guarded SQL statements;
//! these tests pin down the arithmetic and the thresholds the handlers
//! enforce around them.

use rust_decimal::Decimal;

use sari_core::loyalty;

fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

#[test]
fn one_point_per_five_thousand_spent() {
    assert_eq!(loyalty::points_earned(dec("5000")), 1);
    assert_eq!(loyalty::points_earned(dec("12500")), 2);
    assert_eq!(loyalty::points_earned(dec("49999.99")), 9);
}

#[test]
fn totals_below_the_unit_earn_nothing() {
    assert_eq!(loyalty::points_earned(dec("0")), 0);
    assert_eq!(loyalty::points_earned(dec("4999.99")), 0);
}

#[test]
fn earned_points_are_never_negative() {
    assert_eq!(loyalty::points_earned(dec("-100")), 0);
}

#[test]
fn redemption_requires_the_five_point_floor() {
    // points = 12 -> redeem allowed, balance would drop to 7
    assert!(loyalty::can_redeem(12));
    assert_eq!(12 - loyalty::REDEEM_COST, 7);

    // points = 3 -> rejected, balance unchanged
    assert!(!loyalty::can_redeem(3));

    // exactly at the floor
    assert!(loyalty::can_redeem(5));
    assert_eq!(5 - loyalty::REDEEM_COST, 0);
}

#[test]
fn purchase_threshold_matches_the_earn_unit() {
    // The purchase endpoint rejects amounts below one earn unit, so a
    // accepted purchase always credits at least one point.
    assert_eq!(loyalty::MIN_PURCHASE_AMOUNT, loyalty::EARN_UNIT);
    assert!(loyalty::points_earned(Decimal::from(loyalty::MIN_PURCHASE_AMOUNT)) >= 1);
}
