//! Money calculation using rust_decimal for precision
//!
//! All arithmetic is done with `Decimal` internally, then converted to `f64`
//! for storage/serialization.

use crate::db::models::{OrderItem, PricingMode};
use rust_decimal::prelude::*;

/// Rounding: 2 decimal places, half-up
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price per catalog item
pub const MAX_UNIT_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line item
pub const MAX_QUANTITY: i32 = 9_999;
/// Sanity ceiling for a single payment (fat-finger guard)
pub const MAX_PAYMENT_AMOUNT: f64 = 100_000.0;

/// Round a monetary value to 2 decimal places (half-up)
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Contribution of a single line item
///
/// - `per_piece`: multiplier (default 1) × unit price × quantity
/// - `flat`: unit price × quantity
///
/// Non-finite prices and non-positive quantities contribute zero: the
/// strict rejection of malformed items happens at the API layer before
/// anything reaches here.
pub fn line_total(
    mode: PricingMode,
    point_multiplier: Option<i32>,
    unit_price: f64,
    quantity: i32,
) -> Decimal {
    if !unit_price.is_finite() || unit_price < 0.0 || quantity <= 0 {
        return Decimal::ZERO;
    }

    let price = to_decimal(unit_price);
    let qty = Decimal::from(quantity);

    match mode {
        PricingMode::PerPiece => Decimal::from(point_multiplier.unwrap_or(1)) * price * qty,
        PricingMode::Flat => price * qty,
    }
}

/// Order total over a resolved item set
///
/// Pure and deterministic; an empty set yields 0.
pub fn order_total(items: &[OrderItem]) -> f64 {
    let sum = items.iter().fold(Decimal::ZERO, |acc, item| {
        acc + line_total(
            item.pricing_mode,
            item.point_multiplier,
            item.unit_price,
            item.quantity,
        )
    });
    round_money(sum).to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use surrealdb::RecordId;

    fn item(
        mode: PricingMode,
        multiplier: Option<i32>,
        unit_price: f64,
        quantity: i32,
    ) -> OrderItem {
        OrderItem {
            price_item_id: RecordId::from_table_key("price_item", "test"),
            name: "test".to_string(),
            pricing_mode: mode,
            point_multiplier: multiplier,
            unit_price,
            quantity,
            line_total: 0.0,
        }
    }

    #[test]
    fn test_empty_set_is_zero() {
        assert_eq!(order_total(&[]), 0.0);
    }

    #[test]
    fn test_per_piece_contribution() {
        // m * p * q
        let d = line_total(PricingMode::PerPiece, Some(2), 630.0, 3);
        assert_eq!(d, Decimal::from(3780));
    }

    #[test]
    fn test_per_piece_default_multiplier() {
        // absent multiplier defaults to 1
        let d = line_total(PricingMode::PerPiece, None, 630.0, 3);
        assert_eq!(d, Decimal::from(1890));
    }

    #[test]
    fn test_flat_contribution() {
        // p * q, multiplier ignored
        let d = line_total(PricingMode::Flat, Some(5), 10_300.0, 2);
        assert_eq!(d, Decimal::from(20_600));
    }

    #[test]
    fn test_order_total_sums_items() {
        let items = vec![
            item(PricingMode::PerPiece, Some(1), 630.0, 3),
            item(PricingMode::Flat, None, 10_300.0, 1),
        ];
        assert_eq!(order_total(&items), 12_190.0);
    }

    #[test]
    fn test_total_invariant_under_reordering() {
        let mut items = vec![
            item(PricingMode::PerPiece, Some(2), 630.0, 1),
            item(PricingMode::Flat, None, 11_600.0, 2),
            item(PricingMode::PerPiece, None, 630.0, 5),
        ];
        let total = order_total(&items);
        items.reverse();
        assert_eq!(order_total(&items), total);
        items.swap(0, 1);
        assert_eq!(order_total(&items), total);
    }

    #[test]
    fn test_non_finite_price_skipped() {
        let items = vec![
            item(PricingMode::Flat, None, f64::NAN, 2),
            item(PricingMode::Flat, None, f64::INFINITY, 2),
            item(PricingMode::Flat, None, 100.0, 1),
        ];
        assert_eq!(order_total(&items), 100.0);
    }

    #[test]
    fn test_non_positive_quantity_skipped() {
        let items = vec![
            item(PricingMode::Flat, None, 100.0, 0),
            item(PricingMode::Flat, None, 100.0, -3),
        ];
        assert_eq!(order_total(&items), 0.0);
    }

    #[test]
    fn test_rounding_half_up() {
        let d = round_money(Decimal::from_str("10.005").unwrap());
        assert_eq!(d, Decimal::from_str("10.01").unwrap());
    }

    #[test]
    fn test_spec_example_shirt() {
        // per-piece, multiplier 1, price 630, qty 3 -> 1890
        let items = vec![item(PricingMode::PerPiece, Some(1), 630.0, 3)];
        assert_eq!(order_total(&items), 1890.0);
    }
}
