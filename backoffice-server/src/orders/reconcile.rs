//! Order Reconciliation Engine
//!
//! 从支付流水全量重算订单的 `paid` 与 `payment_status`。
//! 这是这两个派生字段唯一的写入路径；任何流水或条目变更之后都必须调用。
//!
//! 幂等：每次都从完整流水重新求和，连续两次调用结果一致。

use rust_decimal::prelude::*;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{Order, PaymentStatus};
use crate::db::repository::{OrderRepository, PaymentRepository};
use crate::pricing::round_money;
use shared::{AppError, AppResult, ErrorCode};

/// Derive the payment status from the reconciled amounts
///
/// The `paid == 0` rule is checked first, so an unpaid zero-total order is
/// PENDING rather than PAID.
pub fn derive_payment_status(paid: f64, total: f64) -> PaymentStatus {
    if paid <= 0.0 {
        PaymentStatus::Pending
    } else if paid < total {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Paid
    }
}

/// Recompute `paid` / `payment_status` for one order from its full ledger
/// and persist them. Returns the updated order snapshot.
///
/// Must run after (never concurrently with) the ledger or item write it
/// reflects; callers hold the per-order lock across both steps.
pub async fn reconcile(db: &Surreal<Db>, order_id: &str) -> AppResult<Order> {
    let orders = OrderRepository::new(db.clone());
    let payments = PaymentRepository::new(db.clone());

    let order = orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    let ledger = payments.list_by_order(order_id).await?;
    let paid_sum = ledger.iter().fold(Decimal::ZERO, |acc, p| {
        acc + Decimal::from_f64(p.amount).unwrap_or(Decimal::ZERO)
    });
    let paid = round_money(paid_sum).to_f64().unwrap_or(0.0);
    let payment_status = derive_payment_status(paid, order.total);

    tracing::debug!(
        order_id = %order_id,
        paid,
        total = order.total,
        status = ?payment_status,
        entries = ledger.len(),
        "Reconciled order"
    );

    let updated = orders.set_payment_fields(order_id, paid, payment_status).await?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_when_nothing_paid() {
        assert_eq!(derive_payment_status(0.0, 1000.0), PaymentStatus::Pending);
    }

    #[test]
    fn test_partial_below_total() {
        assert_eq!(derive_payment_status(600.0, 1000.0), PaymentStatus::Partial);
        assert_eq!(derive_payment_status(999.99, 1000.0), PaymentStatus::Partial);
    }

    #[test]
    fn test_paid_at_or_above_total() {
        assert_eq!(derive_payment_status(1000.0, 1000.0), PaymentStatus::Paid);
        assert_eq!(derive_payment_status(1200.0, 1000.0), PaymentStatus::Paid);
    }

    #[test]
    fn test_zero_total_unpaid_is_pending() {
        // paid == 0 wins over paid >= total
        assert_eq!(derive_payment_status(0.0, 0.0), PaymentStatus::Pending);
    }

    #[test]
    fn test_zero_total_with_payment_is_paid() {
        assert_eq!(derive_payment_status(10.0, 0.0), PaymentStatus::Paid);
    }
}
