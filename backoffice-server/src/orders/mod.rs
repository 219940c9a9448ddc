//! 订单域逻辑
//!
//! - [`reconcile`]: 对账引擎: `paid` / `payment_status` 的唯一写入方
//! - [`locks`]: 订单级互斥锁: 同一订单的变更 + 对账串行执行
//! - [`resolve_items`]: 目录解析 + 快照构建（计价引擎的 I/O 前置）

pub mod locks;
pub mod reconcile;

pub use locks::OrderLocks;
pub use reconcile::{derive_payment_status, reconcile};

use crate::db::models::{OrderItem, OrderItemInput};
use crate::db::repository::{PriceItemRepository, RepoError};
use crate::pricing;
use rust_decimal::prelude::ToPrimitive;
use shared::{AppError, AppResult, ErrorCode};

/// Resolve requested line items against the price catalog and build the
/// value-copied snapshot set.
///
/// Rejects empty sets (`OrderEmpty`), bad quantities (`ValidationFailed`)
/// and unresolvable catalog references (`OrderItemNotFound`). Pricing of the
/// snapshot happens here so `line_total` is always consistent with the
/// copied fields.
pub async fn resolve_items(
    catalog: &PriceItemRepository,
    inputs: &[OrderItemInput],
) -> AppResult<Vec<OrderItem>> {
    if inputs.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }

    let mut items = Vec::with_capacity(inputs.len());
    for input in inputs {
        if input.quantity < 1 {
            return Err(AppError::validation(format!(
                "quantity must be at least 1, got {}",
                input.quantity
            )));
        }
        if input.quantity > pricing::MAX_QUANTITY {
            return Err(AppError::validation(format!(
                "quantity exceeds maximum allowed ({}), got {}",
                pricing::MAX_QUANTITY,
                input.quantity
            )));
        }

        // Malformed references fail the same way as missing ones
        let price_item = match catalog.find_by_id(&input.price_item_id).await {
            Ok(Some(item)) => item,
            Ok(None) | Err(RepoError::Validation(_)) => {
                return Err(AppError::new(ErrorCode::OrderItemNotFound)
                    .with_detail("price_item_id", input.price_item_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let id = price_item
            .id
            .clone()
            .ok_or_else(|| AppError::database("Price item missing id"))?;

        let line_total = pricing::round_money(pricing::line_total(
            price_item.pricing_mode,
            price_item.point_multiplier,
            price_item.unit_price,
            input.quantity,
        ))
        .to_f64()
        .unwrap_or(0.0);

        items.push(OrderItem {
            price_item_id: id,
            name: price_item.name,
            pricing_mode: price_item.pricing_mode,
            point_multiplier: price_item.point_multiplier,
            unit_price: price_item.unit_price,
            quantity: input.quantity,
            line_total,
        });
    }

    Ok(items)
}
