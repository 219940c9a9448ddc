//! Order Model
//!
//! `total`、`paid`、`payment_status` 均为派生字段：
//! - `total` 由计价引擎在条目变更时重算
//! - `paid` / `payment_status` 只能由对账引擎写入

use super::price_item::PricingMode;
use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Order workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Received,
    InProgress,
    Completed,
    Delivered,
}

/// Payment status: a pure function of (paid, total)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

/// Delivery type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    Standard,
    Express,
}

/// Garment care level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareLevel {
    Normal,
    Delicate,
}

/// Order line item: snapshot of the catalog entry at creation/update time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(with = "serde_helpers::record_id")]
    pub price_item_id: RecordId,
    pub name: String,
    pub pricing_mode: PricingMode,
    #[serde(default)]
    pub point_multiplier: Option<i32>,
    pub unit_price: f64,
    pub quantity: i32,
    pub line_total: f64,
}

/// Order entity (订单)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Human-facing zero-padded number ("ORD-000042"), unique
    pub order_number: String,
    #[serde(with = "serde_helpers::record_id")]
    pub customer_id: RecordId,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    /// Derived: pricing engine output over `items`
    pub total: f64,
    /// Derived: ledger sum, written only by the reconciliation engine
    pub paid: f64,
    /// Derived: pure function of (paid, total), written only by reconciliation
    pub payment_status: PaymentStatus,
    pub delivery_type: DeliveryType,
    pub care_level: CareLevel,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One requested line item: catalog reference + quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub price_item_id: String,
    pub quantity: i32,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub customer_id: String,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub delivery_type: Option<DeliveryType>,
    #[serde(default)]
    pub care_level: Option<CareLevel>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Partial order update (status / note / delivery / care)
///
/// `paid` and `payment_status` are deliberately absent: only the
/// reconciliation engine writes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_type: Option<DeliveryType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub care_level: Option<CareLevel>,
}

/// Replace-items payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemsUpdate {
    pub items: Vec<OrderItemInput>,
}

/// Order joined with its customer (list/detail views)
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithCustomer {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Option<super::customer::Customer>,
}
