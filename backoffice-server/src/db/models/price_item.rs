//! Price Catalog Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Pricing mode for a catalog item
///
/// - `per_piece`: 按件计价，点数 (point_multiplier) 参与乘算
/// - `flat`: 固定价格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    PerPiece,
    Flat,
}

/// Price catalog entry (价目表条目)
///
/// Orders copy these fields by value at creation time, so editing a price
/// item never rewrites existing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceItem {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    pub pricing_mode: PricingMode,
    /// Point multiplier, meaningful for `per_piece` items (absent = 1)
    #[serde(default)]
    pub point_multiplier: Option<i32>,
    pub unit_price: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create-or-update payload (upsert keyed by unique name)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceItemCreate {
    pub name: String,
    pub pricing_mode: PricingMode,
    #[serde(default)]
    pub point_multiplier: Option<i32>,
    pub unit_price: f64,
}

/// Update payload for an existing price item
///
/// `None` fields are left unchanged (serializes into a MERGE patch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_mode: Option<PricingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_multiplier: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
}
