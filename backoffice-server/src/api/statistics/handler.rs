//! Statistics API Handlers

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::repository::{OrderRepository, PaymentRepository, StatusCount};
use crate::utils::time;
use shared::AppResult;

// ============================================================================
// Response Types
// ============================================================================

/// Dashboard overview
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub today_orders: i64,
    pub orders_by_status: Vec<StatusCount>,
    pub total_revenue: f64,
}

/// Revenue trend data point (one per day)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueTrendPoint {
    pub date: String,
    pub amount: f64,
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    7
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/statistics - 仪表盘统计
pub async fn dashboard(State(state): State<ServerState>) -> AppResult<Json<DashboardStats>> {
    let db = state.get_db();
    let orders = OrderRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let total_orders = orders.count_all().await?;
    let today_orders = orders.count_created_since(time::start_of_today()).await?;
    let orders_by_status = orders.count_by_status().await?;
    let total_revenue = payments.total_revenue().await?;

    Ok(Json(DashboardStats {
        total_orders,
        today_orders,
        orders_by_status,
        total_revenue,
    }))
}

/// GET /api/statistics/revenue-trend?days=7 - 每日营收趋势
///
/// 区间内没有流水的日期补 0，保证前端折线连续。
pub async fn revenue_trend(
    State(state): State<ServerState>,
    Query(query): Query<TrendQuery>,
) -> AppResult<Json<Vec<RevenueTrendPoint>>> {
    let payments = PaymentRepository::new(state.get_db());
    let days = query.days.clamp(1, 90);

    let from = time::days_ago_millis(days - 1);
    let from_day_start = time::parse_date_start(&time::format_date(from)).unwrap_or(from);
    let rows = payments
        .list_by_time_range(from_day_start, shared::util::now_millis())
        .await?;

    let mut by_day: BTreeMap<String, f64> = BTreeMap::new();
    for offset in (0..days).rev() {
        by_day.insert(time::format_date(time::days_ago_millis(offset)), 0.0);
    }
    for payment in &rows {
        let day = time::format_date(payment.created_at);
        if let Some(amount) = by_day.get_mut(&day) {
            *amount += payment.amount;
        }
    }

    Ok(Json(
        by_day
            .into_iter()
            .map(|(date, amount)| RevenueTrendPoint { date, amount })
            .collect(),
    ))
}
