//! Payment Ledger Handlers
//!
//! 记账 / 删账都持有订单锁执行「写入 → 对账」序列，并把对账后的
//! 订单快照一并返回给调用方。
//!
//! 记账不具备重试幂等性: 重试会重复入账，调用方需自行去重。

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{Order, Payment, PaymentCreate, PaymentMethod};
use crate::db::repository::{OrderRepository, PaymentListFilter, PaymentRepository};
use crate::export;
use crate::orders::reconcile;
use crate::pricing::MAX_PAYMENT_AMOUNT;
use crate::utils::time;
use shared::util::now_millis;
use shared::{AppError, AppResult, ErrorCode};

#[derive(Deserialize)]
pub struct PaymentListQuery {
    pub method: Option<PaymentMethod>,
    pub order_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Serialize)]
pub struct PaymentListResponse {
    pub total: i64,
    pub results: Vec<Payment>,
}

/// Payment plus the reconciled order snapshot
#[derive(Serialize)]
pub struct PaymentWithOrder {
    pub payment: Payment,
    pub order: Order,
}

/// Reconciled order snapshot after a deletion
#[derive(Serialize)]
pub struct PaymentDeleted {
    pub order: Order,
}

#[derive(Serialize)]
pub struct PaymentStats {
    pub from: String,
    pub to: String,
    pub total_payments: i64,
    pub total_amount: f64,
    pub payments_by_method: HashMap<String, i64>,
}

fn parse_range(query: &RangeQuery) -> (i64, i64) {
    let from = query
        .from
        .as_deref()
        .and_then(time::parse_date_start)
        .unwrap_or(0);
    let to = query
        .to
        .as_deref()
        .and_then(time::parse_date_end)
        .unwrap_or_else(now_millis);
    (from, to)
}

/// POST /api/payments - 记账
///
/// 金额守卫：有限、正数、不超过 100,000（防误输入，非业务规则）。
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<Json<PaymentWithOrder>> {
    if !payload.amount.is_finite()
        || payload.amount <= 0.0
        || payload.amount > MAX_PAYMENT_AMOUNT
    {
        return Err(AppError::new(ErrorCode::PaymentInvalidAmount)
            .with_detail("amount", format!("{}", payload.amount)));
    }

    let db = state.get_db();
    let orders = OrderRepository::new(db.clone());
    let payments = PaymentRepository::new(db.clone());

    let order = orders
        .find_by_id(&payload.order_id)
        .await
        .map_err(|_| AppError::new(ErrorCode::OrderNotFound))?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let order_id = order
        .id
        .clone()
        .ok_or_else(|| AppError::database("Order missing id"))?;
    let order_key = order_id.to_string();

    // 串行化：入账与对账之间不允许并发变更同一订单
    let _guard = state.order_locks.acquire(&order_key).await;

    let payment = payments
        .create(Payment {
            id: None,
            order_id,
            amount: payload.amount,
            method: payload.method,
            created_at: now_millis(),
        })
        .await?;

    let order = reconcile(&db, &order_key).await?;

    tracing::info!(
        order_number = %order.order_number,
        amount = payment.amount,
        method = %payment.method.as_str(),
        paid = order.paid,
        payment_status = ?order.payment_status,
        "Payment recorded"
    );

    Ok(Json(PaymentWithOrder { payment, order }))
}

/// GET /api/payments - 流水列表 (带筛选和分页)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<PaymentListQuery>,
) -> AppResult<Json<PaymentListResponse>> {
    let payments = PaymentRepository::new(state.get_db());

    let filter = PaymentListFilter {
        method: query.method,
        order_id: query.order_id,
        from: query.from.as_deref().and_then(time::parse_date_start),
        to: query.to.as_deref().and_then(time::parse_date_end),
        limit: query.limit.clamp(1, 200),
        skip: query.skip.max(0),
    };

    let (results, total) = payments.list(filter).await?;
    Ok(Json(PaymentListResponse { total, results }))
}

/// GET /api/payments/:id - 流水详情
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Payment>> {
    let payments = PaymentRepository::new(state.get_db());
    let payment = payments
        .find_by_id(&id)
        .await
        .map_err(|_| AppError::new(ErrorCode::PaymentNotFound))?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    Ok(Json(payment))
}

/// DELETE /api/payments/:id - 删账（纠错用）
///
/// 删除后对账：`paid` 必然减少，`payment_status` 可能回退
/// (PAID → PARTIAL → PENDING)。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<PaymentDeleted>> {
    let db = state.get_db();
    let payments = PaymentRepository::new(db.clone());

    let payment = payments
        .find_by_id(&id)
        .await
        .map_err(|_| AppError::new(ErrorCode::PaymentNotFound))?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    let order_key = payment.order_id.to_string();

    let _guard = state.order_locks.acquire(&order_key).await;

    payments.delete(&id).await?;
    let order = reconcile(&db, &order_key).await?;

    tracing::info!(
        order_number = %order.order_number,
        amount = payment.amount,
        paid = order.paid,
        payment_status = ?order.payment_status,
        "Payment deleted"
    );

    Ok(Json(PaymentDeleted { order }))
}

/// GET /api/payments/stats?from&to - 区间支付统计
pub async fn stats(
    State(state): State<ServerState>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<PaymentStats>> {
    let payments = PaymentRepository::new(state.get_db());
    let (from, to) = parse_range(&query);

    let rows = payments.list_by_time_range(from, to).await?;
    let total_amount: f64 = rows.iter().map(|p| p.amount).sum();
    let mut by_method: HashMap<String, i64> = HashMap::new();
    for payment in &rows {
        *by_method
            .entry(payment.method.as_str().to_string())
            .or_insert(0) += 1;
    }

    Ok(Json(PaymentStats {
        from: time::format_date(from),
        to: time::format_date(to),
        total_payments: rows.len() as i64,
        total_amount,
        payments_by_method: by_method,
    }))
}

/// GET /api/payments/export?from&to - 导出区间流水 CSV
pub async fn export_csv(
    State(state): State<ServerState>,
    Query(query): Query<RangeQuery>,
) -> AppResult<impl IntoResponse> {
    let db = state.get_db();
    let payments = PaymentRepository::new(db.clone());
    let orders = OrderRepository::new(db);
    let (from, to) = parse_range(&query);

    let rows = payments.list_by_time_range(from, to).await?;

    // Resolve order numbers once per distinct order
    let mut order_numbers: HashMap<String, String> = HashMap::new();
    for payment in &rows {
        let key = payment.order_id.to_string();
        if !order_numbers.contains_key(&key) {
            let number = orders
                .find_by_id(&key)
                .await?
                .map(|o| o.order_number)
                .unwrap_or_default();
            order_numbers.insert(key, number);
        }
    }

    let csv = export::payments_csv::write_payments_csv(&rows, &order_numbers)?;

    let filename = format!(
        "payments_{}_to_{}.csv",
        time::format_date(from),
        time::format_date(to)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        csv,
    ))
}
