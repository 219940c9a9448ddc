//! Public Tracking Handlers
//!
//! 只暴露客户自己需要看到的字段，不泄露联系方式和内部备注。

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::models::{OrderStatus, PaymentMethod, PaymentStatus};
use crate::db::repository::{CustomerRepository, OrderRepository, PaymentRepository};
use shared::{AppError, AppResult, ErrorCode};

#[derive(Serialize)]
pub struct PublicOrder {
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total: f64,
    pub paid: f64,
    pub created_at: i64,
}

#[derive(Serialize)]
pub struct PublicCustomer {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize)]
pub struct PublicPayment {
    pub amount: f64,
    pub method: PaymentMethod,
    pub created_at: i64,
}

#[derive(Serialize)]
pub struct PublicOrderResponse {
    pub order: PublicOrder,
    pub customer: Option<PublicCustomer>,
    pub payments: Vec<PublicPayment>,
}

/// GET /api/public/orders/:order_number - 订单公开跟踪视图
pub async fn track_order(
    State(state): State<ServerState>,
    Path(order_number): Path<String>,
) -> AppResult<Json<PublicOrderResponse>> {
    let db = state.get_db();
    let orders = OrderRepository::new(db.clone());
    let customers = CustomerRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let order = orders
        .find_by_number(&order_number)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let order_key = order
        .id
        .as_ref()
        .map(|t| t.to_string())
        .ok_or_else(|| AppError::database("Order missing id"))?;

    let customer = customers
        .find_by_id(&order.customer_id.to_string())
        .await?
        .map(|c| PublicCustomer {
            first_name: c.first_name,
            last_name: c.last_name,
        });

    let ledger = payments.list_by_order(&order_key).await?;

    Ok(Json(PublicOrderResponse {
        order: PublicOrder {
            order_number: order.order_number,
            status: order.status,
            payment_status: order.payment_status,
            total: order.total,
            paid: order.paid,
            created_at: order.created_at,
        },
        customer,
        payments: ledger
            .into_iter()
            .map(|p| PublicPayment {
                amount: p.amount,
                method: p.method,
                created_at: p.created_at,
            })
            .collect(),
    }))
}
