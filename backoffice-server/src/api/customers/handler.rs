//! Customer API Handlers

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::models::{Customer, CustomerCreate, CustomerUpdate};
use crate::db::repository::{CustomerRepository, OrderRepository, PaymentRepository};
use crate::utils::validation::{
    self, MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN,
};
use shared::{AppError, AppResult, ErrorCode};

#[derive(Serialize)]
pub struct CustomerListResponse {
    pub results: Vec<Customer>,
}

fn validate_create(payload: &CustomerCreate) -> AppResult<()> {
    validation::validate_required_text(&payload.first_name, "first_name", MAX_NAME_LEN)?;
    validation::validate_required_text(&payload.last_name, "last_name", MAX_NAME_LEN)?;
    validation::validate_required_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validation::validate_required_text(&payload.address, "address", MAX_ADDRESS_LEN)?;
    if let Some(email) = &payload.email
        && !email.trim().is_empty()
    {
        validation::validate_email(email)?;
    }
    Ok(())
}

/// GET /api/customers - 获取所有客户
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<CustomerListResponse>> {
    let customers = CustomerRepository::new(state.get_db());
    Ok(Json(CustomerListResponse {
        results: customers.find_all().await?,
    }))
}

/// GET /api/customers/:id - 获取单个客户
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Customer>> {
    let customers = CustomerRepository::new(state.get_db());
    let customer = customers
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound))?;
    Ok(Json(customer))
}

/// POST /api/customers - 创建客户
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CustomerCreate>,
) -> AppResult<Json<Customer>> {
    validate_create(&payload)?;
    let customers = CustomerRepository::new(state.get_db());
    let customer = customers.create(payload).await?;
    tracing::info!(customer = %customer.full_name(), "Customer created");
    Ok(Json(customer))
}

/// PUT /api/customers/:id - 更新客户
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CustomerUpdate>,
) -> AppResult<Json<Customer>> {
    if let Some(first_name) = &payload.first_name {
        validation::validate_required_text(first_name, "first_name", MAX_NAME_LEN)?;
    }
    if let Some(last_name) = &payload.last_name {
        validation::validate_required_text(last_name, "last_name", MAX_NAME_LEN)?;
    }
    if let Some(phone) = &payload.phone {
        validation::validate_required_text(phone, "phone", MAX_SHORT_TEXT_LEN)?;
    }
    if let Some(address) = &payload.address {
        validation::validate_required_text(address, "address", MAX_ADDRESS_LEN)?;
    }
    if let Some(email) = &payload.email
        && !email.trim().is_empty()
    {
        validation::validate_email(email)?;
    }

    let customers = CustomerRepository::new(state.get_db());
    let customer = customers.update(&id, payload).await.map_err(|e| match e {
        crate::db::repository::RepoError::NotFound(_) => {
            AppError::new(ErrorCode::CustomerNotFound)
        }
        other => other.into(),
    })?;
    Ok(Json(customer))
}

/// DELETE /api/customers/:id - 删除客户
///
/// 引用完整性守卫：仍有订单引用该客户时拒绝删除
/// (支付经由订单间接引用客户，订单守卫已传递覆盖)。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<shared::ApiResponse<()>>> {
    let customers = CustomerRepository::new(state.get_db());
    let orders = OrderRepository::new(state.get_db());

    let customer = customers
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound))?;

    if orders.exists_for_customer(&id).await? {
        return Err(AppError::new(ErrorCode::CustomerHasOrders));
    }

    customers.delete(&id).await?;
    tracing::info!(customer = %customer.full_name(), "Customer deleted");
    Ok(Json(shared::ApiResponse::ok()))
}

/// Top customer entry (by amount paid)
#[derive(Debug, Serialize)]
pub struct TopCustomer {
    pub customer_id: String,
    pub name: String,
    pub amount_paid: f64,
    pub payment_count: i64,
    pub last_payment_at: i64,
}

/// GET /api/customers/top - 付款金额前五的客户
pub async fn top_customers(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<TopCustomer>>> {
    let db = state.get_db();
    let payments = PaymentRepository::new(db.clone());
    let orders = OrderRepository::new(db.clone());
    let customers = CustomerRepository::new(db);

    // Aggregate ledger -> order -> customer in memory; the ledger of a
    // single shop stays small enough for this to be the simple answer.
    let all_payments = payments.list_by_time_range(0, i64::MAX).await?;

    struct Acc {
        amount: f64,
        count: i64,
        last_at: i64,
    }
    let mut order_customer: HashMap<String, String> = HashMap::new();
    let mut by_customer: HashMap<String, Acc> = HashMap::new();

    for payment in &all_payments {
        let order_key = payment.order_id.to_string();
        let customer_key = match order_customer.get(&order_key) {
            Some(k) => k.clone(),
            None => {
                let Some(order) = orders.find_by_id(&order_key).await? else {
                    continue;
                };
                let key = order.customer_id.to_string();
                order_customer.insert(order_key, key.clone());
                key
            }
        };

        let entry = by_customer.entry(customer_key).or_insert(Acc {
            amount: 0.0,
            count: 0,
            last_at: 0,
        });
        entry.amount += payment.amount;
        entry.count += 1;
        entry.last_at = entry.last_at.max(payment.created_at);
    }

    let mut ranked: Vec<(String, Acc)> = by_customer.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.amount
            .partial_cmp(&a.1.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(5);

    let mut top = Vec::with_capacity(ranked.len());
    for (customer_id, acc) in ranked {
        let name = customers
            .find_by_id(&customer_id)
            .await?
            .map(|c| c.full_name())
            .unwrap_or_else(|| customer_id.clone());
        top.push(TopCustomer {
            customer_id,
            name,
            amount_paid: acc.amount,
            payment_count: acc.count,
            last_payment_at: acc.last_at,
        });
    }

    Ok(Json(top))
}
