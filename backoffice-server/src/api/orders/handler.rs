//! Order API Handlers
//!
//! 变更流程约定：凡是影响 `total` 或流水的操作，持有订单锁
//! 执行「写入 → 对账」序列，保证派生字段与流水一致。

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{Html, IntoResponse},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{
    Customer, DeliveryType, CareLevel, Order, OrderCreate, OrderItemsUpdate, OrderStatus,
    OrderUpdate, OrderWithCustomer, PaymentStatus,
};
use crate::db::repository::{
    CustomerRepository, OrderListFilter, OrderRepository, PaymentRepository, PriceItemRepository,
    SequenceRepository,
};
use crate::export;
use crate::orders::{reconcile, resolve_items};
use crate::pricing;
use crate::utils::time;
use crate::utils::validation::{self, MAX_NOTE_LEN};
use shared::util::{format_order_number, now_millis};
use shared::{AppError, AppResult, ErrorCode};

/// Counter name backing the order number sequence
const ORDER_SEQUENCE: &str = "order_number";

#[derive(Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<String>,
    /// "YYYY-MM-DD" inclusive lower bound
    pub from: Option<String>,
    /// "YYYY-MM-DD" inclusive upper bound
    pub to: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Serialize)]
pub struct OrderListResponse {
    pub total: i64,
    pub results: Vec<OrderWithCustomer>,
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct NoteBody {
    pub note: String,
}

/// Delayed order row (joined with the customer name)
#[derive(Serialize)]
pub struct DelayedOrder {
    pub order_id: String,
    pub order_number: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub created_at: i64,
}

async fn populate_customers(
    customers: &CustomerRepository,
    orders: Vec<Order>,
) -> AppResult<Vec<OrderWithCustomer>> {
    let mut cache: HashMap<String, Option<Customer>> = HashMap::new();
    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let key = order.customer_id.to_string();
        let customer = match cache.get(&key) {
            Some(c) => c.clone(),
            None => {
                let c = customers.find_by_id(&key).await?;
                cache.insert(key, c.clone());
                c
            }
        };
        result.push(OrderWithCustomer { order, customer });
    }
    Ok(result)
}

/// POST /api/orders - 创建订单
///
/// 解析并快照条目 → 计价 → 分配序号；初始 `paid = 0`、状态 PENDING。
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<Order>> {
    validation::validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;

    let db = state.get_db();
    let customers = CustomerRepository::new(db.clone());
    let catalog = PriceItemRepository::new(db.clone());
    let orders = OrderRepository::new(db.clone());
    let sequences = SequenceRepository::new(db);

    let customer = customers
        .find_by_id(&payload.customer_id)
        .await
        .map_err(|_| AppError::new(ErrorCode::CustomerNotFound))?
        .ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound))?;
    let customer_id = customer
        .id
        .clone()
        .ok_or_else(|| AppError::database("Customer missing id"))?;

    let items = resolve_items(&catalog, &payload.items).await?;
    let total = pricing::order_total(&items);

    let seq = sequences.next(ORDER_SEQUENCE).await?;
    let now = now_millis();

    let order = Order {
        id: None,
        order_number: format_order_number(seq),
        customer_id,
        items,
        status: OrderStatus::Received,
        total,
        paid: 0.0,
        payment_status: PaymentStatus::Pending,
        delivery_type: payload.delivery_type.unwrap_or(DeliveryType::Standard),
        care_level: payload.care_level.unwrap_or(CareLevel::Normal),
        note: payload.note,
        created_at: now,
        updated_at: now,
    };

    let created = orders.create(order).await?;
    tracing::info!(
        order_number = %created.order_number,
        total = created.total,
        "Order created"
    );
    Ok(Json(created))
}

/// GET /api/orders - 订单列表 (带筛选和分页)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<OrderListResponse>> {
    let db = state.get_db();
    let orders = OrderRepository::new(db.clone());
    let customers = CustomerRepository::new(db);

    let filter = OrderListFilter {
        status: query.status,
        customer_id: query.customer_id,
        from: query.from.as_deref().and_then(time::parse_date_start),
        to: query.to.as_deref().and_then(time::parse_date_end),
        limit: query.limit.clamp(1, 200),
        skip: query.skip.max(0),
    };

    let (rows, total) = orders.list(filter).await?;
    let results = populate_customers(&customers, rows).await?;
    Ok(Json(OrderListResponse { total, results }))
}

/// GET /api/orders/delayed - 延误订单
pub async fn delayed(State(state): State<ServerState>) -> AppResult<Json<Vec<DelayedOrder>>> {
    let db = state.get_db();
    let orders = OrderRepository::new(db.clone());
    let customers = CustomerRepository::new(db);

    let cutoff = time::days_ago_millis(state.config.delayed_after_days);
    let rows = orders.find_delayed(cutoff).await?;
    let populated = populate_customers(&customers, rows).await?;

    Ok(Json(
        populated
            .into_iter()
            .map(|row| DelayedOrder {
                order_id: row
                    .order
                    .id
                    .as_ref()
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
                order_number: row.order.order_number.clone(),
                customer_name: row
                    .customer
                    .as_ref()
                    .map(|c| c.full_name())
                    .unwrap_or_default(),
                status: row.order.status,
                created_at: row.order.created_at,
            })
            .collect(),
    ))
}

/// GET /api/orders/customer/:id - 某客户的全部订单
pub async fn by_customer(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.get_db());
    Ok(Json(orders.find_by_customer(&id).await?))
}

/// GET /api/orders/:id - 订单详情 (含客户)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<OrderWithCustomer>> {
    let db = state.get_db();
    let orders = OrderRepository::new(db.clone());
    let customers = CustomerRepository::new(db);

    let order = orders
        .find_by_id(&id)
        .await
        .map_err(|_| AppError::new(ErrorCode::OrderNotFound))?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let customer = customers.find_by_id(&order.customer_id.to_string()).await?;
    Ok(Json(OrderWithCustomer { order, customer }))
}

/// PUT /api/orders/:id - 部分更新 (status / note / delivery / care)
///
/// `paid` / `payment_status` 不在可更新字段内: 它们只能由对账引擎写入。
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<OrderUpdate>,
) -> AppResult<Json<Order>> {
    validation::validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;

    let orders = OrderRepository::new(state.get_db());
    let patch = serde_json::to_value(&payload)
        .map_err(|e| AppError::internal(format!("Failed to serialize patch: {e}")))?;
    let order = orders.update_merge(&id, patch).await.map_err(|e| match e {
        crate::db::repository::RepoError::NotFound(_) => AppError::new(ErrorCode::OrderNotFound),
        other => other.into(),
    })?;
    Ok(Json(order))
}

/// PUT /api/orders/:id/status - 更新订单状态
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> AppResult<Json<Order>> {
    let orders = OrderRepository::new(state.get_db());
    let order = orders
        .update_merge(&id, serde_json::json!({ "status": body.status }))
        .await
        .map_err(|e| match e {
            crate::db::repository::RepoError::NotFound(_) => {
                AppError::new(ErrorCode::OrderNotFound)
            }
            other => other.into(),
        })?;
    Ok(Json(order))
}

/// PUT /api/orders/:id/note - 更新内部备注
pub async fn update_note(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(body): Json<NoteBody>,
) -> AppResult<Json<Order>> {
    validation::validate_required_text(&body.note, "note", MAX_NOTE_LEN)?;

    let orders = OrderRepository::new(state.get_db());
    let order = orders
        .update_merge(&id, serde_json::json!({ "note": body.note }))
        .await
        .map_err(|e| match e {
            crate::db::repository::RepoError::NotFound(_) => {
                AppError::new(ErrorCode::OrderNotFound)
            }
            other => other.into(),
        })?;
    Ok(Json(order))
}

/// PUT /api/orders/:id/items - 替换条目集合
///
/// 重新解析目录 → 重算 `total` → 对账。即便 `paid` 没变，
/// `payment_status` 也可能因新 `total` 跨过阈值而改变。
pub async fn update_items(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<OrderItemsUpdate>,
) -> AppResult<Json<Order>> {
    let db = state.get_db();
    let orders = OrderRepository::new(db.clone());
    let catalog = PriceItemRepository::new(db.clone());

    let order = orders
        .find_by_id(&id)
        .await
        .map_err(|_| AppError::new(ErrorCode::OrderNotFound))?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let order_key = order
        .id
        .as_ref()
        .map(|t| t.to_string())
        .ok_or_else(|| AppError::database("Order missing id"))?;

    let items = resolve_items(&catalog, &payload.items).await?;
    let total = pricing::order_total(&items);

    let _guard = state.order_locks.acquire(&order_key).await;
    orders.set_items(&order_key, items, total).await?;
    let reconciled = reconcile(&db, &order_key).await?;

    tracing::info!(
        order_number = %reconciled.order_number,
        total = reconciled.total,
        payment_status = ?reconciled.payment_status,
        "Order items updated"
    );
    Ok(Json(reconciled))
}

/// DELETE /api/orders/:id - 删除订单
///
/// 引用完整性守卫：存在支付流水时拒绝删除（先删流水再删订单）。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<shared::ApiResponse<()>>> {
    let db = state.get_db();
    let orders = OrderRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let order = orders
        .find_by_id(&id)
        .await
        .map_err(|_| AppError::new(ErrorCode::OrderNotFound))?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let order_key = order
        .id
        .as_ref()
        .map(|t| t.to_string())
        .ok_or_else(|| AppError::database("Order missing id"))?;

    if payments.exists_for_order(&order_key).await? {
        return Err(AppError::new(ErrorCode::OrderHasPayments));
    }

    orders.delete(&order_key).await?;
    tracing::info!(order_number = %order.order_number, "Order deleted");
    Ok(Json(shared::ApiResponse::ok()))
}

/// GET /api/orders/:id/ticket - 打印小票 (HTML, 含跟踪二维码)
pub async fn ticket(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let db = state.get_db();
    let orders = OrderRepository::new(db.clone());
    let customers = CustomerRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let order = orders
        .find_by_id(&id)
        .await
        .map_err(|_| AppError::new(ErrorCode::OrderNotFound))?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let order_key = order
        .id
        .as_ref()
        .map(|t| t.to_string())
        .ok_or_else(|| AppError::database("Order missing id"))?;
    let customer = customers.find_by_id(&order.customer_id.to_string()).await?;
    let ledger = payments.list_by_order(&order_key).await?;

    let html = export::ticket::render_ticket(
        &state.config.public_base_url,
        &order,
        customer.as_ref(),
        &ledger,
    )?;
    Ok(Html(html))
}
