//! Order Repository
//!
//! 派生字段约定：`paid` / `payment_status` 只经由
//! [`set_payment_fields`](OrderRepository::set_payment_fields) 写入，
//! 调用方是对账引擎，不存在其他写入路径。

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Order, OrderItem, OrderStatus, PaymentStatus};
use serde::Deserialize;
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "order";

/// List filter for `GET /api/orders`
#[derive(Debug, Clone, Default)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<String>,
    /// created_at lower bound (millis, inclusive)
    pub from: Option<i64>,
    /// created_at upper bound (millis, inclusive)
    pub to: Option<i64>,
    pub limit: i64,
    pub skip: i64,
}

/// Per-status order count (dashboard)
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Deserialize)]
struct CountRow {
    total: i64,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a fully built order (items already priced)
    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let rid = parse_record_id(TABLE, id)?;
        let order: Option<Order> = self.base.db().select(rid).await?;
        Ok(order)
    }

    /// Find order by its human-facing number
    pub async fn find_by_number(&self, order_number: &str) -> RepoResult<Option<Order>> {
        let number = order_number.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order WHERE order_number = $number LIMIT 1")
            .bind(("number", number))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// List orders with filters, newest first; returns (orders, total matching)
    pub async fn list(&self, filter: OrderListFilter) -> RepoResult<(Vec<Order>, i64)> {
        let mut conditions: Vec<&str> = Vec::new();
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.customer_id.is_some() {
            conditions.push("customer_id = $customer_id");
        }
        if filter.from.is_some() {
            conditions.push("created_at >= $from");
        }
        if filter.to.is_some() {
            conditions.push("created_at <= $to");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let list_query = format!(
            "SELECT * FROM order{where_clause} ORDER BY created_at DESC LIMIT $limit START $skip"
        );
        let count_query = format!("SELECT count() AS total FROM order{where_clause} GROUP ALL");

        let mut q = self
            .base
            .db()
            .query(list_query)
            .query(count_query)
            .bind(("limit", filter.limit))
            .bind(("skip", filter.skip));
        if let Some(status) = filter.status {
            q = q.bind(("status", status));
        }
        if let Some(customer_id) = filter.customer_id {
            let customer_id = parse_record_id("customer", &customer_id)?.to_string();
            q = q.bind(("customer_id", customer_id));
        }
        if let Some(from) = filter.from {
            q = q.bind(("from", from));
        }
        if let Some(to) = filter.to {
            q = q.bind(("to", to));
        }

        let mut result = q.await?;
        let orders: Vec<Order> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.total).unwrap_or(0);
        Ok((orders, total))
    }

    /// All orders for one customer, newest first
    pub async fn find_by_customer(&self, customer_id: &str) -> RepoResult<Vec<Order>> {
        let customer_id = parse_record_id("customer", customer_id)?.to_string();
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE customer_id = $customer_id ORDER BY created_at DESC")
            .bind(("customer_id", customer_id))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Whether any order references the customer (delete guard)
    pub async fn exists_for_customer(&self, customer_id: &str) -> RepoResult<bool> {
        let customer_id = parse_record_id("customer", customer_id)?.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS total FROM order WHERE customer_id = $customer_id GROUP ALL")
            .bind(("customer_id", customer_id))
            .await?;
        let counts: Vec<CountRow> = result.take(0)?;
        Ok(counts.first().map(|c| c.total).unwrap_or(0) > 0)
    }

    /// Apply a partial update (status / note / delivery / care)
    pub async fn update_merge(
        &self,
        id: &str,
        mut patch: serde_json::Value,
    ) -> RepoResult<Order> {
        let rid = parse_record_id(TABLE, id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))?;

        patch["updated_at"] = serde_json::json!(now_millis());
        self.base
            .db()
            .query("UPDATE $id MERGE $data")
            .bind(("id", rid))
            .bind(("data", patch))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Replace the item set and the derived `total`
    ///
    /// The caller reconciles afterwards: `payment_status` depends on `total`.
    pub async fn set_items(
        &self,
        id: &str,
        items: Vec<OrderItem>,
        total: f64,
    ) -> RepoResult<Order> {
        let rid = parse_record_id(TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $id SET items = $items, total = $total, updated_at = $now RETURN AFTER")
            .bind(("id", rid))
            .bind(("items", items))
            .bind(("total", total))
            .bind(("now", now_millis()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Write the reconciled payment fields
    ///
    /// The single write path for `paid` / `payment_status`.
    pub async fn set_payment_fields(
        &self,
        id: &str,
        paid: f64,
        payment_status: PaymentStatus,
    ) -> RepoResult<Order> {
        let rid = parse_record_id(TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $id SET paid = $paid, payment_status = $payment_status, updated_at = $now RETURN AFTER",
            )
            .bind(("id", rid))
            .bind(("paid", paid))
            .bind(("payment_status", payment_status))
            .bind(("now", now_millis()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Hard delete an order
    ///
    /// Referential guards (ledger entries) are checked by the handler.
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let rid = parse_record_id(TABLE, id)?;
        let deleted: Option<Order> = self.base.db().delete(rid).await?;
        Ok(deleted.is_some())
    }

    /// Orders created before the cutoff and still not completed/delivered
    pub async fn find_delayed(&self, cutoff_millis: i64) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM order WHERE created_at <= $cutoff AND status NOT IN [$completed, $delivered] ORDER BY created_at ASC",
            )
            .bind(("cutoff", cutoff_millis))
            .bind(("completed", OrderStatus::Completed))
            .bind(("delivered", OrderStatus::Delivered))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Total number of orders
    pub async fn count_all(&self) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS total FROM order GROUP ALL")
            .await?;
        let counts: Vec<CountRow> = result.take(0)?;
        Ok(counts.first().map(|c| c.total).unwrap_or(0))
    }

    /// Orders created at or after the timestamp
    pub async fn count_created_since(&self, since_millis: i64) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS total FROM order WHERE created_at >= $since GROUP ALL")
            .bind(("since", since_millis))
            .await?;
        let counts: Vec<CountRow> = result.take(0)?;
        Ok(counts.first().map(|c| c.total).unwrap_or(0))
    }

    /// Order counts grouped by workflow status
    pub async fn count_by_status(&self) -> RepoResult<Vec<StatusCount>> {
        let rows: Vec<StatusCount> = self
            .base
            .db()
            .query("SELECT status, count() AS count FROM order GROUP BY status")
            .await?
            .take(0)?;
        Ok(rows)
    }
}
