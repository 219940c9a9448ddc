//! Payment Ledger Repository
//!
//! 业务层面 append-only：只提供 create / delete，不提供 update。

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Payment, PaymentMethod};
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "payment";

/// List filter for `GET /api/payments`
#[derive(Debug, Clone, Default)]
pub struct PaymentListFilter {
    pub method: Option<PaymentMethod>,
    pub order_id: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub limit: i64,
    pub skip: i64,
}

#[derive(Deserialize)]
struct CountRow {
    total: i64,
}

#[derive(Deserialize)]
struct SumRow {
    total: Option<f64>,
}

#[derive(Clone)]
pub struct PaymentRepository {
    base: BaseRepository,
}

impl PaymentRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Append a ledger entry
    pub async fn create(&self, payment: Payment) -> RepoResult<Payment> {
        let created: Option<Payment> = self.base.db().create(TABLE).content(payment).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create payment".to_string()))
    }

    /// Find payment by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Payment>> {
        let rid = parse_record_id(TABLE, id)?;
        let payment: Option<Payment> = self.base.db().select(rid).await?;
        Ok(payment)
    }

    /// Remove a ledger entry, returning it (the caller reconciles its order)
    pub async fn delete(&self, id: &str) -> RepoResult<Option<Payment>> {
        let rid = parse_record_id(TABLE, id)?;
        let deleted: Option<Payment> = self.base.db().delete(rid).await?;
        Ok(deleted)
    }

    /// 按订单查询全部流水（对账引擎的读路径）
    pub async fn list_by_order(&self, order_id: &str) -> RepoResult<Vec<Payment>> {
        let order_id = parse_record_id("order", order_id)?.to_string();
        let payments: Vec<Payment> = self
            .base
            .db()
            .query("SELECT * FROM payment WHERE order_id = $order_id ORDER BY created_at ASC")
            .bind(("order_id", order_id))
            .await?
            .take(0)?;
        Ok(payments)
    }

    /// Whether any ledger entry references the order (delete guard)
    pub async fn exists_for_order(&self, order_id: &str) -> RepoResult<bool> {
        let order_id = parse_record_id("order", order_id)?.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS total FROM payment WHERE order_id = $order_id GROUP ALL")
            .bind(("order_id", order_id))
            .await?;
        let counts: Vec<CountRow> = result.take(0)?;
        Ok(counts.first().map(|c| c.total).unwrap_or(0) > 0)
    }

    /// List payments with filters, newest first; returns (payments, total)
    pub async fn list(&self, filter: PaymentListFilter) -> RepoResult<(Vec<Payment>, i64)> {
        let mut conditions: Vec<&str> = Vec::new();
        if filter.method.is_some() {
            conditions.push("method = $method");
        }
        if filter.order_id.is_some() {
            conditions.push("order_id = $order_id");
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
            "SELECT * FROM payment{where_clause} ORDER BY created_at DESC LIMIT $limit START $skip"
        );
        let count_query = format!("SELECT count() AS total FROM payment{where_clause} GROUP ALL");

        let mut q = self
            .base
            .db()
            .query(list_query)
            .query(count_query)
            .bind(("limit", filter.limit))
            .bind(("skip", filter.skip));
        if let Some(method) = filter.method {
            q = q.bind(("method", method));
        }
        if let Some(order_id) = filter.order_id {
            let order_id = parse_record_id("order", &order_id)?.to_string();
            q = q.bind(("order_id", order_id));
        }
        if let Some(from) = filter.from {
            q = q.bind(("from", from));
        }
        if let Some(to) = filter.to {
            q = q.bind(("to", to));
        }

        let mut result = q.await?;
        let payments: Vec<Payment> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.total).unwrap_or(0);
        Ok((payments, total))
    }

    /// 按时间范围查询（统计 / 导出用）
    pub async fn list_by_time_range(&self, from: i64, to: i64) -> RepoResult<Vec<Payment>> {
        let payments: Vec<Payment> = self
            .base
            .db()
            .query(
                "SELECT * FROM payment WHERE created_at >= $from AND created_at <= $to ORDER BY created_at ASC",
            )
            .bind(("from", from))
            .bind(("to", to))
            .await?
            .take(0)?;
        Ok(payments)
    }

    /// Ledger-wide revenue sum
    pub async fn total_revenue(&self) -> RepoResult<f64> {
        let mut result = self
            .base
            .db()
            .query("SELECT math::sum(amount) AS total FROM payment GROUP ALL")
            .await?;
        let sums: Vec<SumRow> = result.take(0)?;
        Ok(sums.first().and_then(|s| s.total).unwrap_or(0.0))
    }
}
