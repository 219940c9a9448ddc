//! Sequence Repository
//!
//! 单调递增计数器，用于生成人类可读的订单编号。

use super::{BaseRepository, RepoError, RepoResult};
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Deserialize)]
struct CounterRow {
    value: i64,
}

#[derive(Clone)]
pub struct SequenceRepository {
    base: BaseRepository,
}

impl SequenceRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Atomically increment the named counter and return the new value
    ///
    /// Missing counters start at 0, so the first call returns 1.
    pub async fn next(&self, name: &str) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query("UPSERT type::thing('counter', $name) SET value += 1 RETURN AFTER")
            .bind(("name", name.to_string()))
            .await?;
        let rows: Vec<CounterRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|r| r.value)
            .ok_or_else(|| RepoError::Database(format!("Counter '{}' update returned nothing", name)))
    }
}
