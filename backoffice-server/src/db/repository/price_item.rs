//! Price Catalog Repository

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{PriceItem, PriceItemCreate, PriceItemUpdate};
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "price_item";

#[derive(Clone)]
pub struct PriceItemRepository {
    base: BaseRepository,
}

impl PriceItemRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all price items ordered by name
    pub async fn find_all(&self) -> RepoResult<Vec<PriceItem>> {
        let items: Vec<PriceItem> = self
            .base
            .db()
            .query("SELECT * FROM price_item ORDER BY name")
            .await?
            .take(0)?;
        Ok(items)
    }

    /// Find price item by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<PriceItem>> {
        let rid = parse_record_id(TABLE, id)?;
        let item: Option<PriceItem> = self.base.db().select(rid).await?;
        Ok(item)
    }

    /// Find price item by unique name
    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<PriceItem>> {
        let name_owned = name.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM price_item WHERE name = $name LIMIT 1")
            .bind(("name", name_owned))
            .await?;
        let items: Vec<PriceItem> = result.take(0)?;
        Ok(items.into_iter().next())
    }

    /// Create a new price item
    pub async fn create(&self, data: PriceItemCreate) -> RepoResult<PriceItem> {
        // Check duplicate name
        if self.find_by_name(&data.name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Price item '{}' already exists",
                data.name
            )));
        }

        let now = now_millis();
        let item = PriceItem {
            id: None,
            name: data.name,
            pricing_mode: data.pricing_mode,
            point_multiplier: data.point_multiplier,
            unit_price: data.unit_price,
            created_at: now,
            updated_at: now,
        };

        let created: Option<PriceItem> = self.base.db().create(TABLE).content(item).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create price item".to_string()))
    }

    /// Create or update keyed by the unique name
    ///
    /// Returns `(item, created)` where `created` is false for updates.
    pub async fn upsert_by_name(&self, data: PriceItemCreate) -> RepoResult<(PriceItem, bool)> {
        match self.find_by_name(&data.name).await? {
            Some(existing) => {
                let id = existing
                    .id
                    .as_ref()
                    .map(|t| t.to_string())
                    .ok_or_else(|| RepoError::Database("Price item missing id".to_string()))?;
                let updated = self
                    .update(
                        &id,
                        PriceItemUpdate {
                            name: None,
                            pricing_mode: Some(data.pricing_mode),
                            point_multiplier: data.point_multiplier,
                            unit_price: Some(data.unit_price),
                        },
                    )
                    .await?;
                Ok((updated, false))
            }
            None => Ok((self.create(data).await?, true)),
        }
    }

    /// Update a price item (MERGE semantics)
    pub async fn update(&self, id: &str, data: PriceItemUpdate) -> RepoResult<PriceItem> {
        let rid = parse_record_id(TABLE, id)?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Price item {} not found", id)))?;

        // Check duplicate name if changing
        if let Some(ref new_name) = data.name
            && new_name != &existing.name
            && self.find_by_name(new_name).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Price item '{}' already exists",
                new_name
            )));
        }

        let mut patch = serde_json::to_value(&data)
            .map_err(|e| RepoError::Database(format!("Failed to serialize patch: {e}")))?;
        patch["updated_at"] = serde_json::json!(now_millis());

        self.base
            .db()
            .query("UPDATE $id MERGE $data")
            .bind(("id", rid))
            .bind(("data", patch))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Price item {} not found", id)))
    }
}
