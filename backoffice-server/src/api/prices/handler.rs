//! Price Catalog Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::{PriceItem, PriceItemCreate, PriceItemUpdate};
use crate::db::repository::PriceItemRepository;
use crate::pricing::MAX_UNIT_PRICE;
use crate::utils::validation::{self, MAX_NAME_LEN};
use shared::{AppError, AppResult, ErrorCode};

fn validate_unit_price(unit_price: f64) -> AppResult<()> {
    if !unit_price.is_finite() || unit_price <= 0.0 || unit_price > MAX_UNIT_PRICE {
        return Err(AppError::new(ErrorCode::PriceItemInvalidPrice)
            .with_detail("unit_price", format!("{unit_price}")));
    }
    Ok(())
}

fn validate_multiplier(point_multiplier: Option<i32>) -> AppResult<()> {
    if let Some(m) = point_multiplier
        && m < 1
    {
        return Err(AppError::validation(format!(
            "point_multiplier must be at least 1, got {m}"
        )));
    }
    Ok(())
}

/// GET /api/prices - 获取价目表
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<PriceItem>>> {
    let prices = PriceItemRepository::new(state.get_db());
    Ok(Json(prices.find_all().await?))
}

/// POST /api/prices - 按唯一名称创建或更新
pub async fn create_or_update(
    State(state): State<ServerState>,
    Json(payload): Json<PriceItemCreate>,
) -> AppResult<Json<PriceItem>> {
    validation::validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_unit_price(payload.unit_price)?;
    validate_multiplier(payload.point_multiplier)?;

    let prices = PriceItemRepository::new(state.get_db());
    let (item, created) = prices.upsert_by_name(payload).await?;
    tracing::info!(
        name = %item.name,
        unit_price = item.unit_price,
        created,
        "Price item upserted"
    );
    Ok(Json(item))
}

/// PUT /api/prices/:id - 更新价目条目
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<PriceItemUpdate>,
) -> AppResult<Json<PriceItem>> {
    if let Some(name) = &payload.name {
        validation::validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(unit_price) = payload.unit_price {
        validate_unit_price(unit_price)?;
    }
    validate_multiplier(payload.point_multiplier)?;

    let prices = PriceItemRepository::new(state.get_db());
    let item = prices.update(&id, payload).await.map_err(|e| match e {
        crate::db::repository::RepoError::NotFound(_) => {
            AppError::new(ErrorCode::PriceItemNotFound)
        }
        crate::db::repository::RepoError::Duplicate(msg) => {
            AppError::with_message(ErrorCode::PriceItemNameExists, msg)
        }
        other => other.into(),
    })?;
    Ok(Json(item))
}
