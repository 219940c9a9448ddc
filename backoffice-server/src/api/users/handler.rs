//! User Management Handlers (admin only)

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{UserCreate, UserUpdate};
use crate::db::repository::UserRepository;
use crate::utils::validation::{self, MAX_NAME_LEN};
use shared::client::UserInfo;
use shared::{AppError, AppResult, ErrorCode};

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Serialize)]
pub struct UserListResponse {
    pub results: Vec<UserInfo>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_users: i64,
}

/// GET /api/users - 分页获取用户列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<UserListResponse>> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let skip = (page - 1) * limit;

    let users = UserRepository::new(state.get_db());
    let (rows, total) = users.find_page(limit, skip).await?;

    Ok(Json(UserListResponse {
        results: rows.iter().map(|u| u.to_info()).collect(),
        current_page: page,
        total_pages: ((total + limit - 1) / limit).max(1),
        total_users: total,
    }))
}

/// GET /api/users/:id - 获取单个用户
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserInfo>> {
    let users = UserRepository::new(state.get_db());
    let user = users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(user.to_info()))
}

/// POST /api/users - 创建用户
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<UserInfo>> {
    validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;
    validation::validate_required_text(&payload.first_name, "first_name", MAX_NAME_LEN)?;
    validation::validate_required_text(&payload.last_name, "last_name", MAX_NAME_LEN)?;

    let users = UserRepository::new(state.get_db());
    let user = users.create(payload).await.map_err(|e| match e {
        crate::db::repository::RepoError::Duplicate(msg) => {
            AppError::with_message(ErrorCode::UserEmailExists, msg)
        }
        other => other.into(),
    })?;

    tracing::info!(email = %user.email, role = %user.role.as_str(), "User created");
    Ok(Json(user.to_info()))
}

/// PUT /api/users/:id - 更新用户
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<UserInfo>> {
    if let Some(email) = &payload.email {
        validation::validate_email(email)?;
    }
    if let Some(password) = &payload.password
        && !password.is_empty()
    {
        validation::validate_password(password)?;
    }
    if let Some(first_name) = &payload.first_name {
        validation::validate_required_text(first_name, "first_name", MAX_NAME_LEN)?;
    }
    if let Some(last_name) = &payload.last_name {
        validation::validate_required_text(last_name, "last_name", MAX_NAME_LEN)?;
    }

    let users = UserRepository::new(state.get_db());
    let user = users.update(&id, payload).await.map_err(|e| match e {
        crate::db::repository::RepoError::Duplicate(msg) => {
            AppError::with_message(ErrorCode::UserEmailExists, msg)
        }
        crate::db::repository::RepoError::NotFound(_) => AppError::new(ErrorCode::UserNotFound),
        other => other.into(),
    })?;

    tracing::info!(email = %user.email, "User updated");
    Ok(Json(user.to_info()))
}

/// DELETE /api/users/:id - 删除用户
///
/// 不允许删除自己的账户。
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<shared::ApiResponse<()>>> {
    let users = UserRepository::new(state.get_db());
    let target = users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let target_id = target.id.as_ref().map(|t| t.to_string()).unwrap_or_default();
    if target_id == current_user.id {
        return Err(AppError::new(ErrorCode::UserCannotDeleteSelf));
    }

    users.delete(&id).await?;
    tracing::info!(email = %target.email, "User deleted");
    Ok(Json(shared::ApiResponse::ok()))
}
