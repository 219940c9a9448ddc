//! Authentication Handlers
//!
//! Handles login and profile management

use std::time::Duration;

use axum::{Extension, Json, extract::State};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::UserRepository;
use crate::utils::validation::{self, MAX_NAME_LEN};
use shared::AppError;
use shared::client::{
    ChangePasswordRequest, LoginRequest, LoginResponse, UpdateProfileRequest, UserInfo,
};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// POST /api/auth/login
///
/// Authenticates user credentials and returns a JWT token
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let users = UserRepository::new(state.get_db());
    let user = users.find_by_email(&req.email).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent account enumeration
    let user = match user {
        Some(u) => {
            let password_valid = u
                .verify_password(&req.password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;

            if !password_valid {
                tracing::warn!(email = %req.email, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }
            u
        }
        None => {
            tracing::warn!(email = %req.email, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    let user_id = user.id.as_ref().map(|t| t.to_string()).unwrap_or_default();

    let token = state
        .get_jwt_service()
        .generate_token(&user_id, &user.email, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(
        user_id = %user_id,
        email = %user.email,
        role = %user.role.as_str(),
        "User logged in successfully"
    );

    Ok(Json(LoginResponse {
        token,
        user: user.to_info(),
    }))
}

/// GET /api/auth/me - 当前用户信息
pub async fn me(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<UserInfo>, AppError> {
    let users = UserRepository::new(state.get_db());
    let user = users
        .find_by_id(&current_user.id)
        .await?
        .ok_or_else(|| AppError::new(shared::ErrorCode::UserNotFound))?;
    Ok(Json(user.to_info()))
}

/// PUT /api/auth/me - 更新个人资料
pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserInfo>, AppError> {
    if let Some(first_name) = &req.first_name {
        validation::validate_required_text(first_name, "first_name", MAX_NAME_LEN)?;
    }
    if let Some(last_name) = &req.last_name {
        validation::validate_required_text(last_name, "last_name", MAX_NAME_LEN)?;
    }

    let users = UserRepository::new(state.get_db());
    let user = users
        .update(
            &current_user.id,
            crate::db::models::UserUpdate {
                email: None,
                first_name: req.first_name,
                last_name: req.last_name,
                password: None,
                role: None,
            },
        )
        .await?;

    tracing::info!(email = %user.email, "Profile updated");
    Ok(Json(user.to_info()))
}

/// PUT /api/auth/me/password - 修改密码
pub async fn change_password(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<shared::ApiResponse<()>>, AppError> {
    validation::validate_password(&req.new_password)?;

    let users = UserRepository::new(state.get_db());
    let user = users
        .find_by_id(&current_user.id)
        .await?
        .ok_or_else(|| AppError::new(shared::ErrorCode::UserNotFound))?;

    let current_valid = user
        .verify_password(&req.current_password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
    if !current_valid {
        return Err(AppError::validation("Current password is incorrect"));
    }

    users
        .update(
            &current_user.id,
            crate::db::models::UserUpdate {
                email: None,
                first_name: None,
                last_name: None,
                password: Some(req.new_password),
                role: None,
            },
        )
        .await?;

    tracing::info!(email = %user.email, "Password changed");
    Ok(Json(shared::ApiResponse::ok()))
}
