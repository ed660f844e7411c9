//! 认证相关的 HTTP 处理器

use super::ValidatedJson;
use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::{
        auth::{LoginRequest, RefreshTokenRequest},
        user::RegisterRequest,
        ApiResponse,
    },
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("User registered successfully", user)),
    ))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;

    Ok(Json(ApiResponse::ok("Login successful", response)))
}

/// 刷新令牌
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.refresh(req).await?;

    Ok(Json(ApiResponse::ok("Token refreshed successfully", response)))
}

/// 登出
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(auth_context.user_id).await?;

    Ok(Json(ApiResponse::message("Logout successful")))
}

/// 当前令牌中的身份快照
pub async fn me(auth_context: AuthContext) -> Result<impl IntoResponse, AppError> {
    Ok(Json(ApiResponse::ok(
        "Current user",
        json!({
            "user_id": auth_context.user_id,
            "username": auth_context.username,
            "roles": auth_context.roles,
        }),
    )))
}
