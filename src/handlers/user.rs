//! 用户管理的 HTTP 处理器

use super::ValidatedJson;
use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::{
        role::{AssignRoleRequest, RemoveRoleRequest},
        user::{
            CreateUserRequest, ListUsersQuery, UpdateUserPasswordRequest,
            UpdateUserProfileRequest, UpdateUserStatusRequest,
        },
        ApiResponse, PageRequest,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// 列出用户
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageRequest::new(query.page, query.limit);
    let users = state
        .user_admin_service
        .list_users(page, query.search.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok("Users retrieved successfully", users)))
}

/// 获取用户详情
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_admin_service.get_user(id).await?;

    Ok(Json(ApiResponse::ok("User retrieved successfully", user)))
}

/// 创建用户
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_admin_service
        .create_user(&auth_context, req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("User created successfully", user)),
    ))
}

/// 启用/禁用用户
pub async fn update_user_status(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_admin_service
        .update_status(&auth_context, id, req.is_active)
        .await?;

    Ok(Json(ApiResponse::ok("User status updated successfully", user)))
}

/// 重置用户密码
pub async fn update_user_password(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_admin_service
        .update_password(&auth_context, id, &req.new_password)
        .await?;

    Ok(Json(ApiResponse::ok("User password updated successfully", user)))
}

/// 修改用户资料
pub async fn update_user_profile(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_admin_service
        .update_profile(&auth_context, id, req)
        .await?;

    Ok(Json(ApiResponse::ok("User profile updated successfully", user)))
}

/// 删除用户
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .user_admin_service
        .delete_user(&auth_context, id)
        .await?;

    Ok(Json(ApiResponse::message("User deleted successfully")))
}

/// 分配角色
pub async fn assign_role(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AssignRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_admin_service
        .assign_role(&auth_context, id, &req.role_name)
        .await?;

    Ok(Json(ApiResponse::ok("Role assigned successfully", user)))
}

/// 移除角色
pub async fn remove_role(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<RemoveRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_admin_service
        .remove_role(&auth_context, id, &req.role_name)
        .await?;

    Ok(Json(ApiResponse::ok("Role removed successfully", user)))
}
