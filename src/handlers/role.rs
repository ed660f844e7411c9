//! 角色查询处理器

use crate::{
    error::AppError,
    middleware::AppState,
    models::{role::ListRolesQuery, ApiResponse, PageRequest},
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// 列出角色
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRolesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let roles = state
        .user_admin_service
        .list_roles(PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(ApiResponse::ok("Roles retrieved successfully", roles)))
}
