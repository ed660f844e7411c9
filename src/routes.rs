//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer};

use crate::{
    auth::middleware::{jwt_auth_middleware, role_gate_middleware, RoleGate},
    handlers,
    middleware::{request_tracking_middleware, AppState},
};

/// 请求体上限
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 认证路由（无需令牌）
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh_token));

    // 用户管理写操作（superadmin / coordinator）
    let user_management_routes = Router::new()
        .route("/api/user-manager/users", post(handlers::user::create_user))
        .route(
            "/api/user-manager/users/{id}",
            axum::routing::delete(handlers::user::delete_user),
        )
        .route(
            "/api/user-manager/users/{id}/status",
            put(handlers::user::update_user_status),
        )
        .route(
            "/api/user-manager/users/{id}/password",
            put(handlers::user::update_user_password),
        )
        .route(
            "/api/user-manager/users/{id}/profile",
            put(handlers::user::update_user_profile),
        )
        .route(
            "/api/user-manager/users/{id}/roles",
            post(handlers::user::assign_role).delete(handlers::user::remove_role),
        )
        .route_layer(from_fn_with_state(
            RoleGate::USER_MANAGEMENT,
            role_gate_middleware,
        ));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/user-manager/users", get(handlers::user::list_users))
        .route("/api/user-manager/users/{id}", get(handlers::user::get_user))
        .route("/api/user-manager/roles", get(handlers::role::list_roles))
        .merge(user_management_routes)
        .route_layer(from_fn_with_state(
            state.jwt_service.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(from_fn(request_tracking_middleware))
        .with_state(state)
}
