//! HTTP 中间件与应用状态
//! 请求追踪（trace_id / request_id、日志、指标）

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher, RoleHierarchy},
    config::AppConfig,
    error::AppError,
    repository::{RoleStore, UserStore},
    services::{AuthService, PermissionService, UserAdminService},
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 所有服务在启动时构建一次并通过 Arc 共享
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// 使用内存存储时为 None
    pub db: Option<sqlx::PgPool>,
    pub auth_service: Arc<AuthService>,
    pub user_admin_service: Arc<UserAdminService>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        db: Option<sqlx::PgPool>,
        hasher: PasswordHasher,
    ) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(&config)?);

        let auth_service = Arc::new(AuthService::new(
            users.clone(),
            roles.clone(),
            jwt_service.clone(),
            hasher.clone(),
            config.clone(),
        ));

        let user_admin_service = Arc::new(UserAdminService::new(
            users,
            roles,
            PermissionService::new(Arc::new(RoleHierarchy::standard())),
            hasher,
            config.clone(),
        ));

        Ok(Self {
            config,
            db,
            auth_service,
            user_admin_service,
            jwt_service,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 标签只使用有限集合
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "OTHER",
        };
        let status_class = match status {
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            _ => "5xx",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_class)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_or_generate_trace_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", "test-trace-123".parse().unwrap());

        let trace_id = extract_or_generate_trace_id(&headers);
        assert_eq!(trace_id, "test-trace-123");

        let headers = HeaderMap::new();
        let trace_id = extract_or_generate_trace_id(&headers);
        assert!(!trace_id.is_empty());
        assert_ne!(trace_id, "test-trace-123");
    }
}
