//! JWT 认证中间件与角色门禁

use crate::{
    auth::{
        hierarchy::{COORDINATOR, SUPERADMIN},
        jwt::JwtService,
    },
    error::AppError,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthContext {
    pub fn has_any_role(&self, allowed: &[&str]) -> bool {
        self.roles.iter().any(|r| allowed.contains(&r.as_str()))
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::MissingHeader)
    }
}

/// 从 Authorization 头提取令牌
///
/// 头部必须恰好是 `Bearer <token>` 两段；空值视为缺失
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::MissingHeader)?
        .to_str()
        .map_err(|_| AppError::MalformedHeader)?;

    if value.is_empty() {
        return Err(AppError::MissingHeader);
    }

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(token.to_string()),
        _ => Err(AppError::MalformedHeader),
    }
}

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers())?;

    let claims = jwt_service.validate_access(&token)?;
    let user_id = claims.user_id()?;

    let auth_context = AuthContext {
        user_id,
        username: claims.username,
        roles: claims.roles,
    };

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// 角色白名单门禁，需位于 [`jwt_auth_middleware`] 之后
#[derive(Debug, Clone, Copy)]
pub struct RoleGate {
    pub name: &'static str,
    pub allowed: &'static [&'static str],
}

impl RoleGate {
    pub const USER_MANAGEMENT: RoleGate = RoleGate {
        name: "user_management",
        allowed: &[SUPERADMIN, COORDINATOR],
    };

    /// 检查认证上下文是否命中白名单
    pub fn check(&self, ctx: &AuthContext) -> Result<(), AppError> {
        if ctx.has_any_role(self.allowed) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %ctx.user_id,
                gate = self.name,
                roles = ?ctx.roles,
                "Role gate rejected request"
            );
            Err(AppError::Forbidden)
        }
    }
}

/// 角色门禁中间件
pub async fn role_gate_middleware(
    State(gate): State<RoleGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = req
        .extensions()
        .get::<AuthContext>()
        .ok_or(AppError::MissingHeader)?;

    gate.check(ctx)?;

    Ok(next.run(req).await)
}
