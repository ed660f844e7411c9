//! 认证服务：注册、登录、令牌刷新、登出
//!
//! 每个用户同一时间只有一个有效的刷新令牌，新签发的令牌直接覆盖旧值。
//! 同一用户并发刷新时后写者胜出，失败一方拿到的新令牌立即失效。

use super::user_snapshot;
use crate::{
    auth::{hierarchy::GUEST, jwt::JwtService, password::PasswordHasher},
    config::AppConfig,
    error::AppError,
    models::{
        auth::{LoginRequest, LoginResponse, RefreshTokenRequest},
        user::{NewUser, RegisterRequest, User, UserResponse},
    },
    repository::{RoleStore, UserStore},
};
use std::sync::Arc;
use uuid::Uuid;

pub struct AuthService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    jwt_service: Arc<JwtService>,
    hasher: PasswordHasher,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        jwt_service: Arc<JwtService>,
        hasher: PasswordHasher,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            roles,
            jwt_service,
            hasher,
            config,
        }
    }

    /// 用户注册
    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, AppError> {
        PasswordHasher::validate_password_policy(
            &req.password,
            self.config.security.password_min_length,
        )?;

        if self
            .users
            .exists_by_username_or_email(&req.username, &req.email)
            .await?
        {
            return Err(AppError::DuplicateUser);
        }

        let password_hash = self.hasher.hash_blocking(&req.password).await?;

        let user = self
            .users
            .create(NewUser {
                username: req.username,
                email: req.email,
                name: req.name,
                password_hash,
                is_active: true,
            })
            .await?;

        self.assign_guest(&user).await;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        user_snapshot(self.roles.as_ref(), user).await
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let result = self.try_login(req).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AppError::InvalidCredentials) => "invalid_credentials",
            Err(AppError::AccountDisabled) => "account_disabled",
            Err(_) => "error",
        };
        metrics::counter!("auth_login_total", "outcome" => outcome).increment(1);

        result
    }

    async fn try_login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = match self.users.find_by_username(&req.username).await? {
            Some(user) => user,
            None => {
                tracing::debug!(username = %req.username, "Login failed: unknown username");
                return Err(AppError::InvalidCredentials);
            }
        };

        // 验证密码
        if !self
            .hasher
            .verify_blocking(&req.password, &user.password_hash)
            .await?
        {
            tracing::debug!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::info!(user_id = %user.id, "Login rejected: account disabled");
            return Err(AppError::AccountDisabled);
        }

        let response = self.issue_session(user).await?;

        tracing::info!(user_id = %response.user.id, "User logged in");

        Ok(response)
    }

    /// 刷新令牌
    pub async fn refresh(&self, req: RefreshTokenRequest) -> Result<LoginResponse, AppError> {
        let result = self.try_refresh(req).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AppError::InvalidToken) => "invalid_token",
            Err(_) => "error",
        };
        metrics::counter!("auth_refresh_total", "outcome" => outcome).increment(1);

        result
    }

    async fn try_refresh(&self, req: RefreshTokenRequest) -> Result<LoginResponse, AppError> {
        let claims = self
            .jwt_service
            .validate_refresh(&req.refresh_token)
            .map_err(|e| {
                tracing::debug!("Refresh token rejected: {}", e);
                AppError::from(e)
            })?;
        let user_id = claims.user_id()?;

        // 必须与当前存储的令牌完全一致
        let user = self
            .users
            .find_by_refresh_token(user_id, &req.refresh_token)
            .await?
            .ok_or_else(|| {
                tracing::debug!(user_id = %user_id, "Refresh token is not the active one");
                AppError::InvalidToken
            })?;

        self.issue_session(user).await
    }

    /// 登出（清除刷新令牌），重复调用无副作用
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.users.set_refresh_token(user_id, None).await?;

        tracing::info!(user_id = %user_id, "User logged out");

        Ok(())
    }

    /// 签发令牌对并覆盖保存刷新令牌
    async fn issue_session(&self, user: User) -> Result<LoginResponse, AppError> {
        let snapshot = user_snapshot(self.roles.as_ref(), user).await?;

        let token_pair =
            self.jwt_service
                .issue_pair(&snapshot.id, &snapshot.username, snapshot.role_names())?;

        self.users
            .set_refresh_token(snapshot.id, Some(&token_pair.refresh_token))
            .await?;

        Ok(LoginResponse {
            access_token: token_pair.access_token,
            refresh_token: token_pair.refresh_token,
            expires_in: token_pair.expires_in,
            user: snapshot,
        })
    }

    /// 尽力分配 guest 角色，失败只记录日志
    async fn assign_guest(&self, user: &User) {
        let role = match self.roles.find_by_name(GUEST).await {
            Ok(Some(role)) => role,
            Ok(None) => {
                tracing::warn!(user_id = %user.id, "Guest role missing, skipping assignment");
                return;
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, "Failed to look up guest role: {}", e);
                return;
            }
        };

        if let Err(e) = self.roles.assign(user.id, role.id, None).await {
            tracing::warn!(user_id = %user.id, "Failed to assign guest role: {}", e);
        }
    }
}
