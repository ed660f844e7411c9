//! 统一错误模型
//! 定义所有错误类型和错误响应格式

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 错误类别，对应对外的状态码分组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Authentication,
    Authorization,
    Conflict,
    NotFound,
    Internal,
}

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Malformed authorization header")]
    MalformedHeader,

    #[error("Access denied")]
    Forbidden,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Username or email already in use")]
    DuplicateUser,

    #[error("Role already assigned")]
    AlreadyAssigned,

    #[error("User not found")]
    UserNotFound,

    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Validation(_) => ErrorCategory::Validation,
            AppError::InvalidCredentials
            | AppError::AccountDisabled
            | AppError::InvalidToken
            | AppError::MissingHeader
            | AppError::MalformedHeader => ErrorCategory::Authentication,
            AppError::Forbidden | AppError::PermissionDenied(_) => ErrorCategory::Authorization,
            AppError::DuplicateUser | AppError::AlreadyAssigned => ErrorCategory::Conflict,
            AppError::UserNotFound | AppError::RoleNotFound(_) => ErrorCategory::NotFound,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
            ErrorCategory::Authorization => StatusCode::FORBIDDEN,
            ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::InvalidCredentials => "Invalid username or password".to_string(),
            AppError::AccountDisabled => "Account is disabled".to_string(),
            AppError::InvalidToken => "Invalid or expired token".to_string(),
            AppError::MissingHeader => "Authorization header is required".to_string(),
            AppError::MalformedHeader => {
                "Authorization header must use the Bearer scheme".to_string()
            }
            AppError::Forbidden => "Access denied".to_string(),
            AppError::PermissionDenied(msg) => msg.clone(),
            AppError::DuplicateUser => "Username or email already in use".to_string(),
            AppError::AlreadyAssigned => "User already holds this role".to_string(),
            AppError::UserNotFound => "User not found".to_string(),
            AppError::RoleNotFound(name) => format!("Role not found: {}", name),
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// 稳定的错误码字符串
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::AccountDisabled => "account_disabled",
            AppError::InvalidToken => "invalid_token",
            AppError::MissingHeader => "missing_header",
            AppError::MalformedHeader => "malformed_header",
            AppError::Forbidden => "forbidden",
            AppError::PermissionDenied(_) => "permission_denied",
            AppError::DuplicateUser => "duplicate_user",
            AppError::AlreadyAssigned => "already_assigned",
            AppError::UserNotFound => "user_not_found",
            AppError::RoleNotFound(_) => "role_not_found",
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                "internal_error"
            }
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    pub fn permission_denied(msg: &str) -> Self {
        AppError::PermissionDenied(msg.to_string())
    }
}

/// 错误响应 DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: String,
    pub code: u16,
    pub request_id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        let body = ErrorResponse {
            success: false,
            message: self.user_message(),
            error: self.error_code().to_string(),
            code: self.code(),
            request_id,
        };

        if self.category() == ErrorCategory::Internal {
            tracing::error!(
                code = self.code(),
                message = %self,
                request_id = %body.request_id,
                "Application error"
            );
        } else {
            tracing::debug!(
                code = self.code(),
                message = %self,
                request_id = %body.request_id,
                "Request rejected"
            );
        }

        (status, Json(body)).into_response()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}
