//! User domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::RoleAssignment;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,

    /// 当前唯一有效的刷新令牌；None 表示无会话
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 软删除时间
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 新建用户（写入存储前）
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
}

/// Register request
#[derive(Debug, Deserialize, validator::Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Create user request (user management)
#[derive(Debug, Deserialize, validator::Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub initial_role: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Update status request
#[derive(Debug, Deserialize, validator::Validate)]
pub struct UpdateUserStatusRequest {
    pub is_active: bool,
}

/// Update password request
#[derive(Debug, Deserialize, validator::Validate)]
pub struct UpdateUserPasswordRequest {
    #[validate(length(min = 1))]
    pub new_password: String,
}

/// Update profile request
#[derive(Debug, Default, Deserialize, validator::Validate)]
pub struct UpdateUserProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

/// 用户列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

/// Role as seen on a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTime<Utc>,
}

impl From<RoleAssignment> for UserRoleResponse {
    fn from(a: RoleAssignment) -> Self {
        Self {
            id: a.role_id,
            name: a.role_name,
            description: a.role_description,
            assigned_by: a.assigned_by,
            assigned_at: a.assigned_at,
        }
    }
}

/// User response (without sensitive data)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub roles: Vec<UserRoleResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    /// 组合用户与其角色分配（按分配时间排序）
    pub fn new(user: User, assignments: Vec<RoleAssignment>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            is_active: user.is_active,
            roles: assignments.into_iter().map(Into::into).collect(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }
}
