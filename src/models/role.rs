//! Role domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 用户角色分配（关联 roles 表查询）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub role_name: String,
    pub role_description: Option<String>,
    /// 执行分配的用户
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTime<Utc>,
}

/// Assign role request
#[derive(Debug, Deserialize, validator::Validate)]
pub struct AssignRoleRequest {
    #[validate(length(min = 1))]
    pub role_name: String,
}

/// Remove role request
#[derive(Debug, Deserialize, validator::Validate)]
pub struct RemoveRoleRequest {
    #[validate(length(min = 1))]
    pub role_name: String,
}

/// 角色列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ListRolesQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
