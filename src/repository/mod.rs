//! Storage layer
//! 存储抽象（trait）及 PostgreSQL / 内存两种实现

pub mod memory;
pub mod role_repo;
pub mod user_repo;

pub use memory::MemoryStore;
pub use role_repo::RoleRepository;
pub use user_repo::UserRepository;

use crate::{
    error::AppError,
    models::{
        role::{Role, RoleAssignment},
        user::{NewUser, User},
        PageRequest,
    },
};
use async_trait::async_trait;
use uuid::Uuid;

/// 初始角色及描述（与迁移脚本保持一致）
pub const SEEDED_ROLES: &[(&str, &str)] = &[
    ("superadmin", "Super Administrator with full access"),
    ("coordinator", "Coordinator managing warehouse operations and users"),
    ("admin", "Administrator for products and orders"),
    ("admin-retur", "Administrator for returns"),
    ("finance", "Finance staff"),
    ("warehouse", "Warehouse staff"),
    ("picker", "Order picker"),
    ("outbound", "Outbound staff"),
    ("qc-ribbon", "Quality control (ribbon)"),
    ("qc-online", "Quality control (online)"),
    ("mb-ribbon", "Packing table (ribbon)"),
    ("mb-online", "Packing table (online)"),
    ("packing", "Packing staff"),
    ("guest", "Guest with minimal access"),
];

/// 用户存储
///
/// 所有查询都会忽略已软删除的用户
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// 按 id 且刷新令牌逐字节相等查找
    async fn find_by_refresh_token(
        &self,
        id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<User>, AppError>;

    async fn exists_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AppError>;

    /// 邮箱是否被其他用户占用
    async fn email_taken_by_other(&self, email: &str, user_id: Uuid) -> Result<bool, AppError>;

    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// 覆盖保存刷新令牌（None 表示清除）
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError>;

    async fn update_status(&self, id: Uuid, is_active: bool) -> Result<Option<User>, AppError>;

    /// 更新密码哈希并清除刷新令牌
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, AppError>;

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError>;

    /// 原子地移除角色分配并软删除用户
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// 分页列出用户，search 对 username / name 大小写不敏感
    async fn list(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<(Vec<User>, i64), AppError>;
}

/// 角色与角色分配存储
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError>;

    async fn list(&self, page: PageRequest) -> Result<(Vec<Role>, i64), AppError>;

    /// 用户的角色分配，按分配时间排序
    async fn assignments_of(&self, user_id: Uuid) -> Result<Vec<RoleAssignment>, AppError>;

    async fn has_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, AppError>;

    /// 重复分配返回 `AlreadyAssigned`
    async fn assign(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<(), AppError>;

    async fn remove(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, AppError>;
}

/// 唯一约束冲突
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
