//! Business logic services layer

pub mod auth_service;
pub mod permission_service;
pub mod user_admin_service;

pub use auth_service::AuthService;
pub use permission_service::PermissionService;
pub use user_admin_service::UserAdminService;

use crate::{
    error::AppError,
    models::user::{User, UserResponse},
    repository::RoleStore,
};

/// 加载用户的角色分配并组装响应
pub(crate) async fn user_snapshot(
    roles: &dyn RoleStore,
    user: User,
) -> Result<UserResponse, AppError> {
    let assignments = roles.assignments_of(user.id).await?;
    Ok(UserResponse::new(user, assignments))
}
