//! 用户管理服务
//! 创建/删除用户、角色分配、状态/密码/资料修改，均受角色层级约束

use super::{user_snapshot, PermissionService};
use crate::{
    auth::{
        hierarchy::{GUEST, SUPERADMIN},
        middleware::AuthContext,
        password::PasswordHasher,
    },
    config::AppConfig,
    error::AppError,
    models::{
        role::Role,
        user::{CreateUserRequest, NewUser, UpdateUserProfileRequest, User, UserResponse},
        PageRequest, Paginated, Pagination,
    },
    repository::{RoleStore, UserStore},
};
use std::sync::Arc;
use uuid::Uuid;

pub struct UserAdminService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    permissions: PermissionService,
    hasher: PasswordHasher,
    config: Arc<AppConfig>,
}

impl UserAdminService {
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        permissions: PermissionService,
        hasher: PasswordHasher,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            roles,
            permissions,
            hasher,
            config,
        }
    }

    async fn require_user(&self, id: Uuid) -> Result<User, AppError> {
        self.users.find_by_id(id).await?.ok_or(AppError::UserNotFound)
    }

    async fn role_names_of(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        Ok(self
            .roles
            .assignments_of(user_id)
            .await?
            .into_iter()
            .map(|a| a.role_name)
            .collect())
    }

    async fn snapshot(&self, user: User) -> Result<UserResponse, AppError> {
        user_snapshot(self.roles.as_ref(), user).await
    }

    /// 分页列出用户
    pub async fn list_users(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Paginated<UserResponse>, AppError> {
        let (users, total) = self.users.list(page, search).await?;

        let mut items = Vec::with_capacity(users.len());
        for user in users {
            items.push(self.snapshot(user).await?);
        }

        Ok(Paginated {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserResponse, AppError> {
        let user = self.require_user(id).await?;
        self.snapshot(user).await
    }

    /// 分页列出角色
    pub async fn list_roles(&self, page: PageRequest) -> Result<Paginated<Role>, AppError> {
        let (items, total) = self.roles.list(page).await?;

        Ok(Paginated {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    /// 分配角色
    ///
    /// 检查顺序：用户存在、角色存在、未重复分配、层级允许
    pub async fn assign_role(
        &self,
        actor: &AuthContext,
        target_id: Uuid,
        role_name: &str,
    ) -> Result<UserResponse, AppError> {
        let user = self.require_user(target_id).await?;

        let role = self
            .roles
            .find_by_name(role_name)
            .await?
            .ok_or_else(|| AppError::RoleNotFound(role_name.to_string()))?;

        if self.roles.has_role(user.id, role.id).await? {
            return Err(AppError::AlreadyAssigned);
        }

        self.permissions.require_assign(actor, &role.name)?;

        self.roles
            .assign(user.id, role.id, Some(actor.user_id))
            .await?;

        tracing::info!(
            actor_id = %actor.user_id,
            user_id = %user.id,
            role = %role.name,
            "Role assigned"
        );

        self.snapshot(user).await
    }

    /// 移除角色，目标未持有该角色时无操作
    pub async fn remove_role(
        &self,
        actor: &AuthContext,
        target_id: Uuid,
        role_name: &str,
    ) -> Result<UserResponse, AppError> {
        let role = self
            .roles
            .find_by_name(role_name)
            .await?
            .ok_or_else(|| AppError::RoleNotFound(role_name.to_string()))?;

        self.permissions.require_assign(actor, &role.name)?;

        let removed = self.roles.remove(target_id, role.id).await?;
        if removed {
            tracing::info!(
                actor_id = %actor.user_id,
                user_id = %target_id,
                role = %role.name,
                "Role removed"
            );
        }

        let user = self.require_user(target_id).await?;
        self.snapshot(user).await
    }

    /// 创建用户
    pub async fn create_user(
        &self,
        actor: &AuthContext,
        req: CreateUserRequest,
    ) -> Result<UserResponse, AppError> {
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

        // 初始角色的所有检查都在写入用户之前完成
        let initial_role = match req.initial_role.as_deref() {
            Some(name) => {
                if !self.permissions.hierarchy().contains(name) {
                    return Err(AppError::Validation(format!("Invalid role: {}", name)));
                }
                self.permissions.require_assign(actor, name)?;
                let role = self.roles.find_by_name(name).await?.ok_or_else(|| {
                    AppError::Validation(format!("Role does not exist: {}", name))
                })?;
                Some(role)
            }
            None => None,
        };

        let password_hash = self.hasher.hash_blocking(&req.password).await?;

        let user = self
            .users
            .create(NewUser {
                username: req.username,
                email: req.email,
                name: req.name,
                password_hash,
                is_active: req.is_active,
            })
            .await?;

        match initial_role {
            Some(role) => {
                self.roles
                    .assign(user.id, role.id, Some(actor.user_id))
                    .await?;
            }
            None => self.assign_guest(&user, actor.user_id).await,
        }

        tracing::info!(
            actor_id = %actor.user_id,
            user_id = %user.id,
            username = %user.username,
            "User created"
        );

        self.snapshot(user).await
    }

    /// 启用/禁用用户
    pub async fn update_status(
        &self,
        actor: &AuthContext,
        target_id: Uuid,
        is_active: bool,
    ) -> Result<UserResponse, AppError> {
        let user = self
            .users
            .update_status(target_id, is_active)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(
            actor_id = %actor.user_id,
            user_id = %user.id,
            is_active,
            "User status updated"
        );

        self.snapshot(user).await
    }

    /// 重置密码，同时使目标用户的刷新令牌失效
    pub async fn update_password(
        &self,
        actor: &AuthContext,
        target_id: Uuid,
        new_password: &str,
    ) -> Result<UserResponse, AppError> {
        PasswordHasher::validate_password_policy(
            new_password,
            self.config.security.password_min_length,
        )?;

        let user = self.require_user(target_id).await?;
        let target_roles = self.role_names_of(user.id).await?;
        self.permissions.require_modify(actor, &target_roles)?;

        let password_hash = self.hasher.hash_blocking(new_password).await?;

        let user = self
            .users
            .update_password(user.id, &password_hash)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(actor_id = %actor.user_id, user_id = %user.id, "User password updated");

        self.snapshot(user).await
    }

    /// 修改资料（name / email）
    pub async fn update_profile(
        &self,
        actor: &AuthContext,
        target_id: Uuid,
        req: UpdateUserProfileRequest,
    ) -> Result<UserResponse, AppError> {
        let user = self.require_user(target_id).await?;

        if let Some(email) = req.email.as_deref() {
            if self.users.email_taken_by_other(email, user.id).await? {
                return Err(AppError::DuplicateUser);
            }
        }

        let target_roles = self.role_names_of(user.id).await?;
        self.permissions.require_modify(actor, &target_roles)?;

        let user = self
            .users
            .update_profile(user.id, req.name.as_deref(), req.email.as_deref())
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(actor_id = %actor.user_id, user_id = %user.id, "User profile updated");

        self.snapshot(user).await
    }

    /// 软删除用户
    pub async fn delete_user(&self, actor: &AuthContext, target_id: Uuid) -> Result<(), AppError> {
        let user = self.require_user(target_id).await?;

        if user.id == actor.user_id {
            return Err(AppError::permission_denied("Cannot delete your own account"));
        }

        let target_roles = self.role_names_of(user.id).await?;
        self.permissions.require_delete(actor, &target_roles)?;

        if !self.users.soft_delete(user.id).await? {
            return Err(AppError::UserNotFound);
        }

        tracing::info!(
            actor_id = %actor.user_id,
            user_id = %user.id,
            username = %user.username,
            "User deleted"
        );

        Ok(())
    }

    /// 启动时创建首个超级管理员（已存在则跳过）
    pub async fn ensure_superadmin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, AppError> {
        if self.users.find_by_username(username).await?.is_some() {
            tracing::debug!(username = %username, "Bootstrap superadmin already exists");
            return Ok(false);
        }

        PasswordHasher::validate_password_policy(
            password,
            self.config.security.password_min_length,
        )?;

        let role = self
            .roles
            .find_by_name(SUPERADMIN)
            .await?
            .ok_or_else(|| AppError::RoleNotFound(SUPERADMIN.to_string()))?;

        let password_hash = self.hasher.hash_blocking(password).await?;

        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                name: "Super Administrator".to_string(),
                password_hash,
                is_active: true,
            })
            .await?;

        self.roles.assign(user.id, role.id, None).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Bootstrap superadmin created");

        Ok(true)
    }

    async fn assign_guest(&self, user: &User, assigned_by: Uuid) {
        match self.roles.find_by_name(GUEST).await {
            Ok(Some(role)) => {
                if let Err(e) = self.roles.assign(user.id, role.id, Some(assigned_by)).await {
                    tracing::warn!(user_id = %user.id, "Failed to assign guest role: {}", e);
                }
            }
            Ok(None) => {
                tracing::warn!(user_id = %user.id, "Guest role missing, skipping assignment")
            }
            Err(e) => tracing::warn!(user_id = %user.id, "Failed to look up guest role: {}", e),
        }
    }
}
