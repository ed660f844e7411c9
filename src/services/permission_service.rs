//! 权限检查服务
//! 基于角色层级的"能否管理"判断

use crate::{
    auth::{hierarchy::Level, middleware::AuthContext, RoleHierarchy},
    error::AppError,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct PermissionService {
    hierarchy: Arc<RoleHierarchy>,
}

impl PermissionService {
    pub fn new(hierarchy: Arc<RoleHierarchy>) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// 操作者（按令牌中的角色快照）的最高等级
    pub fn actor_level(&self, actor: &AuthContext) -> Level {
        self.hierarchy.max_level(&actor.roles)
    }

    /// 分配或移除角色
    pub fn require_assign(&self, actor: &AuthContext, role: &str) -> Result<(), AppError> {
        let actor_level = self.actor_level(actor);

        if !self.hierarchy.can_assign(actor_level, role) {
            tracing::warn!(
                user_id = %actor.user_id,
                actor_level,
                role = %role,
                "Permission denied: role above actor level"
            );
            return Err(AppError::permission_denied(
                "Cannot manage a role above your own level",
            ));
        }

        Ok(())
    }

    /// 修改其他用户的密码或资料
    pub fn require_modify<S: AsRef<str>>(
        &self,
        actor: &AuthContext,
        target_roles: &[S],
    ) -> Result<(), AppError> {
        let actor_level = self.actor_level(actor);
        let target_level = self.hierarchy.max_level(target_roles);

        if !self.hierarchy.can_modify_user(actor_level, target_level) {
            tracing::warn!(
                user_id = %actor.user_id,
                actor_level,
                target_level,
                "Permission denied: cannot modify user"
            );
            return Err(AppError::permission_denied(
                "Cannot modify a user with a higher role",
            ));
        }

        Ok(())
    }

    /// 删除用户，要求严格高于目标
    pub fn require_delete<S: AsRef<str>>(
        &self,
        actor: &AuthContext,
        target_roles: &[S],
    ) -> Result<(), AppError> {
        let actor_level = self.actor_level(actor);
        let target_level = self.hierarchy.max_level(target_roles);

        if !self.hierarchy.can_delete_user(actor_level, target_level) {
            tracing::warn!(
                user_id = %actor.user_id,
                actor_level,
                target_level,
                "Permission denied: cannot delete user"
            );
            return Err(AppError::permission_denied(
                "Cannot delete a user with an equal or higher role",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn service() -> PermissionService {
        PermissionService::new(Arc::new(RoleHierarchy::standard()))
    }

    fn actor(roles: &[&str]) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "actor".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_admin_cannot_assign_superadmin() {
        let err = service()
            .require_assign(&actor(&["admin"]), "superadmin")
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[test]
    fn test_coordinator_can_assign_own_level() {
        assert!(service()
            .require_assign(&actor(&["coordinator"]), "coordinator")
            .is_ok());
    }

    #[test]
    fn test_modify_and_delete_levels() {
        let service = service();
        let admin = actor(&["admin"]);

        assert!(service.require_modify(&admin, &["finance"]).is_ok());
        assert!(service.require_modify(&admin, &["coordinator"]).is_err());
        assert!(service.require_delete(&admin, &["finance"]).is_err());
        assert!(service.require_delete(&admin, &["picker"]).is_ok());

        let empty: [&str; 0] = [];
        assert!(service.require_delete(&actor(&["guest"]), &empty).is_ok());
    }
}
