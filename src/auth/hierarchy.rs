//! 角色层级
//! 角色名 -> 权限等级，用于"能否管理"的比较

use std::collections::HashMap;

pub const SUPERADMIN: &str = "superadmin";
pub const COORDINATOR: &str = "coordinator";
pub const ADMIN: &str = "admin";
pub const ADMIN_RETUR: &str = "admin-retur";
pub const FINANCE: &str = "finance";
pub const WAREHOUSE: &str = "warehouse";
pub const PICKER: &str = "picker";
pub const OUTBOUND: &str = "outbound";
pub const QC_RIBBON: &str = "qc-ribbon";
pub const QC_ONLINE: &str = "qc-online";
pub const MB_RIBBON: &str = "mb-ribbon";
pub const MB_ONLINE: &str = "mb-online";
pub const PACKING: &str = "packing";
pub const GUEST: &str = "guest";

/// 权限等级
pub type Level = u8;

/// 静态角色层级表（启动时构建一次，之后只读共享）
#[derive(Debug, Clone)]
pub struct RoleHierarchy {
    levels: HashMap<String, Level>,
}

impl RoleHierarchy {
    /// 仓库系统的标准层级
    pub fn standard() -> Self {
        Self::from_levels([
            (SUPERADMIN, 9),
            (COORDINATOR, 4),
            (ADMIN, 3),
            (ADMIN_RETUR, 3),
            (FINANCE, 3),
            (WAREHOUSE, 3),
            (PICKER, 2),
            (OUTBOUND, 2),
            (QC_RIBBON, 2),
            (QC_ONLINE, 2),
            (MB_RIBBON, 2),
            (MB_ONLINE, 2),
            (PACKING, 2),
            (GUEST, 1),
        ])
    }

    pub fn from_levels<'a>(levels: impl IntoIterator<Item = (&'a str, Level)>) -> Self {
        Self {
            levels: levels
                .into_iter()
                .map(|(name, level)| (name.to_string(), level))
                .collect(),
        }
    }

    pub fn level_of(&self, role: &str) -> Option<Level> {
        self.levels.get(role).copied()
    }

    /// 角色列表中的最高等级；列表为空或全部未知时为 0
    pub fn max_level<S: AsRef<str>>(&self, roles: &[S]) -> Level {
        roles
            .iter()
            .filter_map(|r| self.level_of(r.as_ref()))
            .max()
            .unwrap_or(0)
    }

    /// 是否可以分配（或移除）目标角色。未知角色一律拒绝，同级允许。
    pub fn can_assign(&self, actor_max: Level, target_role: &str) -> bool {
        match self.level_of(target_role) {
            Some(target) => actor_max >= target,
            None => false,
        }
    }

    /// 修改密码/资料
    pub fn can_modify_user(&self, actor_max: Level, target_max: Level) -> bool {
        actor_max >= target_max
    }

    /// 删除用户要求严格高于目标
    pub fn can_delete_user(&self, actor_max: Level, target_max: Level) -> bool {
        actor_max > target_max
    }

    pub fn contains(&self, role: &str) -> bool {
        self.levels.contains_key(role)
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        let h = RoleHierarchy::standard();
        assert_eq!(h.level_of(SUPERADMIN), Some(9));
        assert_eq!(h.level_of(COORDINATOR), Some(4));
        assert_eq!(h.level_of(ADMIN_RETUR), Some(3));
        assert_eq!(h.level_of(PACKING), Some(2));
        assert_eq!(h.level_of(GUEST), Some(1));
        assert_eq!(h.level_of("janitor"), None);
    }

    #[test]
    fn test_max_level() {
        let h = RoleHierarchy::standard();
        let empty: [&str; 0] = [];
        assert_eq!(h.max_level(&empty), 0);
        assert_eq!(h.max_level(&["superadmin"]), 9);
        assert_eq!(h.max_level(&["guest", "finance", "picker"]), 3);
        assert_eq!(h.max_level(&["janitor"]), 0);
        assert_eq!(h.max_level(&vec!["picker".to_string()]), 2);
    }

    #[test]
    fn test_can_assign() {
        let h = RoleHierarchy::standard();
        assert!(h.can_assign(4, COORDINATOR));
        assert!(h.can_assign(4, ADMIN));
        assert!(!h.can_assign(3, SUPERADMIN));
        assert!(!h.can_assign(9, "janitor"));
        assert!(!h.can_assign(0, GUEST));
    }

    #[test]
    fn test_modify_and_delete() {
        let h = RoleHierarchy::standard();
        assert!(h.can_modify_user(3, 3));
        assert!(!h.can_modify_user(2, 3));
        assert!(!h.can_delete_user(3, 3));
        assert!(h.can_delete_user(4, 3));
    }
}
