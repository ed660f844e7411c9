//! 角色层级单元测试
//!
//! 覆盖完整的分配 / 修改 / 删除规则矩阵

use wms_auth::auth::hierarchy::*;
use wms_auth::auth::RoleHierarchy;

const ALL_ROLES: [&str; 14] = [
    SUPERADMIN,
    COORDINATOR,
    ADMIN,
    ADMIN_RETUR,
    FINANCE,
    WAREHOUSE,
    PICKER,
    OUTBOUND,
    QC_RIBBON,
    QC_ONLINE,
    MB_RIBBON,
    MB_ONLINE,
    PACKING,
    GUEST,
];

#[test]
fn test_every_seeded_role_has_a_level() {
    let hierarchy = RoleHierarchy::standard();

    for role in ALL_ROLES {
        assert!(hierarchy.contains(role), "missing level for {}", role);
    }
    assert_eq!(hierarchy.level_of(SUPERADMIN), Some(9));
    assert_eq!(hierarchy.level_of(COORDINATOR), Some(4));
    assert_eq!(hierarchy.level_of(WAREHOUSE), Some(3));
    assert_eq!(hierarchy.level_of(PACKING), Some(2));
    assert_eq!(hierarchy.level_of(GUEST), Some(1));
}

#[test]
fn test_assign_matrix_matches_levels() {
    let hierarchy = RoleHierarchy::standard();

    for actor in ALL_ROLES {
        let actor_level = hierarchy.max_level(&[actor]);
        for target in ALL_ROLES {
            let target_level = hierarchy.level_of(target).unwrap();
            assert_eq!(
                hierarchy.can_assign(actor_level, target),
                actor_level >= target_level,
                "{} assigning {}",
                actor,
                target
            );
        }
    }
}

#[test]
fn test_delete_is_strict_and_modify_is_not() {
    let hierarchy = RoleHierarchy::standard();

    for actor in ALL_ROLES {
        let a = hierarchy.max_level(&[actor]);
        for target in ALL_ROLES {
            let t = hierarchy.max_level(&[target]);
            assert_eq!(hierarchy.can_modify_user(a, t), a >= t);
            assert_eq!(hierarchy.can_delete_user(a, t), a > t);
        }
    }
}

#[test]
fn test_multi_role_user_uses_highest_level() {
    let hierarchy = RoleHierarchy::standard();

    let picker_and_finance = hierarchy.max_level(&[PICKER, FINANCE]);
    assert_eq!(picker_and_finance, 3);

    // 以最高层级判断
    assert!(hierarchy.can_assign(picker_and_finance, ADMIN));
    assert!(!hierarchy.can_assign(picker_and_finance, COORDINATOR));

    let coordinator = hierarchy.max_level(&[COORDINATOR]);
    assert!(!hierarchy.can_delete_user(coordinator, hierarchy.max_level(&[GUEST, COORDINATOR])));
    assert!(hierarchy.can_delete_user(coordinator, picker_and_finance));
}

#[test]
fn test_unknown_and_empty_roles() {
    let hierarchy = RoleHierarchy::standard();
    let empty: [&str; 0] = [];

    assert_eq!(hierarchy.max_level(&empty), 0);
    assert_eq!(hierarchy.max_level(&["janitor"]), 0);
    assert_eq!(hierarchy.max_level(&["janitor", GUEST]), 1);

    let top = hierarchy.max_level(&[SUPERADMIN]);
    assert!(!hierarchy.can_assign(top, "janitor"));

    // 等级 0 之间可修改，不可删除
    assert!(hierarchy.can_modify_user(0, 0));
    assert!(!hierarchy.can_delete_user(0, 0));
    assert!(hierarchy.can_delete_user(1, 0));
}

#[test]
fn test_custom_levels() {
    let hierarchy = RoleHierarchy::from_levels([("lead", 5), ("crew", 2)]);

    assert_eq!(hierarchy.level_of("lead"), Some(5));
    assert!(!hierarchy.contains(SUPERADMIN));
    assert!(hierarchy.can_assign(5, "crew"));
    assert!(!hierarchy.can_assign(2, "lead"));
}
