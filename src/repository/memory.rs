//! 内存存储
//! 用于测试与本地开发，语义与 PostgreSQL 实现一致

use super::{RoleStore, UserStore, SEEDED_ROLES};
use crate::{
    error::AppError,
    models::{
        role::{Role, RoleAssignment},
        user::{NewUser, User},
        PageRequest,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct AssignmentRow {
    id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
    assigned_by: Option<Uuid>,
    assigned_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    roles: Vec<Role>,
    assignments: Vec<AssignmentRow>,
}

impl Tables {
    fn live_user(&self, id: Uuid) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
    }

    fn live_user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
    }
}

/// 以 `tokio::sync::RwLock` 保护的进程内存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// 空存储（无角色）
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置标准角色
    pub fn with_seeded_roles() -> Self {
        let now = Utc::now();
        let roles = SEEDED_ROLES
            .iter()
            .map(|(name, description)| Role {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: Some(description.to_string()),
                created_at: now,
                updated_at: now,
            })
            .collect();

        Self {
            tables: RwLock::new(Tables {
                roles,
                ..Tables::default()
            }),
        }
    }
}

fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Vec<T> {
    items
        .iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.live_user(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username == username && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_refresh_token(
        &self,
        id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .live_user(id)
            .filter(|u| u.refresh_token.as_deref() == Some(refresh_token))
            .cloned())
    }

    async fn exists_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().any(|u| {
            u.deleted_at.is_none() && (u.username == username || u.email == email)
        }))
    }

    async fn email_taken_by_other(&self, email: &str, user_id: Uuid) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .any(|u| u.deleted_at.is_none() && u.email == email && u.id != user_id))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;

        // 与唯一索引等价的检查
        if tables.users.iter().any(|u| {
            u.deleted_at.is_none()
                && (u.username == new_user.username || u.email == new_user.email)
        }) {
            return Err(AppError::DuplicateUser);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            is_active: new_user.is_active,
            refresh_token: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.live_user_mut(id) {
            user.refresh_token = token.map(str::to_string);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_status(&self, id: Uuid, is_active: bool) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.live_user_mut(id).map(|user| {
            user.is_active = is_active;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.live_user_mut(id).map(|user| {
            user.password_hash = password_hash.to_string();
            user.refresh_token = None;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;

        if let Some(email) = email {
            if tables
                .users
                .iter()
                .any(|u| u.deleted_at.is_none() && u.email == email && u.id != id)
            {
                return Err(AppError::DuplicateUser);
            }
        }

        Ok(tables.live_user_mut(id).map(|user| {
            if let Some(name) = name {
                user.name = name.to_string();
            }
            if let Some(email) = email {
                user.email = email.to_string();
            }
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;

        if tables.live_user(id).is_none() {
            return Ok(false);
        }

        tables.assignments.retain(|a| a.user_id != id);
        if let Some(user) = tables.live_user_mut(id) {
            let now = Utc::now();
            user.deleted_at = Some(now);
            user.refresh_token = None;
            user.updated_at = now;
        }

        Ok(true)
    }

    async fn list(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<(Vec<User>, i64), AppError> {
        let tables = self.tables.read().await;
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let matching: Vec<User> = tables
            .users
            .iter()
            .filter(|u| u.deleted_at.is_none())
            .filter(|u| match &needle {
                Some(n) => {
                    u.username.to_lowercase().contains(n) || u.name.to_lowercase().contains(n)
                }
                None => true,
            })
            .cloned()
            .collect();

        Ok((paginate(&matching, page), matching.len() as i64))
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<Role>, i64), AppError> {
        let tables = self.tables.read().await;
        Ok((paginate(&tables.roles, page), tables.roles.len() as i64))
    }

    async fn assignments_of(&self, user_id: Uuid) -> Result<Vec<RoleAssignment>, AppError> {
        let tables = self.tables.read().await;

        let mut rows: Vec<RoleAssignment> = tables
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| {
                tables
                    .roles
                    .iter()
                    .find(|r| r.id == a.role_id)
                    .map(|role| RoleAssignment {
                        id: a.id,
                        user_id: a.user_id,
                        role_id: a.role_id,
                        role_name: role.name.clone(),
                        role_description: role.description.clone(),
                        assigned_by: a.assigned_by,
                        assigned_at: a.assigned_at,
                    })
            })
            .collect();
        // 稳定排序，同一时间戳保持插入顺序
        rows.sort_by_key(|a| a.assigned_at);

        Ok(rows)
    }

    async fn has_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .iter()
            .any(|a| a.user_id == user_id && a.role_id == role_id))
    }

    async fn assign(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;

        if tables
            .assignments
            .iter()
            .any(|a| a.user_id == user_id && a.role_id == role_id)
        {
            return Err(AppError::AlreadyAssigned);
        }

        tables.assignments.push(AssignmentRow {
            id: Uuid::new_v4(),
            user_id,
            role_id,
            assigned_by,
            assigned_at: Utc::now(),
        });

        Ok(())
    }

    async fn remove(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.assignments.len();
        tables
            .assignments
            .retain(|a| !(a.user_id == user_id && a.role_id == role_id));
        Ok(tables.assignments.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            name: username.to_uppercase(),
            password_hash: "hash".to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let store = MemoryStore::with_seeded_roles();
        store.create(new_user("alice")).await.unwrap();

        let err = store.create(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUser));
        assert!(store
            .exists_by_username_or_email("other", "alice@example.com")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_refresh_token_overwrite() {
        let store = MemoryStore::new();
        let user = store.create(new_user("alice")).await.unwrap();

        store.set_refresh_token(user.id, Some("first")).await.unwrap();
        store.set_refresh_token(user.id, Some("second")).await.unwrap();

        assert!(store
            .find_by_refresh_token(user.id, "first")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_by_refresh_token(user.id, "second")
            .await
            .unwrap()
            .is_some());

        store.set_refresh_token(user.id, None).await.unwrap();
        assert!(store
            .find_by_refresh_token(user.id, "second")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_assignments_and_soft_delete() {
        let store = MemoryStore::with_seeded_roles();
        let user = store.create(new_user("alice")).await.unwrap();
        let guest = RoleStore::find_by_name(&store, "guest").await.unwrap().unwrap();
        let picker = RoleStore::find_by_name(&store, "picker").await.unwrap().unwrap();

        store.assign(user.id, guest.id, None).await.unwrap();
        store.assign(user.id, picker.id, None).await.unwrap();
        assert!(matches!(
            store.assign(user.id, guest.id, None).await,
            Err(AppError::AlreadyAssigned)
        ));

        let names: Vec<String> = store
            .assignments_of(user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.role_name)
            .collect();
        assert_eq!(names, vec!["guest", "picker"]);

        assert!(store.soft_delete(user.id).await.unwrap());
        assert!(store.assignments_of(user.id).await.unwrap().is_empty());
        assert!(UserStore::find_by_id(&store, user.id).await.unwrap().is_none());
        assert!(!store.soft_delete(user.id).await.unwrap());

        // 软删除后用户名可再次使用
        store.create(new_user("alice")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_search_and_pagination() {
        let store = MemoryStore::new();
        for name in ["alice", "bob", "carol", "alina"] {
            store.create(new_user(name)).await.unwrap();
        }

        let (users, total) = UserStore::list(&store, PageRequest::new(None, None), Some("AL"))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(users.len(), 2);

        let (users, total) =
            UserStore::list(&store, PageRequest::new(Some(2), Some(3)), None)
                .await
                .unwrap();
        assert_eq!(total, 4);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "alina");
    }
}
