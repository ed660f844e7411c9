//! Role repository (角色数据访问)

use super::{is_unique_violation, RoleStore};
use crate::{
    error::AppError,
    models::{
        role::{Role, RoleAssignment},
        PageRequest,
    },
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct RoleRepository {
    db: PgPool,
}

impl RoleRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleStore for RoleRepository {
    /// 根据名称查找角色
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at, updated_at FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;

        Ok(role)
    }

    /// 列出角色
    async fn list(&self, page: PageRequest) -> Result<(Vec<Role>, i64), AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
            .fetch_one(&self.db)
            .await?;

        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM roles
            ORDER BY created_at ASC, name ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok((roles, total))
    }

    async fn assignments_of(&self, user_id: Uuid) -> Result<Vec<RoleAssignment>, AppError> {
        let assignments = sqlx::query_as::<_, RoleAssignment>(
            r#"
            SELECT
                ur.id,
                ur.user_id,
                ur.role_id,
                r.name AS role_name,
                r.description AS role_description,
                ur.assigned_by,
                ur.assigned_at
            FROM user_roles ur
            INNER JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY ur.assigned_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(assignments)
    }

    async fn has_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = $1 AND role_id = $2)",
        )
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    /// 分配角色
    async fn assign(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id, assigned_by)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(assigned_by)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyAssigned
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(())
    }

    /// 移除角色
    async fn remove(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
