//! User repository (数据库访问层)

use super::{is_unique_violation, UserStore};
use crate::{
    error::AppError,
    models::{
        user::{NewUser, User},
        PageRequest,
    },
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, name, password_hash, is_active, refresh_token, \
                            created_at, updated_at, deleted_at";

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 根据用户名查找用户
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn find_by_refresh_token(
        &self,
        id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND refresh_token = $2 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(refresh_token)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn exists_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE (username = $1 OR email = $2) AND deleted_at IS NULL
            )
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    async fn email_taken_by_other(&self, email: &str, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE email = $1 AND id <> $2 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    /// 创建用户
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, name, password_hash, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .bind(new_user.is_active)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateUser
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn update_status(&self, id: Uuid, is_active: bool) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 更新密码
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET password_hash = $2, refresh_token = NULL, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateUser
            } else {
                AppError::Database(e)
            }
        })
    }

    /// 删除用户（事务内清理角色分配后软删除）
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = NOW(), refresh_token = NULL, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<(Vec<User>, i64), AppError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE deleted_at IS NULL
              AND ($1::text IS NULL OR username ILIKE $1 OR name ILIKE $1)
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {} FROM users
            WHERE deleted_at IS NULL
              AND ($1::text IS NULL OR username ILIKE $1 OR name ILIKE $1)
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
            USER_COLUMNS
        ))
        .bind(&pattern)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok((users, total))
    }
}
