// src/db/internal_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::internal::{InternalPermission, InternalRole, InternalUser, InternalUserView};

#[derive(Clone)]
pub struct InternalRepository {
    pool: PgPool,
}

impl InternalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Papéis
    // ---

    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<InternalRole, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, InternalRole>(
            r#"
            INSERT INTO internal_roles (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::on_unique_violation(e, || AppError::RoleNameAlreadyExists(name.to_string())))
    }

    pub async fn find_role<'e, E>(&self, executor: E, role_id: Uuid) -> Result<Option<InternalRole>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, InternalRole>("SELECT * FROM internal_roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    pub async fn list_roles(&self) -> Result<Vec<InternalRole>, AppError> {
        let roles = sqlx::query_as::<_, InternalRole>("SELECT * FROM internal_roles ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    pub async fn update_role_description<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        description: &str,
    ) -> Result<Option<InternalRole>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, InternalRole>(
            r#"
            UPDATE internal_roles SET description = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(role_id)
        .bind(description)
        .fetch_optional(executor)
        .await?;
        Ok(role)
    }

    pub async fn touch_role<'e, E>(&self, executor: E, role_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE internal_roles SET updated_at = NOW() WHERE id = $1")
            .bind(role_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_role<'e, E>(&self, executor: E, role_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM internal_roles WHERE id = $1")
            .bind(role_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Quantos usuários internos (ativos ou não) apontam para o papel.
    pub async fn count_role_users<'e, E>(&self, executor: E, role_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM internal_users WHERE role_id = $1")
            .bind(role_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    // ---
    // Permissões
    // ---

    pub async fn list_all_permissions(&self) -> Result<Vec<InternalPermission>, AppError> {
        let permissions = sqlx::query_as::<_, InternalPermission>(
            "SELECT id, slug, description, module FROM internal_permissions ORDER BY module, slug",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    pub async fn find_permissions_by_ids<'e, E>(
        &self,
        executor: E,
        ids: &[Uuid],
    ) -> Result<Vec<InternalPermission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, InternalPermission>(
            "SELECT id, slug, description, module FROM internal_permissions WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(permissions)
    }

    pub async fn role_permission_slugs<'e, E>(&self, executor: E, role_id: Uuid) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slugs = sqlx::query_scalar::<_, String>(
            r#"
            SELECT p.slug
            FROM internal_role_permissions rp
            JOIN internal_permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.slug
            "#,
        )
        .bind(role_id)
        .fetch_all(executor)
        .await?;
        Ok(slugs)
    }

    pub async fn clear_role_permissions<'e, E>(&self, executor: E, role_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM internal_role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // Inserção em massa usando UNNEST
    pub async fn assign_permissions<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO internal_role_permissions (role_id, permission_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(executor)
        .await?;
        Ok(())
    }

    // ---
    // Usuários internos
    // ---

    pub async fn user_has_permission(&self, user_id: Uuid, permission_slug: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM internal_users iu
                JOIN internal_role_permissions rp ON rp.role_id = iu.role_id
                JOIN internal_permissions p ON p.id = rp.permission_id
                WHERE iu.user_id = $1
                  AND iu.is_active = true
                  AND p.slug = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(permission_slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn is_active_internal_user(&self, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM internal_users WHERE user_id = $1 AND is_active = true)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create_internal_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        name: &str,
        role_id: Uuid,
    ) -> Result<InternalUser, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, InternalUser>(
            r#"
            INSERT INTO internal_users (user_id, name, role_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(role_id)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::on_unique_violation(e, || AppError::InternalUserAlreadyExists))
    }

    pub async fn update_internal_user<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        role_id: Option<Uuid>,
        is_active: Option<bool>,
    ) -> Result<Option<InternalUser>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, InternalUser>(
            r#"
            UPDATE internal_users
            SET role_id = COALESCE($2, role_id),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role_id)
        .bind(is_active)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    pub async fn list_internal_users(&self) -> Result<Vec<InternalUserView>, AppError> {
        let users = sqlx::query_as::<_, InternalUserView>(
            r#"
            SELECT iu.*, u.email, r.name AS role_name
            FROM internal_users iu
            JOIN users u ON u.id = iu.user_id
            JOIN internal_roles r ON r.id = iu.role_id
            ORDER BY iu.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
