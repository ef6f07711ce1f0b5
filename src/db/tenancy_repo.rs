// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::tenancy::{Location, Tenant, TenantMember};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Verifica se um usuário é membro ativo do tenant.
    /// Esta é a verificação de autorização mais importante das rotas de loja.
    pub async fn check_user_tenancy(&self, user_id: Uuid, tenant_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tenant_members
                WHERE user_id = $1 AND tenant_id = $2 AND is_active = true
            )
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await?;

        Ok(tenant)
    }

    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<TenantMember, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let member = sqlx::query_as::<_, TenantMember>(
            r#"
            INSERT INTO tenant_members (tenant_id, user_id)
            VALUES ($1, $2)
            RETURNING tenant_id, user_id, is_active, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(member)
    }

    pub async fn list_user_tenants(&self, user_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT t.*
            FROM tenants t
            JOIN tenant_members tm ON tm.tenant_id = t.id
            WHERE tm.user_id = $1 AND tm.is_active = true
            ORDER BY t.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    // ---
    // Locais
    // ---

    pub async fn create_location<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
    ) -> Result<Location, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Location>(
            "INSERT INTO locations (tenant_id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(e, || {
                AppError::UniqueConstraintViolation(format!("local '{}'", name))
            })
        })
    }

    pub async fn list_locations<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Location>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT * FROM locations WHERE tenant_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;

        Ok(locations)
    }

    /// Primeiro local ativo do tenant (mais antigo). Local padrão dos itens novos.
    pub async fn first_active_location<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Option<Location>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>(
            r#"
            SELECT * FROM locations
            WHERE tenant_id = $1 AND is_active = true
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(location)
    }

    pub async fn location_belongs_to_tenant<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        location_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM locations WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(location_id)
        .bind(tenant_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }
}
