// src/services/tenancy_service.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::tenancy::{Location, Tenant},
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, pool: PgPool) -> Self {
        Self { tenant_repo, pool }
    }

    /// Cria o restaurante e, atomicamente, torna o criador o primeiro membro.
    pub async fn create_tenant_with_owner(
        &self,
        name: &str,
        description: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Tenant, AppError> {
        let mut tx = self.pool.begin().await?;

        let new_tenant = self.tenant_repo.create_tenant(&mut *tx, name, description).await?;
        self.tenant_repo.add_member(&mut *tx, new_tenant.id, owner_id).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %new_tenant.id, owner_id = %owner_id, "🏪 Tenant criado");
        Ok(new_tenant)
    }

    pub async fn list_my_tenants(&self, user_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        self.tenant_repo.list_user_tenants(user_id).await
    }

    pub async fn is_member(&self, user_id: Uuid, tenant_id: Uuid) -> Result<bool, AppError> {
        self.tenant_repo.check_user_tenancy(user_id, tenant_id).await
    }

    pub async fn create_location<'e, E>(&self, executor: E, tenant_id: Uuid, name: &str) -> Result<Location, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.tenant_repo.create_location(executor, tenant_id, name.trim()).await
    }

    pub async fn list_locations<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Location>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.tenant_repo.list_locations(executor, tenant_id).await
    }
}
