// src/services/internal_users_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InternalRepository, UserRepository},
    models::internal::{CreateInternalUserPayload, InternalUser, InternalUserView, UpdateInternalUserPayload},
};

/// Equipe interna: vincula contas já registradas a um papel.
#[derive(Clone)]
pub struct InternalUsersService {
    repo: InternalRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl InternalUsersService {
    pub fn new(repo: InternalRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { repo, user_repo, pool }
    }

    pub async fn list(&self) -> Result<Vec<InternalUserView>, AppError> {
        self.repo.list_internal_users().await
    }

    pub async fn create(&self, payload: CreateInternalUserPayload) -> Result<InternalUser, AppError> {
        let user = self
            .user_repo
            .find_by_email(&payload.email.trim().to_lowercase())
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.repo
            .find_role(&self.pool, payload.role_id)
            .await?
            .ok_or(AppError::RoleNotFound)?;

        let internal_user = self
            .repo
            .create_internal_user(&self.pool, user.id, payload.name.trim(), payload.role_id)
            .await?;

        tracing::info!(internal_user_id = %internal_user.id, role_id = %payload.role_id, "🧑‍💼 Usuário interno criado");
        Ok(internal_user)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateInternalUserPayload) -> Result<InternalUser, AppError> {
        if let Some(role_id) = payload.role_id {
            self.repo
                .find_role(&self.pool, role_id)
                .await?
                .ok_or(AppError::RoleNotFound)?;
        }

        self.repo
            .update_internal_user(&self.pool, id, payload.role_id, payload.is_active)
            .await?
            .ok_or(AppError::InternalUserNotFound)
    }
}
