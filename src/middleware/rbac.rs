// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião) das ferramentas internas.
/// Exige usuário interno ativo cujo papel tenha a permissão `T`.
pub struct RequireInternalPermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireInternalPermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_header(
            parts
                .headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|value| value.to_str().ok()),
        );

        // A. Usuário (inserido pelo auth_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)
            .map_err(|e| e.to_api_error(&locale))?;

        // B. Precisa ser da equipe interna
        let is_internal = app_state
            .internal_repo
            .is_active_internal_user(user.0.id)
            .await
            .map_err(|e| e.to_api_error(&locale))?;
        if !is_internal {
            return Err(AppError::InternalAccessDenied.to_api_error(&locale));
        }

        // C. Verifica a permissão no banco
        let required_perm = T::slug();
        let has_permission = app_state
            .internal_repo
            .user_has_permission(user.0.id, required_perm)
            .await
            .map_err(|e| e.to_api_error(&locale))?;

        if !has_permission {
            tracing::warn!(user_id = %user.0.id, permission = required_perm, "🚫 Permissão interna ausente");
            return Err(AppError::MissingPermission(required_perm).to_api_error(&locale));
        }

        Ok(RequireInternalPermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermInternalRoles;
impl PermissionDef for PermInternalRoles {
    fn slug() -> &'static str { "internal:roles" }
}

pub struct PermInternalUsers;
impl PermissionDef for PermInternalUsers {
    fn slug() -> &'static str { "internal:users" }
}

pub struct PermInternalLeads;
impl PermissionDef for PermInternalLeads {
    fn slug() -> &'static str { "internal:leads" }
}
