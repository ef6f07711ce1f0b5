// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::auth::User,
};

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

async fn authenticate(
    app_state: &AppState,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
) -> Result<User, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| AppError::InvalidToken)?;
    app_state.auth_service.validate_token(bearer.token()).await
}

/// Rotas que exigem só o JWT.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&app_state, bearer)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Rotas de loja: JWT + `x-tenant-id` + vínculo ativo com o tenant.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&app_state, bearer)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let tenant = TenantContext::from_headers(request.headers()).map_err(|e| e.to_api_error(&locale))?;

    let is_member = app_state
        .tenant_service
        .is_member(user.id, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !is_member {
        tracing::warn!(user_id = %user.id, tenant_id = %tenant.0, "🚫 Acesso negado ao tenant");
        return Err(AppError::TenantAccessDenied(tenant.0).to_api_error(&locale));
    }

    request.extensions_mut().insert(AuthenticatedUser(user));
    request.extensions_mut().insert(tenant);
    Ok(next.run(request).await)
}
