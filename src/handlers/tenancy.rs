// src/handlers/tenancy.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::tenancy::{Location, Tenant},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTenantPayload {
    #[validate(length(min = 2, max = 120, message = "O nome deve ter entre 2 e 120 caracteres."))]
    #[schema(example = "Cantina da Nonna")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLocationPayload {
    #[validate(length(min = 1, max = 80, message = "O nome do local é obrigatório."))]
    #[schema(example = "Câmara fria")]
    pub name: String,
}

#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses((status = 201, description = "Restaurante criado; o criador vira membro", body = Tenant)),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let tenant = app_state
        .tenant_service
        .create_tenant_with_owner(payload.name.trim(), payload.description.as_deref(), user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(tenant)))
}

#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "Tenancy",
    responses((status = 200, description = "Restaurantes do usuário", body = Vec<Tenant>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_tenants(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Tenant>>, ApiError> {
    let tenants = app_state
        .tenant_service
        .list_my_tenants(user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(tenants))
}

#[utoipa::path(
    post,
    path = "/api/tenants/setup/locations",
    tag = "Tenancy",
    request_body = CreateLocationPayload,
    responses((status = 201, description = "Local de estoque criado", body = Location)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_location(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateLocationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let location = app_state
        .tenant_service
        .create_location(&mut *rls_conn, tenant.0, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(location)))
}

#[utoipa::path(
    get,
    path = "/api/tenants/setup/locations",
    tag = "Tenancy",
    responses((status = 200, description = "Locais de estoque", body = Vec<Location>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<Location>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let locations = app_state
        .tenant_service
        .list_locations(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(locations))
}
