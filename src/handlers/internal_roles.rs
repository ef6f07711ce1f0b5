// src/handlers/internal_roles.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermInternalRoles, RequireInternalPermission},
    },
    models::internal::{CreateRolePayload, PermissionModule, RoleResponse, UpdateRolePayload},
};

#[utoipa::path(
    get,
    path = "/api/internal-roles/permissions",
    tag = "Internal Roles",
    responses((status = 200, description = "Permissões agrupadas por módulo", body = Vec<PermissionModule>)),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalRoles>,
) -> Result<Json<Vec<PermissionModule>>, ApiError> {
    let modules = app_state
        .internal_roles_service
        .list_permissions()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(modules))
}

#[utoipa::path(
    get,
    path = "/api/internal-roles/roles",
    tag = "Internal Roles",
    responses((status = 200, description = "Papéis com as permissões", body = Vec<RoleResponse>)),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalRoles>,
) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    let roles = app_state
        .internal_roles_service
        .list_roles()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(roles))
}

#[utoipa::path(
    post,
    path = "/api/internal-roles/roles",
    tag = "Internal Roles",
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Papel criado", body = RoleResponse),
        (status = 400, description = "Nome vazio ou permissão inexistente"),
        (status = 409, description = "Nome já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalRoles>,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let role = app_state
        .internal_roles_service
        .create_role(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/api/internal-roles/roles/{id}",
    tag = "Internal Roles",
    responses(
        (status = 200, description = "Papel", body = RoleResponse),
        (status = 404, description = "Papel não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Papel")),
    security(("api_jwt" = []))
)]
pub async fn get_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalRoles>,
    Path(role_id): Path<Uuid>,
) -> Result<Json<RoleResponse>, ApiError> {
    let role = app_state
        .internal_roles_service
        .get_role(role_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(role))
}

#[utoipa::path(
    put,
    path = "/api/internal-roles/roles/{id}",
    tag = "Internal Roles",
    request_body = UpdateRolePayload,
    responses(
        (status = 200, description = "Papel atualizado; permissões substituídas quando enviadas", body = RoleResponse),
        (status = 400, description = "Permissão inexistente"),
        (status = 404, description = "Papel não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Papel")),
    security(("api_jwt" = []))
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalRoles>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<Json<RoleResponse>, ApiError> {
    let role = app_state
        .internal_roles_service
        .update_role(role_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(role))
}

#[utoipa::path(
    delete,
    path = "/api/internal-roles/roles/{id}",
    tag = "Internal Roles",
    responses(
        (status = 204, description = "Papel removido"),
        (status = 404, description = "Papel não encontrado"),
        (status = 409, description = "Papel atribuído a usuários")
    ),
    params(("id" = Uuid, Path, description = "ID do Papel")),
    security(("api_jwt" = []))
)]
pub async fn delete_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalRoles>,
    Path(role_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .internal_roles_service
        .delete_role(role_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
