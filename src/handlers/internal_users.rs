// src/handlers/internal_users.rs

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
        rbac::{PermInternalUsers, RequireInternalPermission},
    },
    models::internal::{CreateInternalUserPayload, InternalUser, InternalUserView, UpdateInternalUserPayload},
};

#[utoipa::path(
    get,
    path = "/api/internal/users",
    tag = "Internal Users",
    responses((status = 200, description = "Equipe interna", body = Vec<InternalUserView>)),
    security(("api_jwt" = []))
)]
pub async fn list_internal_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalUsers>,
) -> Result<Json<Vec<InternalUserView>>, ApiError> {
    let users = app_state
        .internal_users_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/internal/users",
    tag = "Internal Users",
    request_body = CreateInternalUserPayload,
    responses(
        (status = 201, description = "Conta existente vinculada à equipe interna", body = InternalUser),
        (status = 404, description = "Usuário ou papel não encontrado"),
        (status = 409, description = "Usuário já é interno")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_internal_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalUsers>,
    Json(payload): Json<CreateInternalUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let user = app_state
        .internal_users_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/api/internal/users/{id}",
    tag = "Internal Users",
    request_body = UpdateInternalUserPayload,
    responses(
        (status = 200, description = "Papel ou status atualizado", body = InternalUser),
        (status = 404, description = "Usuário interno ou papel não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Usuário interno")),
    security(("api_jwt" = []))
)]
pub async fn update_internal_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalUsers>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInternalUserPayload>,
) -> Result<Json<InternalUser>, ApiError> {
    let user = app_state
        .internal_users_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(user))
}
