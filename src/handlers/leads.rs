// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
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
        rbac::{PermInternalLeads, RequireInternalPermission},
    },
    models::leads::{CreateLeadPayload, Lead, LeadQuery, UpdateLeadPayload},
};

// Rota pública das páginas de captação
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses((status = 201, description = "Lead registrado", body = Lead))
)]
pub async fn capture_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let lead = app_state
        .lead_service
        .capture(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

#[utoipa::path(
    get,
    path = "/api/internal/leads",
    tag = "Leads",
    params(LeadQuery),
    responses((status = 200, description = "Leads, mais recentes primeiro", body = Vec<Lead>)),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalLeads>,
    Query(query): Query<LeadQuery>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let leads = app_state
        .lead_service
        .list(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(leads))
}

#[utoipa::path(
    patch,
    path = "/api/internal/leads/{id}",
    tag = "Leads",
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado", body = Lead),
        (status = 404, description = "Lead não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Lead")),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalLeads>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<Json<Lead>, ApiError> {
    let lead = app_state
        .lead_service
        .update(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(lead))
}

#[utoipa::path(
    delete,
    path = "/api/internal/leads/{id}",
    tag = "Leads",
    responses(
        (status = 204, description = "Lead removido"),
        (status = 404, description = "Lead não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Lead")),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireInternalPermission<PermInternalLeads>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .lead_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
