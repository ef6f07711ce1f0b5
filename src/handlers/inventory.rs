// src/handlers/inventory.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Importa os nossos extratores e erros
use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser, // O extrator de Utilizador
        i18n::Locale,            // O extrator de Idioma
        tenancy::TenantContext,  // O extrator de Tenant (do X-Tenant-ID)
    },
    models::inventory::{
        CloseSessionResponse, InventoryItem, InventorySession, SessionDetail, SessionFilters, SessionType,
        TheoreticalStock,
    },
    services::inventory_service::ItemCount,
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionPayload {
    pub session_type: SessionType,

    #[serde(default)]
    pub filters: SessionFilters,

    // Sem nome, vira "Inventário #<número>"
    #[validate(length(max = 120, message = "O nome deve ter no máximo 120 caracteres."))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemPayload {
    pub product_id: Uuid,
}

// A contagem não é validada: negativos e sessões fechadas passam.
// Local, variação e observação ausentes são gravados como nulos (PUT sobrescreve).
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemPayload {
    #[schema(value_type = f64, example = 3.5)]
    pub counted_quantity: Decimal,
    pub location_id: Option<Uuid>,
    pub variation_id: Option<Uuid>,

    #[validate(length(max = 500, message = "Observação muito longa."))]
    pub notes: Option<String>,
}

// ---
// Sessões
// ---

#[utoipa::path(
    post,
    path = "/api/inventory/sessions",
    tag = "Inventory",
    request_body = CreateSessionPayload,
    responses(
        (status = 201, description = "Sessão aberta com um item zerado por produto", body = SessionDetail),
        (status = 400, description = "Filtros inválidos para o tipo de sessão"),
        (status = 404, description = "Lista de produtos não encontrada")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_session(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let detail = app_state
        .inventory_service
        .create_session(
            &mut *rls_conn,
            tenant.0,
            user.0.id,
            payload.session_type,
            payload.filters,
            payload.name,
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/sessions",
    tag = "Inventory",
    responses((status = 200, description = "Sessões, da mais recente para a mais antiga", body = Vec<InventorySession>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_sessions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<InventorySession>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let sessions = app_state
        .inventory_service
        .list_sessions(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(sessions))
}

#[utoipa::path(
    get,
    path = "/api/inventory/sessions/{id}",
    tag = "Inventory",
    responses(
        (status = 200, description = "Sessão com os itens", body = SessionDetail),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Sessão"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_session(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let detail = app_state
        .inventory_service
        .get_session(&mut *rls_conn, tenant.0, session_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/inventory/sessions/{id}/items",
    tag = "Inventory",
    request_body = AddItemPayload,
    responses(
        (status = 201, description = "Item adicionado à sessão", body = InventoryItem),
        (status = 404, description = "Sessão ou produto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Sessão"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_item(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<AddItemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let item = app_state
        .inventory_service
        .add_item(&mut *rls_conn, tenant.0, session_id, payload.product_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    post,
    path = "/api/inventory/sessions/{id}/close",
    tag = "Inventory",
    responses(
        (status = 200, description = "Sessão fechada e estoque teórico atualizado", body = CloseSessionResponse),
        (status = 404, description = "Sessão não encontrada"),
        (status = 409, description = "Sessão já fechada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Sessão"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn close_session(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CloseSessionResponse>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let closed = app_state
        .inventory_service
        .close_session(&mut *rls_conn, tenant.0, user.0.id, session_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(closed))
}

// ---
// Itens
// ---

#[utoipa::path(
    put,
    path = "/api/inventory/items/{id}",
    tag = "Inventory",
    request_body = UpdateItemPayload,
    responses(
        (status = 200, description = "Contagem gravada", body = InventoryItem),
        (status = 404, description = "Item, local ou variação não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Item"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<Json<InventoryItem>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let count = ItemCount {
        counted_quantity: payload.counted_quantity,
        location_id: payload.location_id,
        variation_id: payload.variation_id,
        notes: payload.notes,
    };

    let item = app_state
        .inventory_service
        .update_item(&mut *rls_conn, tenant.0, user.0.id, item_id, count)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(item))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/items/{id}",
    tag = "Inventory",
    responses(
        (status = 204, description = "Item removido"),
        (status = 404, description = "Item não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Item"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    app_state
        .inventory_service
        .delete_item(&mut *rls_conn, tenant.0, item_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Estoque teórico
// ---

#[utoipa::path(
    get,
    path = "/api/inventory/stock",
    tag = "Inventory",
    responses((status = 200, description = "Estoque teórico por produto/variação", body = Vec<TheoreticalStock>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<TheoreticalStock>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let stock = app_state
        .inventory_service
        .list_theoretical_stock(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(stock))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_payload_reads_camel_case_filters() {
        let list_id = Uuid::new_v4();
        let payload: CreateSessionPayload = serde_json::from_value(serde_json::json!({
            "sessionType": "CALCULATOR",
            "filters": { "productListId": list_id }
        }))
        .unwrap();

        assert_eq!(payload.session_type, SessionType::Calculator);
        assert_eq!(payload.filters.product_list_id, Some(list_id));
        assert!(payload.filters.family_ids.is_empty());
        assert!(payload.name.is_none());
    }

    #[test]
    fn item_payload_accepts_negative_counts() {
        let payload: UpdateItemPayload = serde_json::from_value(serde_json::json!({
            "countedQuantity": -1.5
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        assert!(payload.counted_quantity.is_sign_negative());
    }
}
