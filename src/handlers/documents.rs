// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::{db_utils::get_rls_connection, error::ApiError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
};

#[utoipa::path(
    get,
    path = "/api/inventory/sessions/{id}/sheet",
    tag = "Inventory",
    responses(
        (status = 200, description = "Folha de contagem (application/pdf)"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Sessão"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_count_sheet(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(session_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pdf_bytes = app_state
        .document_service
        .generate_count_sheet(&mut *rls_conn, tenant.0, session_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"inventario_{}.pdf\"", session_id),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}
