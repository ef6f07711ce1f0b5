// src/handlers/catalog.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
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
    models::catalog::{Family, Product, ProductList, ProductListResponse, ProductVariation, Subfamily},
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFamilyPayload {
    #[validate(length(min = 1, max = 80, message = "O nome é obrigatório."))]
    #[schema(example = "Carnes")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubfamilyPayload {
    pub family_id: Uuid,
    #[validate(length(min = 1, max = 80, message = "O nome é obrigatório."))]
    #[schema(example = "Bovinos")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    pub family_id: Option<Uuid>,
    pub subfamily_id: Option<Uuid>,

    #[validate(length(min = 1, max = 120, message = "O nome é obrigatório."))]
    #[schema(example = "Picanha")]
    pub name: String,

    #[validate(length(min = 1, max = 10, message = "A unidade é obrigatória."))]
    #[schema(example = "kg")]
    pub unit: String,

    // Locais onde o produto é guardado (filtro de sessões CUSTOM)
    #[serde(default)]
    pub location_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVariationPayload {
    #[validate(length(min = 1, max = 80, message = "O nome é obrigatório."))]
    #[schema(example = "Peça inteira")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductListPayload {
    #[validate(length(min = 1, max = 80, message = "O nome é obrigatório."))]
    #[schema(example = "Bar")]
    pub name: String,

    #[serde(default)]
    pub product_ids: Vec<Uuid>,
}

// ---
// Famílias
// ---

#[utoipa::path(
    post,
    path = "/api/catalog/families",
    tag = "Catalog",
    request_body = CreateFamilyPayload,
    responses((status = 201, description = "Família criada", body = Family)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_family(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateFamilyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let family = app_state
        .catalog_service
        .create_family(&mut *rls_conn, tenant.0, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(family)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/families",
    tag = "Catalog",
    responses((status = 200, description = "Famílias do restaurante", body = Vec<Family>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_families(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<Family>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let families = app_state
        .catalog_service
        .list_families(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(families))
}

#[utoipa::path(
    post,
    path = "/api/catalog/subfamilies",
    tag = "Catalog",
    request_body = CreateSubfamilyPayload,
    responses(
        (status = 201, description = "Subfamília criada", body = Subfamily),
        (status = 404, description = "Família não encontrada")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_subfamily(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateSubfamilyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let subfamily = app_state
        .catalog_service
        .create_subfamily(&mut *rls_conn, tenant.0, payload.family_id, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(subfamily)))
}

// ---
// Produtos
// ---

#[utoipa::path(
    post,
    path = "/api/catalog/products",
    tag = "Catalog",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 404, description = "Família ou subfamília não encontrada")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let product = app_state
        .catalog_service
        .create_product(
            &mut *rls_conn,
            tenant.0,
            payload.family_id,
            payload.subfamily_id,
            &payload.name,
            &payload.unit,
            &payload.location_ids,
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/products",
    tag = "Catalog",
    responses((status = 200, description = "Produtos do restaurante", body = Vec<Product>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<Product>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let products = app_state
        .catalog_service
        .list_products(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/api/catalog/products/{id}/variations",
    tag = "Catalog",
    request_body = CreateVariationPayload,
    responses(
        (status = 201, description = "Variação criada", body = ProductVariation),
        (status = 404, description = "Produto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Produto"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_variation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<CreateVariationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let variation = app_state
        .catalog_service
        .add_variation(&mut *rls_conn, tenant.0, product_id, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(variation)))
}

// ---
// Listas salvas (base das sessões CALCULATOR)
// ---

#[utoipa::path(
    post,
    path = "/api/catalog/product-lists",
    tag = "Catalog",
    request_body = CreateProductListPayload,
    responses((status = 201, description = "Lista criada", body = ProductListResponse)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_product_list(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateProductListPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let list = app_state
        .catalog_service
        .create_product_list(&mut *rls_conn, tenant.0, &payload.name, &payload.product_ids)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(list)))
}

#[utoipa::path(
    get,
    path = "/api/catalog/product-lists",
    tag = "Catalog",
    responses((status = 200, description = "Listas salvas", body = Vec<ProductList>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_product_lists(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<ProductList>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let lists = app_state
        .catalog_service
        .list_product_lists(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(lists))
}
