// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,
        handlers::tenancy::create_location,
        handlers::tenancy::list_locations,

        // --- Catalog ---
        handlers::catalog::create_family,
        handlers::catalog::list_families,
        handlers::catalog::create_subfamily,
        handlers::catalog::create_product,
        handlers::catalog::list_products,
        handlers::catalog::add_variation,
        handlers::catalog::create_product_list,
        handlers::catalog::list_product_lists,

        // --- INVENTORY ---
        handlers::inventory::create_session,
        handlers::inventory::list_sessions,
        handlers::inventory::get_session,
        handlers::inventory::add_item,
        handlers::inventory::close_session,
        handlers::inventory::update_item,
        handlers::inventory::delete_item,
        handlers::inventory::list_stock,
        handlers::documents::get_count_sheet,

        // --- Internal ---
        handlers::internal_roles::list_permissions,
        handlers::internal_roles::list_roles,
        handlers::internal_roles::create_role,
        handlers::internal_roles::get_role,
        handlers::internal_roles::update_role,
        handlers::internal_roles::delete_role,
        handlers::internal_users::list_internal_users,
        handlers::internal_users::create_internal_user,
        handlers::internal_users::update_internal_user,

        // --- Leads ---
        handlers::leads::capture_lead,
        handlers::leads::list_leads,
        handlers::leads::update_lead,
        handlers::leads::delete_lead,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- TENANCY ---
            models::tenancy::Tenant,
            models::tenancy::TenantMember,
            models::tenancy::Location,
            handlers::tenancy::CreateTenantPayload,
            handlers::tenancy::CreateLocationPayload,

            // --- Catalog ---
            models::catalog::Family,
            models::catalog::Subfamily,
            models::catalog::Product,
            models::catalog::ProductVariation,
            models::catalog::ProductList,
            models::catalog::ProductListResponse,
            handlers::catalog::CreateFamilyPayload,
            handlers::catalog::CreateSubfamilyPayload,
            handlers::catalog::CreateProductPayload,
            handlers::catalog::CreateVariationPayload,
            handlers::catalog::CreateProductListPayload,

            // --- Inventory ---
            models::inventory::SessionType,
            models::inventory::SessionStatus,
            models::inventory::SessionFilters,
            models::inventory::InventorySession,
            models::inventory::InventoryItem,
            models::inventory::InventoryItemView,
            models::inventory::SessionDetail,
            models::inventory::TheoreticalStock,
            models::inventory::CloseSessionResponse,
            handlers::inventory::CreateSessionPayload,
            handlers::inventory::AddItemPayload,
            handlers::inventory::UpdateItemPayload,

            // --- Internal ---
            models::internal::InternalRole,
            models::internal::InternalPermission,
            models::internal::PermissionModule,
            models::internal::CreateRolePayload,
            models::internal::UpdateRolePayload,
            models::internal::RoleResponse,
            models::internal::InternalUser,
            models::internal::InternalUserView,
            models::internal::CreateInternalUserPayload,
            models::internal::UpdateInternalUserPayload,

            // --- Leads ---
            models::leads::LeadStatus,
            models::leads::Lead,
            models::leads::CreateLeadPayload,
            models::leads::UpdateLeadPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Tenancy", description = "Restaurantes e Locais de Estoque"),
        (name = "Catalog", description = "Famílias, Produtos, Variações e Listas"),
        (name = "Inventory", description = "Sessões de Inventário e Estoque Teórico"),
        (name = "Internal Roles", description = "Papéis e Permissões da Equipe Interna"),
        (name = "Internal Users", description = "Equipe Interna"),
        (name = "Leads", description = "Captação de Leads")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
