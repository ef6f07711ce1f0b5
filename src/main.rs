// src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_guard, tenant_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inicializa o logger (RUST_LOG, padrão "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar
    let config = Config::from_env().context("Falha ao ler a configuração")?;
    let app_state = AppState::new(&config)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas de usuário (só JWT)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let tenancy_routes = Router::new()
        .route(
            "/",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_my_tenants),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Rotas de loja (JWT + x-tenant-id + vínculo)
    let tenant_setup_routes = Router::new()
        .route(
            "/locations",
            post(handlers::tenancy::create_location).get(handlers::tenancy::list_locations),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let catalog_routes = Router::new()
        .route(
            "/families",
            post(handlers::catalog::create_family).get(handlers::catalog::list_families),
        )
        .route("/subfamilies", post(handlers::catalog::create_subfamily))
        .route(
            "/products",
            post(handlers::catalog::create_product).get(handlers::catalog::list_products),
        )
        .route("/products/{id}/variations", post(handlers::catalog::add_variation))
        .route(
            "/product-lists",
            post(handlers::catalog::create_product_list).get(handlers::catalog::list_product_lists),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let inventory_routes = Router::new()
        .route(
            "/sessions",
            post(handlers::inventory::create_session).get(handlers::inventory::list_sessions),
        )
        .route("/sessions/{id}", get(handlers::inventory::get_session))
        .route("/sessions/{id}/items", post(handlers::inventory::add_item))
        .route("/sessions/{id}/close", post(handlers::inventory::close_session))
        .route("/sessions/{id}/sheet", get(handlers::documents::get_count_sheet))
        .route(
            "/items/{id}",
            put(handlers::inventory::update_item).delete(handlers::inventory::delete_item),
        )
        .route("/stock", get(handlers::inventory::list_stock))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    // Ferramentas internas (JWT + permissão checada por rota)
    let internal_roles_routes = Router::new()
        .route("/permissions", get(handlers::internal_roles::list_permissions))
        .route(
            "/roles",
            get(handlers::internal_roles::list_roles).post(handlers::internal_roles::create_role),
        )
        .route(
            "/roles/{id}",
            get(handlers::internal_roles::get_role)
                .put(handlers::internal_roles::update_role)
                .delete(handlers::internal_roles::delete_role),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let internal_routes = Router::new()
        .route(
            "/users",
            get(handlers::internal_users::list_internal_users).post(handlers::internal_users::create_internal_user),
        )
        .route("/users/{id}", put(handlers::internal_users::update_internal_user))
        .route("/leads", get(handlers::leads::list_leads))
        .route(
            "/leads/{id}",
            patch(handlers::leads::update_lead).delete(handlers::leads::delete_lead),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/leads", post(handlers::leads::capture_lead))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/tenants", tenancy_routes)
        .nest("/api/tenants/setup", tenant_setup_routes)
        .nest("/api/catalog", catalog_routes)
        .nest("/api/inventory", inventory_routes)
        .nest("/api/internal-roles", internal_roles_routes)
        .nest("/api/internal", internal_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    // Monta o router inteiro: cada handler precisa satisfazer o bound de `Handler` do axum
    #[tokio::test]
    async fn router_builds_with_every_route() {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/nao_usado".into()),
            "JWT_SECRET" => Some("segredo".into()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new().connect_lazy(&config.database_url).unwrap();

        let _router: Router = build_router(AppState::with_pool(pool, &config));
    }
}
