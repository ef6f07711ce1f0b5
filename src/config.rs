// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    db::{CatalogRepository, InternalRepository, InventoryRepository, LeadRepository, TenantRepository, UserRepository},
    services::{
        auth::AuthService, catalog_service::CatalogService, document_service::DocumentService,
        internal_roles_service::InternalRolesService, internal_users_service::InternalUsersService,
        inventory_service::InventoryService, lead_service::LeadService, tenancy_service::TenantService,
    },
};

/// Configuração lida das variáveis de ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub jwt_ttl: chrono::Duration,
    pub fonts_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{} deve ser definida", key));

        fn parsed<T: FromStr>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            match value {
                Some(raw) => raw.trim().parse().with_context(|| format!("{} inválida: '{}'", key, raw)),
                None => Ok(default),
            }
        }

        let bind_addr = parsed(lookup("BIND_ADDR"), "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        let db_max_connections = parsed(lookup("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 5u32)?;
        let acquire_secs = parsed(lookup("DB_ACQUIRE_TIMEOUT_SECS"), "DB_ACQUIRE_TIMEOUT_SECS", 3u64)?;
        let ttl_hours = parsed(lookup("JWT_TTL_HOURS"), "JWT_TTL_HOURS", 168i64)?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            jwt_ttl: chrono::Duration::hours(ttl_hours),
            fonts_dir: lookup("FONTS_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./fonts")),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub catalog_service: CatalogService,
    pub inventory_service: InventoryService,
    pub document_service: DocumentService,
    pub internal_roles_service: InternalRolesService,
    pub internal_users_service: InternalUsersService,
    pub lead_service: LeadService,
    // Usado direto pelo guardião de permissões internas
    pub internal_repo: InternalRepository,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, config: &Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let internal_repo = InternalRepository::new(db_pool.clone());

        let auth_service =
            AuthService::new(user_repo.clone(), config.jwt_secret.clone(), config.jwt_ttl, db_pool.clone());
        let tenant_service = TenantService::new(tenant_repo.clone(), db_pool.clone());
        let catalog_service = CatalogService::new(CatalogRepository::new());
        let inventory_service =
            InventoryService::new(InventoryRepository::new(), CatalogRepository::new(), tenant_repo);
        let document_service = DocumentService::new(inventory_service.clone(), config.fonts_dir.clone());
        let internal_roles_service = InternalRolesService::new(internal_repo.clone(), db_pool.clone());
        let internal_users_service = InternalUsersService::new(internal_repo.clone(), user_repo, db_pool.clone());
        let lead_service = LeadService::new(LeadRepository::new(db_pool.clone()));

        Self {
            db_pool,
            auth_service,
            tenant_service,
            catalog_service,
            inventory_service,
            document_service,
            internal_roles_service,
            internal_users_service,
            lead_service,
            internal_repo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_absent() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://db"), ("JWT_SECRET", "s")])).unwrap();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.jwt_ttl, chrono::Duration::hours(168));
        assert_eq!(config.fonts_dir, PathBuf::from("./fonts"));
    }

    #[test]
    fn missing_secret_fails() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://db")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn malformed_number_fails_with_the_key_name() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "s"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "s"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("JWT_TTL_HOURS", "1"),
            ("FONTS_DIR", "/srv/fonts"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.jwt_ttl, chrono::Duration::hours(1));
        assert_eq!(config.fonts_dir, PathBuf::from("/srv/fonts"));
    }
}
