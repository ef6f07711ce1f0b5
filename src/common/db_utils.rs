use sqlx::{pool::PoolConnection, Postgres};

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::TenantContext;

// ---
// Helper RLS: a "chave" do banco para a requisição
// ---
/// Adquire uma conexão da pool e grava `app.tenant_id` / `app.user_id`,
/// lidos pelas políticas de RLS das tabelas de inventário.
///
/// As variáveis valem para a sessão da conexão; toda requisição que usa
/// este helper as redefine antes de qualquer consulta.
pub(crate) async fn get_rls_connection(
    app_state: &AppState,
    tenant_ctx: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<PoolConnection<Postgres>, AppError> {
    let mut conn = app_state.db_pool.acquire().await?;

    sqlx::query("SELECT set_config('app.tenant_id', $1, false), set_config('app.user_id', $2, false)")
        .bind(tenant_ctx.0.to_string())
        .bind(user.0.id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}
