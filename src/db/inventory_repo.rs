// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        InventoryItem, InventoryItemView, InventorySession, SessionFilters, SessionType, TheoreticalStock,
    },
};

#[derive(Clone, Default)]
pub struct InventoryRepository;

impl InventoryRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Sessões
    // ---

    /// Próximo número sequencial do tenant. Deve rodar na mesma transação do INSERT;
    /// a UNIQUE (tenant_id, number) barra duas criações simultâneas.
    pub async fn next_session_number<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let next = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(number), 0) + 1 FROM inventory_sessions WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_one(executor)
        .await?;
        Ok(next)
    }

    pub async fn create_session<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        number: i32,
        name: &str,
        session_type: SessionType,
        filters: &SessionFilters,
        created_by: Uuid,
    ) -> Result<InventorySession, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, InventorySession>(
            r#"
            INSERT INTO inventory_sessions (tenant_id, number, name, session_type, filters, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(number)
        .bind(name)
        .bind(session_type)
        .bind(Json(filters))
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(e, || {
                AppError::UniqueConstraintViolation(format!("sessão número {}", number))
            })
        })
    }

    pub async fn list_sessions<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<InventorySession>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sessions = sqlx::query_as::<_, InventorySession>(
            "SELECT * FROM inventory_sessions WHERE tenant_id = $1 ORDER BY number DESC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(sessions)
    }

    pub async fn find_session<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<InventorySession>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let session = sqlx::query_as::<_, InventorySession>(
            "SELECT * FROM inventory_sessions WHERE id = $1 AND tenant_id = $2",
        )
        .bind(session_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(session)
    }

    /// Igual a `find_session`, mas trava a linha até o fim da transação.
    pub async fn find_session_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<InventorySession>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let session = sqlx::query_as::<_, InventorySession>(
            "SELECT * FROM inventory_sessions WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(session_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(session)
    }

    pub async fn mark_session_closed<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        session_id: Uuid,
        closed_by: Uuid,
    ) -> Result<InventorySession, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let session = sqlx::query_as::<_, InventorySession>(
            r#"
            UPDATE inventory_sessions
            SET status = 'CLOSED', closed_by = $3, closed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(tenant_id)
        .bind(closed_by)
        .fetch_one(executor)
        .await?;
        Ok(session)
    }

    // ---
    // Itens
    // ---

    /// Um item zerado por produto, com a unidade do produto.
    pub async fn insert_zero_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        session_id: Uuid,
        product_ids: &[Uuid],
        location_id: Option<Uuid>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory_items (tenant_id, session_id, product_id, location_id, unit)
            SELECT $1, $2, p.id, $4, p.unit
            FROM products p
            WHERE p.tenant_id = $1 AND p.id = ANY($3)
            "#,
        )
        .bind(tenant_id)
        .bind(session_id)
        .bind(product_ids)
        .bind(location_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        session_id: Uuid,
        product_id: Uuid,
        unit: &str,
        location_id: Option<Uuid>,
    ) -> Result<InventoryItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items (tenant_id, session_id, product_id, location_id, unit)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(session_id)
        .bind(product_id)
        .bind(location_id)
        .bind(unit)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        session_id: Uuid,
    ) -> Result<Vec<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE session_id = $1 AND tenant_id = $2",
        )
        .bind(session_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn list_item_views<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        session_id: Uuid,
    ) -> Result<Vec<InventoryItemView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, InventoryItemView>(
            r#"
            SELECT i.*,
                   p.name AS product_name,
                   v.name AS variation_name,
                   l.name AS location_name
            FROM inventory_items i
            JOIN products p ON p.id = i.product_id
            LEFT JOIN product_variations v ON v.id = i.variation_id
            LEFT JOIN locations l ON l.id = i.location_id
            WHERE i.session_id = $1 AND i.tenant_id = $2
            ORDER BY l.name ASC NULLS LAST, p.name ASC, v.name ASC NULLS FIRST
            "#,
        )
        .bind(session_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    /// Sobrescreve a contagem e os metadados. `None` limpa local, variação e observação.
    pub async fn update_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        item_id: Uuid,
        counted_quantity: Decimal,
        location_id: Option<Uuid>,
        variation_id: Option<Uuid>,
        notes: Option<&str>,
        counted_by: Uuid,
    ) -> Result<Option<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items
            SET counted_quantity = $3,
                location_id = $4,
                variation_id = $5,
                notes = $6,
                counted_by = $7,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(tenant_id)
        .bind(counted_quantity)
        .bind(location_id)
        .bind(variation_id)
        .bind(notes)
        .bind(counted_by)
        .fetch_optional(executor)
        .await?;
        Ok(item)
    }

    /// A variação precisa ser do mesmo produto do item, dentro do tenant.
    pub async fn variation_matches_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        item_id: Uuid,
        variation_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let matches: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM product_variations v
                JOIN inventory_items i ON i.product_id = v.product_id
                WHERE v.id = $1 AND v.tenant_id = $2 AND i.id = $3 AND i.tenant_id = $2
            )
            "#,
        )
        .bind(variation_id)
        .bind(tenant_id)
        .bind(item_id)
        .fetch_one(executor)
        .await?;

        Ok(matches)
    }

    pub async fn delete_item<'e, E>(&self, executor: E, tenant_id: Uuid, item_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1 AND tenant_id = $2")
            .bind(item_id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Estoque teórico
    // ---

    /// UPSERT pela chave (tenant, produto, variação). A quantidade é substituída
    /// pela soma contada, não acumulada. Valor total ainda não é calculado.
    pub async fn upsert_theoretical_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        variation_id: Uuid,
        quantity: Decimal,
    ) -> Result<TheoreticalStock, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock = sqlx::query_as::<_, TheoreticalStock>(
            r#"
            INSERT INTO theoretical_stock (tenant_id, product_id, variation_id, current_quantity, total_value)
            VALUES ($1, $2, $3, $4, 0)
            ON CONFLICT (tenant_id, product_id, variation_id)
            DO UPDATE SET
                current_quantity = EXCLUDED.current_quantity,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(variation_id)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(stock)
    }

    pub async fn list_theoretical_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<TheoreticalStock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock = sqlx::query_as::<_, TheoreticalStock>(
            "SELECT * FROM theoretical_stock WHERE tenant_id = $1 ORDER BY updated_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(stock)
    }
}
