// src/services/inventory_service.rs

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, InventoryRepository, TenantRepository},
    models::inventory::{
        CloseSessionResponse, InventoryItem, InventorySession, SessionDetail, SessionFilters, SessionStatus,
        SessionType, TheoreticalStock,
    },
};

/// Conjunto de produtos candidatos de uma nova sessão.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductScope {
    All,
    Filtered {
        family_ids: Vec<Uuid>,
        subfamily_ids: Vec<Uuid>,
        location_ids: Vec<Uuid>,
    },
    SavedList(Uuid),
}

pub fn resolve_scope(session_type: SessionType, filters: &SessionFilters) -> Result<ProductScope, AppError> {
    match session_type {
        SessionType::Total => Ok(ProductScope::All),
        SessionType::Custom => {
            if filters.family_ids.is_empty() && filters.subfamily_ids.is_empty() && filters.location_ids.is_empty() {
                return Err(AppError::InvalidSessionFilters(
                    "CUSTOM exige família, subfamília ou local".into(),
                ));
            }
            Ok(ProductScope::Filtered {
                family_ids: filters.family_ids.clone(),
                subfamily_ids: filters.subfamily_ids.clone(),
                location_ids: filters.location_ids.clone(),
            })
        }
        SessionType::Calculator => filters
            .product_list_id
            .map(ProductScope::SavedList)
            .ok_or_else(|| AppError::InvalidSessionFilters("CALCULATOR exige productListId".into())),
    }
}

/// Chave do estoque teórico. Sem variação = UUID nulo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StockKey {
    pub product_id: Uuid,
    pub variation_id: Uuid,
}

impl StockKey {
    pub fn of(item: &InventoryItem) -> Self {
        Self {
            product_id: item.product_id,
            variation_id: item.variation_id.unwrap_or(Uuid::nil()),
        }
    }
}

/// Soma as contagens por (produto, variação), juntando todos os locais.
pub fn aggregate_counts(items: &[InventoryItem]) -> BTreeMap<StockKey, Decimal> {
    let mut totals: BTreeMap<StockKey, Decimal> = BTreeMap::new();
    for item in items {
        *totals.entry(StockKey::of(item)).or_insert(Decimal::ZERO) += item.counted_quantity;
    }
    totals
}

pub fn ensure_open(session: &InventorySession) -> Result<(), AppError> {
    match session.status {
        SessionStatus::Open => Ok(()),
        SessionStatus::Closed => Err(AppError::SessionAlreadyClosed),
    }
}

// Dados da contagem de um item
#[derive(Debug, Clone)]
pub struct ItemCount {
    pub counted_quantity: Decimal,
    pub location_id: Option<Uuid>,
    pub variation_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    catalog_repo: CatalogRepository,
    tenant_repo: TenantRepository,
}

impl InventoryService {
    pub fn new(
        inventory_repo: InventoryRepository,
        catalog_repo: CatalogRepository,
        tenant_repo: TenantRepository,
    ) -> Self {
        Self { inventory_repo, catalog_repo, tenant_repo }
    }

    // --- CREATE SESSION ---
    pub async fn create_session<'a, A>(
        &self,
        conn: A,
        tenant_id: Uuid,
        user_id: Uuid,
        session_type: SessionType,
        filters: SessionFilters,
        name: Option<String>,
    ) -> Result<SessionDetail, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let scope = resolve_scope(session_type, &filters)?;

        let mut tx = conn.begin().await?;

        // 1. Resolve os produtos candidatos
        let product_ids = match &scope {
            ProductScope::All => self.catalog_repo.active_product_ids(&mut *tx, tenant_id).await?,
            ProductScope::Filtered { family_ids, subfamily_ids, location_ids } => {
                self.catalog_repo
                    .filtered_product_ids(&mut *tx, tenant_id, family_ids, subfamily_ids, location_ids)
                    .await?
            }
            ProductScope::SavedList(list_id) => {
                self.catalog_repo
                    .find_product_list(&mut *tx, tenant_id, *list_id)
                    .await?
                    .ok_or(AppError::ProductListNotFound)?;
                self.catalog_repo
                    .list_product_ids_in_list(&mut *tx, tenant_id, *list_id)
                    .await?
            }
        };

        // 2. Número sequencial e a sessão
        let number = self.inventory_repo.next_session_number(&mut *tx, tenant_id).await?;
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Inventário #{}", number));

        let session = self
            .inventory_repo
            .create_session(&mut *tx, tenant_id, number, &name, session_type, &filters, user_id)
            .await?;

        // 3. Um item zerado por produto, no primeiro local ativo
        let default_location = self
            .tenant_repo
            .first_active_location(&mut *tx, tenant_id)
            .await?
            .map(|l| l.id);

        let created = self
            .inventory_repo
            .insert_zero_items(&mut *tx, tenant_id, session.id, &product_ids, default_location)
            .await?;

        let items = self.inventory_repo.list_item_views(&mut *tx, tenant_id, session.id).await?;

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            session_id = %session.id,
            number = session.number,
            session_type = ?session_type,
            items = created,
            "📋 Sessão de inventário criada"
        );

        Ok(SessionDetail { session, items })
    }

    pub async fn list_sessions<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<InventorySession>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.list_sessions(executor, tenant_id).await
    }

    pub async fn get_session<'a, A>(&self, conn: A, tenant_id: Uuid, session_id: Uuid) -> Result<SessionDetail, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        let session = self
            .inventory_repo
            .find_session(&mut *tx, tenant_id, session_id)
            .await?
            .ok_or(AppError::SessionNotFound)?;
        let items = self.inventory_repo.list_item_views(&mut *tx, tenant_id, session_id).await?;

        tx.commit().await?;
        Ok(SessionDetail { session, items })
    }

    // --- UPDATE ITEM ---
    // Sobrescreve contagem e metadados. Não valida negativos nem o status da sessão.
    pub async fn update_item<'a, A>(
        &self,
        conn: A,
        tenant_id: Uuid,
        user_id: Uuid,
        item_id: Uuid,
        count: ItemCount,
    ) -> Result<InventoryItem, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        if let Some(location_id) = count.location_id {
            if !self
                .tenant_repo
                .location_belongs_to_tenant(&mut *tx, tenant_id, location_id)
                .await?
            {
                return Err(AppError::LocationNotFound);
            }
        }

        let item = self
            .inventory_repo
            .update_item(
                &mut *tx,
                tenant_id,
                item_id,
                count.counted_quantity,
                count.location_id,
                count.variation_id,
                count.notes.as_deref(),
                user_id,
            )
            .await?
            .ok_or(AppError::ItemNotFound)?;

        // A variação tem que ser do produto do item (rollback se não for)
        if let Some(variation_id) = count.variation_id {
            if !self
                .inventory_repo
                .variation_matches_item(&mut *tx, tenant_id, item_id, variation_id)
                .await?
            {
                return Err(AppError::VariationNotFound);
            }
        }

        tx.commit().await?;
        Ok(item)
    }

    // --- ADD ITEM (produto fora do conjunto original) ---
    pub async fn add_item<'a, A>(
        &self,
        conn: A,
        tenant_id: Uuid,
        session_id: Uuid,
        product_id: Uuid,
    ) -> Result<InventoryItem, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        self.inventory_repo
            .find_session(&mut *tx, tenant_id, session_id)
            .await?
            .ok_or(AppError::SessionNotFound)?;

        let product = self
            .catalog_repo
            .find_product(&mut *tx, tenant_id, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let default_location = self
            .tenant_repo
            .first_active_location(&mut *tx, tenant_id)
            .await?
            .map(|l| l.id);

        let item = self
            .inventory_repo
            .insert_item(&mut *tx, tenant_id, session_id, product.id, &product.unit, default_location)
            .await?;

        tx.commit().await?;
        Ok(item)
    }

    pub async fn delete_item<'e, E>(&self, executor: E, tenant_id: Uuid, item_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        match self.inventory_repo.delete_item(executor, tenant_id, item_id).await? {
            0 => Err(AppError::ItemNotFound),
            _ => Ok(()),
        }
    }

    // --- CLOSE SESSION ---
    /// Fecha a sessão e grava o estoque teórico, tudo ou nada.
    /// Qualquer erro antes do commit descarta a transação (rollback no drop).
    pub async fn close_session<'a, A>(
        &self,
        conn: A,
        tenant_id: Uuid,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<CloseSessionResponse, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        // 1. Trava a sessão: dois fechamentos simultâneos não passam juntos
        let session = self
            .inventory_repo
            .find_session_for_update(&mut *tx, tenant_id, session_id)
            .await?
            .ok_or(AppError::SessionNotFound)?;
        ensure_open(&session)?;

        // 2. Agrupa por (produto, variação) somando todos os locais
        let items = self.inventory_repo.list_items(&mut *tx, tenant_id, session_id).await?;
        let totals = aggregate_counts(&items);

        // 3. UPSERT do estoque teórico
        for (key, quantity) in &totals {
            self.inventory_repo
                .upsert_theoretical_stock(&mut *tx, tenant_id, key.product_id, key.variation_id, *quantity)
                .await?;
        }

        // 4. Fecha
        let session = self
            .inventory_repo
            .mark_session_closed(&mut *tx, tenant_id, session_id, user_id)
            .await?;

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            session_id = %session_id,
            items = items.len(),
            stock_rows = totals.len(),
            "✅ Sessão de inventário fechada"
        );

        Ok(CloseSessionResponse { session, stock_rows: totals.len() })
    }

    pub async fn list_theoretical_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<TheoreticalStock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.list_theoretical_stock(executor, tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;
    use sqlx::types::Json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(product_id: Uuid, variation_id: Option<Uuid>, location_id: Option<Uuid>, qty: &str) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            session_id: Uuid::nil(),
            product_id,
            variation_id,
            location_id,
            counted_quantity: dec(qty),
            unit: "kg".into(),
            counted_by: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn session(status: SessionStatus) -> InventorySession {
        InventorySession {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            number: 1,
            name: "Inventário #1".into(),
            session_type: SessionType::Total,
            status,
            filters: Json(SessionFilters::default()),
            created_by: Uuid::new_v4(),
            closed_by: None,
            closed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sums_same_product_across_locations() {
        let product_a = Uuid::new_v4();
        let items = vec![
            item(product_a, None, Some(Uuid::new_v4()), "3"),
            item(product_a, None, Some(Uuid::new_v4()), "2"),
        ];

        let totals = aggregate_counts(&items);

        assert_eq!(totals.len(), 1);
        let key = StockKey { product_id: product_a, variation_id: Uuid::nil() };
        assert_eq!(totals[&key], dec("5"));
    }

    #[test]
    fn variations_are_separate_keys() {
        let product = Uuid::new_v4();
        let variation = Uuid::new_v4();
        let items = vec![
            item(product, None, None, "1"),
            item(product, Some(variation), None, "4"),
            item(product, Some(variation), None, "0.5"),
        ];

        let totals = aggregate_counts(&items);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&StockKey { product_id: product, variation_id: Uuid::nil() }], dec("1"));
        assert_eq!(totals[&StockKey { product_id: product, variation_id: variation }], dec("4.5"));
    }

    #[test]
    fn decimal_sum_is_exact() {
        let product = Uuid::new_v4();
        let items = vec![item(product, None, None, "0.1"), item(product, None, None, "0.2")];

        let totals = aggregate_counts(&items);

        assert_eq!(totals.values().next().copied(), Some(dec("0.3")));
    }

    #[test]
    fn uncounted_items_still_produce_a_zero_row() {
        let product = Uuid::new_v4();
        let totals = aggregate_counts(&[item(product, None, None, "0")]);

        assert_eq!(totals.values().next().copied(), Some(Decimal::ZERO));
        assert!(aggregate_counts(&[]).is_empty());
    }

    #[test]
    fn total_scope_ignores_filters() {
        let filters = SessionFilters { family_ids: vec![Uuid::new_v4()], ..Default::default() };
        assert_eq!(resolve_scope(SessionType::Total, &filters).unwrap(), ProductScope::All);
    }

    #[test]
    fn custom_scope_requires_a_filter() {
        let err = resolve_scope(SessionType::Custom, &SessionFilters::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidSessionFilters(_)));

        let location = Uuid::new_v4();
        let filters = SessionFilters { location_ids: vec![location], ..Default::default() };
        assert_eq!(
            resolve_scope(SessionType::Custom, &filters).unwrap(),
            ProductScope::Filtered { family_ids: vec![], subfamily_ids: vec![], location_ids: vec![location] }
        );
    }

    #[test]
    fn calculator_scope_requires_a_saved_list() {
        assert!(resolve_scope(SessionType::Calculator, &SessionFilters::default()).is_err());

        let list_id = Uuid::new_v4();
        let filters = SessionFilters { product_list_id: Some(list_id), ..Default::default() };
        assert_eq!(resolve_scope(SessionType::Calculator, &filters).unwrap(), ProductScope::SavedList(list_id));
    }

    #[test]
    fn only_open_sessions_can_close() {
        assert!(ensure_open(&session(SessionStatus::Open)).is_ok());
        assert!(matches!(ensure_open(&session(SessionStatus::Closed)), Err(AppError::SessionAlreadyClosed)));
    }

    // ---
    // Testes contra Postgres real
    // ---

    mod db {
        use super::*;
        use sqlx::PgPool;

        struct Seed {
            tenant_id: Uuid,
            user_id: Uuid,
            loc_1: Uuid,
            loc_2: Uuid,
            product_a: Uuid,
            product_b: Uuid,
        }

        async fn seed(pool: &PgPool) -> Seed {
            let user_id: Uuid = sqlx::query_scalar(
                "INSERT INTO users (email, password_hash) VALUES ('estoque@teste.com', 'x') RETURNING id",
            )
            .fetch_one(pool)
            .await
            .unwrap();
            let tenant_id: Uuid = sqlx::query_scalar("INSERT INTO tenants (name) VALUES ('Cantina') RETURNING id")
                .fetch_one(pool)
                .await
                .unwrap();
            let loc_1: Uuid = sqlx::query_scalar(
                "INSERT INTO locations (tenant_id, name, created_at) VALUES ($1, 'Câmara fria', NOW() - INTERVAL '1 day') RETURNING id",
            )
            .bind(tenant_id)
            .fetch_one(pool)
            .await
            .unwrap();
            let loc_2: Uuid =
                sqlx::query_scalar("INSERT INTO locations (tenant_id, name) VALUES ($1, 'Estoque seco') RETURNING id")
                    .bind(tenant_id)
                    .fetch_one(pool)
                    .await
                    .unwrap();
            let product_a: Uuid = sqlx::query_scalar(
                "INSERT INTO products (tenant_id, name, unit) VALUES ($1, 'Arroz', 'kg') RETURNING id",
            )
            .bind(tenant_id)
            .fetch_one(pool)
            .await
            .unwrap();
            let product_b: Uuid = sqlx::query_scalar(
                "INSERT INTO products (tenant_id, name, unit) VALUES ($1, 'Feijão', 'kg') RETURNING id",
            )
            .bind(tenant_id)
            .fetch_one(pool)
            .await
            .unwrap();

            Seed { tenant_id, user_id, loc_1, loc_2, product_a, product_b }
        }

        fn service(pool: &PgPool) -> InventoryService {
            InventoryService::new(
                InventoryRepository::new(),
                CatalogRepository::new(),
                TenantRepository::new(pool.clone()),
            )
        }

        fn count(qty: &str, location_id: Uuid) -> ItemCount {
            ItemCount { counted_quantity: dec(qty), location_id: Some(location_id), variation_id: None, notes: None }
        }

        async fn stock_of(pool: &PgPool, tenant_id: Uuid, product_id: Uuid) -> Option<Decimal> {
            sqlx::query_scalar(
                "SELECT current_quantity FROM theoretical_stock WHERE tenant_id = $1 AND product_id = $2 AND variation_id = $3",
            )
            .bind(tenant_id)
            .bind(product_id)
            .bind(Uuid::nil())
            .fetch_optional(pool)
            .await
            .unwrap()
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn total_session_gets_one_zero_item_per_active_product(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);

            let detail = svc
                .create_session(&pool, s.tenant_id, s.user_id, SessionType::Total, SessionFilters::default(), None)
                .await
                .unwrap();

            assert_eq!(detail.session.number, 1);
            assert_eq!(detail.session.name, "Inventário #1");
            assert_eq!(detail.session.status, SessionStatus::Open);
            assert_eq!(detail.items.len(), 2);
            assert!(detail.items.iter().all(|i| i.item.counted_quantity == Decimal::ZERO));
            assert!(detail.items.iter().all(|i| i.item.location_id == Some(s.loc_1)));

            let second = svc
                .create_session(&pool, s.tenant_id, s.user_id, SessionType::Total, SessionFilters::default(), None)
                .await
                .unwrap();
            assert_eq!(second.session.number, 2);
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn close_sums_counts_across_locations(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);

            let detail = svc
                .create_session(&pool, s.tenant_id, s.user_id, SessionType::Total, SessionFilters::default(), None)
                .await
                .unwrap();
            let first_a = detail.items.iter().find(|i| i.item.product_id == s.product_a).unwrap();

            svc.update_item(&pool, s.tenant_id, s.user_id, first_a.item.id, count("3", s.loc_1))
                .await
                .unwrap();
            let extra = svc.add_item(&pool, s.tenant_id, detail.session.id, s.product_a).await.unwrap();
            svc.update_item(&pool, s.tenant_id, s.user_id, extra.id, count("2", s.loc_2))
                .await
                .unwrap();

            let closed = svc.close_session(&pool, s.tenant_id, s.user_id, detail.session.id).await.unwrap();

            assert_eq!(closed.session.status, SessionStatus::Closed);
            assert_eq!(closed.session.closed_by, Some(s.user_id));
            assert_eq!(closed.stock_rows, 2);
            assert_eq!(stock_of(&pool, s.tenant_id, s.product_a).await, Some(dec("5")));
            assert_eq!(stock_of(&pool, s.tenant_id, s.product_b).await, Some(Decimal::ZERO));
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn closing_twice_fails_without_touching_stock(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);

            let first = svc
                .create_session(&pool, s.tenant_id, s.user_id, SessionType::Total, SessionFilters::default(), None)
                .await
                .unwrap();
            let item_a = first.items.iter().find(|i| i.item.product_id == s.product_a).unwrap();
            svc.update_item(&pool, s.tenant_id, s.user_id, item_a.item.id, count("7", s.loc_1))
                .await
                .unwrap();
            svc.close_session(&pool, s.tenant_id, s.user_id, first.session.id).await.unwrap();

            // Contagem alterada depois do fechamento não pode chegar ao estoque
            svc.update_item(&pool, s.tenant_id, s.user_id, item_a.item.id, count("99", s.loc_1))
                .await
                .unwrap();
            let err = svc
                .close_session(&pool, s.tenant_id, s.user_id, first.session.id)
                .await
                .unwrap_err();

            assert!(matches!(err, AppError::SessionAlreadyClosed));
            assert_eq!(stock_of(&pool, s.tenant_id, s.product_a).await, Some(dec("7")));
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn count_cannot_point_to_another_tenants_location(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);

            let other_tenant: Uuid = sqlx::query_scalar("INSERT INTO tenants (name) VALUES ('Outro') RETURNING id")
                .fetch_one(&pool)
                .await
                .unwrap();
            let foreign_location: Uuid =
                sqlx::query_scalar("INSERT INTO locations (tenant_id, name) VALUES ($1, 'Depósito') RETURNING id")
                    .bind(other_tenant)
                    .fetch_one(&pool)
                    .await
                    .unwrap();

            let detail = svc
                .create_session(&pool, s.tenant_id, s.user_id, SessionType::Total, SessionFilters::default(), None)
                .await
                .unwrap();
            let err = svc
                .update_item(&pool, s.tenant_id, s.user_id, detail.items[0].item.id, count("1", foreign_location))
                .await
                .unwrap_err();

            assert!(matches!(err, AppError::LocationNotFound));
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn add_item_rejects_unknown_product(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);

            let detail = svc
                .create_session(&pool, s.tenant_id, s.user_id, SessionType::Total, SessionFilters::default(), None)
                .await
                .unwrap();
            let err = svc
                .add_item(&pool, s.tenant_id, detail.session.id, Uuid::new_v4())
                .await
                .unwrap_err();

            assert!(matches!(err, AppError::ProductNotFound));
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn calculator_session_uses_the_saved_list(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);

            let list_id: Uuid =
                sqlx::query_scalar("INSERT INTO product_lists (tenant_id, name) VALUES ($1, 'Bar') RETURNING id")
                    .bind(s.tenant_id)
                    .fetch_one(&pool)
                    .await
                    .unwrap();
            sqlx::query("INSERT INTO product_list_items (list_id, product_id) VALUES ($1, $2)")
                .bind(list_id)
                .bind(s.product_b)
                .execute(&pool)
                .await
                .unwrap();

            let filters = SessionFilters { product_list_id: Some(list_id), ..Default::default() };
            let detail = svc
                .create_session(&pool, s.tenant_id, s.user_id, SessionType::Calculator, filters, Some("Bar".into()))
                .await
                .unwrap();

            assert_eq!(detail.session.name, "Bar");
            assert_eq!(detail.items.len(), 1);
            assert_eq!(detail.items[0].item.product_id, s.product_b);
            assert_eq!(detail.session.filters.0.product_list_id, Some(list_id));
        }

        async fn session_of(svc: &InventoryService, pool: &PgPool, s: &Seed, filters: SessionFilters) -> SessionDetail {
            let session_type = if filters == SessionFilters::default() { SessionType::Total } else { SessionType::Custom };
            svc.create_session(pool, s.tenant_id, s.user_id, session_type, filters, None).await.unwrap()
        }

        async fn variation(pool: &PgPool, tenant_id: Uuid, product_id: Uuid, name: &str) -> Uuid {
            sqlx::query_scalar(
                "INSERT INTO product_variations (tenant_id, product_id, name) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(tenant_id)
            .bind(product_id)
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap()
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn get_session_works_on_a_pooled_connection(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);
            let created = session_of(&svc, &pool, &s, SessionFilters::default()).await;

            let mut conn = pool.acquire().await.unwrap();
            let detail = svc.get_session(&mut *conn, s.tenant_id, created.session.id).await.unwrap();

            assert_eq!(detail.session.id, created.session.id);
            assert_eq!(detail.items.len(), 2);

            let err = svc.get_session(&mut *conn, s.tenant_id, Uuid::new_v4()).await.unwrap_err();
            assert!(matches!(err, AppError::SessionNotFound));
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn count_cannot_point_to_a_foreign_variation(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);

            let other_tenant: Uuid = sqlx::query_scalar("INSERT INTO tenants (name) VALUES ('Outro') RETURNING id")
                .fetch_one(&pool)
                .await
                .unwrap();
            let other_product: Uuid = sqlx::query_scalar(
                "INSERT INTO products (tenant_id, name, unit) VALUES ($1, 'Arroz', 'kg') RETURNING id",
            )
            .bind(other_tenant)
            .fetch_one(&pool)
            .await
            .unwrap();
            let foreign = variation(&pool, other_tenant, other_product, "Parboilizado").await;
            let of_product_b = variation(&pool, s.tenant_id, s.product_b, "Preto").await;

            let detail = session_of(&svc, &pool, &s, SessionFilters::default()).await;
            let item_a = detail.items.iter().find(|i| i.item.product_id == s.product_a).unwrap();

            for variation_id in [foreign, of_product_b] {
                let counted = ItemCount { variation_id: Some(variation_id), ..count("4", s.loc_1) };
                let err = svc
                    .update_item(&pool, s.tenant_id, s.user_id, item_a.item.id, counted)
                    .await
                    .unwrap_err();
                assert!(matches!(err, AppError::VariationNotFound));
            }

            // Nada foi gravado: o fechamento só conhece a chave sem variação
            svc.close_session(&pool, s.tenant_id, s.user_id, detail.session.id).await.unwrap();
            let keyed_by_variation: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM theoretical_stock WHERE tenant_id = $1 AND variation_id <> $2",
            )
            .bind(s.tenant_id)
            .bind(Uuid::nil())
            .fetch_one(&pool)
            .await
            .unwrap();
            assert_eq!(keyed_by_variation, 0);
            assert_eq!(stock_of(&pool, s.tenant_id, s.product_a).await, Some(Decimal::ZERO));
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn variation_of_the_items_product_is_a_separate_stock_key(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);
            let whole = variation(&pool, s.tenant_id, s.product_a, "Integral").await;

            let detail = session_of(&svc, &pool, &s, SessionFilters::default()).await;
            let item_a = detail.items.iter().find(|i| i.item.product_id == s.product_a).unwrap();
            let counted = ItemCount { variation_id: Some(whole), ..count("2.5", s.loc_1) };
            let updated = svc.update_item(&pool, s.tenant_id, s.user_id, item_a.item.id, counted).await.unwrap();
            assert_eq!(updated.variation_id, Some(whole));

            svc.close_session(&pool, s.tenant_id, s.user_id, detail.session.id).await.unwrap();

            let stocked: Decimal = sqlx::query_scalar(
                "SELECT current_quantity FROM theoretical_stock WHERE tenant_id = $1 AND product_id = $2 AND variation_id = $3",
            )
            .bind(s.tenant_id)
            .bind(s.product_a)
            .bind(whole)
            .fetch_one(&pool)
            .await
            .unwrap();
            assert_eq!(stocked, dec("2.5"));
            assert_eq!(stock_of(&pool, s.tenant_id, s.product_a).await, None);
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn update_overwrites_metadata_with_nulls(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);
            let detail = session_of(&svc, &pool, &s, SessionFilters::default()).await;
            let item_id = detail.items[0].item.id;

            let noted = ItemCount { notes: Some("caixa aberta".into()), ..count("1", s.loc_2) };
            let first = svc.update_item(&pool, s.tenant_id, s.user_id, item_id, noted).await.unwrap();
            assert_eq!(first.location_id, Some(s.loc_2));
            assert_eq!(first.notes.as_deref(), Some("caixa aberta"));

            let bare = ItemCount { counted_quantity: dec("1"), location_id: None, variation_id: None, notes: None };
            let second = svc.update_item(&pool, s.tenant_id, s.user_id, item_id, bare).await.unwrap();
            assert_eq!(second.location_id, None);
            assert_eq!(second.notes, None);
            assert_eq!(second.counted_by, Some(s.user_id));
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn custom_session_filtered_by_family(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);

            let grains: Uuid =
                sqlx::query_scalar("INSERT INTO product_families (tenant_id, name) VALUES ($1, 'Grãos') RETURNING id")
                    .bind(s.tenant_id)
                    .fetch_one(&pool)
                    .await
                    .unwrap();
            sqlx::query("UPDATE products SET family_id = $1 WHERE id = $2")
                .bind(grains)
                .bind(s.product_a)
                .execute(&pool)
                .await
                .unwrap();
            // Inativo da mesma família fica de fora
            sqlx::query("INSERT INTO products (tenant_id, family_id, name, unit, is_active) VALUES ($1, $2, 'Lentilha', 'kg', false)")
                .bind(s.tenant_id)
                .bind(grains)
                .execute(&pool)
                .await
                .unwrap();

            let filters = SessionFilters { family_ids: vec![grains], ..Default::default() };
            let detail = session_of(&svc, &pool, &s, filters).await;

            assert_eq!(detail.session.session_type, SessionType::Custom);
            let products: Vec<Uuid> = detail.items.iter().map(|i| i.item.product_id).collect();
            assert_eq!(products, vec![s.product_a]);
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn custom_session_filtered_by_location(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);

            sqlx::query("INSERT INTO product_locations (product_id, location_id) VALUES ($1, $2), ($3, $4)")
                .bind(s.product_a)
                .bind(s.loc_1)
                .bind(s.product_b)
                .bind(s.loc_2)
                .execute(&pool)
                .await
                .unwrap();

            let filters = SessionFilters { location_ids: vec![s.loc_2], ..Default::default() };
            let detail = session_of(&svc, &pool, &s, filters).await;

            let products: Vec<Uuid> = detail.items.iter().map(|i| i.item.product_id).collect();
            assert_eq!(products, vec![s.product_b]);

            // Filtro sem nenhum produto ainda abre a sessão
            let empty = SessionFilters { family_ids: vec![Uuid::new_v4()], ..Default::default() };
            let detail = session_of(&svc, &pool, &s, empty).await;
            assert!(detail.items.is_empty());
            assert_eq!(detail.session.number, 2);
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn add_item_rejects_unknown_session(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);

            let err = svc.add_item(&pool, s.tenant_id, Uuid::new_v4(), s.product_a).await.unwrap_err();

            assert!(matches!(err, AppError::SessionNotFound));
        }

        #[sqlx::test]
        #[ignore = "requer Postgres (DATABASE_URL)"]
        async fn delete_item_removes_it_once(pool: PgPool) {
            let s = seed(&pool).await;
            let svc = service(&pool);
            let detail = session_of(&svc, &pool, &s, SessionFilters::default()).await;
            let item_id = detail.items[0].item.id;

            svc.delete_item(&pool, s.tenant_id, item_id).await.unwrap();

            let left = svc.get_session(&pool, s.tenant_id, detail.session.id).await.unwrap();
            assert_eq!(left.items.len(), 1);
            assert!(left.items.iter().all(|i| i.item.id != item_id));

            let err = svc.delete_item(&pool, s.tenant_id, item_id).await.unwrap_err();
            assert!(matches!(err, AppError::ItemNotFound));
        }
    }
}
