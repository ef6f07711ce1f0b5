// src/db/catalog_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{Family, Product, ProductList, ProductVariation, Subfamily},
};

#[derive(Clone, Default)]
pub struct CatalogRepository;

impl CatalogRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Famílias
    // ---

    pub async fn create_family<'e, E>(&self, executor: E, tenant_id: Uuid, name: &str) -> Result<Family, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Family>(
            "INSERT INTO product_families (tenant_id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(e, || {
                AppError::UniqueConstraintViolation(format!("família '{}'", name))
            })
        })
    }

    pub async fn list_families<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Family>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let families = sqlx::query_as::<_, Family>(
            "SELECT * FROM product_families WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(families)
    }

    /// Cria a subfamília só se a família for do mesmo tenant.
    pub async fn create_subfamily<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        family_id: Uuid,
        name: &str,
    ) -> Result<Subfamily, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Subfamily>(
            r#"
            INSERT INTO product_subfamilies (tenant_id, family_id, name)
            SELECT f.tenant_id, f.id, $3
            FROM product_families f
            WHERE f.id = $2 AND f.tenant_id = $1
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(family_id)
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(e, || {
                AppError::UniqueConstraintViolation(format!("subfamília '{}'", name))
            })
        })?
        .ok_or(AppError::FamilyNotFound)
    }

    pub async fn family_belongs_to_tenant<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        family_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM product_families WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(family_id)
        .bind(tenant_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn find_subfamily<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        subfamily_id: Uuid,
    ) -> Result<Option<Subfamily>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let subfamily = sqlx::query_as::<_, Subfamily>(
            "SELECT * FROM product_subfamilies WHERE id = $1 AND tenant_id = $2",
        )
        .bind(subfamily_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(subfamily)
    }

    // ---
    // Produtos
    // ---

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        family_id: Option<Uuid>,
        subfamily_id: Option<Uuid>,
        name: &str,
        unit: &str,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (tenant_id, family_id, subfamily_id, name, unit)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(family_id)
        .bind(subfamily_id)
        .bind(name)
        .bind(unit)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    // Inserção em massa usando UNNEST. Ignora locais de outro tenant.
    pub async fn link_product_locations<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        location_ids: &[Uuid],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO product_locations (product_id, location_id)
            SELECT $2, l.id FROM locations l
            WHERE l.tenant_id = $1 AND l.id = ANY($3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(location_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_products<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn find_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND tenant_id = $2",
        )
        .bind(product_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    pub async fn create_variation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        name: &str,
    ) -> Result<ProductVariation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ProductVariation>(
            r#"
            INSERT INTO product_variations (tenant_id, product_id, name)
            SELECT p.tenant_id, p.id, $3
            FROM products p
            WHERE p.id = $2 AND p.tenant_id = $1
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(e, || {
                AppError::UniqueConstraintViolation(format!("variação '{}'", name))
            })
        })?
        .ok_or(AppError::ProductNotFound)
    }

    // ---
    // Resolução de produtos para as sessões de inventário
    // ---

    /// TOTAL: todos os produtos ativos.
    pub async fn active_product_ids<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM products WHERE tenant_id = $1 AND is_active = true ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    /// CUSTOM: listas vazias não filtram.
    pub async fn filtered_product_ids<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        family_ids: &[Uuid],
        subfamily_ids: &[Uuid],
        location_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT p.id
            FROM products p
            WHERE p.tenant_id = $1
              AND p.is_active = true
              AND (cardinality($2::uuid[]) = 0 OR p.family_id = ANY($2))
              AND (cardinality($3::uuid[]) = 0 OR p.subfamily_id = ANY($3))
              AND (cardinality($4::uuid[]) = 0 OR EXISTS (
                    SELECT 1 FROM product_locations pl
                    WHERE pl.product_id = p.id AND pl.location_id = ANY($4)
                  ))
            ORDER BY p.name ASC
            "#,
        )
        .bind(tenant_id)
        .bind(family_ids)
        .bind(subfamily_ids)
        .bind(location_ids)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    /// CALCULATOR: produtos ativos de uma lista salva.
    pub async fn list_product_ids_in_list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        list_id: Uuid,
    ) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT p.id
            FROM product_list_items li
            JOIN products p ON p.id = li.product_id
            WHERE li.list_id = $2 AND p.tenant_id = $1 AND p.is_active = true
            ORDER BY p.name ASC
            "#,
        )
        .bind(tenant_id)
        .bind(list_id)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    // ---
    // Listas salvas
    // ---

    pub async fn create_product_list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
    ) -> Result<ProductList, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let list = sqlx::query_as::<_, ProductList>(
            "INSERT INTO product_lists (tenant_id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(list)
    }

    pub async fn add_products_to_list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        list_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO product_list_items (list_id, product_id)
            SELECT $2, p.id FROM products p
            WHERE p.tenant_id = $1 AND p.id = ANY($3)
            ON CONFLICT DO NOTHING
            RETURNING product_id
            "#,
        )
        .bind(tenant_id)
        .bind(list_id)
        .bind(product_ids)
        .fetch_all(executor)
        .await?;
        Ok(inserted)
    }

    pub async fn find_product_list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        list_id: Uuid,
    ) -> Result<Option<ProductList>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let list = sqlx::query_as::<_, ProductList>(
            "SELECT * FROM product_lists WHERE id = $1 AND tenant_id = $2",
        )
        .bind(list_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(list)
    }

    pub async fn list_product_lists<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<ProductList>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lists = sqlx::query_as::<_, ProductList>(
            "SELECT * FROM product_lists WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(lists)
    }
}
