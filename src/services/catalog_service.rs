// src/services/catalog_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::catalog::{Family, Product, ProductList, ProductListResponse, ProductVariation, Subfamily},
};

#[derive(Clone)]
pub struct CatalogService {
    repo: CatalogRepository,
}

impl CatalogService {
    pub fn new(repo: CatalogRepository) -> Self {
        Self { repo }
    }

    pub async fn create_family<'e, E>(&self, executor: E, tenant_id: Uuid, name: &str) -> Result<Family, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_family(executor, tenant_id, name.trim()).await
    }

    pub async fn list_families<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Family>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_families(executor, tenant_id).await
    }

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
        self.repo.create_subfamily(executor, tenant_id, family_id, name.trim()).await
    }

    /// Cria o produto e os vínculos com locais numa transação só.
    /// Família e subfamília têm que ser do tenant; só com a subfamília, a família vem dela.
    pub async fn create_product<'a, A>(
        &self,
        conn: A,
        tenant_id: Uuid,
        family_id: Option<Uuid>,
        subfamily_id: Option<Uuid>,
        name: &str,
        unit: &str,
        location_ids: &[Uuid],
    ) -> Result<Product, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        if let Some(family_id) = family_id {
            if !self.repo.family_belongs_to_tenant(&mut *tx, tenant_id, family_id).await? {
                return Err(AppError::FamilyNotFound);
            }
        }

        let family_id = match subfamily_id {
            Some(subfamily_id) => {
                let subfamily = self
                    .repo
                    .find_subfamily(&mut *tx, tenant_id, subfamily_id)
                    .await?
                    .filter(|sub| family_id.is_none_or(|f| f == sub.family_id))
                    .ok_or(AppError::SubfamilyNotFound)?;
                Some(subfamily.family_id)
            }
            None => family_id,
        };

        let product = self
            .repo
            .create_product(&mut *tx, tenant_id, family_id, subfamily_id, name.trim(), unit.trim())
            .await?;

        if !location_ids.is_empty() {
            self.repo
                .link_product_locations(&mut *tx, tenant_id, product.id, location_ids)
                .await?;
        }

        tx.commit().await?;
        Ok(product)
    }

    pub async fn list_products<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_products(executor, tenant_id).await
    }

    pub async fn add_variation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        name: &str,
    ) -> Result<ProductVariation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_variation(executor, tenant_id, product_id, name.trim()).await
    }

    pub async fn create_product_list<'a, A>(
        &self,
        conn: A,
        tenant_id: Uuid,
        name: &str,
        product_ids: &[Uuid],
    ) -> Result<ProductListResponse, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        let list = self.repo.create_product_list(&mut *tx, tenant_id, name.trim()).await?;
        let product_ids = self
            .repo
            .add_products_to_list(&mut *tx, tenant_id, list.id, product_ids)
            .await?;

        tx.commit().await?;
        Ok(ProductListResponse { list, product_ids })
    }

    pub async fn list_product_lists<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<ProductList>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_product_lists(executor, tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    async fn tenant(pool: &PgPool, name: &str) -> Uuid {
        sqlx::query_scalar("INSERT INTO tenants (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn service() -> CatalogService {
        CatalogService::new(CatalogRepository::new())
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn product_cannot_use_another_tenants_family(pool: PgPool) {
        let svc = service();
        let ours = tenant(&pool, "Cantina").await;
        let theirs = tenant(&pool, "Outro").await;
        let foreign = svc.create_family(&pool, theirs, "Carnes").await.unwrap();

        let err = svc
            .create_product(&pool, ours, Some(foreign.id), None, "Picanha", "kg", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FamilyNotFound));

        let err = svc
            .create_product(&pool, ours, Some(Uuid::new_v4()), None, "Picanha", "kg", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FamilyNotFound));

        assert!(svc.list_products(&pool, ours).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn subfamily_must_belong_to_the_given_family(pool: PgPool) {
        let svc = service();
        let ours = tenant(&pool, "Cantina").await;
        let theirs = tenant(&pool, "Outro").await;

        let meats = svc.create_family(&pool, ours, "Carnes").await.unwrap();
        let drinks = svc.create_family(&pool, ours, "Bebidas").await.unwrap();
        let beef = svc.create_subfamily(&pool, ours, meats.id, "Bovinos").await.unwrap();
        let foreign_family = svc.create_family(&pool, theirs, "Carnes").await.unwrap();
        let foreign_sub = svc.create_subfamily(&pool, theirs, foreign_family.id, "Bovinos").await.unwrap();

        let err = svc
            .create_product(&pool, ours, Some(drinks.id), Some(beef.id), "Picanha", "kg", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SubfamilyNotFound));

        let err = svc
            .create_product(&pool, ours, None, Some(foreign_sub.id), "Picanha", "kg", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SubfamilyNotFound));

        // Só a subfamília: a família vem dela
        let product = svc
            .create_product(&pool, ours, None, Some(beef.id), " Picanha ", "kg", &[])
            .await
            .unwrap();
        assert_eq!(product.family_id, Some(meats.id));
        assert_eq!(product.subfamily_id, Some(beef.id));
        assert_eq!(product.name, "Picanha");
    }
}
