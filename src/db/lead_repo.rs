// src/db/lead_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::leads::{CreateLeadPayload, Lead, LeadStatus},
};

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_lead(&self, input: &CreateLeadPayload) -> Result<Lead, AppError> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (name, email, phone, restaurant_name, city, source)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(input.email.to_lowercase())
        .bind(&input.phone)
        .bind(&input.restaurant_name)
        .bind(&input.city)
        .bind(&input.source)
        .fetch_one(&self.pool)
        .await?;
        Ok(lead)
    }

    // Filtro opcional por status, montado com QueryBuilder
    pub async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM leads");
        if let Some(status) = status {
            query.push(" WHERE status = ").push_bind(status);
        }
        query.push(" ORDER BY created_at DESC");

        let leads = query.build_query_as::<Lead>().fetch_all(&self.pool).await?;
        Ok(leads)
    }

    pub async fn update_lead(
        &self,
        id: Uuid,
        status: Option<LeadStatus>,
        notes: Option<&str>,
    ) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
            SET status = COALESCE($2, status),
                notes = COALESCE($3, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lead)
    }

    pub async fn delete_lead(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
