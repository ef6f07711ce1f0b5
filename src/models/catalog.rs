// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Famílias e Subfamílias (agrupam o catálogo: Carnes > Bovinos) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Carnes")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subfamily {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub family_id: Uuid,
    #[schema(example = "Bovinos")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// --- 2. Produtos (insumos contados no inventário) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub family_id: Option<Uuid>,
    pub subfamily_id: Option<Uuid>,
    #[schema(example = "Contra-filé")]
    pub name: String,
    #[schema(example = "kg")]
    pub unit: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariation {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    #[schema(example = "Peça inteira")]
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// --- 3. Listas salvas (base das sessões do tipo CALCULATOR) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductList {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Contagem semanal do bar")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    #[serde(flatten)]
    pub list: ProductList,
    pub product_ids: Vec<Uuid>,
}
