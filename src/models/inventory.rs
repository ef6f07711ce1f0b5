// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Tipo e status da sessão ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "inventory_session_type", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum SessionType {
    Total,      // Todos os produtos ativos
    Calculator, // Produtos de uma lista salva
    Custom,     // Filtro por família / subfamília / local
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "inventory_session_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Open,
    Closed,
}

// Filtros usados na criação. Guardados em JSONB junto da sessão.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionFilters {
    pub family_ids: Vec<Uuid>,
    pub subfamily_ids: Vec<Uuid>,
    pub location_ids: Vec<Uuid>,
    pub product_list_id: Option<Uuid>,
}

// --- 2. Sessão de inventário ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventorySession {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = 12)]
    pub number: i32,
    #[schema(example = "Inventário #12")]
    pub name: String,
    pub session_type: SessionType,
    pub status: SessionStatus,
    #[schema(value_type = SessionFilters)]
    pub filters: Json<SessionFilters>,
    pub created_by: Uuid,
    pub closed_by: Option<Uuid>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 3. Item contado ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub session_id: Uuid,
    pub product_id: Uuid,
    pub variation_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    #[schema(example = 3.5)]
    pub counted_quantity: Decimal,
    #[schema(example = "kg")]
    pub unit: String,
    pub counted_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Item com os nomes já resolvidos (tela de contagem e folha em PDF)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub item: InventoryItem,
    pub product_name: String,
    pub variation_name: Option<String>,
    pub location_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: InventorySession,
    pub items: Vec<InventoryItemView>,
}

// --- 4. Estoque teórico ---
// variation_id = UUID nulo quando o produto não tem variação.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TheoreticalStock {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub variation_id: Uuid,
    pub current_quantity: Decimal,
    // Ainda não valorizado: gravado como zero.
    pub total_value: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Resultado do fechamento
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionResponse {
    pub session: InventorySession,
    pub stock_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_screaming_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_value(SessionType::Calculator).unwrap(), "CALCULATOR");
        assert_eq!(serde_json::to_value(SessionStatus::Closed).unwrap(), "CLOSED");
    }

    #[test]
    fn filters_accept_partial_json() {
        let filters: SessionFilters =
            serde_json::from_str(r#"{"familyIds":["6f1c1e3e-6d9b-4a8e-9c61-2f1f6d3b7a10"]}"#).unwrap();

        assert_eq!(filters.family_ids.len(), 1);
        assert!(filters.subfamily_ids.is_empty());
        assert!(filters.product_list_id.is_none());
    }
}
