// src/models/leads.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Mapeia o CREATE TYPE lead_status do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(example = "João Lima")]
    pub name: String,
    #[schema(example = "joao@bistro.com.br")]
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = "Bistrô Lima")]
    pub restaurant_name: Option<String>,
    pub city: Option<String>,
    #[schema(example = "landing-cmv")]
    pub source: Option<String>,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Formulário público das páginas de captação
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres."))]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(length(min = 8, max = 20, message = "Telefone inválido."))]
    pub phone: Option<String>,

    pub restaurant_name: Option<String>,
    pub city: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    pub status: Option<LeadStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LeadQuery {
    pub status: Option<LeadStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CreateLeadPayload {
        CreateLeadPayload {
            name: "João Lima".into(),
            email: "joao@bistro.com.br".into(),
            phone: Some("11999998888".into()),
            restaurant_name: Some("Bistrô Lima".into()),
            city: None,
            source: None,
        }
    }

    #[test]
    fn accepts_a_complete_form() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn phone_is_optional_but_checked_when_present() {
        let mut p = payload();
        p.phone = None;
        assert!(p.validate().is_ok());

        p.phone = Some("123".into());
        assert!(p.validate().unwrap_err().field_errors().contains_key("phone"));
    }

    #[test]
    fn status_parses_from_query_string_value() {
        let status: LeadStatus = serde_json::from_str("\"QUALIFIED\"").unwrap();
        assert_eq!(status, LeadStatus::Qualified);
    }
}
