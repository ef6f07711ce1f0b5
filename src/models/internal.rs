// src/models/internal.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// O que sai do banco (tabela internal_roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternalRole {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    // Sempre em maiúsculas
    #[schema(example = "SUPORTE")]
    pub name: String,

    #[schema(example = "Atendimento aos restaurantes")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O que sai do banco (tabela internal_permissions)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternalPermission {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440001")]
    pub id: Uuid,

    #[schema(example = "internal:leads")]
    pub slug: String,

    #[schema(example = "Visualizar e tratar leads")]
    pub description: String,

    #[schema(example = "CRM")]
    pub module: String,
}

// Permissões agrupadas por módulo (tela de edição de papéis)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionModule {
    #[schema(example = "ADMIN")]
    pub module: String,
    pub permissions: Vec<InternalPermission>,
}

// Payload para criar um papel
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, max = 60, message = "O nome deve ter entre 1 e 60 caracteres."))]
    #[schema(example = "Suporte")]
    pub name: String,

    #[schema(example = "Atendimento aos restaurantes")]
    pub description: Option<String>,

    #[serde(default)]
    pub permissions: Vec<Uuid>,
}

// Payload para atualizar um papel. `permissions` ausente = não mexe no vínculo.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePayload {
    pub description: Option<String>,
    pub permissions: Option<Vec<Uuid>>,
}

// Resposta completa (papel + slugs das permissões)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: InternalRole,

    #[schema(example = json!(["internal:leads", "internal:users"]))]
    pub permissions: Vec<String>,
}

// --- Usuários internos (equipe da empresa) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternalUser {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "Maria Souza")]
    pub name: String,
    pub role_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternalUserView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub user: InternalUser,
    pub email: String,
    pub role_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternalUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "maria@empresa.com.br")]
    pub email: String,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    pub role_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInternalUserPayload {
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}
