// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::i18n::Locale;

// Erros de domínio. A mensagem do `#[error]` vai para o log;
// a mensagem para o cliente sai de `to_api_error`, já traduzida.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Cabeçalho x-tenant-id inválido: {0}")]
    InvalidTenantHeader(String),

    #[error("Usuário sem acesso ao tenant {0}")]
    TenantAccessDenied(Uuid),

    #[error("Local não encontrado")]
    LocationNotFound,

    #[error("Família não encontrada")]
    FamilyNotFound,

    #[error("Subfamília não encontrada")]
    SubfamilyNotFound,

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Variação não encontrada")]
    VariationNotFound,

    #[error("Lista de produtos não encontrada")]
    ProductListNotFound,

    #[error("Registro duplicado: {0}")]
    UniqueConstraintViolation(String),

    // --- Inventário ---
    #[error("Sessão de inventário não encontrada")]
    SessionNotFound,

    #[error("Sessão de inventário já está fechada")]
    SessionAlreadyClosed,

    #[error("Filtros da sessão inválidos: {0}")]
    InvalidSessionFilters(String),

    #[error("Item de inventário não encontrado")]
    ItemNotFound,

    // --- Ferramentas internas ---
    #[error("Acesso restrito à equipe interna")]
    InternalAccessDenied,

    #[error("Permissão '{0}' ausente")]
    MissingPermission(&'static str),

    #[error("Papel não encontrado")]
    RoleNotFound,

    #[error("Papel '{0}' já existe")]
    RoleNameAlreadyExists(String),

    #[error("Papel atribuído a usuários")]
    RoleAssignedToUsers,

    #[error("Permissões desconhecidas: {0:?}")]
    UnknownPermissions(Vec<Uuid>),

    #[error("Usuário interno não encontrado")]
    InternalUserNotFound,

    #[error("Usuário já é interno")]
    InternalUserAlreadyExists,

    #[error("Lead não encontrado")]
    LeadNotFound,

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro que de fato vira resposta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidTenantHeader(_)
            | AppError::InvalidSessionFilters(_)
            | AppError::UnknownPermissions(_) => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,

            AppError::TenantAccessDenied(_)
            | AppError::InternalAccessDenied
            | AppError::MissingPermission(_) => StatusCode::FORBIDDEN,

            AppError::UserNotFound
            | AppError::LocationNotFound
            | AppError::FamilyNotFound
            | AppError::SubfamilyNotFound
            | AppError::ProductNotFound
            | AppError::VariationNotFound
            | AppError::ProductListNotFound
            | AppError::SessionNotFound
            | AppError::ItemNotFound
            | AppError::RoleNotFound
            | AppError::InternalUserNotFound
            | AppError::LeadNotFound => StatusCode::NOT_FOUND,

            AppError::EmailAlreadyExists
            | AppError::UniqueConstraintViolation(_)
            | AppError::SessionAlreadyClosed
            | AppError::RoleNameAlreadyExists(_)
            | AppError::RoleAssignedToUsers
            | AppError::InternalUserAlreadyExists => StatusCode::CONFLICT,

            AppError::FontNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // (pt, en)
    fn messages(&self) -> (String, String) {
        let pair = |pt: &str, en: &str| (pt.to_string(), en.to_string());
        match self {
            AppError::ValidationError(_) => pair("Um ou mais campos são inválidos.", "One or more fields are invalid."),
            AppError::EmailAlreadyExists => pair("Este e-mail já está em uso.", "This e-mail is already in use."),
            AppError::InvalidCredentials => pair("E-mail ou senha inválidos.", "Invalid e-mail or password."),
            AppError::InvalidToken => pair(
                "Token de autenticação inválido ou ausente.",
                "Missing or invalid authentication token.",
            ),
            AppError::UserNotFound => pair("Usuário não encontrado.", "User not found."),
            AppError::InvalidTenantHeader(reason) => (
                format!("Cabeçalho x-tenant-id inválido: {}", reason),
                format!("Invalid x-tenant-id header: {}", reason),
            ),
            AppError::TenantAccessDenied(_) => pair("Você não tem acesso a esta loja.", "You do not have access to this tenant."),
            AppError::LocationNotFound => pair("Local não encontrado.", "Location not found."),
            AppError::FamilyNotFound => pair("Família não encontrada.", "Family not found."),
            AppError::SubfamilyNotFound => pair("Subfamília não encontrada.", "Subfamily not found."),
            AppError::ProductNotFound => pair("Produto não encontrado.", "Product not found."),
            AppError::VariationNotFound => pair("Variação não encontrada para este produto.", "Variation not found for this product."),
            AppError::ProductListNotFound => pair("Lista de produtos não encontrada.", "Product list not found."),
            AppError::UniqueConstraintViolation(what) => (
                format!("Registro duplicado: {}", what),
                format!("Duplicate record: {}", what),
            ),
            AppError::SessionNotFound => pair("Sessão de inventário não encontrada.", "Inventory session not found."),
            AppError::SessionAlreadyClosed => pair(
                "Esta sessão de inventário já foi fechada.",
                "This inventory session is already closed.",
            ),
            AppError::InvalidSessionFilters(reason) => (
                format!("Filtros inválidos: {}", reason),
                format!("Invalid filters: {}", reason),
            ),
            AppError::ItemNotFound => pair("Item de inventário não encontrado.", "Inventory item not found."),
            AppError::InternalAccessDenied => pair("Acesso restrito à equipe interna.", "Restricted to internal staff."),
            AppError::MissingPermission(slug) => (
                format!("Você precisa da permissão '{}' para realizar esta ação.", slug),
                format!("You need the '{}' permission to perform this action.", slug),
            ),
            AppError::RoleNotFound => pair("Papel não encontrado.", "Role not found."),
            AppError::RoleNameAlreadyExists(name) => (
                format!("Já existe um papel chamado '{}'.", name),
                format!("A role named '{}' already exists.", name),
            ),
            AppError::RoleAssignedToUsers => pair(
                "Não é possível excluir um papel atribuído a usuários.",
                "Cannot delete role assigned to users.",
            ),
            AppError::UnknownPermissions(_) => pair("Uma ou mais permissões não existem.", "One or more permissions do not exist."),
            AppError::InternalUserNotFound => pair("Usuário interno não encontrado.", "Internal user not found."),
            AppError::InternalUserAlreadyExists => pair("Este usuário já faz parte da equipe interna.", "This user is already internal staff."),
            AppError::LeadNotFound => pair("Lead não encontrado.", "Lead not found."),
            AppError::FontNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => pair("Ocorreu um erro inesperado.", "An unexpected error occurred."),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => Value::String(m.to_string()),
                            None => Value::String(e.code.to_string()),
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            AppError::UnknownPermissions(ids) => Some(json!({ "permissions": ids })),
            _ => None,
        }
    }

    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let (pt, en) = self.messages();
        ApiError {
            status,
            error: if locale.is_pt() { pt } else { en },
            details: self.details(),
        }
    }

    /// Converte violações de unicidade do banco no erro de domínio dado.
    pub fn on_unique_violation(err: sqlx::Error, mapped: impl FnOnce() -> AppError) -> AppError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return mapped();
            }
        }
        err.into()
    }
}

// Handlers sem Locale (ex.: auth) devolvem AppError diretamente
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "O nome é obrigatório."))]
        name: String,
    }

    #[test]
    fn maps_domain_errors_to_status_codes() {
        assert_eq!(AppError::SessionAlreadyClosed.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::RoleAssignedToUsers.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::RoleNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::ProductNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::VariationNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::SubfamilyNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::MissingPermission("internal:roles").status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::InvalidSessionFilters("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn message_follows_locale() {
        let pt = AppError::RoleAssignedToUsers.to_api_error(&Locale("pt".into()));
        let en = AppError::RoleAssignedToUsers.to_api_error(&Locale::default());

        assert_eq!(pt.error, "Não é possível excluir um papel atribuído a usuários.");
        assert_eq!(en.error, "Cannot delete role assigned to users.");
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let errors = Payload { name: String::new() }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&Locale::default());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.details.unwrap()["name"][0], "O nome é obrigatório.");
    }

    #[test]
    fn server_errors_hide_internal_message() {
        let api = AppError::FontNotFound("./fonts".into()).to_api_error(&Locale::default());
        assert_eq!(api.error, "An unexpected error occurred.");
        assert!(api.details.is_none());
    }
}
