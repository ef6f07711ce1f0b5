// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::common::error::AppError;

// O nome do nosso cabeçalho HTTP customizado
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

// Tenant já validado pelo `tenant_guard`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TenantContext(pub Uuid);

impl TenantContext {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let value = headers
            .get(TENANT_ID_HEADER)
            .ok_or_else(|| AppError::InvalidTenantHeader("ausente".into()))?;

        let value_str = value
            .to_str()
            .map_err(|_| AppError::InvalidTenantHeader("caracteres inválidos".into()))?;

        Uuid::parse_str(value_str.trim())
            .map(TenantContext)
            .map_err(|_| AppError::InvalidTenantHeader(value_str.to_string()))
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<TenantContext>() {
            Some(tenant) => Ok(*tenant),
            None => TenantContext::from_headers(&parts.headers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_uuid_header() {
        let id = Uuid::new_v4();
        assert_eq!(TenantContext::from_headers(&headers(&id.to_string())).unwrap(), TenantContext(id));
    }

    #[test]
    fn rejects_missing_header() {
        let err = TenantContext::from_headers(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AppError::InvalidTenantHeader(_)));
    }

    #[test]
    fn rejects_non_uuid_header() {
        let err = TenantContext::from_headers(&headers("loja-1")).unwrap_err();
        assert!(matches!(err, AppError::InvalidTenantHeader(ref v) if v == "loja-1"));
    }
}
