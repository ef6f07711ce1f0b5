pub mod auth;
pub mod catalog_service;
pub mod document_service;
pub mod internal_roles_service;
pub mod internal_users_service;
pub mod inventory_service;
pub mod lead_service;
pub mod tenancy_service;
