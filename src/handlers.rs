pub mod auth;
pub mod catalog;
pub mod documents;
pub mod internal_roles;
pub mod internal_users;
pub mod inventory;
pub mod leads;
pub mod tenancy;
