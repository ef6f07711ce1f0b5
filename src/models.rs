pub mod auth;
pub mod catalog;
pub mod internal;
pub mod inventory;
pub mod leads;
pub mod tenancy;
