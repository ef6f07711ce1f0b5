pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod internal_repo;
pub use internal_repo::InternalRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
