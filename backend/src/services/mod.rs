//! Business logic services for the InventoryPro stock ledger

pub mod auth;
pub mod category;
pub mod import;
pub mod product;
pub mod reporting;
pub mod stock;
pub mod supplier;

pub use auth::AuthService;
pub use category::CategoryService;
pub use import::ImportService;
pub use product::ProductService;
pub use reporting::ReportingService;
pub use stock::StockService;
pub use supplier::SupplierService;
