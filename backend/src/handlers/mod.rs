//! HTTP request handlers

pub mod auth;
pub mod category;
pub mod health;
pub mod import;
pub mod product;
pub mod reporting;
pub mod stock;
pub mod supplier;

pub use auth::*;
pub use category::*;
pub use health::*;
pub use import::*;
pub use product::*;
pub use reporting::*;
pub use stock::*;
pub use supplier::*;
