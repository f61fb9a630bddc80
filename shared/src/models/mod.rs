//! Domain models for the inventory platform

mod catalog;
mod product;
mod user;

pub use catalog::*;
pub use product::*;
pub use user::*;
