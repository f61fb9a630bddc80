//! Category and supplier references

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Compact `{id, name}` reference to a category or supplier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: Uuid,
    pub name: String,
}

impl EntityRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Supplier reference including the contact phone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRef {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}
