//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` so it can be handed directly to the HTTP
//! layer. Password hashes are never serialized. Orders are defined in
//! `forkful_shared::order` because their pricing rules live there.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use forkful_shared::catalog::Category;
use forkful_shared::identity::Role;
use forkful_shared::money::Money;
use forkful_shared::order::PricedMenuItem;

pub use forkful_shared::order::{AddOn, Order, OrderLine};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Normalized (trimmed, lower-case).
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// The owner's primary restaurant, carried in their credential.
    pub restaurant_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Restaurant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Menu item
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ratings {
    /// 0.0 to 5.0
    pub average_rating: f64,
    pub review_count: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    /// Relative path under the upload directory.
    pub image: Option<String>,
    pub category: Option<Category>,
    pub is_available: bool,
    pub ratings: Ratings,
    #[serde(rename = "restaurant")]
    pub restaurant_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// The facts order pricing needs from this item.
    pub fn priced(&self) -> PricedMenuItem {
        PricedMenuItem {
            id: self.id,
            restaurant_id: self.restaurant_id,
            name: self.name.clone(),
            price: self.price,
            is_available: self.is_available,
        }
    }
}
