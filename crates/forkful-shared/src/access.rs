//! Who may do what with catalog entries and orders.
//!
//! These checks are pure: the caller's credential plus the facts about the
//! target (order customer, restaurant owner) are passed in and a yes/no comes
//! back. Handlers translate a "no" into a 403.

use serde::Serialize;
use uuid::Uuid;

use crate::identity::Role;
use crate::order::Order;

/// The identity proven by a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub user_id: Uuid,
    pub role: Role,
    pub restaurant_id: Option<Uuid>,
}

impl Credential {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    pub fn owns(&self, restaurant_owner_id: Uuid) -> bool {
        self.is_owner() && self.user_id == restaurant_owner_id
    }
}

/// Restaurants and menu items are created by owners only.
pub fn can_manage_catalog(caller: &Credential) -> bool {
    caller.is_owner()
}

/// The order's customer, the restaurant's owner, or an admin.
pub fn can_view_order(caller: &Credential, order: &Order, restaurant_owner_id: Uuid) -> bool {
    caller.is_admin()
        || order.customer_id == Some(caller.user_id)
        || caller.owns(restaurant_owner_id)
}

/// Status moves are driven from the restaurant side.
pub fn can_update_status(caller: &Credential, restaurant_owner_id: Uuid) -> bool {
    caller.is_admin() || caller.owns(restaurant_owner_id)
}

/// Either party to the order may cancel it.
pub fn can_cancel_order(caller: &Credential, order: &Order, restaurant_owner_id: Uuid) -> bool {
    can_view_order(caller, order, restaurant_owner_id)
}
