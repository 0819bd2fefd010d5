//! Order placement, lookup, listings, status moves and cancellation.
//!
//! Prices always come from the stored menu; anything price-like in the
//! request body besides add-on prices is ignored.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use forkful_shared::access::{can_cancel_order, can_update_status, can_view_order, Credential};
use forkful_shared::order::{price_lines, validate_order_input, OrderInput, PaymentStatus};
use forkful_shared::status::OrderStatus;
use forkful_shared::validation::non_blank;
use forkful_shared::ValidationErrors;
use forkful_store::{Database, Order, Restaurant, StoreError};

use super::{parse_id, ApiJson, AppState};
use crate::credential::AuthUser;
use crate::error::ServerError;

/// An order as returned to clients, with its derived item count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub total_items: u32,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let total_items = order.total_items();
        Self { order, total_items }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderEnvelope {
    pub order: OrderView,
}

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub success: bool,
    pub count: usize,
    pub orders: Vec<OrderView>,
}

impl From<Vec<Order>> for OrderList {
    fn from(orders: Vec<Order>) -> Self {
        Self {
            success: true,
            count: orders.len(),
            orders: orders.into_iter().map(OrderView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Cancelled {
    pub message: &'static str,
    pub order: OrderView,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

/// Load an order together with its restaurant, mapping absence to 404s.
fn load_order(db: &Database, id: Uuid) -> Result<(Order, Restaurant), ServerError> {
    let order = match db.get_order(id) {
        Ok(order) => order,
        Err(StoreError::NotFound) => return Err(ServerError::NotFound("Order not found".to_string())),
        Err(e) => return Err(e.into()),
    };
    let restaurant = db.get_restaurant(order.restaurant_id)?;
    Ok((order, restaurant))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(input): ApiJson<OrderInput>,
) -> Result<(StatusCode, Json<OrderView>), ServerError> {
    let draft = validate_order_input(&input)?;

    let db = state.db.lock().await;
    match db.get_restaurant(draft.restaurant_id) {
        Ok(_) => {}
        Err(StoreError::NotFound) => {
            return Err(ServerError::NotFound("Restaurant not found".to_string()))
        }
        Err(e) => return Err(e.into()),
    }

    let ids: Vec<Uuid> = draft.lines.iter().map(|l| l.menu_item_id).collect();
    let menu = db.priced_menu_items(&ids)?;
    let lines = price_lines(draft.restaurant_id, &draft.lines, &menu)?;

    let mut order = Order::place(draft, Some(caller.user_id), lines, Utc::now())?;
    db.insert_order(&mut order)?;
    drop(db);

    info!(
        order_id = %order.id,
        restaurant_id = %order.restaurant_id,
        customer_id = %caller.user_id,
        total = %order.total_amount,
        "Order placed"
    );
    Ok((StatusCode::CREATED, Json(order.into())))
}

pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderEnvelope>, ServerError> {
    let id = parse_id(&id, "order")?;
    let (order, restaurant) = load_order(&*state.db.lock().await, id)?;

    if !can_view_order(&caller, &order, restaurant.owner_id) {
        return Err(ServerError::Forbidden(
            "Not authorized to view this order".to_string(),
        ));
    }
    Ok(Json(OrderEnvelope {
        order: order.into(),
    }))
}

/// Orders for the restaurant carried in the caller's credential.
pub async fn list_for_restaurant(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<OrderList>, ServerError> {
    let restaurant_id = restaurant_scope(&caller)?;
    let orders = state
        .db
        .lock()
        .await
        .list_orders_for_restaurant(restaurant_id)?;
    Ok(Json(orders.into()))
}

fn restaurant_scope(caller: &Credential) -> Result<Uuid, ServerError> {
    match caller.restaurant_id {
        Some(id) if caller.is_owner() => Ok(id),
        _ => Err(ServerError::Forbidden(
            "Restaurant authentication required".to_string(),
        )),
    }
}

pub async fn list_for_customer(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<OrderList>, ServerError> {
    let orders = state
        .db
        .lock()
        .await
        .list_orders_for_customer(caller.user_id)?;
    Ok(Json(orders.into()))
}

pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<OrderView>, ServerError> {
    let id = parse_id(&id, "order")?;

    let mut errors = ValidationErrors::new();
    let target = match non_blank(update.status.as_deref()) {
        None => None,
        Some(raw) => match raw.parse::<OrderStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                errors.push("status", format!("{raw} is not a valid status"));
                None
            }
        },
    };
    let payment = match non_blank(update.payment_status.as_deref()) {
        None => None,
        Some(raw) => match raw.parse::<PaymentStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                errors.push("paymentStatus", format!("{raw} is not a valid payment status"));
                None
            }
        },
    };
    if errors.is_empty() && target.is_none() && payment.is_none() {
        errors.push("status", "Status is required");
    }
    errors.into_result(())?;

    let db = state.db.lock().await;
    let (mut order, restaurant) = load_order(&db, id)?;
    if !can_update_status(&caller, restaurant.owner_id) {
        return Err(ServerError::Forbidden(
            "Only the restaurant owner can update this order".to_string(),
        ));
    }

    let previous = order.status;
    if let Some(target) = target {
        order.apply_status(target)?;
    }
    if let Some(payment) = payment {
        order.payment_status = payment;
    }
    db.update_order(&mut order)?;
    drop(db);

    info!(
        order_id = %order.id,
        from = %previous,
        to = %order.status,
        payment_status = %order.payment_status,
        "Order status updated"
    );
    Ok(Json(order.into()))
}

/// Soft delete: the order stays, its status becomes `Cancelled`.
pub async fn cancel(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Cancelled>, ServerError> {
    let id = parse_id(&id, "order")?;

    let db = state.db.lock().await;
    let (mut order, restaurant) = load_order(&db, id)?;
    if !can_cancel_order(&caller, &order, restaurant.owner_id) {
        return Err(ServerError::Forbidden(
            "Not authorized to cancel this order".to_string(),
        ));
    }
    order.cancel()?;
    db.update_order(&mut order)?;
    drop(db);

    info!(order_id = %order.id, by = %caller.user_id, "Order cancelled");
    Ok(Json(Cancelled {
        message: "Order cancelled successfully",
        order: order.into(),
    }))
}
