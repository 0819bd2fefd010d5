use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use forkful_shared::access::can_manage_catalog;
use forkful_shared::catalog::{validate_restaurant, RestaurantInput};
use forkful_store::{Restaurant, StoreError};

use super::{parse_id, ApiJson, AppState};
use crate::credential::AuthUser;
use crate::error::ServerError;

#[derive(Debug, Serialize)]
pub struct OwnedRestaurants {
    pub success: bool,
    pub count: usize,
    pub restaurants: Vec<Restaurant>,
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(input): ApiJson<RestaurantInput>,
) -> Result<(StatusCode, Json<Restaurant>), ServerError> {
    if !can_manage_catalog(&caller) {
        return Err(ServerError::Forbidden(
            "Only restaurant owners can create restaurants".to_string(),
        ));
    }
    let draft = validate_restaurant(&input, false)?;

    let restaurant = Restaurant {
        id: Uuid::new_v4(),
        name: draft.name,
        description: draft.description,
        address: draft.address,
        phone: draft.phone,
        owner_id: caller.user_id,
        created_at: Utc::now(),
    };

    // An owner without a primary restaurant adopts this one.
    let primary = state.db.lock().await.create_owned_restaurant(&restaurant)?;

    info!(
        restaurant_id = %restaurant.id,
        owner_id = %caller.user_id,
        primary,
        "Restaurant created"
    );
    Ok((StatusCode::CREATED, Json(restaurant)))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Restaurant>>, ServerError> {
    Ok(Json(state.db.lock().await.list_restaurants()?))
}

pub async fn list_owned(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<OwnedRestaurants>, ServerError> {
    if !caller.is_owner() {
        return Err(ServerError::Forbidden(
            "Only restaurant owners have restaurants".to_string(),
        ));
    }
    let restaurants = state
        .db
        .lock()
        .await
        .list_restaurants_for_owner(caller.user_id)?;
    Ok(Json(OwnedRestaurants {
        success: true,
        count: restaurants.len(),
        restaurants,
    }))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Restaurant>, ServerError> {
    let id = parse_id(&id, "restaurant")?;
    match state.db.lock().await.get_restaurant(id) {
        Ok(restaurant) => Ok(Json(restaurant)),
        Err(StoreError::NotFound) => Err(ServerError::NotFound("Restaurant not found".to_string())),
        Err(e) => Err(e.into()),
    }
}
