//! Menu item creation and the two menu listings.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use forkful_shared::access::can_manage_catalog;
use forkful_shared::catalog::{group_by_category, validate_menu_item, MenuItemInput};
use forkful_store::{MenuItem, Ratings};

use super::{parse_id, ApiJson, AppState};
use crate::credential::AuthUser;
use crate::error::ServerError;

#[derive(Debug, Serialize)]
pub struct Created {
    pub success: bool,
    pub data: MenuItem,
}

#[derive(Debug, Serialize)]
pub struct RestaurantRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerMenu {
    pub success: bool,
    pub restaurant: RestaurantRef,
    pub menu_items: BTreeMap<String, Vec<MenuItem>>,
}

struct Upload {
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

fn form_error(e: impl std::fmt::Display) -> ServerError {
    ServerError::validation("body", format!("Malformed form data: {e}"))
}

async fn read_form(mut multipart: Multipart) -> Result<(MenuItemInput, Option<Upload>), ServerError> {
    let mut input = MenuItemInput::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(form_error)?;
            if !file_name.is_empty() || !data.is_empty() {
                upload = Some(Upload {
                    file_name,
                    content_type,
                    data,
                });
            }
            continue;
        }

        let value = field.text().await.map_err(form_error)?;
        match name.as_str() {
            "name" => input.name = Some(value),
            "description" => input.description = Some(value),
            "price" => input.price = Some(value),
            "category" => input.category = Some(value),
            "restaurantId" => input.restaurant_id = Some(value),
            _ => {}
        }
    }

    Ok((input, upload))
}

/// Accepts `multipart/form-data` (with an optional `image` file) or JSON.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    req: Request,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    if !can_manage_catalog(&caller) {
        return Err(ServerError::Forbidden(
            "Only restaurant owners can create menu items".to_string(),
        ));
    }

    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let (input, upload) = if is_multipart {
        let multipart = Multipart::from_request(req, &state)
            .await
            .map_err(|e| form_error(e.body_text()))?;
        read_form(multipart).await?
    } else {
        let ApiJson(input) = ApiJson::<MenuItemInput>::from_request(req, &state).await?;
        (input, None)
    };

    let draft = validate_menu_item(&input)?;

    // Ownership is settled before anything is written, image included.
    let owned = state
        .db
        .lock()
        .await
        .find_owned_restaurant(draft.restaurant_id, caller.user_id)?;
    if owned.is_none() {
        return Err(ServerError::Forbidden(
            "Not authorized to add items to this restaurant's menu".to_string(),
        ));
    }

    let stored = match upload {
        Some(upload) => Some(
            state
                .images
                .store_image(
                    &upload.file_name,
                    upload.content_type.as_deref(),
                    &upload.data,
                )
                .await?,
        ),
        None => None,
    };

    let now = Utc::now();
    let item = MenuItem {
        id: Uuid::new_v4(),
        name: draft.name,
        description: Some(draft.description),
        price: draft.price,
        image: stored.as_ref().map(|s| s.path.clone()),
        category: Some(draft.category),
        is_available: true,
        ratings: Ratings::default(),
        restaurant_id: draft.restaurant_id,
        created_at: now,
        updated_at: now,
    };
    let created = state.db.lock().await.create_menu_item(&item);
    if let Err(e) = created {
        if let Some(stored) = &stored {
            state.images.discard(stored).await;
        }
        return Err(e.into());
    }

    info!(
        menu_item_id = %item.id,
        restaurant_id = %item.restaurant_id,
        price = %item.price,
        "Menu item created"
    );
    Ok((
        StatusCode::CREATED,
        Json(Created {
            success: true,
            data: item,
        }),
    ))
}

/// Public flat listing, newest first.
pub async fn list_for_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> Result<Json<Vec<MenuItem>>, ServerError> {
    let restaurant_id = parse_id(&restaurant_id, "restaurant")?;
    Ok(Json(
        state
            .db
            .lock()
            .await
            .list_menu_items_for_restaurant(restaurant_id)?,
    ))
}

/// Owner dashboard: the menu grouped by category.
pub async fn owner_menu(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(restaurant_id): Path<String>,
) -> Result<Json<OwnerMenu>, ServerError> {
    let restaurant_id = parse_id(&restaurant_id, "restaurant")?;

    let db = state.db.lock().await;
    let restaurant = db
        .find_owned_restaurant(restaurant_id, caller.user_id)?
        .filter(|_| caller.is_owner())
        .ok_or_else(|| {
            ServerError::Forbidden("Not authorized to view this restaurant's menu".to_string())
        })?;
    let items = db.list_menu_items_for_restaurant(restaurant.id)?;
    drop(db);

    Ok(Json(OwnerMenu {
        success: true,
        restaurant: RestaurantRef {
            id: restaurant.id,
            name: restaurant.name,
        },
        menu_items: group_by_category(items, |item| item.category),
    }))
}
