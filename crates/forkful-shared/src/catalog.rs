//! Restaurants and menu items: the fixed category list, input validation,
//! and the category grouping used by the owner dashboard.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_PRICE_CENTS, MIN_MENU_ITEM_NAME_LEN, UNCATEGORIZED};
use crate::money::Money;
use crate::validation::{is_valid_phone, non_blank, ValidationErrors};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Appetizer,
    #[serde(rename = "Main Course")]
    MainCourse,
    Dessert,
    Beverage,
    Snack,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Appetizer,
        Category::MainCourse,
        Category::Dessert,
        Category::Beverage,
        Category::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Appetizer => "Appetizer",
            Category::MainCourse => "Main Course",
            Category::Dessert => "Dessert",
            Category::Beverage => "Beverage",
            Category::Snack => "Snack",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::MainCourse
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or(())
    }
}

// ---------------------------------------------------------------------------
// Restaurant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestaurantInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Restaurant fields ready to be stored; the owner is attached by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantDraft {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Only the name is mandatory for a standalone restaurant. Owner registration
/// passes `require_all` because the bundle must be complete.
pub fn validate_restaurant(
    input: &RestaurantInput,
    require_all: bool,
) -> Result<RestaurantDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = non_blank(input.name.as_deref());
    let description = non_blank(input.description.as_deref());
    let address = non_blank(input.address.as_deref());
    let phone = non_blank(input.phone.as_deref());

    if name.is_none() {
        errors.push("name", "Restaurant name is required");
    }
    if require_all {
        if description.is_none() {
            errors.push("description", "Restaurant description is required");
        }
        if address.is_none() {
            errors.push("address", "Restaurant address is required");
        }
        if phone.is_none() {
            errors.push("phone", "Restaurant phone is required");
        }
    }
    if let Some(p) = &phone {
        if !is_valid_phone(p) {
            errors.push("phone", format!("{p} is not a valid phone number"));
        }
    }

    errors.into_result(RestaurantDraft {
        name: name.unwrap_or_default(),
        description,
        address,
        phone,
    })
}

// ---------------------------------------------------------------------------
// Menu item
// ---------------------------------------------------------------------------

/// Menu item fields as they arrive from a form or JSON body. The price is a
/// string because multipart forms carry everything as text; JSON bodies may
/// send it as a number.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: Option<String>,
    pub category: Option<String>,
    pub restaurant_id: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(de)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemDraft {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: Category,
    pub restaurant_id: Uuid,
}

pub fn validate_menu_item(input: &MenuItemInput) -> Result<MenuItemDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = non_blank(input.name.as_deref());
    match &name {
        None => errors.push("name", "Menu item name is required"),
        Some(n) if n.chars().count() < MIN_MENU_ITEM_NAME_LEN => errors.push(
            "name",
            format!("Menu item name must be at least {MIN_MENU_ITEM_NAME_LEN} characters long"),
        ),
        _ => {}
    }

    let description = non_blank(input.description.as_deref());
    if description.is_none() {
        errors.push("description", "Description is required");
    }

    let price = match non_blank(input.price.as_deref()) {
        None => {
            errors.push("price", "Price is required");
            None
        }
        Some(raw) => match Money::parse(&raw) {
            Some(p) if p.cents() > MAX_PRICE_CENTS => {
                errors.push("price", "Price is too large");
                None
            }
            Some(p) if p.is_positive() => Some(p),
            _ => {
                errors.push("price", "Price must be a positive number");
                None
            }
        },
    };

    let category = match non_blank(input.category.as_deref()) {
        None => Some(Category::default()),
        Some(raw) => match raw.parse::<Category>() {
            Ok(c) => Some(c),
            Err(()) => {
                errors.push(
                    "category",
                    format!("{raw} is not a valid category"),
                );
                None
            }
        },
    };

    let restaurant_id = match non_blank(input.restaurant_id.as_deref()) {
        None => {
            errors.push("restaurantId", "Restaurant id is required");
            None
        }
        Some(raw) => match Uuid::parse_str(&raw) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push("restaurantId", "Invalid restaurant id");
                None
            }
        },
    };

    match (name, description, price, category, restaurant_id) {
        (Some(name), Some(description), Some(price), Some(category), Some(restaurant_id))
            if errors.is_empty() =>
        {
            Ok(MenuItemDraft {
                name,
                description,
                price,
                category,
                restaurant_id,
            })
        }
        _ => Err(errors),
    }
}

/// Group items by category name, preserving the incoming order inside each
/// bucket. Items without a category land in [`UNCATEGORIZED`].
pub fn group_by_category<T>(
    items: impl IntoIterator<Item = T>,
    category_of: impl Fn(&T) -> Option<Category>,
) -> BTreeMap<String, Vec<T>> {
    let mut grouped: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        let key = category_of(&item)
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        grouped.entry(key).or_default().push(item);
    }
    grouped
}
