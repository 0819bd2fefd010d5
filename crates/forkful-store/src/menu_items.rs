//! CRUD operations for [`MenuItem`] records and the lookup order pricing uses.

use std::collections::HashMap;

use rusqlite::params;
use uuid::Uuid;

use forkful_shared::money::Money;
use forkful_shared::order::PricedMenuItem;

use crate::database::Database;
use crate::error::Result;
use crate::models::{MenuItem, Ratings};
use crate::row::{opt_enum_at, ts, ts_at, uuid_at};

const MENU_ITEM_COLUMNS: &str = "id, name, description, price_cents, image, category, is_available, \
     average_rating, review_count, restaurant_id, created_at, updated_at";

impl Database {
    pub fn create_menu_item(&self, item: &MenuItem) -> Result<()> {
        self.conn().execute(
            "INSERT INTO menu_items (id, name, description, price_cents, image, category,
                                     is_available, average_rating, review_count,
                                     restaurant_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                item.id.to_string(),
                item.name,
                item.description,
                item.price.cents(),
                item.image,
                item.category.map(|c| c.as_str()),
                item.is_available,
                item.ratings.average_rating,
                item.ratings.review_count,
                item.restaurant_id.to_string(),
                ts(&item.created_at),
                ts(&item.updated_at),
            ],
        )?;
        Ok(())
    }

    /// A restaurant's menu, newest first.
    pub fn list_menu_items_for_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<MenuItem>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items
             WHERE restaurant_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map(params![restaurant_id.to_string()], row_to_menu_item)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Load the pricing facts for every id that exists. Unknown ids are
    /// simply absent from the map.
    pub fn priced_menu_items(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, PricedMenuItem>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE id = ?1"
        ))?;
        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            if found.contains_key(id) {
                continue;
            }
            let mut rows = stmt.query_map(params![id.to_string()], row_to_menu_item)?;
            if let Some(item) = rows.next().transpose()? {
                found.insert(item.id, item.priced());
            }
        }
        Ok(found)
    }
}

fn row_to_menu_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<MenuItem> {
    Ok(MenuItem {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: Money::from_cents(row.get(3)?),
        image: row.get(4)?,
        category: opt_enum_at(row, 5)?,
        is_available: row.get(6)?,
        ratings: Ratings {
            average_rating: row.get(7)?,
            review_count: row.get(8)?,
        },
        restaurant_id: uuid_at(row, 9)?,
        created_at: ts_at(row, 10)?,
        updated_at: ts_at(row, 11)?,
    })
}
