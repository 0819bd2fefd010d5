//! CRUD operations for [`Restaurant`] records.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::Restaurant;
use crate::row::{ts, ts_at, uuid_at};

const RESTAURANT_COLUMNS: &str = "id, name, description, address, phone, owner_id, created_at";

impl Database {
    /// Store a restaurant and, in the same transaction, make it the owner's
    /// primary restaurant if they have none yet. Returns whether it was
    /// adopted as primary.
    pub fn create_owned_restaurant(&self, restaurant: &Restaurant) -> Result<bool> {
        let tx = self.conn().unchecked_transaction()?;
        insert_restaurant(&tx, restaurant)?;
        let adopted = tx.execute(
            "UPDATE users SET restaurant_id = ?1 WHERE id = ?2 AND restaurant_id IS NULL",
            params![restaurant.id.to_string(), restaurant.owner_id.to_string()],
        )?;
        tx.commit()?;

        tracing::debug!(
            restaurant = %restaurant.id,
            owner = %restaurant.owner_id,
            primary = adopted == 1,
            "restaurant stored"
        );
        Ok(adopted == 1)
    }

    pub fn get_restaurant(&self, id: Uuid) -> Result<Restaurant> {
        self.conn()
            .query_row(
                &format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = ?1"),
                params![id.to_string()],
                row_to_restaurant,
            )
            .map_err(not_found)
    }

    /// The restaurant with this id, but only if `owner_id` owns it.
    pub fn find_owned_restaurant(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Restaurant>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = ?1 AND owner_id = ?2"
                ),
                params![id.to_string(), owner_id.to_string()],
                row_to_restaurant,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    /// Every restaurant, oldest first.
    pub fn list_restaurants(&self) -> Result<Vec<Restaurant>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map([], row_to_restaurant)?;
        let mut restaurants = Vec::new();
        for row in rows {
            restaurants.push(row?);
        }
        Ok(restaurants)
    }

    pub fn list_restaurants_for_owner(&self, owner_id: Uuid) -> Result<Vec<Restaurant>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants
             WHERE owner_id = ?1
             ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map(params![owner_id.to_string()], row_to_restaurant)?;
        let mut restaurants = Vec::new();
        for row in rows {
            restaurants.push(row?);
        }
        Ok(restaurants)
    }
}

pub(crate) fn insert_restaurant(conn: &Connection, restaurant: &Restaurant) -> Result<()> {
    conn.execute(
        "INSERT INTO restaurants (id, name, description, address, phone, owner_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            restaurant.id.to_string(),
            restaurant.name,
            restaurant.description,
            restaurant.address,
            restaurant.phone,
            restaurant.owner_id.to_string(),
            ts(&restaurant.created_at),
        ],
    )?;
    Ok(())
}

fn row_to_restaurant(row: &rusqlite::Row<'_>) -> rusqlite::Result<Restaurant> {
    Ok(Restaurant {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        address: row.get(3)?,
        phone: row.get(4)?,
        owner_id: uuid_at(row, 5)?,
        created_at: ts_at(row, 6)?,
    })
}
