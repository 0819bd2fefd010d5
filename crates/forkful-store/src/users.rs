//! CRUD operations for [`User`] records, including the atomic owner
//! registration that creates a user and their first restaurant together.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::{Restaurant, User};
use crate::restaurants::insert_restaurant;
use crate::row::{enum_at, opt_uuid_at, ts, ts_at, uuid_at};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, restaurant_id, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a user and, for owners, their first restaurant in a single
    /// transaction. Either both rows land or neither does.
    pub fn register_user(&self, user: &User, restaurant: Option<&Restaurant>) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        insert_user(&tx, user)?;
        if let Some(restaurant) = restaurant {
            insert_restaurant(&tx, restaurant)?;
        }
        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Look up by email. The argument must already be normalized.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }
}

fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, restaurant_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id.to_string(),
            user.name,
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.restaurant_id.map(|r| r.to_string()),
            ts(&user.created_at),
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::Duplicate("email")
        }
        other => StoreError::Sqlite(other),
    })?;
    Ok(())
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: enum_at(row, 4)?,
        restaurant_id: opt_uuid_at(row, 5)?,
        created_at: ts_at(row, 6)?,
    })
}
