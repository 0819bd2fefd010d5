//! v001 -- Initial schema creation.
//!
//! Creates the catalog tables: `users`, `restaurants` and `menu_items`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,        -- trimmed, lower-cased
    password_hash TEXT NOT NULL,               -- argon2 PHC string
    role          TEXT NOT NULL,               -- customer | owner | admin
    restaurant_id TEXT,                        -- owner's primary restaurant (no FK: created in the same tx)
    created_at    TEXT NOT NULL                -- RFC-3339
);

-- ----------------------------------------------------------------
-- Restaurants
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS restaurants (
    id          TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    name        TEXT NOT NULL,
    description TEXT,
    address     TEXT,
    phone       TEXT,
    owner_id    TEXT NOT NULL,                 -- FK -> users(id)
    created_at  TEXT NOT NULL,

    FOREIGN KEY (owner_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_restaurants_owner ON restaurants(owner_id);

-- ----------------------------------------------------------------
-- Menu items
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS menu_items (
    id             TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    name           TEXT NOT NULL,
    description    TEXT,
    price_cents    INTEGER NOT NULL CHECK (price_cents >= 0),
    image          TEXT,                       -- relative upload path
    category       TEXT,                       -- NULL reads as "Uncategorized"
    is_available   INTEGER NOT NULL DEFAULT 1, -- boolean 0/1
    average_rating REAL NOT NULL DEFAULT 0 CHECK (average_rating BETWEEN 0 AND 5),
    review_count   INTEGER NOT NULL DEFAULT 0,
    restaurant_id  TEXT NOT NULL,              -- FK -> restaurants(id)
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,

    FOREIGN KEY (restaurant_id) REFERENCES restaurants(id)
);

CREATE INDEX IF NOT EXISTS idx_menu_items_restaurant_ts
    ON menu_items(restaurant_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
