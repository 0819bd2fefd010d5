use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id                   TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    customer_id          TEXT,                       -- nullable FK -> users(id)
    restaurant_id        TEXT NOT NULL,              -- FK -> restaurants(id)
    total_cents          INTEGER NOT NULL CHECK (total_cents >= 0),
    status               TEXT NOT NULL,
    payment_method       TEXT,
    payment_status       TEXT NOT NULL,
    special_instructions TEXT,
    delivery_address     TEXT,
    contact_number       TEXT,
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,

    FOREIGN KEY (customer_id) REFERENCES users(id),
    FOREIGN KEY (restaurant_id) REFERENCES restaurants(id)
);

CREATE INDEX IF NOT EXISTS idx_orders_restaurant_ts ON orders(restaurant_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_orders_customer_ts ON orders(customer_id, created_at DESC);

CREATE TABLE IF NOT EXISTS order_items (
    order_id         TEXT NOT NULL,              -- FK -> orders(id)
    position         INTEGER NOT NULL,
    menu_item_id     TEXT NOT NULL,              -- FK -> menu_items(id)
    name             TEXT NOT NULL,
    unit_price_cents INTEGER NOT NULL,
    quantity         INTEGER NOT NULL CHECK (quantity >= 1),
    add_ons          TEXT NOT NULL DEFAULT '[]', -- JSON [{name, price}]

    PRIMARY KEY (order_id, position),
    FOREIGN KEY (order_id) REFERENCES orders(id) ON DELETE CASCADE,
    FOREIGN KEY (menu_item_id) REFERENCES menu_items(id)
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
