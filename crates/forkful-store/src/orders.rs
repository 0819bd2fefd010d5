//! Persistence for the [`Order`] aggregate.
//!
//! An order and its lines are always written together inside one transaction.
//! Before any write the total is recomputed from the lines and the model
//! rules are checked, so a stored order always satisfies
//! `total_amount == sum(line subtotals)`.

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use forkful_shared::money::Money;

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::{AddOn, Order, OrderLine};
use crate::row::{enum_at, opt_enum_at, opt_uuid_at, ts, ts_at, uuid_at};

const ORDER_COLUMNS: &str = "id, customer_id, restaurant_id, total_cents, status, payment_method, \
     payment_status, special_instructions, delivery_address, contact_number, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Recompute, validate and store a new order with its lines.
    pub fn insert_order(&self, order: &mut Order) -> Result<()> {
        prepare(order)?;

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO orders (id, customer_id, restaurant_id, total_cents, status,
                                 payment_method, payment_status, special_instructions,
                                 delivery_address, contact_number, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                order.id.to_string(),
                order.customer_id.map(|c| c.to_string()),
                order.restaurant_id.to_string(),
                order.total_amount.cents(),
                order.status.as_str(),
                order.payment_method.map(|m| m.as_str()),
                order.payment_status.as_str(),
                order.special_instructions,
                order.delivery_address,
                order.contact_number,
                ts(&order.created_at),
                ts(&order.updated_at),
            ],
        )?;
        insert_lines(&tx, order.id, &order.items)?;
        tx.commit()?;

        tracing::debug!(order = %order.id, total = %order.total_amount, "order stored");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_order(&self, id: Uuid) -> Result<Order> {
        let mut order = self
            .conn()
            .query_row(
                &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
                params![id.to_string()],
                row_to_order,
            )
            .map_err(not_found)?;
        order.items = load_lines(self.conn(), order.id)?;
        Ok(order)
    }

    /// Orders placed with a restaurant, newest first.
    pub fn list_orders_for_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Order>> {
        self.list_orders_where("restaurant_id", restaurant_id)
    }

    /// Orders placed by a customer, newest first.
    pub fn list_orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<Order>> {
        self.list_orders_where("customer_id", customer_id)
    }

    fn list_orders_where(&self, column: &'static str, value: Uuid) -> Result<Vec<Order>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE {column} = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map(params![value.to_string()], row_to_order)?;
        let mut orders = Vec::new();
        for row in rows {
            let mut order = row?;
            order.items = load_lines(self.conn(), order.id)?;
            orders.push(order);
        }
        Ok(orders)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Recompute, validate and overwrite an existing order, replacing its
    /// lines. `updated_at` is bumped to now.
    pub fn update_order(&self, order: &mut Order) -> Result<()> {
        prepare(order)?;
        order.updated_at = Utc::now();

        let tx = self.conn().unchecked_transaction()?;
        let affected = tx.execute(
            "UPDATE orders
             SET customer_id = ?2, restaurant_id = ?3, total_cents = ?4, status = ?5,
                 payment_method = ?6, payment_status = ?7, special_instructions = ?8,
                 delivery_address = ?9, contact_number = ?10, updated_at = ?11
             WHERE id = ?1",
            params![
                order.id.to_string(),
                order.customer_id.map(|c| c.to_string()),
                order.restaurant_id.to_string(),
                order.total_amount.cents(),
                order.status.as_str(),
                order.payment_method.map(|m| m.as_str()),
                order.payment_status.as_str(),
                order.special_instructions,
                order.delivery_address,
                order.contact_number,
                ts(&order.updated_at),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        tx.execute(
            "DELETE FROM order_items WHERE order_id = ?1",
            params![order.id.to_string()],
        )?;
        insert_lines(&tx, order.id, &order.items)?;
        tx.commit()?;

        tracing::debug!(order = %order.id, status = %order.status, "order updated");
        Ok(())
    }
}

/// Derive the total and enforce the model rules.
fn prepare(order: &mut Order) -> Result<()> {
    order.recompute_total().map_err(StoreError::Invalid)?;
    order.validate().map_err(StoreError::Invalid)
}

fn insert_lines(conn: &Connection, order_id: Uuid, lines: &[OrderLine]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO order_items (order_id, position, menu_item_id, name,
                                  unit_price_cents, quantity, add_ons)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for (position, line) in lines.iter().enumerate() {
        stmt.execute(params![
            order_id.to_string(),
            position as i64,
            line.menu_item_id.to_string(),
            line.name,
            line.unit_price.cents(),
            line.quantity,
            serde_json::to_string(&line.add_ons)?,
        ])?;
    }
    Ok(())
}

fn load_lines(conn: &Connection, order_id: Uuid) -> Result<Vec<OrderLine>> {
    let mut stmt = conn.prepare(
        "SELECT menu_item_id, name, unit_price_cents, quantity, add_ons
         FROM order_items
         WHERE order_id = ?1
         ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![order_id.to_string()], |row| {
        Ok((
            uuid_at(row, 0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, u32>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut lines = Vec::new();
    for row in rows {
        let (menu_item_id, name, unit_cents, quantity, add_ons_json) = row?;
        let add_ons: Vec<AddOn> = serde_json::from_str(&add_ons_json)?;
        lines.push(OrderLine {
            menu_item_id,
            name,
            unit_price: Money::from_cents(unit_cents),
            quantity,
            add_ons,
        });
    }
    Ok(lines)
}

/// Lines are loaded separately.
fn row_to_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: uuid_at(row, 0)?,
        customer_id: opt_uuid_at(row, 1)?,
        restaurant_id: uuid_at(row, 2)?,
        items: Vec::new(),
        total_amount: Money::from_cents(row.get(3)?),
        status: enum_at(row, 4)?,
        payment_method: opt_enum_at(row, 5)?,
        payment_status: enum_at(row, 6)?,
        special_instructions: row.get(7)?,
        delivery_address: row.get(8)?,
        contact_number: row.get(9)?,
        created_at: ts_at(row, 10)?,
        updated_at: ts_at(row, 11)?,
    })
}
