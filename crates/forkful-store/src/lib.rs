//! # forkful-store
//!
//! SQLite persistence for users, restaurants, menu items and orders.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model. Orders are re-priced and validated on every write.

pub mod database;
pub mod menu_items;
pub mod migrations;
pub mod models;
pub mod orders;
pub mod restaurants;
pub mod users;

mod error;
mod row;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
