//! # forkful-shared
//!
//! Domain types and pure business rules for the Forkful ordering service.
//!
//! Nothing in this crate performs I/O: the store and server crates feed it
//! plain values and persist or transmit whatever it hands back.

pub mod access;
pub mod addons;
pub mod catalog;
pub mod constants;
pub mod error;
pub mod identity;
pub mod money;
pub mod order;
pub mod password;
pub mod status;
pub mod token;
pub mod validation;

pub use error::{KeyError, PasswordError, TokenError, TransitionError};
pub use money::Money;
pub use validation::{FieldError, ValidationErrors};
