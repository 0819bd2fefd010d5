use thiserror::Error;

use crate::status::OrderStatus;

/// Why a bearer credential was rejected.
///
/// Every variant maps to an authentication failure; callers never get
/// partial access from a token that fails any of these checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Authorization credential missing")]
    Missing,

    #[error("Invalid token format")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token not yet active")]
    NotYetValid,
}

impl TokenError {
    /// Machine-readable code so clients can tell an expired session
    /// (silent re-login) from a bad one.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Missing => "AUTH_REQUIRED",
            TokenError::Malformed | TokenError::BadSignature => "INVALID_TOKEN",
            TokenError::Expired => "TOKEN_EXPIRED",
            TokenError::NotYetValid => "TOKEN_NOT_ACTIVE",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Order is already {0} and can no longer change status")]
    Terminal(OrderStatus),

    #[error("Cannot move order from {from} to {to}")]
    Illegal { from: OrderStatus, to: OrderStatus },
}

/// A configured signing secret that cannot be used as a key.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyError {
    #[error("Signing key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Signing key must be 32 bytes, got {0}")]
    Length(usize),
}

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}
