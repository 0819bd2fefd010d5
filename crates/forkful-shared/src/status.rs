//! Order status lifecycle.
//!
//! ```text
//! Pending -> Confirmed -> Preparing -> Ready -> Out for Delivery -> Delivered
//! (any non-terminal status) -> Cancelled
//! ```
//!
//! Forward moves go one step at a time. Any non-terminal status may be
//! cancelled. `Delivered` and `Cancelled` are terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The forward sequence, excluding `Cancelled`.
    pub const SEQUENCE: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// The next forward status, if any.
    pub fn next(self) -> Option<OrderStatus> {
        let pos = Self::SEQUENCE.iter().position(|s| *s == self)?;
        Self::SEQUENCE.get(pos + 1).copied()
    }

    /// Statuses at which the order must carry a delivery address.
    pub fn requires_delivery_address(self) -> bool {
        matches!(self, OrderStatus::OutForDelivery | OrderStatus::Delivered)
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        self.transition(target).is_ok()
    }

    /// Validate a move to `target`, returning the new status.
    pub fn transition(self, target: OrderStatus) -> Result<OrderStatus, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }
        if target == OrderStatus::Cancelled || self.next() == Some(target) {
            Ok(target)
        } else {
            Err(TransitionError::Illegal {
                from: self,
                to: target,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::SEQUENCE
            .into_iter()
            .chain([OrderStatus::Cancelled])
            .find(|status| status.as_str() == s.trim())
            .ok_or(())
    }
}
