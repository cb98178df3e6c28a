//! Order status state machine
//!
//! ```text
//! pending ──▶ preparing ──▶ completed
//!    ▲            │
//!    └────────────┘  (kitchen "Back")
//! pending | preparing ──▶ cancelled
//! ```
//!
//! `completed` and `cancelled` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status (persisted as the literal lowercase string)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Completed,
    Cancelled,
}

/// Outcome of checking a requested status change against the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCheck {
    /// The edge exists
    Allowed,
    /// Already in the requested non-terminal status; nothing to write
    NoOp,
    /// The edge does not exist
    Rejected,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Orders the kitchen still has to work on
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    pub fn check_transition(&self, to: OrderStatus) -> TransitionCheck {
        use OrderStatus::*;
        match (self, to) {
            (Pending, Preparing)
            | (Preparing, Completed)
            | (Preparing, Pending)
            | (Pending, Cancelled)
            | (Preparing, Cancelled) => TransitionCheck::Allowed,
            (from, to) if *from == to && !from.is_terminal() => TransitionCheck::NoOp,
            _ => TransitionCheck::Rejected,
        }
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.check_transition(to) == TransitionCheck::Allowed
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "preparing" => Ok(Self::Preparing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}
