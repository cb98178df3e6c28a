//! Orders
//!
//! - [`OrderStatus`]: the status state machine shared by server and clients
//! - [`Order`] / [`OrderLineItem`]: the immutable order record
//! - [`CommandResponse`]: discriminated result of order commands
//! - [`LiveMessage`]: live feed frames

pub mod live;
pub mod report;
pub mod status;
pub mod types;

// Re-exports
pub use live::LiveMessage;
pub use report::{CommissionSummary, DashboardStats, StatusCounts};
pub use status::{OrderStatus, TransitionCheck, UnknownOrderStatus};
pub use types::*;
