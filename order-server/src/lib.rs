//! Order Server - table-side ordering core for a multi-restaurant platform
//!
//! # Overview
//!
//! - **Pricing** (`pricing`): subtotal, single best discount, commission
//! - **Orders** (`orders`): order creation, status state machine, order reads
//! - **Repositories** (`repo`): PostgreSQL (sqlx) or in-memory storage
//! - **Live** (`live`): per-restaurant fan-out feeding the WebSocket feed
//! - **Dashboard** (`dashboard`): cached per-restaurant aggregates
//! - **HTTP API** (`api`): axum routes
//!
//! # Layout
//!
//! ```text
//! order-server/src/
//! ├── core/       # config, state, server, errors
//! ├── api/        # HTTP routes and handlers
//! ├── orders/     # OrderService
//! ├── pricing/    # calculator, matcher, resolver
//! ├── repo/       # repository traits + stores
//! ├── live/       # LiveOrderHub
//! ├── dashboard/  # DashboardCache
//! └── utils/      # logging, validation
//! ```

pub mod api;
pub mod core;
pub mod dashboard;
pub mod live;
pub mod orders;
pub mod pricing;
pub mod repo;
pub mod utils;

// Re-export common types
pub use core::{Config, Server, ServerState};
pub use orders::{OrderError, OrderService};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialize logging from the environment
pub fn setup_environment() -> Config {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("failed to load .env: {e}");
    }

    let config = Config::from_env();
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );
    config
}
