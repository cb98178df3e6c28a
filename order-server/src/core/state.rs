use std::sync::Arc;

use crate::core::{Config, Result};
use crate::dashboard::DashboardCache;
use crate::live::LiveOrderHub;
use crate::orders::{OrderService, OrderSettings};
use crate::repo::{MemoryStore, PgStore, Repositories};

/// Server state - shared handles to every service
///
/// Cheap to clone; every field is reference counted.
///
/// | Field | Description |
/// |-------|-------------|
/// | config | Immutable configuration |
/// | orders | Order commands and queries |
/// | hub | Per-restaurant live fan-out |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub orders: OrderService,
    pub hub: LiveOrderHub,
}

impl ServerState {
    /// Build the state around an existing set of repositories
    pub fn new(config: Config, repos: Repositories) -> Self {
        let hub = LiveOrderHub::new(config.live_channel_capacity);
        let orders = OrderService::new(
            repos,
            hub.clone(),
            DashboardCache::new(),
            OrderSettings::from(&config),
        );
        Self {
            config,
            orders,
            hub,
        }
    }

    /// Initialize state from configuration
    ///
    /// With `DATABASE_URL` set, connects to PostgreSQL and applies the
    /// migrations; otherwise runs on an empty in-memory store.
    pub async fn initialize(config: &Config) -> Result<Self> {
        let repos = match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url).await?;
                tracing::info!("Connected to PostgreSQL");
                Repositories::from_store(Arc::new(store))
            }
            None => {
                if config.is_production() {
                    return Err(crate::core::ServerError::Config(
                        "DATABASE_URL is required in production".into(),
                    ));
                }
                tracing::warn!("DATABASE_URL not set, using in-memory store");
                Repositories::from_store(Arc::new(MemoryStore::new()))
            }
        };
        Ok(Self::new(config.clone(), repos))
    }
}
