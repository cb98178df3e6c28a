use rust_decimal::Decimal;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | HTTP_PORT | 3000 | HTTP listen port |
/// | DATABASE_URL | (unset) | PostgreSQL URL; unset runs on the in-memory store |
/// | ENVIRONMENT | development | development / staging / production |
/// | DEFAULT_COMMISSION_RATE | 0.05 | Platform commission when a restaurant has none |
/// | LIVE_CHANNEL_CAPACITY | 256 | Broadcast buffer per restaurant |
/// | KITCHEN_COMPLETED_TAIL | 10 | Recently completed orders shown to the kitchen |
/// | RECENT_ORDERS_LIMIT | 100 | Window size for order lists and the live `ready` frame |
/// | LOG_LEVEL | info | Default tracing filter |
/// | LOG_JSON | false | Emit JSON log lines |
/// | LOG_DIR | (unset) | Directory for daily-rolling log files |
/// | REQUEST_TIMEOUT_MS | 30000 | Per-request timeout |
///
/// # Example
///
/// ```ignore
/// HTTP_PORT=8080 DATABASE_URL=postgres://localhost/orders cargo run -p order-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub database_url: Option<String>,
    /// development | staging | production
    pub environment: String,
    pub default_commission_rate: Decimal,
    pub live_channel_capacity: usize,
    pub kitchen_completed_tail: usize,
    pub recent_orders_limit: usize,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub request_timeout_ms: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            http_port: env_parse("HTTP_PORT", 3000),
            database_url: env_opt("DATABASE_URL"),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            default_commission_rate: env_parse("DEFAULT_COMMISSION_RATE", Decimal::new(5, 2)),
            live_channel_capacity: env_parse("LIVE_CHANNEL_CAPACITY", 256),
            kitchen_completed_tail: env_parse("KITCHEN_COMPLETED_TAIL", 10),
            recent_orders_limit: env_parse("RECENT_ORDERS_LIMIT", 100),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_parse("LOG_JSON", false),
            log_dir: env_opt("LOG_DIR"),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30000),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    /// Built-in defaults, ignoring the environment (tests)
    fn default() -> Self {
        Self {
            http_port: 3000,
            database_url: None,
            environment: "development".into(),
            default_commission_rate: Decimal::new(5, 2),
            live_channel_capacity: 256,
            kitchen_completed_tail: 10,
            recent_orders_limit: 100,
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
            request_timeout_ms: 30000,
        }
    }
}
