use std::env;

/// Shipping defaults, in currency minor units.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: i64 = 3999;
pub const DEFAULT_SHIPPING_FEE: i64 = 200;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub free_shipping_threshold: i64,
    pub shipping_fee: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let free_shipping_threshold = env::var("FREE_SHIPPING_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_FREE_SHIPPING_THRESHOLD);
        let shipping_fee = env::var("SHIPPING_FEE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_SHIPPING_FEE);
        Ok(Self {
            database_url,
            host,
            port,
            free_shipping_threshold,
            shipping_fee,
        })
    }
}
