use std::env;

use chrono::{FixedOffset, Offset, Utc};

use crate::{auth::token::DEFAULT_TTL_HOURS, fetchers::JoinStrategy};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub join_strategy: JoinStrategy,
    /// Offset used as "local time" when grouping earnings by calendar date.
    pub dashboard_utc_offset_minutes: i32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_TTL_HOURS);
        let join_strategy = match env::var("JOIN_STRATEGY") {
            Ok(value) => value.parse::<JoinStrategy>()?,
            Err(_) => JoinStrategy::default(),
        };
        let dashboard_utc_offset_minutes = env::var("DASHBOARD_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|m| m.parse::<i32>().ok())
            .unwrap_or(0);
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            session_ttl_hours,
            join_strategy,
            dashboard_utc_offset_minutes,
        })
    }

    /// The fixed offset dashboards treat as local time. Out-of-range values fall back to UTC.
    pub fn dashboard_offset(&self) -> FixedOffset {
        self.dashboard_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}
