use std::env;

use anyhow::Context;
use secrecy::SecretString;

#[derive(Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_connect_retries: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub paystack: PaystackConfig,
}

#[derive(Debug)]
pub struct PaystackConfig {
    pub secret_key: SecretString,
    pub base_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let secret_key =
            env::var("PAYSTACK_SECRET_KEY").context("PAYSTACK_SECRET_KEY is not set")?;
        let base_url = env::var("PAYSTACK_BASE_URL")
            .unwrap_or_else(|_| "https://api.paystack.co".to_string());

        Ok(Self {
            port,
            database_url,
            host,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            db_connect_retries: parse_or("DB_CONNECT_RETRIES", 5),
            jwt_secret,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 24),
            paystack: PaystackConfig {
                secret_key: SecretString::from(secret_key),
                base_url: base_url.trim_end_matches('/').to_string(),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
