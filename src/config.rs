use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_global_listing: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");
        if secret.len() < 32 {
            tracing::warn!("JWT_SECRET is shorter than 32 bytes");
        }

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "appointments".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "appointments-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60 * 24),
        };

        Ok(Self {
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            jwt,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT", 8080),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 30),
            enable_global_listing: std::env::var("ENABLE_GLOBAL_LISTING")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("APPOINTMENTS_TEST_PORT", "not-a-number");
        assert_eq!(env_parse::<u16>("APPOINTMENTS_TEST_PORT", 8080), 8080);
        std::env::set_var("APPOINTMENTS_TEST_PORT", "9090");
        assert_eq!(env_parse::<u16>("APPOINTMENTS_TEST_PORT", 8080), 9090);
        std::env::remove_var("APPOINTMENTS_TEST_PORT");
    }
}
