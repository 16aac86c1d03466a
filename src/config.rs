use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    /// PostgreSQL URL. When unset the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub profile_cache_ttl: Duration,
    pub bcrypt_cost: u32,
    pub request_timeout: Duration,
    pub log_dir: PathBuf,
}

impl Config {
    /// Load environment variables and set defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            jwt_secret,
            token_ttl: Duration::from_secs(parse_var("TOKEN_TTL_SECS", 36_000)?),
            bind_addr: parse_var("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 10)?,
            profile_cache_ttl: Duration::from_secs(parse_var("PROFILE_CACHE_TTL_SECS", 600)?),
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 30)?),
            log_dir: PathBuf::from(env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string())),
        })
    }

    /// Configuration for tests and local tooling: in-memory store, cheap hashing.
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::from_secs(3600),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            db_max_connections: 1,
            profile_cache_ttl: Duration::from_secs(60),
            bcrypt_cost: 4,
            request_timeout: Duration::from_secs(10),
            log_dir: PathBuf::from("logs"),
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default_when_unset() {
        let value: u32 = parse_var("ROADASSIST_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_var_rejects_garbage() {
        env::set_var("ROADASSIST_TEST_GARBAGE", "not-a-number");
        let err = parse_var::<u32>("ROADASSIST_TEST_GARBAGE", 1).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "ROADASSIST_TEST_GARBAGE", .. }));
    }
}
