//! Database connection settings.
//!
//! Built once at process start and passed by reference to whatever needs a
//! pool. Nothing below the binaries reads the environment directly.

use url::Url;

/// Errors raised while assembling configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a valid {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("cannot build a database URL: {0}")]
    Url(String),
}

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_USER: &str = "postgres";
const DEFAULT_DATABASE: &str = "historical_figures";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the `figures` store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Fully composed `postgres://` connection string.
    pub url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// How long a caller waits for a pooled connection.
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default              |
    /// |--------------------------|----------------------|
    /// | `DATABASE_URL`           | composed from below  |
    /// | `POSTGRES_HOST`          | `localhost`          |
    /// | `POSTGRES_PORT`          | `5432`               |
    /// | `POSTGRES_USER`          | `postgres`           |
    /// | `POSTGRES_PASSWORD`      | empty                |
    /// | `POSTGRES_DB`            | `historical_figures` |
    /// | `DB_MAX_CONNECTIONS`     | `10`                 |
    /// | `DB_ACQUIRE_TIMEOUT_SECS`| `30`                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = match lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            Some(url) => url,
            None => {
                let host = lookup("POSTGRES_HOST").unwrap_or_else(|| DEFAULT_HOST.into());
                let port = parse_or(&lookup, "POSTGRES_PORT", "port number", DEFAULT_PORT)?;
                let user = lookup("POSTGRES_USER").unwrap_or_else(|| DEFAULT_USER.into());
                let password = lookup("POSTGRES_PASSWORD").unwrap_or_default();
                let database = lookup("POSTGRES_DB").unwrap_or_else(|| DEFAULT_DATABASE.into());
                compose_url(&host, port, &user, &password, &database)?
            }
        };

        let max_connections = parse_or(
            &lookup,
            "DB_MAX_CONNECTIONS",
            "u32",
            DEFAULT_MAX_CONNECTIONS,
        )?;
        let acquire_timeout_secs = parse_or(
            &lookup,
            "DB_ACQUIRE_TIMEOUT_SECS",
            "u64",
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        Ok(Self {
            url,
            max_connections,
            acquire_timeout_secs,
        })
    }
}

/// Compose a `postgres://` URL, percent-escaping the user and password.
pub fn compose_url(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
    database: &str,
) -> Result<String, ConfigError> {
    let mut url = Url::parse(&format!("postgres://{host}"))
        .map_err(|e| ConfigError::Url(format!("invalid host '{host}': {e}")))?;

    url.set_port(Some(port))
        .map_err(|()| ConfigError::Url("cannot set port".into()))?;
    url.set_username(user)
        .map_err(|()| ConfigError::Url("cannot set user".into()))?;
    if !password.is_empty() {
        url.set_password(Some(password))
            .map_err(|()| ConfigError::Url("cannot set password".into()))?;
    }
    url.set_path(&format!("/{database}"));

    Ok(url.into())
}

/// Parse `key` through `lookup`, falling back to `default` when unset.
pub fn parse_or<F, T>(
    lookup: &F,
    key: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            expected,
            value,
        }),
    }
}
