//! Application configuration.
//!
//! All settings come from environment variables. Binaries load a `.env` file
//! first (via `dotenvy`), so values there behave like real environment
//! variables.

use std::str::FromStr;

use crate::errors::{AppError, AppResult};
use crate::models::connection::{ConnectionConfig, DbType, Qualifier};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATASOURCE_NAME: &str = "accountDB";

/// Connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of pooled connections; one per flow by default.
    pub max_connections: u32,
    /// Connect/acquire timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 1,
            connect_timeout_secs: 10,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name used in logs and responses.
    pub service_name: String,
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Pool settings for every facade the service opens.
    pub pool: PoolConfig,
    /// The data source to discover against.
    pub data_source: ConnectionConfig,
}

impl AppConfig {
    /// Loads the configuration from the process environment.
    pub fn load_with_service(service_name: &str) -> AppResult<Self> {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, which returns the value of
    /// an environment variable if it is set.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let pool = PoolConfig {
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", PoolConfig::default().max_connections)?,
            connect_timeout_secs: parse_or(
                &get,
                "DB_CONNECT_TIMEOUT_SECS",
                PoolConfig::default().connect_timeout_secs,
            )?,
        };
        if pool.max_connections == 0 {
            return Err(AppError::Config("DB_MAX_CONNECTIONS must be at least 1".into()));
        }

        let db_type = match get("DATASOURCE_TYPE") {
            Some(v) => DbType::from_str(&v).map_err(AppError::Config)?,
            None => DbType::Postgres,
        };

        let data_source = ConnectionConfig {
            name: get("DATASOURCE_NAME").unwrap_or_else(|| DEFAULT_DATASOURCE_NAME.to_string()),
            db_type,
            host: get("DATASOURCE_HOST"),
            port: parse_opt(&get, "DATASOURCE_PORT")?,
            username: get("DATASOURCE_USER"),
            password: get("DATASOURCE_PASSWORD"),
            database: get("DATASOURCE_DATABASE"),
            file_path: get("DATASOURCE_FILE"),
            qualifier: Qualifier {
                owner: get("DATASOURCE_OWNER"),
                schema: get("DATASOURCE_SCHEMA"),
                associations: false,
            },
        };

        Ok(Self {
            service_name: service_name.to_string(),
            host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&get, "SERVER_PORT", DEFAULT_PORT)?,
            pool,
            data_source,
        })
    }
}

fn parse_opt<T, F>(get: &F, key: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} has an invalid value `{}`", key, raw))),
        None => Ok(None),
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> AppResult<AppConfig> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup("test-service", |key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.service_name, "test-service");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.pool, PoolConfig::default());
        assert_eq!(config.data_source.name, "accountDB");
        assert_eq!(config.data_source.db_type, DbType::Postgres);
        assert!(config.data_source.qualifier.is_empty());
    }

    #[test]
    fn test_data_source_from_env() {
        let config = load(&[
            ("DATASOURCE_TYPE", "mysql"),
            ("DATASOURCE_HOST", "db.internal"),
            ("DATASOURCE_PORT", "3307"),
            ("DATASOURCE_USER", "reader"),
            ("DATASOURCE_DATABASE", "bank"),
            ("DATASOURCE_OWNER", "dbo"),
            ("SERVER_PORT", "9000"),
        ])
        .unwrap();
        let ds = &config.data_source;
        assert_eq!(ds.db_type, DbType::MySQL);
        assert_eq!(ds.host.as_deref(), Some("db.internal"));
        assert_eq!(ds.port, Some(3307));
        assert_eq!(ds.username.as_deref(), Some("reader"));
        assert_eq!(ds.database.as_deref(), Some("bank"));
        assert_eq!(ds.qualifier, Qualifier::owner("dbo"));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = load(&[("DATASOURCE_SCHEMA", "  "), ("SERVER_PORT", "")]).unwrap();
        assert!(config.data_source.qualifier.schema.is_none());
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        assert!(matches!(load(&[("SERVER_PORT", "http")]), Err(AppError::Config(_))));
        assert!(matches!(load(&[("DATASOURCE_TYPE", "oracle")]), Err(AppError::Config(_))));
        assert!(matches!(load(&[("DB_MAX_CONNECTIONS", "0")]), Err(AppError::Config(_))));
    }
}
