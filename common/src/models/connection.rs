//! Connection configuration models.
//!
//! Contains the data source description a facade connects with, and the
//! namespace qualifier used to disambiguate table names.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Database type enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// MySQL database.
    MySQL,
    /// PostgreSQL database.
    Postgres,
    /// SQLite database.
    SQLite,
}

impl DbType {
    /// Returns the default port for this database type.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DbType::MySQL => Some(3306),
            DbType::Postgres => Some(5432),
            DbType::SQLite => None,
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::MySQL => write!(f, "mysql"),
            DbType::Postgres => write!(f, "postgres"),
            DbType::SQLite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for DbType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DbType::MySQL),
            "postgres" | "postgresql" => Ok(DbType::Postgres),
            "sqlite" => Ok(DbType::SQLite),
            other => Err(format!("unknown database type `{}`", other)),
        }
    }
}

/// Namespace selector for discovery.
///
/// `owner` is meant for dialects that separate table ownership from schema,
/// `schema` for dialects with a flat schema model. Only one of them is
/// meaningful per dialect; the other is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate, ToSchema)]
#[serde(default)]
pub struct Qualifier {
    /// Owner namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "owner must not be empty"))]
    pub owner: Option<String>,
    /// Schema namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "schema must not be empty"))]
    pub schema: Option<String>,
    /// Also build models for tables referenced through foreign keys.
    pub associations: bool,
}

impl Qualifier {
    /// Qualifier selecting an owner namespace.
    pub fn owner(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            ..Default::default()
        }
    }

    /// Qualifier selecting a schema namespace.
    pub fn schema(schema: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            ..Default::default()
        }
    }

    /// Enables foreign-key association discovery.
    pub fn with_associations(mut self, associations: bool) -> Self {
        self.associations = associations;
        self
    }

    /// Returns true when neither namespace key is set.
    pub fn is_empty(&self) -> bool {
        self.owner.is_none() && self.schema.is_none()
    }

    /// Returns the namespace this qualifier selects for the given dialect.
    pub fn namespace_for(&self, db_type: DbType) -> Option<&str> {
        match db_type {
            DbType::Postgres | DbType::MySQL | DbType::SQLite => self.schema.as_deref(),
        }
    }

    /// Returns the key that the given dialect ignores, if it was supplied.
    pub fn ignored_key(&self, db_type: DbType) -> Option<(&'static str, &str)> {
        match db_type {
            DbType::Postgres | DbType::MySQL | DbType::SQLite => {
                self.owner.as_deref().map(|owner| ("owner", owner))
            }
        }
    }

    /// Fills unset namespace keys from `defaults`.
    pub fn or(&self, defaults: &Qualifier) -> Qualifier {
        Qualifier {
            owner: self.owner.clone().or_else(|| defaults.owner.clone()),
            schema: self.schema.clone().or_else(|| defaults.schema.clone()),
            associations: self.associations,
        }
    }
}

/// Data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ConnectionConfig {
    /// Data source name.
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    /// Database type.
    pub db_type: DbType,
    /// Database host (for network databases).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Database port (for network databases).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Database username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Database password (not serialized).
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    /// Default database name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// SQLite file path, or `:memory:`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Qualifier applied when a call does not name a namespace.
    #[serde(default)]
    #[validate(nested)]
    pub qualifier: Qualifier,
}

impl ConnectionConfig {
    /// Creates a config for an in-memory SQLite database.
    pub fn sqlite_memory(name: impl Into<String>) -> Self {
        Self::sqlite_file(name, ":memory:")
    }

    /// Creates a config for a SQLite database file.
    pub fn sqlite_file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_type: DbType::SQLite,
            host: None,
            port: None,
            username: None,
            password: None,
            database: None,
            file_path: Some(path.into()),
            qualifier: Qualifier::default(),
        }
    }

    /// Returns the configured port or the dialect default.
    pub fn port_or_default(&self) -> Option<u16> {
        self.port.or_else(|| self.db_type.default_port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_the_namespace_key() {
        let q = Qualifier::schema("public");
        assert_eq!(q.namespace_for(DbType::Postgres), Some("public"));
        assert_eq!(q.ignored_key(DbType::Postgres), None);

        let q = Qualifier::owner("dbo");
        assert_eq!(q.namespace_for(DbType::MySQL), None);
        assert_eq!(q.ignored_key(DbType::MySQL), Some(("owner", "dbo")));
    }

    #[test]
    fn test_qualifier_defaults_fill_unset_keys() {
        let defaults = Qualifier::schema("public");
        let merged = Qualifier::owner("dbo").or(&defaults);
        assert_eq!(merged.owner.as_deref(), Some("dbo"));
        assert_eq!(merged.schema.as_deref(), Some("public"));

        let merged = Qualifier::schema("audit").or(&defaults);
        assert_eq!(merged.schema.as_deref(), Some("audit"));
    }

    #[test]
    fn test_qualifier_deserializes_partial_objects() {
        let q: Qualifier = serde_json::from_str(r#"{"owner":"dbo"}"#).unwrap();
        assert_eq!(q, Qualifier::owner("dbo"));
        assert!(!q.associations);
        let q: Qualifier = serde_json::from_str("{}").unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn test_db_type_parse() {
        assert_eq!("PostgreSQL".parse::<DbType>(), Ok(DbType::Postgres));
        assert_eq!("sqlite".parse::<DbType>(), Ok(DbType::SQLite));
        assert!("oracle".parse::<DbType>().is_err());
    }

    #[test]
    fn test_password_is_not_serialized() {
        let mut config = ConnectionConfig::sqlite_memory("accountDB");
        config.password = Some("secret".into());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_empty_schema_is_rejected() {
        let q = Qualifier::schema("");
        assert!(q.validate().is_err());
    }
}
