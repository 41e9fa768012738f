//! The schema facade.
//!
//! A [`SchemaFacade`] owns one data source connection. It discovers table
//! structures, turns them into [`ModelHandle`]s and releases the connection
//! on [`SchemaFacade::disconnect`].

use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::config::PoolConfig;
use common::errors::{AppError, AppResult};
use common::models::{ConnectionConfig, DbType, Qualifier, SchemaDescriptor};
use common::utils::IdentifierValidator;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{MySqlPool, PgPool, SqlitePool};
use validator::Validate;

use crate::introspect;
use crate::model::{ModelHandle, Models};

/// Connection pool for one of the supported dialects.
#[derive(Clone)]
pub enum DatabasePool {
    /// MySQL connection pool.
    MySQL(MySqlPool),
    /// PostgreSQL connection pool.
    Postgres(PgPool),
    /// SQLite connection pool.
    SQLite(SqlitePool),
}

impl DatabasePool {
    /// Opens a pool for `config`.
    pub async fn connect(config: &ConnectionConfig, settings: &PoolConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(settings.connect_timeout_secs);
        let max_connections = settings.max_connections;

        match config.db_type {
            DbType::MySQL => {
                let host = config
                    .host
                    .as_deref()
                    .ok_or_else(|| AppError::Validation("MySQL requires host".into()))?;
                let mut options = MySqlConnectOptions::new().host(host);
                if let Some(port) = config.port_or_default() {
                    options = options.port(port);
                }
                if let Some(user) = config.username.as_deref() {
                    options = options.username(user);
                }
                if let Some(password) = config.password.as_deref() {
                    options = options.password(password);
                }
                if let Some(database) = config.database.as_deref() {
                    options = options.database(database);
                }
                let pool = MySqlPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
                Ok(DatabasePool::MySQL(pool))
            }
            DbType::Postgres => {
                let host = config
                    .host
                    .as_deref()
                    .ok_or_else(|| AppError::Validation("PostgreSQL requires host".into()))?;
                let mut options = PgConnectOptions::new().host(host);
                if let Some(port) = config.port_or_default() {
                    options = options.port(port);
                }
                if let Some(user) = config.username.as_deref() {
                    options = options.username(user);
                }
                if let Some(password) = config.password.as_deref() {
                    options = options.password(password);
                }
                if let Some(database) = config.database.as_deref() {
                    options = options.database(database);
                }
                let pool = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
                Ok(DatabasePool::Postgres(pool))
            }
            DbType::SQLite => {
                let path = config
                    .file_path
                    .as_deref()
                    .ok_or_else(|| AppError::Validation("SQLite requires file_path".into()))?;
                let options = if path == ":memory:" {
                    SqliteConnectOptions::from_str("sqlite::memory:")
                        .map_err(|e| AppError::DatabaseConnection(e.to_string()))?
                } else {
                    SqliteConnectOptions::new()
                        .filename(path)
                        .create_if_missing(false)
                };
                // An in-memory database lives as long as its only connection.
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .acquire_timeout(timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
                Ok(DatabasePool::SQLite(pool))
            }
        }
    }

    /// Returns the dialect of this pool.
    pub fn db_type(&self) -> DbType {
        match self {
            DatabasePool::MySQL(_) => DbType::MySQL,
            DatabasePool::Postgres(_) => DbType::Postgres,
            DatabasePool::SQLite(_) => DbType::SQLite,
        }
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        match self {
            DatabasePool::MySQL(pool) => pool.close().await,
            DatabasePool::Postgres(pool) => pool.close().await,
            DatabasePool::SQLite(pool) => pool.close().await,
        }
    }
}

/// Lifecycle of a facade.
///
/// `Open → (Discovering) → Ready → Disconnected`. A disconnected facade
/// never reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Connected, no models built yet.
    Open,
    /// A discovery is in flight.
    Discovering,
    /// Models have been built.
    Ready,
    /// The connection was released.
    Disconnected,
}

/// The connection shared by a facade and every model it built.
pub(crate) struct Connection {
    name: String,
    pool: DatabasePool,
    closed: AtomicBool,
    discovering: AtomicUsize,
    models_built: AtomicBool,
}

impl Connection {
    /// Returns the pool, or `ConnectionClosed` after disconnect.
    pub(crate) fn pool(&self) -> AppResult<&DatabasePool> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AppError::ConnectionClosed);
        }
        Ok(&self.pool)
    }

    fn begin_discovery(&self) -> DiscoveryGuard<'_> {
        self.discovering.fetch_add(1, Ordering::SeqCst);
        DiscoveryGuard(&self.discovering)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            tracing::warn!(
                data_source = %self.name,
                "Facade dropped without disconnect; connection released on drop"
            );
        }
    }
}

struct DiscoveryGuard<'a>(&'a AtomicUsize);

impl Drop for DiscoveryGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Schema discovery and model facade over one data source connection.
///
/// Cloning is cheap; clones share the connection, so `disconnect` on any of
/// them closes it for all, including the models already handed out.
#[derive(Clone)]
pub struct SchemaFacade {
    config: Arc<ConnectionConfig>,
    conn: Arc<Connection>,
}

impl std::fmt::Debug for SchemaFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaFacade")
            .field("data_source", &self.config.name)
            .field("db_type", &self.config.db_type)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}

impl SchemaFacade {
    /// Connects to the data source described by `config`.
    pub async fn connect(config: ConnectionConfig, settings: &PoolConfig) -> AppResult<Self> {
        config.validate()?;
        let pool = DatabasePool::connect(&config, settings).await?;
        tracing::info!(
            data_source = %config.name,
            db_type = %config.db_type,
            "Connected to data source"
        );
        Ok(Self {
            conn: Arc::new(Connection {
                name: config.name.clone(),
                pool,
                closed: AtomicBool::new(false),
                discovering: AtomicUsize::new(0),
                models_built: AtomicBool::new(false),
            }),
            config: Arc::new(config),
        })
    }

    /// Connects, runs `flow` and disconnects on every exit path.
    ///
    /// Returns the flow's result; a connect failure is returned without
    /// running the flow.
    pub async fn scoped<F, Fut, T, E>(
        config: ConnectionConfig,
        settings: &PoolConfig,
        flow: F,
    ) -> Result<T, E>
    where
        F: FnOnce(SchemaFacade) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<AppError>,
    {
        let facade = Self::connect(config, settings).await?;
        let result = flow(facade.clone()).await;
        facade.disconnect().await;
        result
    }

    /// Returns the data source configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Returns the dialect of the data source.
    pub fn db_type(&self) -> DbType {
        self.conn.pool.db_type()
    }

    /// Returns the current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        if self.conn.closed.load(Ordering::SeqCst) {
            Lifecycle::Disconnected
        } else if self.conn.discovering.load(Ordering::SeqCst) > 0 {
            Lifecycle::Discovering
        } else if self.conn.models_built.load(Ordering::SeqCst) {
            Lifecycle::Ready
        } else {
            Lifecycle::Open
        }
    }

    /// Discovers the structure of `table`.
    ///
    /// The namespace comes from `qualifier`, then from the data source's
    /// default qualifier, then from the dialect default.
    pub async fn discover_schema(
        &self,
        table: &str,
        qualifier: &Qualifier,
    ) -> AppResult<SchemaDescriptor> {
        IdentifierValidator::validate("table", table)?;
        qualifier.validate()?;
        let pool = self.conn.pool()?;
        let db_type = pool.db_type();

        let qualifier = qualifier.or(&self.config.qualifier);
        if let Some((key, value)) = qualifier.ignored_key(db_type) {
            tracing::debug!(
                table = %table,
                key = key,
                value = %value,
                db_type = %db_type,
                "Qualifier key ignored by this dialect"
            );
        }

        let _guard = self.conn.begin_discovery();
        let schema = introspect::discover(pool, table, qualifier.namespace_for(db_type)).await?;
        tracing::info!(
            table = %schema.table,
            namespace = %schema.namespace,
            columns = schema.columns.len(),
            "Discovered schema"
        );
        Ok(schema)
    }

    /// Discovers `table` and builds a model for it, keyed by model name.
    ///
    /// With `qualifier.associations`, every table the discovered one
    /// references through a foreign key is discovered and built as well.
    pub async fn discover_and_build_models(
        &self,
        table: &str,
        qualifier: &Qualifier,
    ) -> AppResult<Models> {
        self.conn.pool()?;
        let _guard = self.conn.begin_discovery();
        let root = self.discover_schema(table, qualifier).await?;
        let referenced: Vec<_> = if qualifier.associations {
            root.referenced_tables().into_iter().cloned().collect()
        } else {
            Vec::new()
        };
        let root_namespace = root.namespace.clone();

        let mut models = Models::new();
        let handle = ModelHandle::build(root, self.conn.clone())?;
        models.insert(handle.name().to_string(), handle);

        for target in referenced {
            if target.table == table && target.namespace == root_namespace {
                continue;
            }
            let schema = self
                .discover_schema(&target.table, &Qualifier::schema(target.namespace.clone()))
                .await?;
            let handle = ModelHandle::build(schema, self.conn.clone())?;
            models.entry(handle.name().to_string()).or_insert(handle);
        }

        self.conn.models_built.store(true, Ordering::SeqCst);
        tracing::info!(
            table = %table,
            models = ?models.keys().collect::<Vec<_>>(),
            "Built models"
        );
        Ok(models)
    }

    /// Releases the connection. Calling it again is a no-op.
    pub async fn disconnect(&self) {
        if self.conn.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(data_source = %self.config.name, "Already disconnected");
            return;
        }
        self.conn.pool.close().await;
        tracing::info!(data_source = %self.config.name, "Disconnected from data source");
    }

    /// Runs raw SQL against the data source.
    #[cfg(test)]
    pub(crate) async fn execute(&self, sql: &str) -> AppResult<()> {
        match self.conn.pool()? {
            DatabasePool::MySQL(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
            DatabasePool::Postgres(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
            DatabasePool::SQLite(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
        }
        .map_err(AppError::from_query)
    }
}
