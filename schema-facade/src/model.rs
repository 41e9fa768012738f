//! Models built from discovered schemas.

use std::collections::BTreeMap;
use std::sync::Arc;

use common::errors::{AppError, AppResult};
use common::models::{ColumnType, Filter, ModelSummary, Record, SchemaDescriptor};
use serde_json::Value;
use sqlx::{MySql, Postgres, Sqlite};
use validator::Validate;

use crate::dialect;
use crate::facade::{Connection, DatabasePool};
use crate::row::{bind_params, decode_count, decode_row};

/// Models keyed by model name.
pub type Models = BTreeMap<String, ModelHandle>;

/// Queryable accessor for one discovered table.
///
/// A handle interprets its [`SchemaDescriptor`] at call time and shares the
/// facade's connection, so it stops working once the facade disconnects.
#[derive(Clone)]
pub struct ModelHandle {
    schema: Arc<SchemaDescriptor>,
    conn: Arc<Connection>,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("name", &self.schema.name)
            .field("table", &self.schema.table)
            .field("namespace", &self.schema.namespace)
            .finish()
    }
}

/// Checks that a descriptor can back a model.
fn check_constructible(schema: &SchemaDescriptor) -> AppResult<()> {
    if schema.columns.is_empty() {
        return Err(AppError::ModelConstruction(format!(
            "table `{}` has no columns",
            schema.table
        )));
    }
    if let Some(column) = schema
        .columns
        .iter()
        .find(|c| c.column_type == ColumnType::Unknown)
    {
        return Err(AppError::ModelConstruction(format!(
            "column `{}` of table `{}` has unsupported type `{}`",
            column.name, schema.table, column.data_type
        )));
    }
    if schema.primary_key().is_empty() {
        return Err(AppError::ModelConstruction(format!(
            "table `{}` has no primary key",
            schema.table
        )));
    }
    Ok(())
}

impl ModelHandle {
    pub(crate) fn build(schema: SchemaDescriptor, conn: Arc<Connection>) -> AppResult<Self> {
        check_constructible(&schema)?;
        Ok(Self {
            schema: Arc::new(schema),
            conn,
        })
    }

    /// Returns the model name.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Returns the descriptor this model was built from.
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Summarizes the model for listings.
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            name: self.schema.name.clone(),
            table: self.schema.table.clone(),
            namespace: self.schema.namespace.clone(),
            primary_key: self
                .schema
                .primary_key()
                .into_iter()
                .map(|c| c.name.clone())
                .collect(),
            column_count: self.schema.columns.len(),
        }
    }

    /// Returns the records matching `filter`, or every record without one.
    ///
    /// Records hold exactly the model's columns, or the `fields` subset.
    /// Without an `order` the row order is whatever the data source returns.
    pub async fn find(&self, filter: Option<&Filter>) -> AppResult<Vec<Record>> {
        if let Some(filter) = filter {
            filter.validate()?;
        }
        let plan = dialect::build_select(&self.schema, filter)?;
        let db_type = self.schema.db_type;
        tracing::debug!(model = %self.schema.name, sql = %plan.sql, "Running find");

        match self.conn.pool()? {
            DatabasePool::MySQL(pool) => {
                let rows = bind_params(sqlx::query::<MySql>(&plan.sql), plan.params)
                    .fetch_all(pool)
                    .await
                    .map_err(AppError::from_query)?;
                rows.iter()
                    .map(|row| decode_row(row, &plan.columns, db_type))
                    .collect()
            }
            DatabasePool::Postgres(pool) => {
                let rows = bind_params(sqlx::query::<Postgres>(&plan.sql), plan.params)
                    .fetch_all(pool)
                    .await
                    .map_err(AppError::from_query)?;
                rows.iter()
                    .map(|row| decode_row(row, &plan.columns, db_type))
                    .collect()
            }
            DatabasePool::SQLite(pool) => {
                let rows = bind_params(sqlx::query::<Sqlite>(&plan.sql), plan.params)
                    .fetch_all(pool)
                    .await
                    .map_err(AppError::from_query)?;
                rows.iter()
                    .map(|row| decode_row(row, &plan.columns, db_type))
                    .collect()
            }
        }
    }

    /// Returns the record whose primary key equals `id`.
    ///
    /// Only models with a single-column primary key support lookup by id.
    pub async fn find_by_id(&self, id: impl Into<Value>) -> AppResult<Option<Record>> {
        let key = self.schema.primary_key();
        let [column] = key.as_slice() else {
            return Err(AppError::Validation(format!(
                "model `{}` has a composite primary key",
                self.schema.name
            )));
        };
        let filter = Filter::default()
            .where_eq(column.name.clone(), id)
            .limit(1);
        let mut records = self.find(Some(&filter)).await?;
        Ok(records.pop())
    }

    /// Counts the records matching the `where` part of `filter`.
    pub async fn count(&self, filter: Option<&Filter>) -> AppResult<u64> {
        if let Some(filter) = filter {
            filter.validate()?;
        }
        let plan = dialect::build_count(&self.schema, filter)?;

        match self.conn.pool()? {
            DatabasePool::MySQL(pool) => {
                let row = bind_params(sqlx::query::<MySql>(&plan.sql), plan.params)
                    .fetch_one(pool)
                    .await
                    .map_err(AppError::from_query)?;
                decode_count(&row)
            }
            DatabasePool::Postgres(pool) => {
                let row = bind_params(sqlx::query::<Postgres>(&plan.sql), plan.params)
                    .fetch_one(pool)
                    .await
                    .map_err(AppError::from_query)?;
                decode_count(&row)
            }
            DatabasePool::SQLite(pool) => {
                let row = bind_params(sqlx::query::<Sqlite>(&plan.sql), plan.params)
                    .fetch_one(pool)
                    .await
                    .map_err(AppError::from_query)?;
                decode_count(&row)
            }
        }
    }
}
