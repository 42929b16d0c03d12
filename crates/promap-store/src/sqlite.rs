use std::str::FromStr;

use async_trait::async_trait;
use promap_blueprint::{Blueprint, VisibilityFilter};
use promap_process::{MaterializedProcess, Process, ProcessConnection, ProcessStep};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::types::TemplateRow;
use crate::{Error, Store, UnitOfWork};

const TEMPLATE_COLUMNS: &str = "id, name, description, category, subcategory, industry, is_public, \
  organization_id, usage_count, template_data, created_by, created_at";

/// SQLite-based store implementation.
#[derive(Clone)]
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if missing) the database at `url` with foreign keys on.
  pub async fn connect(url: &str) -> Result<Self, Error> {
    let options = SqliteConnectOptions::from_str(url)?
      .create_if_missing(true)
      .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(Self::new(pool))
  }

  /// Open a private in-memory database.
  ///
  /// The pool holds a single connection that is never recycled, since each
  /// SQLite in-memory connection is its own database.
  pub async fn in_memory() -> Result<Self, Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .idle_timeout(None)
      .max_lifetime(None)
      .connect_with(options)
      .await?;
    Ok(Self::new(pool))
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), Error> {
    sqlx::migrate!("../../migrations").run(&self.pool).await?;
    Ok(())
  }
}

#[async_trait]
impl Store for SqliteStore {
  async fn create_blueprint(&self, blueprint: &Blueprint) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO templates (id, name, description, category, subcategory, industry, is_public,
                                   organization_id, usage_count, template_data, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(&blueprint.id)
    .bind(&blueprint.def.name)
    .bind(&blueprint.def.description)
    .bind(&blueprint.def.category)
    .bind(&blueprint.def.subcategory)
    .bind(&blueprint.def.industry)
    .bind(blueprint.def.is_public)
    .bind(&blueprint.organization_id)
    .bind(blueprint.usage_count)
    .bind(Json(&blueprint.def.template_data))
    .bind(&blueprint.created_by)
    .bind(blueprint.created_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn find_blueprint(
    &self,
    blueprint_id: &str,
    filter: &VisibilityFilter,
  ) -> Result<Option<Blueprint>, Error> {
    let row: Option<TemplateRow> = sqlx::query_as(&format!(
      r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM templates
            WHERE id = ? AND (is_public = 1 OR organization_id = ?)
            "#
    ))
    .bind(blueprint_id)
    .bind(&filter.organization_id)
    .fetch_optional(&self.pool)
    .await?;

    Ok(row.map(Blueprint::from))
  }

  async fn list_blueprints(&self, filter: &VisibilityFilter) -> Result<Vec<Blueprint>, Error> {
    let rows: Vec<TemplateRow> = sqlx::query_as(&format!(
      r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM templates
            WHERE is_public = 1 OR organization_id = ?
            ORDER BY usage_count DESC, name ASC
            "#
    ))
    .bind(&filter.organization_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(rows.into_iter().map(Blueprint::from).collect())
  }

  async fn increment_usage(&self, blueprint_id: &str) -> Result<(), Error> {
    let result = sqlx::query(
      r#"
            UPDATE templates
            SET usage_count = usage_count + 1
            WHERE id = ?
            "#,
    )
    .bind(blueprint_id)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(Error::NotFound(format!("template {blueprint_id}")));
    }

    Ok(())
  }

  async fn begin(&self) -> Result<Box<dyn UnitOfWork>, Error> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(SqliteUnitOfWork { tx }))
  }

  async fn get_process(&self, process_id: &str) -> Result<MaterializedProcess, Error> {
    let process: Process = sqlx::query_as(
      r#"
            SELECT id, name, description, status, version, organization_id, created_by,
                   category, template_id, created_at
            FROM processes
            WHERE id = ?
            "#,
    )
    .bind(process_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("process {process_id}")))?;

    let steps: Vec<ProcessStep> = sqlx::query_as(
      r#"
            SELECT id, process_id, name, step_type, description, duration,
                   position_x, position_y, step_order, metadata
            FROM process_steps
            WHERE process_id = ?
            ORDER BY step_order ASC
            "#,
    )
    .bind(process_id)
    .fetch_all(&self.pool)
    .await?;

    let connections: Vec<ProcessConnection> = sqlx::query_as(
      r#"
            SELECT id, process_id, source_step_id, target_step_id, label, connection_type
            FROM process_connections
            WHERE process_id = ?
            ORDER BY rowid ASC
            "#,
    )
    .bind(process_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(MaterializedProcess {
      process,
      steps,
      connections,
    })
  }

  async fn list_processes(&self, organization_id: &str) -> Result<Vec<Process>, Error> {
    let processes = sqlx::query_as(
      r#"
            SELECT id, name, description, status, version, organization_id, created_by,
                   category, template_id, created_at
            FROM processes
            WHERE organization_id = ?
            ORDER BY created_at DESC
            "#,
    )
    .bind(organization_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(processes)
  }
}

/// A unit of work backed by one SQLite transaction.
///
/// Dropping it without calling `commit` rolls the transaction back.
struct SqliteUnitOfWork {
  tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
  async fn create_process(&mut self, process: &Process) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO processes (id, name, description, status, version, organization_id,
                                   created_by, category, template_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(&process.id)
    .bind(&process.name)
    .bind(&process.description)
    .bind(process.status)
    .bind(process.version)
    .bind(&process.organization_id)
    .bind(&process.created_by)
    .bind(&process.category)
    .bind(&process.template_id)
    .bind(process.created_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn create_step(&mut self, step: &ProcessStep) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO process_steps (id, process_id, name, step_type, description, duration,
                                       position_x, position_y, step_order, metadata)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(&step.id)
    .bind(&step.process_id)
    .bind(&step.name)
    .bind(step.step_type)
    .bind(&step.description)
    .bind(step.duration)
    .bind(step.position_x)
    .bind(step.position_y)
    .bind(step.order)
    .bind(Json(&step.metadata))
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn create_connection(&mut self, connection: &ProcessConnection) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO process_connections (id, process_id, source_step_id, target_step_id,
                                             label, connection_type)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(&connection.id)
    .bind(&connection.process_id)
    .bind(&connection.source_step_id)
    .bind(&connection.target_step_id)
    .bind(&connection.label)
    .bind(connection.connection_type)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn commit(self: Box<Self>) -> Result<(), Error> {
    self.tx.commit().await?;
    debug!("unit of work committed");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> Result<(), Error> {
    self.tx.rollback().await?;
    debug!("unit of work rolled back");
    Ok(())
  }
}
