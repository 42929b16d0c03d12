//! Promap Store
//!
//! This crate provides the storage traits and implementations for the
//! template catalog and for materialized processes. Data is persisted to
//! SQLite, or kept in memory for tests.
//!
//! The [`Store`] trait defines operations for:
//! - Creating, finding and listing blueprints (with a visibility filter)
//! - Atomically incrementing a blueprint's usage counter
//! - Opening a [`UnitOfWork`] for transactional process creation
//! - Reading materialized processes back
//!
//! Nothing written through a [`UnitOfWork`] is visible to other readers
//! until [`UnitOfWork::commit`] succeeds. Dropping a unit of work without
//! committing discards every write made through it.

mod memory;
mod sqlite;
mod types;

pub use memory::{FaultPoint, MemoryStore};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use promap_blueprint::{Blueprint, VisibilityFilter};
use promap_process::{MaterializedProcess, Process, ProcessConnection, ProcessStep};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Applying schema migrations failed.
  #[error("migration error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  /// The storage backend refused the operation.
  #[error("storage unavailable: {0}")]
  Unavailable(String),
}

/// Storage trait for blueprints and materialized processes.
#[async_trait]
pub trait Store: Send + Sync {
  /// Add a blueprint to the catalog.
  async fn create_blueprint(&self, blueprint: &Blueprint) -> Result<(), Error>;

  /// Find a blueprint by ID, returning `None` when it does not exist or the
  /// filter hides it. The two cases are deliberately indistinguishable.
  async fn find_blueprint(
    &self,
    blueprint_id: &str,
    filter: &VisibilityFilter,
  ) -> Result<Option<Blueprint>, Error>;

  /// List the blueprints the filter permits, most used first.
  async fn list_blueprints(&self, filter: &VisibilityFilter) -> Result<Vec<Blueprint>, Error>;

  /// Add one to a blueprint's usage counter without a read-modify-write.
  async fn increment_usage(&self, blueprint_id: &str) -> Result<(), Error>;

  /// Open a unit of work for creating one process graph.
  async fn begin(&self) -> Result<Box<dyn UnitOfWork>, Error>;

  /// Get a process with its steps (by order) and connections (by creation).
  async fn get_process(&self, process_id: &str) -> Result<MaterializedProcess, Error>;

  /// List processes owned by an organization, newest first.
  async fn list_processes(&self, organization_id: &str) -> Result<Vec<Process>, Error>;
}

/// A transactional batch of creates.
///
/// Identifiers are always supplied by the caller so that the ids handed out
/// during instantiation are exactly the ones persisted.
#[async_trait]
pub trait UnitOfWork: Send {
  /// Create the process record.
  async fn create_process(&mut self, process: &Process) -> Result<(), Error>;

  /// Create a step.
  async fn create_step(&mut self, step: &ProcessStep) -> Result<(), Error>;

  /// Create a connection. Both endpoints must already exist.
  async fn create_connection(&mut self, connection: &ProcessConnection) -> Result<(), Error>;

  /// Make every write visible at once.
  async fn commit(self: Box<Self>) -> Result<(), Error>;

  /// Discard every write.
  async fn rollback(self: Box<Self>) -> Result<(), Error>;
}
