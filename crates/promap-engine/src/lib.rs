//! Promap Template Instantiation Engine
//!
//! This crate turns a stored blueprint into a new, independently addressable
//! process graph.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TemplateEngine                         │
//! │  - validate overrides, find blueprint (visibility filtered) │
//! │  - classify orientation once, open a unit of work           │
//! │  - commit, then bump the usage counter (best effort)        │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        GraphPlan                            │
//! │  - phase 1: every step, new id, transformed position        │
//! │  - phase 2: every connection, endpoints through IdRemap     │
//! │  - unresolvable connections become DroppedConnection        │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        UnitOfWork                           │
//! │  - process, then steps, then connections; all or nothing    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use promap_engine::{EngineConfig, InstantiateRequest, TemplateEngine};
//! use promap_store::SqliteStore;
//!
//! let store = SqliteStore::connect("sqlite://promap.db").await?;
//! let engine = TemplateEngine::new(store, EngineConfig::default());
//!
//! let process = engine
//!   .instantiate(InstantiateRequest::new("template-id", "org-id", "user-id"))
//!   .await?;
//! ```

mod config;
mod engine;
mod error;
mod events;
mod materialize;
mod remap;
mod stats;
mod usage;

pub use config::EngineConfig;
pub use engine::{GeneratedProcess, InstantiateRequest, Overrides, TemplateEngine};
pub use error::{ErrorBody, InstantiateError};
pub use events::{
  ChannelNotifier, DroppedConnection, InstantiationEvent, InstantiationNotifier, MissingEndpoint,
  NoopNotifier,
};
pub use materialize::{GraphPlan, detect_orientation};
pub use remap::IdRemap;
pub use stats::{EngineStats, StatsSnapshot};
pub use usage::UsageTracker;
