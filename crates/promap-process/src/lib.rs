//! Promap Process
//!
//! This crate provides the materialized process representation for promap.
//! A materialized process is the persistent, independently addressable graph
//! created from a blueprint (or from a generated draft).
//!
//! Key differences from `promap-blueprint`:
//! - Every step and connection has a generated, globally unique identifier
//! - Connections reference materialized step ids, never template-local ones
//! - Steps carry their final canvas coordinates and an explicit `order`
//! - The graph belongs to an organization and has a lifecycle status

mod error;
mod graph;
mod process;

pub use error::ProcessError;
pub use graph::ProcessGraph;
pub use process::{MaterializedProcess, Process, ProcessConnection, ProcessStatus, ProcessStep};
