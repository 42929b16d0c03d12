//! Promap Blueprint
//!
//! This crate contains the serializable template types for promap. A
//! blueprint is a reusable process graph: an ordered list of step
//! descriptors and an unordered list of connection descriptors, all
//! addressed by template-local identifiers.
//!
//! Blueprints can be loaded from:
//! - JSON files (via CLI with `promap template import blueprint.json`)
//! - Database storage (the `template_data` column holds the JSON payload)
//!
//! The engine never mutates a blueprint. Instantiation reads it and writes a
//! fresh process graph with newly generated identifiers.

mod blueprint;
mod connection;
mod error;
mod step;

pub use blueprint::{Blueprint, BlueprintDef, TemplateData, VisibilityFilter};
pub use connection::{ConnectionDescriptor, ConnectionType};
pub use error::BlueprintError;
pub use step::{Position, StepDescriptor, StepType};
