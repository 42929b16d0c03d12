use std::collections::HashSet;

use chrono::{DateTime, Utc};
use promap_blueprint::{ConnectionType, StepType};
use serde::{Deserialize, Serialize};

use crate::error::ProcessError;
use crate::graph::ProcessGraph;

/// Lifecycle status of a process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ProcessStatus {
  #[default]
  Draft,
  InReview,
  Approved,
  Archived,
}

/// A process record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Process {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  pub status: ProcessStatus,
  pub version: i32,
  pub organization_id: String,
  pub created_by: String,
  pub category: Option<String>,
  /// Blueprint this process was instantiated from, if any.
  pub template_id: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// A materialized step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProcessStep {
  pub id: String,
  pub process_id: String,
  pub name: String,
  #[serde(rename = "type")]
  pub step_type: StepType,
  pub description: Option<String>,
  pub duration: Option<i32>,
  pub position_x: f64,
  pub position_y: f64,
  /// Index of the source descriptor in the blueprint's step sequence.
  #[cfg_attr(feature = "sqlx", sqlx(rename = "step_order"))]
  pub order: i32,
  #[cfg_attr(feature = "sqlx", sqlx(json))]
  pub metadata: serde_json::Value,
}

/// A materialized connection between two steps of the same process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProcessConnection {
  pub id: String,
  pub process_id: String,
  pub source_step_id: String,
  pub target_step_id: String,
  pub label: Option<String>,
  #[serde(rename = "type")]
  pub connection_type: ConnectionType,
}

/// A process together with its steps (ordered by `order`) and connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedProcess {
  pub process: Process,
  pub steps: Vec<ProcessStep>,
  pub connections: Vec<ProcessConnection>,
}

impl MaterializedProcess {
  /// Build the graph structure for traversal.
  pub fn graph(&self) -> ProcessGraph {
    ProcessGraph::new(&self.steps, &self.connections)
  }

  /// Get a step by its materialized id.
  pub fn get_step(&self, step_id: &str) -> Option<&ProcessStep> {
    self.steps.iter().find(|s| s.id == step_id)
  }

  /// Check that every step and connection belongs to this process and that
  /// every connection endpoint resolves to one of its steps.
  pub fn validate(&self) -> Result<(), ProcessError> {
    let process_id = &self.process.id;
    let mut step_ids = HashSet::with_capacity(self.steps.len());

    for step in &self.steps {
      if &step.process_id != process_id {
        return Err(ProcessError::ForeignRecord {
          kind: "step",
          id: step.id.clone(),
          expected: process_id.clone(),
          actual: step.process_id.clone(),
        });
      }
      step_ids.insert(step.id.as_str());
    }

    for connection in &self.connections {
      if &connection.process_id != process_id {
        return Err(ProcessError::ForeignRecord {
          kind: "connection",
          id: connection.id.clone(),
          expected: process_id.clone(),
          actual: connection.process_id.clone(),
        });
      }
      for endpoint in [&connection.source_step_id, &connection.target_step_id] {
        if !step_ids.contains(endpoint.as_str()) {
          return Err(ProcessError::DanglingConnection {
            connection_id: connection.id.clone(),
            step_id: endpoint.clone(),
          });
        }
      }
    }

    Ok(())
  }
}
