use std::collections::{HashMap, HashSet};

use crate::process::{ProcessConnection, ProcessStep};

/// Graph structure for traversal and analysis of a materialized process.
#[derive(Debug, Clone)]
pub struct ProcessGraph {
  /// Adjacency list: step_id -> list of downstream step_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: step_id -> list of upstream step_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Steps with no incoming connections, in step order.
  entry_points: Vec<String>,
  /// Steps with no outgoing connections, in step order.
  exit_points: Vec<String>,
  /// Steps with multiple incoming connections.
  join_points: HashSet<String>,
}

impl ProcessGraph {
  /// Build a graph from steps and connections.
  ///
  /// Artifacts (data objects, groups, annotations) take no part in the flow
  /// and are never reported as entry or exit points.
  pub fn new(steps: &[ProcessStep], connections: &[ProcessConnection]) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for step in steps {
      adjacency.entry(step.id.clone()).or_default();
      reverse_adjacency.entry(step.id.clone()).or_default();
    }

    for connection in connections {
      adjacency
        .entry(connection.source_step_id.clone())
        .or_default()
        .push(connection.target_step_id.clone());
      reverse_adjacency
        .entry(connection.target_step_id.clone())
        .or_default()
        .push(connection.source_step_id.clone());
    }

    let mut ordered: Vec<&ProcessStep> = steps
      .iter()
      .filter(|s| !s.step_type.is_artifact())
      .collect();
    ordered.sort_by_key(|s| s.order);

    let entry_points = ordered
      .iter()
      .filter(|s| reverse_adjacency.get(&s.id).is_none_or(|v| v.is_empty()))
      .map(|s| s.id.clone())
      .collect();

    let exit_points = ordered
      .iter()
      .filter(|s| adjacency.get(&s.id).is_none_or(|v| v.is_empty()))
      .map(|s| s.id.clone())
      .collect();

    let join_points = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.len() > 1)
      .map(|(id, _)| id.clone())
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
      exit_points,
      join_points,
    }
  }

  /// Get entry points (steps with no incoming connections).
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Get exit points (steps with no outgoing connections).
  pub fn exit_points(&self) -> &[String] {
    &self.exit_points
  }

  /// Get downstream steps for a given step.
  pub fn downstream(&self, step_id: &str) -> &[String] {
    self
      .adjacency
      .get(step_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream steps for a given step.
  pub fn upstream(&self, step_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(step_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Check if a step is a join point (has multiple incoming connections).
  pub fn is_join_point(&self, step_id: &str) -> bool {
    self.join_points.contains(step_id)
  }
}
