//! Planning and writing a materialized process graph.
//!
//! Planning is pure: it assigns ids, transforms positions and resolves
//! connection endpoints without touching storage. Writing replays a plan
//! through a [`UnitOfWork`] in two phases, every step before any connection.

use promap_blueprint::TemplateData;
use promap_layout::{Orientation, Point, classify};
use promap_process::{MaterializedProcess, ProcessConnection, ProcessStep};
use promap_store::UnitOfWork;
use tracing::{debug, warn};

use crate::events::DroppedConnection;
use crate::remap::IdRemap;

/// Classify the orientation of a blueprint from all of its step positions.
pub fn detect_orientation(data: &TemplateData) -> Orientation {
  let points: Vec<Point> = data
    .steps
    .iter()
    .map(|step| {
      let position = step.resolved_position();
      Point::new(position.x, position.y)
    })
    .collect();
  classify(&points)
}

/// The records one instantiation will create.
#[derive(Debug, Clone)]
pub struct GraphPlan {
  /// In descriptor order; `order` equals the descriptor index.
  pub steps: Vec<ProcessStep>,
  /// Only connections whose endpoints both resolved, in descriptor order.
  pub connections: Vec<ProcessConnection>,
  pub dropped: Vec<DroppedConnection>,
  pub remap: IdRemap,
}

impl GraphPlan {
  /// Plan the graph for `process_id`.
  ///
  /// Every step position is mapped through `orientation`; pass
  /// [`Orientation::Vertical`] to keep positions as authored. `next_id` is
  /// called once per created record.
  pub fn build(
    process_id: &str,
    data: &TemplateData,
    orientation: Orientation,
    mut next_id: impl FnMut() -> String,
  ) -> Self {
    let mut remap = IdRemap::new();
    let mut steps = Vec::with_capacity(data.steps.len());

    for (index, descriptor) in data.steps.iter().enumerate() {
      let position = descriptor.resolved_position();
      let point = orientation.to_vertical(Point::new(position.x, position.y));
      let id = next_id();

      if let Some(previous) = remap.insert(descriptor.id.clone(), id.clone()) {
        warn!(
          process_id = %process_id,
          step_id = %descriptor.id,
          replaced = %previous,
          "duplicate_step_id"
        );
      }

      steps.push(ProcessStep {
        id,
        process_id: process_id.to_string(),
        name: descriptor.name.clone(),
        step_type: descriptor.step_type,
        description: descriptor.description.clone(),
        duration: descriptor.duration,
        position_x: point.x,
        position_y: point.y,
        order: index as i32,
        metadata: descriptor.metadata.clone(),
      });
    }

    let mut connections = Vec::with_capacity(data.connections.len());
    let mut dropped = Vec::new();

    for (index, descriptor) in data.connections.iter().enumerate() {
      match remap.resolve_connection(descriptor) {
        Ok((source, target)) => connections.push(ProcessConnection {
          id: next_id(),
          process_id: process_id.to_string(),
          source_step_id: source.to_string(),
          target_step_id: target.to_string(),
          label: descriptor.label.clone(),
          connection_type: descriptor.connection_type,
        }),
        Err(missing) => dropped.push(DroppedConnection {
          index,
          source: descriptor.source.clone(),
          target: descriptor.target.clone(),
          missing,
        }),
      }
    }

    Self {
      steps,
      connections,
      dropped,
      remap,
    }
  }
}

/// Write the process shell, then every step, then every connection.
///
/// The caller owns the unit of work and decides whether to commit.
pub(crate) async fn write_graph(
  uow: &mut dyn UnitOfWork,
  graph: &MaterializedProcess,
) -> Result<(), promap_store::Error> {
  let process = &graph.process;
  uow.create_process(process).await?;

  for step in &graph.steps {
    uow.create_step(step).await?;
    debug!(
      process_id = %process.id,
      step_id = %step.id,
      order = step.order,
      "step_created"
    );
  }

  for connection in &graph.connections {
    uow.create_connection(connection).await?;
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use promap_blueprint::{ConnectionDescriptor, StepDescriptor, StepType};

  fn counter() -> impl FnMut() -> String {
    let mut n = 0;
    move || {
      n += 1;
      format!("id-{n}")
    }
  }

  fn chain(points: &[(f64, f64)]) -> TemplateData {
    let steps = points
      .iter()
      .enumerate()
      .map(|(i, (x, y))| StepDescriptor::new(format!("s{}", i + 1), "step", StepType::Task).at(*x, *y))
      .collect();
    let connections = (1..points.len())
      .map(|i| ConnectionDescriptor::new(format!("s{i}"), format!("s{}", i + 1)))
      .collect();
    TemplateData { steps, connections }
  }

  #[test]
  fn test_horizontal_chain_becomes_vertical() {
    let data = chain(&[(0.0, 0.0), (300.0, 0.0), (600.0, 0.0)]);
    let orientation = detect_orientation(&data);
    assert_eq!(orientation, Orientation::Horizontal);

    let plan = GraphPlan::build("p1", &data, orientation, counter());

    let positions: Vec<(f64, f64)> = plan
      .steps
      .iter()
      .map(|s| (s.position_x, s.position_y))
      .collect();
    assert_eq!(positions, vec![(0.0, 0.0), (0.0, 300.0), (0.0, 600.0)]);

    assert_eq!(plan.connections.len(), 2);
    assert_eq!(plan.connections[0].source_step_id, plan.steps[0].id);
    assert_eq!(plan.connections[0].target_step_id, plan.steps[1].id);
    assert_eq!(plan.connections[1].source_step_id, plan.steps[1].id);
    assert_eq!(plan.connections[1].target_step_id, plan.steps[2].id);
  }

  #[test]
  fn test_steps_keep_descriptor_order_and_fields() {
    let mut data = chain(&[(0.0, 0.0), (0.0, 100.0)]);
    data.steps[1].description = Some("Check the invoice".to_string());
    data.steps[1].duration = Some(30);
    data.steps[1].metadata = serde_json::json!({ "owner": "finance" });

    let plan = GraphPlan::build("p1", &data, Orientation::Vertical, counter());

    assert_eq!(plan.steps[0].order, 0);
    assert_eq!(plan.steps[1].order, 1);
    assert_eq!(plan.steps[1].description.as_deref(), Some("Check the invoice"));
    assert_eq!(plan.steps[1].duration, Some(30));
    assert_eq!(plan.steps[1].metadata["owner"], "finance");
    assert!(plan.steps.iter().all(|s| s.process_id == "p1"));
  }

  #[test]
  fn test_dangling_connection_is_dropped() {
    let mut data = chain(&[(0.0, 0.0), (0.0, 100.0), (0.0, 200.0)]);
    data
      .connections
      .insert(1, ConnectionDescriptor::new("s2", "s9"));

    let plan = GraphPlan::build("p1", &data, Orientation::Vertical, counter());

    assert_eq!(plan.connections.len(), 2);
    assert_eq!(plan.dropped.len(), 1);
    assert_eq!(plan.dropped[0].index, 1);
    assert_eq!(plan.dropped[0].target, "s9");
    assert_eq!(plan.dropped[0].missing, crate::MissingEndpoint::Target);
  }

  #[test]
  fn test_connections_never_carry_local_ids() {
    let data = chain(&[(0.0, 0.0), (0.0, 100.0)]);
    let plan = GraphPlan::build("p1", &data, Orientation::Vertical, counter());

    let step_ids: Vec<&str> = plan.steps.iter().map(|s| s.id.as_str()).collect();
    for connection in &plan.connections {
      assert!(step_ids.contains(&connection.source_step_id.as_str()));
      assert!(step_ids.contains(&connection.target_step_id.as_str()));
    }
  }

  #[test]
  fn test_duplicate_local_id_later_step_wins() {
    let data = TemplateData {
      steps: vec![
        StepDescriptor::new("s1", "first", StepType::Start),
        StepDescriptor::new("s1", "second", StepType::Task),
        StepDescriptor::new("s2", "end", StepType::End),
      ],
      connections: vec![ConnectionDescriptor::new("s1", "s2")],
    };

    let plan = GraphPlan::build("p1", &data, Orientation::Vertical, counter());

    assert_eq!(plan.steps.len(), 3);
    assert_eq!(plan.connections.len(), 1);
    assert_eq!(plan.connections[0].source_step_id, plan.steps[1].id);
  }

  #[test]
  fn test_empty_blueprint_plans_nothing() {
    let plan = GraphPlan::build("p1", &TemplateData::default(), Orientation::Vertical, counter());
    assert!(plan.steps.is_empty());
    assert!(plan.connections.is_empty());
    assert!(plan.dropped.is_empty());
    assert_eq!(detect_orientation(&TemplateData::default()), Orientation::Vertical);
  }
}
