use serde::{Deserialize, Serialize};

/// A 2-D canvas position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

impl Position {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

/// Kind of a process step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum StepType {
  #[serde(alias = "start")]
  Start,
  #[serde(alias = "end")]
  End,
  #[serde(alias = "task")]
  Task,
  #[serde(alias = "user_task")]
  UserTask,
  #[serde(alias = "system_task")]
  SystemTask,
  #[serde(alias = "decision")]
  Decision,
  #[serde(alias = "parallel_gateway")]
  ParallelGateway,
  #[serde(alias = "inclusive_gateway")]
  InclusiveGateway,
  #[serde(alias = "event_gateway")]
  EventGateway,
  #[serde(alias = "subprocess")]
  Subprocess,
  #[serde(alias = "timer")]
  Timer,
  #[serde(alias = "message_event")]
  MessageEvent,
  #[serde(alias = "error_event")]
  ErrorEvent,
  #[serde(alias = "signal_event")]
  SignalEvent,
  #[serde(alias = "data_object")]
  DataObject,
  #[serde(alias = "group")]
  Group,
  #[serde(alias = "annotation")]
  Annotation,
}

impl StepType {
  /// Artifacts sit on the canvas but take no part in the flow.
  pub fn is_artifact(&self) -> bool {
    matches!(
      self,
      StepType::DataObject | StepType::Group | StepType::Annotation
    )
  }
}

/// A step inside a blueprint, addressed by its template-local `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
  /// Unique within the blueprint, never globally unique.
  pub id: String,
  pub name: String,
  #[serde(rename = "type")]
  pub step_type: StepType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// Expected duration in minutes.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration: Option<i32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub position: Option<Position>,
  /// Legacy flat coordinate, read only when `position` is absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub position_x: Option<f64>,
  /// Legacy flat coordinate, read only when `position` is absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub position_y: Option<f64>,
  #[serde(default = "empty_metadata")]
  pub metadata: serde_json::Value,
}

fn empty_metadata() -> serde_json::Value {
  serde_json::Value::Object(serde_json::Map::new())
}

impl StepDescriptor {
  pub fn new(id: impl Into<String>, name: impl Into<String>, step_type: StepType) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      step_type,
      description: None,
      duration: None,
      position: None,
      position_x: None,
      position_y: None,
      metadata: empty_metadata(),
    }
  }

  pub fn at(mut self, x: f64, y: f64) -> Self {
    self.position = Some(Position::new(x, y));
    self
  }

  /// The effective canvas position.
  ///
  /// `position` wins; otherwise each axis falls back to the legacy
  /// `positionX`/`positionY` fields, and finally to the origin.
  pub fn resolved_position(&self) -> Position {
    match self.position {
      Some(position) => position,
      None => Position {
        x: self.position_x.unwrap_or(0.0),
        y: self.position_y.unwrap_or(0.0),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_position_object_wins_over_legacy_fields() {
    let step: StepDescriptor = serde_json::from_value(json!({
      "id": "s1",
      "name": "Receive order",
      "type": "START",
      "position": { "x": 10.0, "y": 20.0 },
      "positionX": 99.0,
      "positionY": 99.0
    }))
    .unwrap();

    assert_eq!(step.resolved_position(), Position::new(10.0, 20.0));
  }

  #[test]
  fn test_legacy_position_fields_are_read_as_fallback() {
    let step: StepDescriptor = serde_json::from_value(json!({
      "id": "s1",
      "name": "Review",
      "type": "USER_TASK",
      "positionX": 150.0,
      "positionY": 75.5
    }))
    .unwrap();

    assert_eq!(step.resolved_position(), Position::new(150.0, 75.5));
  }

  #[test]
  fn test_missing_position_defaults_to_origin() {
    let step: StepDescriptor = serde_json::from_value(json!({
      "id": "s1",
      "name": "Review",
      "type": "task"
    }))
    .unwrap();

    assert_eq!(step.resolved_position(), Position::default());
    assert_eq!(step.step_type, StepType::Task);
    assert_eq!(step.metadata, json!({}));
  }

  #[test]
  fn test_unknown_step_type_is_rejected() {
    let result: Result<StepDescriptor, _> = serde_json::from_value(json!({
      "id": "s1",
      "name": "Mystery",
      "type": "TELEPORT"
    }));

    assert!(result.is_err());
  }

  #[test]
  fn test_artifact_types() {
    assert!(!StepType::ParallelGateway.is_artifact());
    assert!(StepType::Annotation.is_artifact());
    assert!(!StepType::Timer.is_artifact());
  }
}
