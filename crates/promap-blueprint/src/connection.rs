use serde::{Deserialize, Serialize};

/// Kind of transition between two steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ConnectionType {
  #[default]
  #[serde(alias = "sequence")]
  Sequence,
  #[serde(alias = "conditional")]
  Conditional,
  #[serde(alias = "default")]
  Default,
  #[serde(alias = "message")]
  Message,
  #[serde(alias = "association")]
  Association,
}

/// A directed edge between two template-local step identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDescriptor {
  #[serde(alias = "sourceId", alias = "sourceStepId")]
  pub source: String,
  #[serde(alias = "targetId", alias = "targetStepId")]
  pub target: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  #[serde(default, rename = "type")]
  pub connection_type: ConnectionType,
}

impl ConnectionDescriptor {
  pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      source: source.into(),
      target: target.into(),
      label: None,
      connection_type: ConnectionType::default(),
    }
  }

  pub fn labeled(mut self, label: impl Into<String>) -> Self {
    self.label = Some(label.into());
    self
  }
}
