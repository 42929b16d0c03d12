use thiserror::Error;

/// Errors raised when a blueprint definition is checked before it enters the
/// template catalog.
#[derive(Debug, Error)]
pub enum BlueprintError {
  #[error("blueprint name must not be empty")]
  EmptyName,

  #[error("step at index {index} has an empty id")]
  EmptyStepId { index: usize },

  #[error("duplicate step id: {step_id}")]
  DuplicateStepId { step_id: String },

  #[error("a private blueprint needs an owning organization")]
  MissingOwner,

  #[error("failed to parse blueprint: {0}")]
  Parse(#[from] serde_json::Error),
}
