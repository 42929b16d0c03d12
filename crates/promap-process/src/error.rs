use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
  #[error("connection {connection_id} references a step outside the process: {step_id}")]
  DanglingConnection {
    connection_id: String,
    step_id: String,
  },

  #[error("{kind} {id} belongs to process {actual}, expected {expected}")]
  ForeignRecord {
    kind: &'static str,
    id: String,
    expected: String,
    actual: String,
  },
}
