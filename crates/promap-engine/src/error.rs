//! Error types for template instantiation.

use promap_process::ProcessError;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while instantiating a template.
///
/// Dropped connections are not errors and never appear here.
#[derive(Debug, Error)]
pub enum InstantiateError {
  /// The template does not exist or is not visible to the caller.
  #[error("template not found: {template_id}")]
  NotFound { template_id: String },

  /// The request was rejected before anything was written.
  #[error("invalid {field}: {message}")]
  Validation { field: &'static str, message: String },

  /// A storage operation failed; nothing was persisted.
  #[error("storage failure: {0}")]
  Persistence(#[from] promap_store::Error),

  /// The planned graph broke referential integrity; nothing was persisted.
  #[error("inconsistent process graph: {0}")]
  Integrity(#[from] ProcessError),
}

/// Structured error payload for an HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
  pub code: &'static str,
  pub message: String,
}

impl InstantiateError {
  pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation {
      field,
      message: message.into(),
    }
  }

  /// HTTP status this error maps to.
  pub fn status_code(&self) -> u16 {
    match self {
      InstantiateError::NotFound { .. } => 404,
      InstantiateError::Validation { .. } => 400,
      InstantiateError::Persistence(_) | InstantiateError::Integrity(_) => 500,
    }
  }

  /// Caller-facing body. Internal failures keep their details out of it.
  pub fn to_body(&self) -> ErrorBody {
    match self {
      InstantiateError::NotFound { .. } => ErrorBody {
        code: "NOT_FOUND",
        message: self.to_string(),
      },
      InstantiateError::Validation { .. } => ErrorBody {
        code: "VALIDATION_FAILED",
        message: self.to_string(),
      },
      InstantiateError::Persistence(_) | InstantiateError::Integrity(_) => ErrorBody {
        code: "INTERNAL_ERROR",
        message: "failed to create process from template".to_string(),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_codes() {
    let not_found = InstantiateError::NotFound {
      template_id: "t1".to_string(),
    };
    let invalid = InstantiateError::validation("name", "too long");
    let storage = InstantiateError::from(promap_store::Error::Unavailable("disk".to_string()));

    assert_eq!(not_found.status_code(), 404);
    assert_eq!(invalid.status_code(), 400);
    assert_eq!(storage.status_code(), 500);
  }

  #[test]
  fn test_internal_details_stay_out_of_body() {
    let storage = InstantiateError::from(promap_store::Error::Unavailable(
      "secret connection string".to_string(),
    ));
    let body = storage.to_body();

    assert_eq!(body.code, "INTERNAL_ERROR");
    assert!(!body.message.contains("secret"));
  }

  #[test]
  fn test_validation_body_names_field() {
    let body = InstantiateError::validation("name", "must not be empty").to_body();
    assert_eq!(body.code, "VALIDATION_FAILED");
    assert_eq!(body.message, "invalid name: must not be empty");
  }
}
