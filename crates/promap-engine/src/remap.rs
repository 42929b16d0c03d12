use std::collections::HashMap;

use promap_blueprint::ConnectionDescriptor;

use crate::events::MissingEndpoint;

/// Template-local step id to materialized step id, for one instantiation.
///
/// Populated in step order and thrown away when the instantiation ends.
#[derive(Debug, Clone, Default)]
pub struct IdRemap {
  ids: HashMap<String, String>,
}

impl IdRemap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a mapping, returning the id it replaced if `local_id` was
  /// already mapped.
  pub fn insert(
    &mut self,
    local_id: impl Into<String>,
    generated_id: impl Into<String>,
  ) -> Option<String> {
    self.ids.insert(local_id.into(), generated_id.into())
  }

  pub fn resolve(&self, local_id: &str) -> Option<&str> {
    self.ids.get(local_id).map(String::as_str)
  }

  /// Resolve both endpoints of a connection descriptor.
  pub fn resolve_connection(
    &self,
    connection: &ConnectionDescriptor,
  ) -> Result<(&str, &str), MissingEndpoint> {
    match (
      self.resolve(&connection.source),
      self.resolve(&connection.target),
    ) {
      (Some(source), Some(target)) => Ok((source, target)),
      (None, Some(_)) => Err(MissingEndpoint::Source),
      (Some(_), None) => Err(MissingEndpoint::Target),
      (None, None) => Err(MissingEndpoint::Both),
    }
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }
}
