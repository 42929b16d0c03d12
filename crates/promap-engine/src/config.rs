/// Configuration for the template engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Longest accepted process name, in characters.
  pub max_name_length: usize,
  /// Longest accepted process description, in characters.
  pub max_description_length: usize,
  /// Re-orient horizontally authored blueprints to top-to-bottom flow.
  pub normalize_orientation: bool,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      max_name_length: 255,
      max_description_length: 2000,
      normalize_orientation: true,
    }
  }
}
