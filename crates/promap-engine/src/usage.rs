use std::sync::Arc;

use promap_store::Store;
use tracing::{debug, instrument};

/// Advances blueprint usage counters.
///
/// Each call adds exactly one. The store performs the addition atomically,
/// so concurrent callers never lose an increment.
pub struct UsageTracker<S: Store> {
  store: Arc<S>,
}

impl<S: Store> UsageTracker<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// Record one use of a blueprint.
  #[instrument(skip(self), fields(template_id = %template_id))]
  pub async fn increment(&self, template_id: &str) -> Result<(), promap_store::Error> {
    self.store.increment_usage(template_id).await?;
    debug!(template_id = %template_id, "usage_incremented");
    Ok(())
  }
}

impl<S: Store> Clone for UsageTracker<S> {
  fn clone(&self) -> Self {
    Self {
      store: self.store.clone(),
    }
  }
}
