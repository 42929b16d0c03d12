use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Running counters kept by a [`TemplateEngine`](crate::TemplateEngine).
#[derive(Debug, Default)]
pub struct EngineStats {
  instantiations: AtomicU64,
  failed_instantiations: AtomicU64,
  dropped_connections: AtomicU64,
  usage_increment_failures: AtomicU64,
}

/// A point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
  pub instantiations: u64,
  pub failed_instantiations: u64,
  pub dropped_connections: u64,
  pub usage_increment_failures: u64,
}

impl EngineStats {
  pub(crate) fn record_instantiation(&self) {
    self.instantiations.fetch_add(1, Ordering::Relaxed);
  }

  pub(crate) fn record_failure(&self) {
    self.failed_instantiations.fetch_add(1, Ordering::Relaxed);
  }

  pub(crate) fn record_dropped(&self, count: usize) {
    self
      .dropped_connections
      .fetch_add(count as u64, Ordering::Relaxed);
  }

  pub(crate) fn record_usage_failure(&self) {
    self.usage_increment_failures.fetch_add(1, Ordering::Relaxed);
  }

  pub fn snapshot(&self) -> StatsSnapshot {
    StatsSnapshot {
      instantiations: self.instantiations.load(Ordering::Relaxed),
      failed_instantiations: self.failed_instantiations.load(Ordering::Relaxed),
      dropped_connections: self.dropped_connections.load(Ordering::Relaxed),
      usage_increment_failures: self.usage_increment_failures.load(Ordering::Relaxed),
    }
  }
}
