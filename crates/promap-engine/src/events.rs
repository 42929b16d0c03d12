//! Instantiation events and notifiers for observability.
//!
//! Events are emitted while a template is materialized so consumers can
//! count dropped connections, audit template usage, stream progress, etc.

use promap_layout::Orientation;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Which endpoint(s) of a connection descriptor could not be remapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingEndpoint {
  Source,
  Target,
  Both,
}

/// A connection descriptor skipped during materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedConnection {
  /// Index of the descriptor in the blueprint's connection list.
  pub index: usize,
  /// Template-local source id as written in the blueprint.
  pub source: String,
  /// Template-local target id as written in the blueprint.
  pub target: String,
  pub missing: MissingEndpoint,
}

/// Events emitted during instantiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InstantiationEvent {
  /// A process graph is about to be written.
  InstantiationStarted {
    process_id: String,
    template_id: Option<String>,
    orientation: Orientation,
  },

  /// A connection descriptor was dropped; the instantiation continues.
  ConnectionDropped {
    process_id: String,
    connection: DroppedConnection,
  },

  /// The process graph was committed.
  InstantiationCompleted {
    process_id: String,
    template_id: Option<String>,
    steps: usize,
    connections: usize,
    dropped: usize,
  },

  /// Nothing was written.
  InstantiationFailed {
    template_id: Option<String>,
    error: String,
  },

  /// The graph was committed but the usage counter could not be advanced.
  UsageIncrementFailed { template_id: String, error: String },
}

/// Trait for receiving instantiation events.
///
/// The engine calls `notify` for each event; implementations decide what to
/// do with them (count, persist, broadcast, log, ignore, etc.).
pub trait InstantiationNotifier: Send + Sync {
  /// Called when an instantiation event occurs.
  fn notify(&self, event: InstantiationEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl InstantiationNotifier for NoopNotifier {
  fn notify(&self, _event: InstantiationEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<InstantiationEvent>,
}

impl ChannelNotifier {
  /// Create a new channel notifier.
  pub fn new(sender: mpsc::UnboundedSender<InstantiationEvent>) -> Self {
    Self { sender }
  }
}

impl InstantiationNotifier for ChannelNotifier {
  fn notify(&self, event: InstantiationEvent) {
    // Ignore send errors - receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
