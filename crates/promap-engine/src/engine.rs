//! Template instantiation.
//!
//! The `TemplateEngine` looks up a blueprint, plans its graph under fresh
//! identifiers and writes the result through a single unit of work.

use std::sync::Arc;

use chrono::Utc;
use promap_blueprint::{Blueprint, TemplateData, VisibilityFilter};
use promap_layout::Orientation;
use promap_process::{MaterializedProcess, Process, ProcessStatus};
use promap_store::Store;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::InstantiateError;
use crate::events::{InstantiationEvent, InstantiationNotifier, NoopNotifier};
use crate::materialize::{GraphPlan, detect_orientation, write_graph};
use crate::stats::EngineStats;
use crate::usage::UsageTracker;

/// Caller-supplied replacements for blueprint fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
  pub name: Option<String>,
  pub description: Option<String>,
}

/// A request to create a process from a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateRequest {
  pub template_id: String,
  #[serde(default)]
  pub overrides: Overrides,
  pub organization_id: String,
  pub actor_id: String,
}

impl InstantiateRequest {
  pub fn new(
    template_id: impl Into<String>,
    organization_id: impl Into<String>,
    actor_id: impl Into<String>,
  ) -> Self {
    Self {
      template_id: template_id.into(),
      overrides: Overrides::default(),
      organization_id: organization_id.into(),
      actor_id: actor_id.into(),
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.overrides.name = Some(name.into());
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.overrides.description = Some(description.into());
    self
  }
}

/// A process graph produced outside the catalog, e.g. by a generator.
///
/// Positions are taken as given and no usage counter is touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedProcess {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub template_data: TemplateData,
}

/// The template instantiation engine.
///
/// Generic over `N: InstantiationNotifier` to allow different notification
/// strategies. Use `TemplateEngine::new()` for an engine that discards
/// events, or `TemplateEngine::with_notifier()` to observe them.
pub struct TemplateEngine<S: Store, N: InstantiationNotifier = NoopNotifier> {
  store: Arc<S>,
  usage: UsageTracker<S>,
  config: EngineConfig,
  notifier: N,
  stats: EngineStats,
}

impl<S: Store> TemplateEngine<S, NoopNotifier> {
  /// Create a new engine with no-op notifications.
  pub fn new(store: S, config: EngineConfig) -> Self {
    Self::with_notifier(Arc::new(store), config, NoopNotifier)
  }
}

impl<S: Store, N: InstantiationNotifier> TemplateEngine<S, N> {
  /// Create a new engine over a shared store with a custom notifier.
  pub fn with_notifier(store: Arc<S>, config: EngineConfig, notifier: N) -> Self {
    Self {
      usage: UsageTracker::new(store.clone()),
      store,
      config,
      notifier,
      stats: EngineStats::default(),
    }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn stats(&self) -> &EngineStats {
    &self.stats
  }

  /// Create a new process from a blueprint.
  ///
  /// Either the whole graph is created or none of it is. Connections whose
  /// endpoints cannot be resolved are skipped and reported through the
  /// notifier. The blueprint's usage counter is advanced after the graph is
  /// committed; a failure there is reported but does not fail the call.
  #[instrument(
    skip(self, request),
    fields(template_id = %request.template_id, organization_id = %request.organization_id)
  )]
  pub async fn instantiate(
    &self,
    request: InstantiateRequest,
  ) -> Result<MaterializedProcess, InstantiateError> {
    let template_id = request.template_id.clone();
    let result = self.instantiate_inner(request).await;
    if let Err(e) = &result {
      self.report_failure(Some(template_id), e);
    }
    result
  }

  /// Persist a generated graph as a new process.
  ///
  /// Uses the same two-phase, all-or-nothing write as [`instantiate`],
  /// without a catalog lookup, a layout transform or a usage increment.
  ///
  /// [`instantiate`]: Self::instantiate
  #[instrument(skip(self, draft), fields(organization_id = %organization_id))]
  pub async fn materialize_generated(
    &self,
    draft: GeneratedProcess,
    organization_id: &str,
    actor_id: &str,
  ) -> Result<MaterializedProcess, InstantiateError> {
    let result = self
      .materialize_generated_inner(draft, organization_id, actor_id)
      .await;
    if let Err(e) = &result {
      self.report_failure(None, e);
    }
    result
  }

  async fn instantiate_inner(
    &self,
    request: InstantiateRequest,
  ) -> Result<MaterializedProcess, InstantiateError> {
    let Overrides { name, description } = self.validate_overrides(request.overrides)?;

    let filter = VisibilityFilter::for_organization(&request.organization_id);
    let blueprint = self
      .store
      .find_blueprint(&request.template_id, &filter)
      .await?
      .ok_or_else(|| InstantiateError::NotFound {
        template_id: request.template_id.clone(),
      })?;

    let orientation = if self.config.normalize_orientation {
      detect_orientation(blueprint.template_data())
    } else {
      Orientation::Vertical
    };

    let process = Process {
      id: uuid::Uuid::new_v4().to_string(),
      name: name.unwrap_or_else(|| blueprint.name().to_string()),
      description: description.or_else(|| blueprint.def.description.clone()),
      status: ProcessStatus::Draft,
      version: 1,
      organization_id: request.organization_id,
      created_by: request.actor_id,
      category: blueprint.def.category.clone(),
      template_id: Some(blueprint.id.clone()),
      created_at: Utc::now(),
    };

    let graph = self
      .commit_graph(process, blueprint.template_data(), orientation)
      .await?;

    self.record_usage(&blueprint).await;

    Ok(graph)
  }

  async fn materialize_generated_inner(
    &self,
    draft: GeneratedProcess,
    organization_id: &str,
    actor_id: &str,
  ) -> Result<MaterializedProcess, InstantiateError> {
    let Overrides { name, description } = self.validate_overrides(Overrides {
      name: Some(draft.name),
      description: draft.description,
    })?;

    let process = Process {
      id: uuid::Uuid::new_v4().to_string(),
      name: name.unwrap_or_default(),
      description,
      status: ProcessStatus::Draft,
      version: 1,
      organization_id: organization_id.to_string(),
      created_by: actor_id.to_string(),
      category: draft.category,
      template_id: None,
      created_at: Utc::now(),
    };

    self
      .commit_graph(process, &draft.template_data, Orientation::Vertical)
      .await
  }

  /// Trim the name and check both fields against the configured limits.
  fn validate_overrides(&self, overrides: Overrides) -> Result<Overrides, InstantiateError> {
    let name = match overrides.name {
      Some(name) => {
        let name = name.trim();
        if name.is_empty() {
          return Err(InstantiateError::validation("name", "must not be empty"));
        }
        if name.chars().count() > self.config.max_name_length {
          return Err(InstantiateError::validation(
            "name",
            format!(
              "must be at most {} characters",
              self.config.max_name_length
            ),
          ));
        }
        Some(name.to_string())
      }
      None => None,
    };

    if let Some(description) = &overrides.description
      && description.chars().count() > self.config.max_description_length
    {
      return Err(InstantiateError::validation(
        "description",
        format!(
          "must be at most {} characters",
          self.config.max_description_length
        ),
      ));
    }

    Ok(Overrides {
      name,
      description: overrides.description,
    })
  }

  /// Plan and write one process graph, all or nothing.
  async fn commit_graph(
    &self,
    process: Process,
    data: &TemplateData,
    orientation: Orientation,
  ) -> Result<MaterializedProcess, InstantiateError> {
    let process_id = process.id.clone();
    let template_id = process.template_id.clone();

    info!(
      process_id = %process_id,
      template_id = ?template_id,
      orientation = ?orientation,
      steps = data.steps.len(),
      connections = data.connections.len(),
      "instantiation_started"
    );
    self.notifier.notify(InstantiationEvent::InstantiationStarted {
      process_id: process_id.clone(),
      template_id: template_id.clone(),
      orientation,
    });

    let GraphPlan {
      steps,
      connections,
      dropped,
      ..
    } = GraphPlan::build(&process_id, data, orientation, || {
      uuid::Uuid::new_v4().to_string()
    });

    let graph = MaterializedProcess {
      process,
      steps,
      connections,
    };
    graph.validate()?;

    let mut uow = self.store.begin().await?;
    if let Err(e) = write_graph(uow.as_mut(), &graph).await {
      if let Err(rollback_error) = uow.rollback().await {
        warn!(
          process_id = %process_id,
          error = %rollback_error,
          "rollback_failed"
        );
      }
      return Err(e.into());
    }
    uow.commit().await?;

    for connection in dropped.iter() {
      warn!(
        process_id = %process_id,
        index = connection.index,
        source = %connection.source,
        target = %connection.target,
        missing = ?connection.missing,
        "connection_dropped"
      );
      self.notifier.notify(InstantiationEvent::ConnectionDropped {
        process_id: process_id.clone(),
        connection: connection.clone(),
      });
    }
    self.stats.record_dropped(dropped.len());
    self.stats.record_instantiation();

    info!(
      process_id = %process_id,
      steps = graph.steps.len(),
      connections = graph.connections.len(),
      dropped = dropped.len(),
      "instantiation_completed"
    );
    self.notifier.notify(InstantiationEvent::InstantiationCompleted {
      process_id,
      template_id,
      steps: graph.steps.len(),
      connections: graph.connections.len(),
      dropped: dropped.len(),
    });

    Ok(graph)
  }

  /// Advance the usage counter. Failures are reported, never returned.
  async fn record_usage(&self, blueprint: &Blueprint) {
    if let Err(e) = self.usage.increment(&blueprint.id).await {
      warn!(template_id = %blueprint.id, error = %e, "usage_increment_failed");
      self.stats.record_usage_failure();
      self.notifier.notify(InstantiationEvent::UsageIncrementFailed {
        template_id: blueprint.id.clone(),
        error: e.to_string(),
      });
    }
  }

  fn report_failure(&self, template_id: Option<String>, error: &InstantiateError) {
    warn!(
      template_id = ?template_id,
      error = %error,
      status = error.status_code(),
      "instantiation_failed"
    );
    self.stats.record_failure();
    self.notifier.notify(InstantiationEvent::InstantiationFailed {
      template_id,
      error: error.to_string(),
    });
  }
}
