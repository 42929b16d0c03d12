use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use promap_blueprint::{Blueprint, VisibilityFilter};
use promap_process::{MaterializedProcess, Process, ProcessConnection, ProcessStep};

use crate::{Error, Store, UnitOfWork};

/// Operations of [`MemoryStore`] that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
  CreateProcess,
  CreateStep,
  CreateConnection,
  Commit,
  IncrementUsage,
}

#[derive(Debug, Default)]
struct State {
  blueprints: HashMap<String, Blueprint>,
  processes: Vec<Process>,
  steps: Vec<ProcessStep>,
  connections: Vec<ProcessConnection>,
}

/// In-memory store.
///
/// Clones share the same data, so a test can keep a handle while an engine
/// owns another. Writes made through a unit of work are staged privately and
/// applied under a single write lock on commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  state: Arc<RwLock<State>>,
  faults: Arc<Mutex<HashSet<FaultPoint>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Make every later call at `point` fail until [`clear_faults`](Self::clear_faults).
  pub fn fail_on(&self, point: FaultPoint) {
    self
      .faults
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .insert(point);
  }

  pub fn clear_faults(&self) {
    self
      .faults
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .clear();
  }

  /// Number of committed steps across all processes.
  pub fn step_count(&self) -> usize {
    self.read().steps.len()
  }

  /// Number of committed connections across all processes.
  pub fn connection_count(&self) -> usize {
    self.read().connections.len()
  }

  /// Number of committed processes.
  pub fn process_count(&self) -> usize {
    self.read().processes.len()
  }

  fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
    self.state.read().unwrap_or_else(|e| e.into_inner())
  }

  fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
    self.state.write().unwrap_or_else(|e| e.into_inner())
  }

  fn check(&self, point: FaultPoint) -> Result<(), Error> {
    check_fault(&self.faults, point)
  }
}

fn check_fault(faults: &Mutex<HashSet<FaultPoint>>, point: FaultPoint) -> Result<(), Error> {
  let faults = faults.lock().unwrap_or_else(|e| e.into_inner());
  if faults.contains(&point) {
    return Err(Error::Unavailable(format!("injected fault at {point:?}")));
  }
  Ok(())
}

#[async_trait]
impl Store for MemoryStore {
  async fn create_blueprint(&self, blueprint: &Blueprint) -> Result<(), Error> {
    self
      .write()
      .blueprints
      .insert(blueprint.id.clone(), blueprint.clone());
    Ok(())
  }

  async fn find_blueprint(
    &self,
    blueprint_id: &str,
    filter: &VisibilityFilter,
  ) -> Result<Option<Blueprint>, Error> {
    Ok(
      self
        .read()
        .blueprints
        .get(blueprint_id)
        .filter(|b| filter.permits(b))
        .cloned(),
    )
  }

  async fn list_blueprints(&self, filter: &VisibilityFilter) -> Result<Vec<Blueprint>, Error> {
    let mut blueprints: Vec<Blueprint> = self
      .read()
      .blueprints
      .values()
      .filter(|b| filter.permits(b))
      .cloned()
      .collect();
    blueprints.sort_by(|a, b| {
      b.usage_count
        .cmp(&a.usage_count)
        .then_with(|| a.name().cmp(b.name()))
    });
    Ok(blueprints)
  }

  async fn increment_usage(&self, blueprint_id: &str) -> Result<(), Error> {
    self.check(FaultPoint::IncrementUsage)?;
    match self.write().blueprints.get_mut(blueprint_id) {
      Some(blueprint) => {
        blueprint.usage_count += 1;
        Ok(())
      }
      None => Err(Error::NotFound(format!("template {blueprint_id}"))),
    }
  }

  async fn begin(&self) -> Result<Box<dyn UnitOfWork>, Error> {
    Ok(Box::new(MemoryUnitOfWork {
      state: self.state.clone(),
      faults: self.faults.clone(),
      processes: Vec::new(),
      steps: Vec::new(),
      connections: Vec::new(),
    }))
  }

  async fn get_process(&self, process_id: &str) -> Result<MaterializedProcess, Error> {
    let state = self.read();
    let process = state
      .processes
      .iter()
      .find(|p| p.id == process_id)
      .cloned()
      .ok_or_else(|| Error::NotFound(format!("process {process_id}")))?;

    let mut steps: Vec<ProcessStep> = state
      .steps
      .iter()
      .filter(|s| s.process_id == process_id)
      .cloned()
      .collect();
    steps.sort_by_key(|s| s.order);

    let connections = state
      .connections
      .iter()
      .filter(|c| c.process_id == process_id)
      .cloned()
      .collect();

    Ok(MaterializedProcess {
      process,
      steps,
      connections,
    })
  }

  async fn list_processes(&self, organization_id: &str) -> Result<Vec<Process>, Error> {
    let mut processes: Vec<Process> = self
      .read()
      .processes
      .iter()
      .filter(|p| p.organization_id == organization_id)
      .cloned()
      .collect();
    processes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(processes)
  }
}

struct MemoryUnitOfWork {
  state: Arc<RwLock<State>>,
  faults: Arc<Mutex<HashSet<FaultPoint>>>,
  processes: Vec<Process>,
  steps: Vec<ProcessStep>,
  connections: Vec<ProcessConnection>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
  async fn create_process(&mut self, process: &Process) -> Result<(), Error> {
    check_fault(&self.faults, FaultPoint::CreateProcess)?;
    self.processes.push(process.clone());
    Ok(())
  }

  async fn create_step(&mut self, step: &ProcessStep) -> Result<(), Error> {
    check_fault(&self.faults, FaultPoint::CreateStep)?;
    if !self.processes.iter().any(|p| p.id == step.process_id) {
      return Err(Error::NotFound(format!("process {}", step.process_id)));
    }
    self.steps.push(step.clone());
    Ok(())
  }

  async fn create_connection(&mut self, connection: &ProcessConnection) -> Result<(), Error> {
    check_fault(&self.faults, FaultPoint::CreateConnection)?;
    for endpoint in [&connection.source_step_id, &connection.target_step_id] {
      if !self.steps.iter().any(|s| &s.id == endpoint) {
        return Err(Error::NotFound(format!("step {endpoint}")));
      }
    }
    self.connections.push(connection.clone());
    Ok(())
  }

  async fn commit(self: Box<Self>) -> Result<(), Error> {
    check_fault(&self.faults, FaultPoint::Commit)?;
    let this = *self;
    let mut state = this.state.write().unwrap_or_else(|e| e.into_inner());
    state.processes.extend(this.processes);
    state.steps.extend(this.steps);
    state.connections.extend(this.connections);
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> Result<(), Error> {
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use promap_blueprint::{BlueprintDef, StepType, TemplateData};
  use promap_process::ProcessStatus;

  fn blueprint(id: &str, org: &str, is_public: bool, usage_count: i64) -> Blueprint {
    Blueprint {
      id: id.to_string(),
      organization_id: Some(org.to_string()),
      usage_count,
      created_by: None,
      created_at: Utc::now(),
      def: BlueprintDef {
        name: id.to_string(),
        description: None,
        category: None,
        subcategory: None,
        industry: None,
        is_public,
        template_data: TemplateData::default(),
      },
    }
  }

  fn process(id: &str) -> Process {
    Process {
      id: id.to_string(),
      name: "P".to_string(),
      description: None,
      status: ProcessStatus::Draft,
      version: 1,
      organization_id: "org-a".to_string(),
      created_by: "user".to_string(),
      category: None,
      template_id: None,
      created_at: Utc::now(),
    }
  }

  fn step(id: &str, process_id: &str) -> ProcessStep {
    ProcessStep {
      id: id.to_string(),
      process_id: process_id.to_string(),
      name: id.to_string(),
      step_type: StepType::Task,
      description: None,
      duration: None,
      position_x: 0.0,
      position_y: 0.0,
      order: 0,
      metadata: serde_json::json!({}),
    }
  }

  #[tokio::test]
  async fn test_find_respects_visibility() {
    let store = MemoryStore::new();
    store
      .create_blueprint(&blueprint("private", "org-b", false, 0))
      .await
      .unwrap();

    let outsider = VisibilityFilter::for_organization("org-a");
    let owner = VisibilityFilter::for_organization("org-b");

    assert!(store.find_blueprint("private", &outsider).await.unwrap().is_none());
    assert!(store.find_blueprint("private", &owner).await.unwrap().is_some());
    assert!(store.find_blueprint("missing", &owner).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_list_orders_by_usage() {
    let store = MemoryStore::new();
    store.create_blueprint(&blueprint("a", "org-a", true, 1)).await.unwrap();
    store.create_blueprint(&blueprint("b", "org-a", true, 5)).await.unwrap();
    store.create_blueprint(&blueprint("c", "org-z", false, 9)).await.unwrap();

    let listed = store
      .list_blueprints(&VisibilityFilter::for_organization("org-a"))
      .await
      .unwrap();

    let ids: Vec<&str> = listed.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
  }

  #[tokio::test]
  async fn test_uncommitted_writes_are_invisible() {
    let store = MemoryStore::new();
    let mut uow = store.begin().await.unwrap();
    uow.create_process(&process("p1")).await.unwrap();
    uow.create_step(&step("s1", "p1")).await.unwrap();

    assert_eq!(store.step_count(), 0);
    assert!(store.get_process("p1").await.is_err());

    drop(uow);
    assert_eq!(store.process_count(), 0);
  }

  #[tokio::test]
  async fn test_commit_publishes_everything() {
    let store = MemoryStore::new();
    let mut uow = store.begin().await.unwrap();
    uow.create_process(&process("p1")).await.unwrap();
    uow.create_step(&step("s1", "p1")).await.unwrap();
    uow.commit().await.unwrap();

    let materialized = store.get_process("p1").await.unwrap();
    assert_eq!(materialized.steps.len(), 1);
  }

  #[tokio::test]
  async fn test_connection_requires_staged_endpoints() {
    let store = MemoryStore::new();
    let mut uow = store.begin().await.unwrap();
    uow.create_process(&process("p1")).await.unwrap();
    uow.create_step(&step("s1", "p1")).await.unwrap();

    let result = uow
      .create_connection(&ProcessConnection {
        id: "c1".to_string(),
        process_id: "p1".to_string(),
        source_step_id: "s1".to_string(),
        target_step_id: "nope".to_string(),
        label: None,
        connection_type: Default::default(),
      })
      .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
  }

  #[tokio::test]
  async fn test_fault_injection() {
    let store = MemoryStore::new();
    store.create_blueprint(&blueprint("a", "org-a", true, 0)).await.unwrap();

    store.fail_on(FaultPoint::IncrementUsage);
    assert!(matches!(
      store.increment_usage("a").await,
      Err(Error::Unavailable(_))
    ));

    store.clear_faults();
    store.increment_usage("a").await.unwrap();
    let found = store
      .find_blueprint("a", &VisibilityFilter::for_organization("org-a"))
      .await
      .unwrap()
      .unwrap();
    assert_eq!(found.usage_count, 1);
  }
}
