use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::connection::ConnectionDescriptor;
use crate::error::BlueprintError;
use crate::step::StepDescriptor;

/// The graph payload of a blueprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateData {
  /// Ordered; a step's index becomes its materialized `order`.
  #[serde(default)]
  pub steps: Vec<StepDescriptor>,
  #[serde(default)]
  pub connections: Vec<ConnectionDescriptor>,
}

/// The authorable part of a template, as found in an import file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintDef {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subcategory: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub industry: Option<String>,
  #[serde(default)]
  pub is_public: bool,
  #[serde(default)]
  pub template_data: TemplateData,
}

impl BlueprintDef {
  /// Parse a definition from JSON text.
  pub fn from_json(json: &str) -> Result<Self, BlueprintError> {
    Ok(serde_json::from_str(json)?)
  }

  /// Check the definition before it is stored in the catalog.
  ///
  /// Instantiation tolerates malformed graphs (dangling connections are
  /// dropped), but the catalog refuses definitions whose steps cannot be told
  /// apart.
  pub fn validate(&self) -> Result<(), BlueprintError> {
    if self.name.trim().is_empty() {
      return Err(BlueprintError::EmptyName);
    }

    let mut seen = HashSet::new();
    for (index, step) in self.template_data.steps.iter().enumerate() {
      if step.id.is_empty() {
        return Err(BlueprintError::EmptyStepId { index });
      }
      if !seen.insert(step.id.as_str()) {
        return Err(BlueprintError::DuplicateStepId {
          step_id: step.id.clone(),
        });
      }
    }

    Ok(())
  }
}

/// A template as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
  pub id: String,
  /// Owning organization. Private blueprints are only visible inside it.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub organization_id: Option<String>,
  #[serde(default)]
  pub usage_count: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_by: Option<String>,
  pub created_at: DateTime<Utc>,
  #[serde(flatten)]
  pub def: BlueprintDef,
}

impl Blueprint {
  /// Build a new catalog entry from a checked definition.
  ///
  /// A private blueprint without an owner would be visible to no one, so
  /// `organization_id` may only be omitted for public definitions.
  pub fn import(
    id: impl Into<String>,
    def: BlueprintDef,
    organization_id: Option<String>,
    created_by: Option<String>,
  ) -> Result<Self, BlueprintError> {
    def.validate()?;
    if organization_id.is_none() && !def.is_public {
      return Err(BlueprintError::MissingOwner);
    }

    Ok(Self {
      id: id.into(),
      organization_id,
      usage_count: 0,
      created_by,
      created_at: Utc::now(),
      def,
    })
  }

  pub fn name(&self) -> &str {
    &self.def.name
  }

  pub fn template_data(&self) -> &TemplateData {
    &self.def.template_data
  }

  pub fn is_visible_to(&self, organization_id: &str) -> bool {
    self.def.is_public || self.organization_id.as_deref() == Some(organization_id)
  }
}

/// Restricts catalog lookups to what one organization may see: public
/// blueprints plus its own private ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityFilter {
  pub organization_id: String,
}

impl VisibilityFilter {
  pub fn for_organization(organization_id: impl Into<String>) -> Self {
    Self {
      organization_id: organization_id.into(),
    }
  }

  pub fn permits(&self, blueprint: &Blueprint) -> bool {
    blueprint.is_visible_to(&self.organization_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::step::StepType;
  use serde_json::json;

  fn def_with_steps(ids: &[&str]) -> BlueprintDef {
    BlueprintDef {
      name: "Order to cash".to_string(),
      description: None,
      category: None,
      subcategory: None,
      industry: None,
      is_public: false,
      template_data: TemplateData {
        steps: ids
          .iter()
          .map(|id| StepDescriptor::new(*id, *id, StepType::Task))
          .collect(),
        connections: Vec::new(),
      },
    }
  }

  fn blueprint(is_public: bool, organization_id: Option<&str>) -> Blueprint {
    let mut def = def_with_steps(&["s1"]);
    def.is_public = is_public;
    Blueprint {
      id: "tpl-1".to_string(),
      organization_id: organization_id.map(str::to_string),
      usage_count: 0,
      created_by: None,
      created_at: Utc::now(),
      def,
    }
  }

  #[test]
  fn test_parse_camel_case_definition() {
    let def = BlueprintDef::from_json(
      &json!({
        "name": "Invoice approval",
        "category": "Finance",
        "industry": "Retail",
        "isPublic": true,
        "templateData": {
          "steps": [
            { "id": "s1", "name": "Start", "type": "START", "position": { "x": 0, "y": 0 } },
            { "id": "s2", "name": "Approve", "type": "USER_TASK", "positionX": 200, "positionY": 0 }
          ],
          "connections": [{ "source": "s1", "target": "s2" }]
        }
      })
      .to_string(),
    )
    .unwrap();

    assert!(def.is_public);
    assert_eq!(def.category.as_deref(), Some("Finance"));
    assert_eq!(def.template_data.steps.len(), 2);
    assert_eq!(def.template_data.connections.len(), 1);
  }

  #[test]
  fn test_validate_rejects_duplicate_step_ids() {
    let def = def_with_steps(&["s1", "s2", "s1"]);
    assert!(matches!(
      def.validate(),
      Err(BlueprintError::DuplicateStepId { step_id }) if step_id == "s1"
    ));
  }

  #[test]
  fn test_validate_rejects_empty_name_and_ids() {
    let mut def = def_with_steps(&["s1"]);
    def.name = "  ".to_string();
    assert!(matches!(def.validate(), Err(BlueprintError::EmptyName)));

    let def = def_with_steps(&["s1", ""]);
    assert!(matches!(
      def.validate(),
      Err(BlueprintError::EmptyStepId { index: 1 })
    ));
  }

  #[test]
  fn test_visibility() {
    let filter = VisibilityFilter::for_organization("org-a");

    assert!(filter.permits(&blueprint(true, Some("org-b"))));
    assert!(filter.permits(&blueprint(false, Some("org-a"))));
    assert!(!filter.permits(&blueprint(false, Some("org-b"))));
    assert!(!filter.permits(&blueprint(false, None)));
  }

  #[test]
  fn test_import_requires_owner_for_private_blueprint() {
    let private = def_with_steps(&["s1"]);
    let err = Blueprint::import("t1", private.clone(), None, None).unwrap_err();
    assert!(matches!(err, BlueprintError::MissingOwner));

    let owned = Blueprint::import("t1", private, Some("org-a".to_string()), None).unwrap();
    assert!(owned.is_visible_to("org-a"));
    assert!(!owned.is_visible_to("org-b"));
    assert_eq!(owned.usage_count, 0);
  }

  #[test]
  fn test_import_allows_unowned_public_blueprint() {
    let mut public = def_with_steps(&["s1"]);
    public.is_public = true;

    let system = Blueprint::import("t1", public, None, Some("admin".to_string())).unwrap();
    assert_eq!(system.organization_id, None);
    assert!(system.is_visible_to("any-org"));
  }

  #[test]
  fn test_import_validates_definition() {
    let err = Blueprint::import("t1", def_with_steps(&["s1", "s1"]), Some("org-a".to_string()), None)
      .unwrap_err();
    assert!(matches!(err, BlueprintError::DuplicateStepId { .. }));
  }
}
