use chrono::{DateTime, Utc};
use promap_blueprint::{Blueprint, BlueprintDef, TemplateData};
use sqlx::FromRow;
use sqlx::types::Json;

/// A blueprint as stored in the `templates` table.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct TemplateRow {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  pub category: Option<String>,
  pub subcategory: Option<String>,
  pub industry: Option<String>,
  pub is_public: bool,
  pub organization_id: Option<String>,
  pub usage_count: i64,
  pub template_data: Json<TemplateData>,
  pub created_by: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl From<TemplateRow> for Blueprint {
  fn from(row: TemplateRow) -> Self {
    Blueprint {
      id: row.id,
      organization_id: row.organization_id,
      usage_count: row.usage_count,
      created_by: row.created_by,
      created_at: row.created_at,
      def: BlueprintDef {
        name: row.name,
        description: row.description,
        category: row.category,
        subcategory: row.subcategory,
        industry: row.industry,
        is_public: row.is_public,
        template_data: row.template_data.0,
      },
    }
  }
}
