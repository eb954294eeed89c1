use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::require_non_empty;
use super::{CmsDocument, Collection};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Calculator,
    CallToAction,
    Faq,
    Html,
    Newsletter,
}

/// Reusable block placed into a named page region (e.g. `sidebar`, `home_hero`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub name: String,
    pub kind: WidgetKind,
    pub placement: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub config: Value,
}

fn default_active() -> bool {
    true
}

impl CmsDocument for Widget {
    const COLLECTION: Collection = Collection::Widgets;

    fn validate(&self) -> AppResult<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("placement", &self.placement)?;
        if !(self.config.is_null() || self.config.is_object()) {
            return Err(AppError::Validation(
                "widget config must be an object".to_string(),
            ));
        }
        Ok(())
    }
}
