// Public menu and widget lookups.

use serde::Serialize;
use std::sync::Arc;

use super::repository::{Record, Repository};
use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::DocumentStore;
use crate::models::{MenuConfig, MenuItem, MenuLocation, Widget};

/// A navigable entry in a menu, flattened out of its tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuLink {
    pub label: String,
    pub url: String,
}

/// Every link and button URL in the menu, depth-first. Used for sitemap and link checks.
pub fn menu_links(menu: &MenuConfig) -> Vec<MenuLink> {
    menu.items
        .iter()
        .flat_map(MenuItem::walk)
        .filter_map(|item| match item {
            MenuItem::Link { label, url, .. } | MenuItem::Button { label, url, .. } => Some(MenuLink {
                label: label.clone(),
                url: url.clone(),
            }),
            _ => None,
        })
        .collect()
}

#[derive(Clone)]
pub struct MenuService {
    menus: Repository<MenuConfig>,
    widgets: Repository<Widget>,
}

impl MenuService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            menus: Repository::new(store.clone()),
            widgets: Repository::new(store),
        }
    }

    /// The active menu for a slot. With several active menus the most recently edited wins.
    pub async fn active_menu(&self, location: MenuLocation) -> AppResult<Record<MenuConfig>> {
        self.menus
            .list()
            .await?
            .into_iter()
            .filter(|record| record.data.active && record.data.location == location)
            .max_by_key(|record| record.updated_at)
            .ok_or_else(|| AppError::NotFound(format!("no active menu for '{}'", location)))
    }

    /// Active widgets for a placement, ordered by `order`.
    pub async fn widgets_for(&self, placement: &str) -> AppResult<Vec<Record<Widget>>> {
        let mut widgets: Vec<Record<Widget>> = self
            .widgets
            .list()
            .await?
            .into_iter()
            .filter(|record| record.data.active && record.data.placement == placement)
            .collect();
        widgets.sort_by_key(|record| (record.data.order, record.created_at));
        Ok(widgets)
    }
}
