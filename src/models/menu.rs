use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::common::require_non_empty;
use super::{CmsDocument, Collection};
use crate::error::{AppError, AppResult};

/// Nesting below a top-level item; a dropdown inside a dropdown is depth 2.
pub const MAX_MENU_DEPTH: usize = 3;

/// Placement slots the site layout renders menus into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuLocation {
    HeaderMain,
    HeaderTop,
    Mobile,
    FooterCol1,
    FooterCol2,
    FooterCol3,
    FooterCol4,
    FooterBottom,
}

impl MenuLocation {
    pub const ALL: [MenuLocation; 8] = [
        MenuLocation::HeaderMain,
        MenuLocation::HeaderTop,
        MenuLocation::Mobile,
        MenuLocation::FooterCol1,
        MenuLocation::FooterCol2,
        MenuLocation::FooterCol3,
        MenuLocation::FooterCol4,
        MenuLocation::FooterBottom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MenuLocation::HeaderMain => "header_main",
            MenuLocation::HeaderTop => "header_top",
            MenuLocation::Mobile => "mobile",
            MenuLocation::FooterCol1 => "footer_col_1",
            MenuLocation::FooterCol2 => "footer_col_2",
            MenuLocation::FooterCol3 => "footer_col_3",
            MenuLocation::FooterCol4 => "footer_col_4",
            MenuLocation::FooterBottom => "footer_bottom",
        }
    }
}

impl fmt::Display for MenuLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MenuLocation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MenuLocation::ALL
            .into_iter()
            .find(|location| location.as_str() == s)
            .ok_or_else(|| AppError::NotFound(format!("unknown menu location '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MegaMenuColumn {
    pub title: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuItem {
    Link {
        label: String,
        url: String,
        #[serde(default, rename = "openInNewTab")]
        open_in_new_tab: bool,
    },
    Button {
        label: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
    },
    Dropdown {
        label: String,
        #[serde(default)]
        children: Vec<MenuItem>,
    },
    MegaMenu {
        label: String,
        #[serde(default)]
        columns: Vec<MegaMenuColumn>,
    },
    /// Client-side behaviour such as opening the calculator modal.
    Action { label: String, action: String },
}

impl MenuItem {
    pub fn label(&self) -> &str {
        match self {
            MenuItem::Link { label, .. }
            | MenuItem::Button { label, .. }
            | MenuItem::Dropdown { label, .. }
            | MenuItem::MegaMenu { label, .. }
            | MenuItem::Action { label, .. } => label,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MenuItem::Link { .. } => "link",
            MenuItem::Button { .. } => "button",
            MenuItem::Dropdown { .. } => "dropdown",
            MenuItem::MegaMenu { .. } => "mega_menu",
            MenuItem::Action { .. } => "action",
        }
    }

    /// Every item in this subtree, depth-first, including `self`.
    pub fn walk(&self) -> Vec<&MenuItem> {
        let mut out = vec![self];
        match self {
            MenuItem::Dropdown { children, .. } => {
                for child in children {
                    out.extend(child.walk());
                }
            }
            MenuItem::MegaMenu { columns, .. } => {
                for column in columns {
                    for item in &column.items {
                        out.extend(item.walk());
                    }
                }
            }
            _ => {}
        }
        out
    }

    fn validate_at(&self, depth: usize, inside_container: bool) -> AppResult<()> {
        if depth > MAX_MENU_DEPTH {
            return Err(AppError::Validation(format!(
                "menu item '{}' nested deeper than {} levels",
                self.label(),
                MAX_MENU_DEPTH
            )));
        }
        require_non_empty("menu item label", self.label())?;
        match self {
            MenuItem::Link { url, .. } | MenuItem::Button { url, .. } => {
                require_non_empty(&format!("url of menu item '{}'", self.label()), url)
            }
            MenuItem::Action { action, .. } => {
                require_non_empty(&format!("action of menu item '{}'", self.label()), action)
            }
            MenuItem::Dropdown { children, .. } => {
                for child in children {
                    child.validate_at(depth + 1, true)?;
                }
                Ok(())
            }
            MenuItem::MegaMenu { label, columns } => {
                if inside_container {
                    return Err(AppError::Validation(format!(
                        "mega menu '{}' must be a top-level item",
                        label
                    )));
                }
                for column in columns {
                    require_non_empty("mega menu column title", &column.title)?;
                    for item in &column.items {
                        item.validate_at(depth + 1, true)?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuConfig {
    pub name: String,
    pub location: MenuLocation,
    #[serde(default)]
    pub items: Vec<MenuItem>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CmsDocument for MenuConfig {
    const COLLECTION: Collection = Collection::Menus;

    fn validate(&self) -> AppResult<()> {
        require_non_empty("name", &self.name)?;
        for item in &self.items {
            item.validate_at(1, false)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn menu(items: serde_json::Value) -> MenuConfig {
        serde_json::from_value(json!({
            "name": "Main",
            "location": "header_main",
            "items": items
        }))
        .unwrap()
    }

    #[test]
    fn test_tagged_items_parse() {
        let menu = menu(json!([
            {"type": "link", "label": "Home", "url": "/"},
            {"type": "dropdown", "label": "Guides", "children": [
                {"type": "link", "label": "Dubai", "url": "/locations/dubai", "openInNewTab": true}
            ]},
            {"type": "mega_menu", "label": "Free zones", "columns": [
                {"title": "Dubai", "items": [{"type": "link", "label": "DIFC", "url": "/free-zones/difc"}]}
            ]},
            {"type": "action", "label": "Calculate", "action": "open_calculator"}
        ]));
        assert!(menu.active);
        assert_eq!(menu.items.len(), 4);
        assert_eq!(menu.items[2].kind(), "mega_menu");
        assert_eq!(menu.items.iter().flat_map(|i| i.walk()).count(), 6);
        menu.validate().unwrap();
    }

    #[test]
    fn test_rejects_nested_mega_menu() {
        let menu = menu(json!([
            {"type": "dropdown", "label": "More", "children": [
                {"type": "mega_menu", "label": "Inner", "columns": []}
            ]}
        ]));
        assert!(menu.validate().is_err());
    }

    #[test]
    fn test_rejects_excessive_depth() {
        let menu = menu(json!([
            {"type": "dropdown", "label": "1", "children": [
                {"type": "dropdown", "label": "2", "children": [
                    {"type": "dropdown", "label": "3", "children": [
                        {"type": "link", "label": "4", "url": "/deep"}
                    ]}
                ]}
            ]}
        ]));
        assert!(menu.validate().is_err());
    }

    #[test]
    fn test_rejects_link_without_url() {
        let menu = menu(json!([{"type": "button", "label": "Go", "url": "  "}]));
        assert!(menu.validate().is_err());
    }

    #[test]
    fn test_location_round_trips_through_str() {
        for location in MenuLocation::ALL {
            assert_eq!(location.as_str().parse::<MenuLocation>().unwrap(), location);
        }
        assert!("sidebar".parse::<MenuLocation>().is_err());
    }
}
