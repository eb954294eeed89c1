// Default content for a fresh database: the location catalog and starter menus.
// Safe to run repeatedly; anything already present is left alone.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::{
    error::AppResult,
    infrastructure::document_store::DocumentStore,
    models::{MenuConfig, MenuItem, MenuLocation},
    services::{LocationService, Repository},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub locations: usize,
    pub menus: usize,
}

fn link(label: &str, url: &str) -> MenuItem {
    MenuItem::Link {
        label: label.to_string(),
        url: url.to_string(),
        open_in_new_tab: false,
    }
}

/// Starter menus for the header and footer slots.
pub fn default_menus() -> Vec<MenuConfig> {
    vec![
        MenuConfig {
            name: "Main navigation".to_string(),
            location: MenuLocation::HeaderMain,
            items: vec![
                link("Home", "/"),
                MenuItem::Dropdown {
                    label: "Calculators".to_string(),
                    children: vec![
                        link("Unlimited contract", "/unlimited-contract-gratuity"),
                        link("Limited contract", "/limited-contract-gratuity"),
                        link("DIFC", "/difc-gratuity"),
                        link("ADGM", "/adgm-gratuity"),
                    ],
                },
                link("UAE Labour Law", "/uae-labour-law"),
                link("Blog", "/blog"),
                link("FAQ", "/faq"),
                MenuItem::Button {
                    label: "Contact".to_string(),
                    url: "/contact".to_string(),
                    style: Some("primary".to_string()),
                },
            ],
            active: true,
        },
        MenuConfig {
            name: "Footer legal".to_string(),
            location: MenuLocation::FooterBottom,
            items: vec![
                link("Privacy Policy", "/privacy-policy"),
                link("Terms of Use", "/terms"),
                link("About", "/about"),
            ],
            active: true,
        },
    ]
}

pub async fn seed_defaults(store: Arc<dyn DocumentStore>) -> AppResult<SeedSummary> {
    let locations = LocationService::new(store.clone()).seed_catalog().await?;

    let menus = Repository::<MenuConfig>::new(store);
    let existing = menus.list().await?;
    let mut created_menus = 0;
    for menu in default_menus() {
        if existing.iter().any(|record| record.data.location == menu.location) {
            continue;
        }
        menus.create(&menu).await?;
        created_menus += 1;
    }

    info!(
        "Seeded {} locations and {} menus",
        locations, created_menus
    );
    Ok(SeedSummary {
        locations,
        menus: created_menus,
    })
}
