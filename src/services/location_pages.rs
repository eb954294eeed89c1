// Location pages - one templated page per emirate, free zone and landmark,
// plus the built-in catalog used to seed them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::repository::{Record, Repository};
use crate::calculator::{
    calculate, ContractType, GratuityBreakdown, GratuityInput, CAP_MONTHS, FIRST_TIER_DAYS_PER_YEAR,
    FIRST_TIER_YEARS, SECOND_TIER_DAYS_PER_YEAR,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::DocumentStore;
use crate::models::{Faq, Location, LocationKind, Status};
use crate::seo::schema_org::{self, Breadcrumb};
use crate::seo::{MetadataInput, PageMetadata, SiteInfo};

/// Salary and service length used for the worked example on every page.
pub const EXAMPLE_SALARY: f64 = 10_000.0;
pub const EXAMPLE_YEARS: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogLocation {
    pub slug: &'static str,
    pub name: &'static str,
    pub kind: LocationKind,
    pub emirate: &'static str,
    pub contract_type: ContractType,
    pub coordinates: Option<(f64, f64)>,
}

const fn entry(
    slug: &'static str,
    name: &'static str,
    kind: LocationKind,
    emirate: &'static str,
    contract_type: ContractType,
    coordinates: Option<(f64, f64)>,
) -> CatalogLocation {
    CatalogLocation {
        slug,
        name,
        kind,
        emirate,
        contract_type,
        coordinates,
    }
}

use ContractType::{Adgm, Difc, Unlimited};
use LocationKind::{Emirate, FreeZone, Landmark};

pub const LOCATION_CATALOG: &[CatalogLocation] = &[
    entry("dubai", "Dubai", Emirate, "Dubai", Unlimited, Some((25.2048, 55.2708))),
    entry("abu-dhabi", "Abu Dhabi", Emirate, "Abu Dhabi", Unlimited, Some((24.4539, 54.3773))),
    entry("sharjah", "Sharjah", Emirate, "Sharjah", Unlimited, Some((25.3463, 55.4209))),
    entry("ajman", "Ajman", Emirate, "Ajman", Unlimited, Some((25.4052, 55.5136))),
    entry("umm-al-quwain", "Umm Al Quwain", Emirate, "Umm Al Quwain", Unlimited, Some((25.5647, 55.5552))),
    entry("ras-al-khaimah", "Ras Al Khaimah", Emirate, "Ras Al Khaimah", Unlimited, Some((25.8007, 55.9762))),
    entry("fujairah", "Fujairah", Emirate, "Fujairah", Unlimited, Some((25.1288, 56.3265))),
    entry("difc", "DIFC", FreeZone, "Dubai", Difc, Some((25.2116, 55.2797))),
    entry("adgm", "ADGM", FreeZone, "Abu Dhabi", Adgm, Some((24.5015, 54.3890))),
    entry("jafza", "Jebel Ali Free Zone", FreeZone, "Dubai", Unlimited, Some((24.9857, 55.0913))),
    entry("dmcc", "DMCC", FreeZone, "Dubai", Unlimited, Some((25.0693, 55.1413))),
    entry("dubai-internet-city", "Dubai Internet City", FreeZone, "Dubai", Unlimited, Some((25.0955, 55.1605))),
    entry("dubai-silicon-oasis", "Dubai Silicon Oasis", FreeZone, "Dubai", Unlimited, Some((25.1181, 55.3838))),
    entry("kizad", "KEZAD", FreeZone, "Abu Dhabi", Unlimited, None),
    entry("saif-zone", "SAIF Zone", FreeZone, "Sharjah", Unlimited, Some((25.3287, 55.5172))),
    entry("rakez", "RAKEZ", FreeZone, "Ras Al Khaimah", Unlimited, None),
    entry("dubai-marina", "Dubai Marina", Landmark, "Dubai", Unlimited, Some((25.0805, 55.1403))),
    entry("downtown-dubai", "Downtown Dubai", Landmark, "Dubai", Unlimited, Some((25.1972, 55.2744))),
    entry("business-bay", "Business Bay", Landmark, "Dubai", Unlimited, Some((25.1857, 55.2650))),
    entry("jumeirah-lakes-towers", "Jumeirah Lakes Towers", Landmark, "Dubai", Unlimited, Some((25.0693, 55.1413))),
    entry("al-reem-island", "Al Reem Island", Landmark, "Abu Dhabi", Unlimited, Some((24.4990, 54.4066))),
];

impl CatalogLocation {
    pub fn to_location(&self) -> Location {
        Location {
            slug: self.slug.to_string(),
            name: self.name.to_string(),
            kind: self.kind,
            emirate: self.emirate.to_string(),
            description: None,
            contract_type: self.contract_type,
            address: None,
            latitude: self.coordinates.map(|(lat, _)| lat),
            longitude: self.coordinates.map(|(_, lng)| lng),
            status: Status::Published,
            publish_at: None,
            seo: None,
            faqs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRule {
    pub contract_type: ContractType,
    pub summary: String,
    pub example: Option<GratuityBreakdown>,
}

/// Everything the site needs to render a location page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPage {
    pub path: String,
    pub heading: String,
    pub intro: String,
    pub rule: CalculationRule,
    pub faqs: Vec<Faq>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub metadata: PageMetadata,
    pub json_ld: Vec<Value>,
    pub location: Location,
}

/// "AED 12,345.67", or without decimals for whole amounts.
pub fn format_aed(amount: f64) -> String {
    let fils = (amount * 100.0).round() as i64;
    let whole = (fils / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match fils % 100 {
        0 => format!("AED {}", grouped),
        cents => format!("AED {}.{:02}", grouped, cents),
    }
}

fn regime_name(contract_type: ContractType) -> &'static str {
    match contract_type {
        ContractType::Difc => "DIFC Employment Law",
        ContractType::Adgm => "ADGM Employment Regulations",
        ContractType::Unlimited | ContractType::Limited => "UAE Labour Law",
    }
}

pub fn calculation_rule(contract_type: ContractType) -> CalculationRule {
    let summary = if contract_type.is_flat_rate() {
        format!(
            "Under {} gratuity accrues at {} days of basic salary for every year of service, \
             with no higher tier, capped at {} months of basic salary.",
            regime_name(contract_type),
            FIRST_TIER_DAYS_PER_YEAR,
            CAP_MONTHS
        )
    } else {
        format!(
            "Under {} gratuity is {} days of basic salary for each of the first {} years of service \
             and {} days for every year after that, capped at {} months of basic salary. \
             At least one year of continuous service is required.",
            regime_name(contract_type),
            FIRST_TIER_DAYS_PER_YEAR,
            FIRST_TIER_YEARS,
            SECOND_TIER_DAYS_PER_YEAR,
            CAP_MONTHS
        )
    };
    let example = calculate(&GratuityInput {
        basic_salary: EXAMPLE_SALARY,
        years_of_service: EXAMPLE_YEARS,
        contract_type,
    })
    .ok();
    CalculationRule {
        contract_type,
        summary,
        example,
    }
}

fn default_intro(location: &Location) -> String {
    match location.kind {
        LocationKind::Emirate => format!(
            "Calculate your end-of-service gratuity if you work in {}. Enter your basic salary and \
             service period to see what your employer owes you under {}.",
            location.name,
            regime_name(location.contract_type)
        ),
        LocationKind::FreeZone => format!(
            "Working in {} in {}? Free zone employees are covered by {}. Use the calculator to \
             estimate your end-of-service benefit.",
            location.name,
            location.emirate,
            regime_name(location.contract_type)
        ),
        LocationKind::Landmark => format!(
            "Employees based around {}, {} can estimate their end-of-service gratuity in seconds \
             with our free calculator.",
            location.name, location.emirate
        ),
    }
}

/// Questions shown when the CMS record has none of its own.
fn default_faqs(location: &Location, rule: &CalculationRule) -> Vec<Faq> {
    let mut faqs = vec![
        Faq {
            question: format!("How is gratuity calculated in {}?", location.name),
            answer: rule.summary.clone(),
        },
        Faq {
            question: format!("Am I eligible for gratuity in {}?", location.name),
            answer: "Employees who complete at least one year of continuous service are entitled \
                     to an end-of-service gratuity based on their last basic salary."
                .to_string(),
        },
    ];
    if let Some(example) = &rule.example {
        faqs.push(Faq {
            question: format!(
                "How much gratuity is {} after {} years?",
                format_aed(EXAMPLE_SALARY),
                EXAMPLE_YEARS
            ),
            answer: format!(
                "With a basic salary of {} and {} years of service in {}, the gratuity is {}.",
                format_aed(EXAMPLE_SALARY),
                EXAMPLE_YEARS,
                location.name,
                format_aed(example.total)
            ),
        });
    }
    faqs
}

pub fn build_location_page(location: &Location, site: &SiteInfo) -> LocationPage {
    let path = location.path();
    let heading = format!("Gratuity Calculator {}", location.name);
    let intro = location
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| default_intro(location));
    let rule = calculation_rule(location.contract_type);
    let faqs = if location.faqs.is_empty() {
        default_faqs(location, &rule)
    } else {
        location.faqs.clone()
    };
    let breadcrumbs = vec![
        Breadcrumb::new("Home", "/"),
        Breadcrumb::new(location.kind.label(), location.kind.path_prefix()),
        Breadcrumb::new(location.name.clone(), path.clone()),
    ];

    let metadata = PageMetadata::build(
        &MetadataInput {
            path: &path,
            title: &heading,
            fallback_description: Some(intro.as_str()),
            seo: location.seo.as_ref(),
            og_type: "website",
        },
        site,
    );

    let mut json_ld = vec![schema_org::breadcrumb_list(&breadcrumbs, site)];
    json_ld.extend(schema_org::faq_page(&faqs));
    json_ld.push(schema_org::local_business(location, site));

    LocationPage {
        path,
        heading,
        intro,
        rule,
        faqs,
        breadcrumbs,
        metadata,
        json_ld,
        location: location.clone(),
    }
}

#[derive(Clone)]
pub struct LocationService {
    repo: Repository<Location>,
}

impl LocationService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    pub async fn list_live(&self, now: DateTime<Utc>) -> AppResult<Vec<Record<Location>>> {
        let mut locations = self.repo.list_live(now).await?;
        locations.sort_by(|a, b| a.data.name.cmp(&b.data.name));
        Ok(locations)
    }

    pub async fn page_for(&self, slug: &str, site: &SiteInfo, now: DateTime<Utc>) -> AppResult<LocationPage> {
        let record = self
            .repo
            .find_live_by_slug(slug, now)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("location '{}' not found", slug)))?;
        Ok(build_location_page(&record.data, site))
    }

    /// Create a published record for each catalog entry whose slug is not yet taken.
    pub async fn seed_catalog(&self) -> AppResult<usize> {
        let existing: HashSet<String> = self
            .repo
            .list()
            .await?
            .into_iter()
            .map(|record| record.data.slug)
            .collect();
        let mut created = 0;
        for entry in LOCATION_CATALOG.iter().filter(|e| !existing.contains(e.slug)) {
            self.repo.create(&entry.to_location()).await?;
            created += 1;
        }
        info!("Seeded {} of {} catalog locations", created, LOCATION_CATALOG.len());
        Ok(created)
    }
}
