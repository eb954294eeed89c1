// Content sync - brings the site's built-in routes under CMS control by
// creating draft page documents for them on demand.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::repository::{Record, Repository};
use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::DocumentStore;
use crate::models::{Page, PageTemplate, RobotsDirectives, SeoMeta, Status};

/// A route the site serves whether or not the CMS has a page for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownRoute {
    pub slug: &'static str,
    pub path: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub template: PageTemplate,
}

pub const KNOWN_ROUTES: &[KnownRoute] = &[
    KnownRoute {
        slug: "home",
        path: "/",
        title: "UAE Gratuity Calculator",
        description: "Calculate your UAE end-of-service gratuity in seconds. Free calculator for mainland, DIFC and ADGM employees based on current UAE Labour Law.",
        template: PageTemplate::Calculator,
    },
    KnownRoute {
        slug: "about",
        path: "/about",
        title: "About Us",
        description: "Who builds the UAE Gratuity Calculator and how we keep our end-of-service benefit calculations in line with UAE Labour Law.",
        template: PageTemplate::Standard,
    },
    KnownRoute {
        slug: "contact",
        path: "/contact",
        title: "Contact Us",
        description: "Questions about your gratuity calculation? Contact the UAE Gratuity Calculator team and we will get back to you.",
        template: PageTemplate::Standard,
    },
    KnownRoute {
        slug: "uae-labour-law",
        path: "/uae-labour-law",
        title: "UAE Labour Law and Gratuity",
        description: "How UAE Labour Law calculates end-of-service gratuity: eligibility, the 21 and 30 day accrual tiers and the two-year cap.",
        template: PageTemplate::Landing,
    },
    KnownRoute {
        slug: "limited-contract-gratuity",
        path: "/limited-contract-gratuity",
        title: "Limited Contract Gratuity",
        description: "Gratuity for limited (fixed-term) contracts in the UAE, with worked examples for different salaries and service periods.",
        template: PageTemplate::Calculator,
    },
    KnownRoute {
        slug: "unlimited-contract-gratuity",
        path: "/unlimited-contract-gratuity",
        title: "Unlimited Contract Gratuity",
        description: "Gratuity for unlimited contracts in the UAE, including how resignation and termination are treated under current law.",
        template: PageTemplate::Calculator,
    },
    KnownRoute {
        slug: "difc-gratuity",
        path: "/difc-gratuity",
        title: "DIFC Gratuity Calculator",
        description: "Estimate end-of-service benefits for DIFC employees with the flat 21 days per year rule and the two-year cap.",
        template: PageTemplate::Calculator,
    },
    KnownRoute {
        slug: "adgm-gratuity",
        path: "/adgm-gratuity",
        title: "ADGM Gratuity Calculator",
        description: "Estimate end-of-service benefits for ADGM employees with the flat 21 days per year rule and the two-year cap.",
        template: PageTemplate::Calculator,
    },
    KnownRoute {
        slug: "faq",
        path: "/faq",
        title: "Gratuity FAQ",
        description: "Answers to the most common questions about UAE gratuity: eligibility, basic salary, unpaid leave, resignation and payment deadlines.",
        template: PageTemplate::Standard,
    },
    KnownRoute {
        slug: "privacy-policy",
        path: "/privacy-policy",
        title: "Privacy Policy",
        description: "How the UAE Gratuity Calculator handles the information you enter into the calculator and contact form.",
        template: PageTemplate::Legal,
    },
    KnownRoute {
        slug: "terms",
        path: "/terms",
        title: "Terms of Use",
        description: "Terms for using the UAE Gratuity Calculator. Results are estimates and do not replace advice from MOHRE or a legal adviser.",
        template: PageTemplate::Legal,
    },
];

pub fn find_route(slug: &str) -> Option<&'static KnownRoute> {
    KNOWN_ROUTES.iter().find(|route| route.slug == slug)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredPage {
    #[serde(flatten)]
    pub route: KnownRoute,
    pub synced: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Created { page: Record<Page> },
    AlreadySynced { page: Record<Page> },
}

/// Draft page carrying the route's title and default SEO.
pub fn skeleton_page(route: &KnownRoute) -> Page {
    Page {
        slug: route.slug.to_string(),
        title: route.title.to_string(),
        content: String::new(),
        excerpt: Some(route.description.to_string()),
        template: route.template,
        status: Status::Draft,
        publish_at: None,
        seo: Some(SeoMeta {
            title: Some(route.title.to_string()),
            description: Some(route.description.to_string()),
            focus_keyword: None,
            keywords: Vec::new(),
            canonical: Some(route.path.to_string()),
            robots: RobotsDirectives::default(),
            og_image: None,
        }),
        faqs: Vec::new(),
    }
}

#[derive(Clone)]
pub struct ContentSyncService {
    pages: Repository<Page>,
}

impl ContentSyncService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            pages: Repository::new(store),
        }
    }

    pub async fn discover_pages(&self) -> AppResult<Vec<DiscoveredPage>> {
        let existing: HashSet<String> = self
            .pages
            .list()
            .await?
            .into_iter()
            .map(|record| record.data.slug)
            .collect();
        Ok(KNOWN_ROUTES
            .iter()
            .map(|route| DiscoveredPage {
                route: *route,
                synced: existing.contains(route.slug),
            })
            .collect())
    }

    pub async fn sync_page(&self, slug: &str) -> AppResult<SyncOutcome> {
        let route = find_route(slug)
            .ok_or_else(|| AppError::NotFound(format!("no known route with slug '{}'", slug)))?;
        if let Some(page) = self.pages.find_one("slug", slug).await? {
            return Ok(SyncOutcome::AlreadySynced { page });
        }
        let page = self.pages.create(&skeleton_page(route)).await?;
        info!("Synced route {} into CMS page {}", route.path, page.id);
        Ok(SyncOutcome::Created { page })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDocumentStore;
    use crate::models::CmsDocument;

    async fn service() -> ContentSyncService {
        let store: Arc<dyn DocumentStore> =
            Arc::new(SqliteDocumentStore::new_in_memory(16).await.unwrap());
        ContentSyncService::new(store)
    }

    #[test]
    fn test_catalog_is_consistent() {
        let mut slugs = HashSet::new();
        for route in KNOWN_ROUTES {
            assert!(slugs.insert(route.slug), "duplicate slug {}", route.slug);
            let page = skeleton_page(route);
            assert!(page.validate().is_ok(), "{} does not validate", route.slug);
            assert_eq!(page.path(), route.path);
        }
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let service = service().await;
        let first = service.sync_page("about").await.unwrap();
        let SyncOutcome::Created { page } = first else {
            panic!("expected a new page");
        };
        assert_eq!(page.data.status, Status::Draft);
        assert_eq!(
            page.data.seo.as_ref().and_then(|s| s.canonical.as_deref()),
            Some("/about")
        );

        match service.sync_page("about").await.unwrap() {
            SyncOutcome::AlreadySynced { page: again } => assert_eq!(again.id, page.id),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_discover_marks_synced_routes() {
        let service = service().await;
        service.sync_page("faq").await.unwrap();
        let discovered = service.discover_pages().await.unwrap();
        assert_eq!(discovered.len(), KNOWN_ROUTES.len());
        for page in discovered {
            assert_eq!(page.synced, page.route.slug == "faq");
        }
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found() {
        let service = service().await;
        assert!(matches!(
            service.sync_page("no-such-page").await,
            Err(AppError::NotFound(_))
        ));
    }
}
