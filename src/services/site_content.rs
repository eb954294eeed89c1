// Published pages and blog posts as the public site renders them, and the
// sitemap built from everything that is live.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::content_sync::KNOWN_ROUTES;
use super::repository::{Record, Repository};
use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::DocumentStore;
use crate::models::{BlogPost, Location, Page, PageTemplate, SeoMeta};
use crate::seo::schema_org::{self, Breadcrumb};
use crate::seo::{render_head, ChangeFrequency, MetadataInput, PageMetadata, SiteInfo, SitemapEntry};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub page: Record<Page>,
    pub metadata: PageMetadata,
    pub json_ld: Vec<Value>,
    /// Pre-rendered `<head>` fragment.
    pub head: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostView {
    pub post: Record<BlogPost>,
    pub reading_time_minutes: usize,
    pub metadata: PageMetadata,
    pub json_ld: Vec<Value>,
    pub head: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSummary {
    pub slug: String,
    pub path: String,
    pub title: String,
    pub excerpt: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub featured_image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub reading_time_minutes: usize,
}

/// When a post went live: its schedule if it had one, otherwise when it was written.
fn published_at(record: &Record<BlogPost>) -> DateTime<Utc> {
    record.data.publish_at.unwrap_or(record.created_at)
}

fn noindex(seo: Option<&SeoMeta>) -> bool {
    seo.is_some_and(|s| !s.robots.index)
}

pub fn page_view(record: Record<Page>, site: &SiteInfo) -> PageView {
    let page = &record.data;
    let path = page.path();
    let metadata = PageMetadata::build(
        &MetadataInput {
            path: &path,
            title: &page.title,
            fallback_description: page.excerpt.as_deref(),
            seo: page.seo.as_ref(),
            og_type: "website",
        },
        site,
    );

    let mut json_ld = Vec::new();
    if path == "/" {
        json_ld.push(schema_org::organization(site));
        json_ld.push(schema_org::website(site));
    } else {
        json_ld.push(schema_org::breadcrumb_list(
            &[Breadcrumb::new("Home", "/"), Breadcrumb::new(page.title.clone(), path.clone())],
            site,
        ));
    }
    if page.template == PageTemplate::Calculator {
        json_ld.push(schema_org::gratuity_how_to(site));
    }
    json_ld.extend(schema_org::faq_page(&page.faqs));

    let head = render_head(&metadata, &json_ld);
    PageView {
        page: record,
        metadata,
        json_ld,
        head,
    }
}

pub fn blog_post_view(record: Record<BlogPost>, site: &SiteInfo) -> BlogPostView {
    let post = &record.data;
    let path = post.path();
    let metadata = PageMetadata::build(
        &MetadataInput {
            path: &path,
            title: &post.title,
            fallback_description: Some(post.excerpt.as_str()).filter(|e| !e.trim().is_empty()),
            seo: post.seo.as_ref(),
            og_type: "article",
        },
        site,
    );
    let mut json_ld = vec![
        schema_org::article(post, site, published_at(&record), record.updated_at),
        schema_org::breadcrumb_list(
            &[
                Breadcrumb::new("Home", "/"),
                Breadcrumb::new("Blog", "/blog"),
                Breadcrumb::new(post.title.clone(), path.clone()),
            ],
            site,
        ),
    ];
    json_ld.extend(schema_org::faq_page(&post.faqs));

    let head = render_head(&metadata, &json_ld);
    BlogPostView {
        reading_time_minutes: post.reading_time_minutes(),
        post: record,
        metadata,
        json_ld,
        head,
    }
}

#[derive(Clone)]
pub struct SiteContent {
    pages: Repository<Page>,
    blogs: Repository<BlogPost>,
    locations: Repository<Location>,
}

impl SiteContent {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            pages: Repository::new(store.clone()),
            blogs: Repository::new(store.clone()),
            locations: Repository::new(store),
        }
    }

    pub async fn page(&self, slug: &str, site: &SiteInfo, now: DateTime<Utc>) -> AppResult<PageView> {
        let record = self
            .pages
            .find_live_by_slug(slug, now)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("page '{}' not found", slug)))?;
        Ok(page_view(record, site))
    }

    pub async fn blog_post(&self, slug: &str, site: &SiteInfo, now: DateTime<Utc>) -> AppResult<BlogPostView> {
        let record = self
            .blogs
            .find_live_by_slug(slug, now)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("blog post '{}' not found", slug)))?;
        Ok(blog_post_view(record, site))
    }

    /// Live posts, newest first.
    pub async fn blog_index(&self, now: DateTime<Utc>) -> AppResult<Vec<BlogSummary>> {
        let mut posts = self.blogs.list_live(now).await?;
        posts.sort_by_key(|record| std::cmp::Reverse(published_at(record)));
        Ok(posts
            .iter()
            .map(|record| BlogSummary {
                slug: record.data.slug.clone(),
                path: record.data.path(),
                title: record.data.title.clone(),
                excerpt: record.data.excerpt.clone(),
                category: record.data.category.clone(),
                tags: record.data.tags.clone(),
                featured_image: record.data.featured_image.clone(),
                published_at: published_at(record),
                reading_time_minutes: record.data.reading_time_minutes(),
            })
            .collect())
    }

    /// Built-in routes plus every live, indexable page, post and location.
    pub async fn sitemap_entries(&self, now: DateTime<Utc>) -> AppResult<Vec<SitemapEntry>> {
        let pages = self.pages.list_live(now).await?;
        let hidden: Vec<String> = pages
            .iter()
            .filter(|r| noindex(r.data.seo.as_ref()))
            .map(|r| r.data.path())
            .collect();

        let mut entries: Vec<SitemapEntry> = Vec::new();
        for route in KNOWN_ROUTES {
            if hidden.iter().any(|p| p == route.path) {
                continue;
            }
            let (frequency, priority) = match (route.path, route.template) {
                ("/", _) => (ChangeFrequency::Daily, 1.0),
                (_, PageTemplate::Calculator) => (ChangeFrequency::Weekly, 0.9),
                (_, PageTemplate::Legal) => (ChangeFrequency::Yearly, 0.3),
                _ => (ChangeFrequency::Monthly, 0.5),
            };
            let mut entry = SitemapEntry::new(route.path, frequency, priority);
            if let Some(record) = pages.iter().find(|r| r.data.slug == route.slug) {
                entry = entry.modified(record.updated_at);
            }
            entries.push(entry);
        }
        for record in pages.iter().filter(|r| !noindex(r.data.seo.as_ref())) {
            entries.push(
                SitemapEntry::new(record.data.path(), ChangeFrequency::Monthly, 0.5)
                    .modified(record.updated_at),
            );
        }

        entries.push(SitemapEntry::new("/blog", ChangeFrequency::Daily, 0.7));
        for record in self.blogs.list_live(now).await? {
            if noindex(record.data.seo.as_ref()) {
                continue;
            }
            entries.push(
                SitemapEntry::new(record.data.path(), ChangeFrequency::Weekly, 0.6)
                    .modified(record.updated_at),
            );
        }

        for record in self.locations.list_live(now).await? {
            if noindex(record.data.seo.as_ref()) {
                continue;
            }
            entries.push(
                SitemapEntry::new(record.data.path(), ChangeFrequency::Monthly, 0.7)
                    .modified(record.updated_at),
            );
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDocumentStore;
    use crate::seo::render_sitemap;
    use chrono::Duration;
    use serde_json::json;

    fn site() -> SiteInfo {
        SiteInfo::new("UAE Gratuity Calculator", "https://gratuitycalculator.ae")
    }

    async fn setup() -> (SiteContent, Arc<dyn DocumentStore>) {
        let store: Arc<dyn DocumentStore> =
            Arc::new(SqliteDocumentStore::new_in_memory(32).await.unwrap());
        (SiteContent::new(store.clone()), store)
    }

    fn page(value: Value) -> Page {
        serde_json::from_value(value).unwrap()
    }

    fn post(value: Value) -> BlogPost {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_home_page_view() {
        let (content, store) = setup().await;
        Repository::<Page>::new(store)
            .create(&page(json!({
                "slug": "home", "title": "Gratuity Calculator", "status": "published",
                "template": "calculator",
                "faqs": [{"question": "Is it free?", "answer": "Yes."}]
            })))
            .await
            .unwrap();

        let view = content.page("home", &site(), Utc::now()).await.unwrap();
        assert_eq!(view.metadata.canonical, "https://gratuitycalculator.ae/");
        let types: Vec<&str> = view.json_ld.iter().map(|b| b["@type"].as_str().unwrap()).collect();
        assert_eq!(types, vec!["Organization", "WebSite", "HowTo", "FAQPage"]);
        assert!(view.head.contains("<title>Gratuity Calculator | UAE Gratuity Calculator</title>"));
        assert!(view.head.contains("application/ld+json"));
    }

    #[tokio::test]
    async fn test_drafts_and_future_schedules_are_hidden() {
        let (content, store) = setup().await;
        let blogs = Repository::<BlogPost>::new(store);
        let now = Utc::now();
        blogs
            .create(&post(json!({"slug": "draft", "title": "Draft"})))
            .await
            .unwrap();
        blogs
            .create(&post(json!({
                "slug": "later", "title": "Later", "status": "scheduled",
                "publishAt": (now + Duration::days(1)).to_rfc3339()
            })))
            .await
            .unwrap();
        blogs
            .create(&post(json!({
                "slug": "earlier", "title": "Earlier", "status": "scheduled",
                "publishAt": (now - Duration::days(2)).to_rfc3339()
            })))
            .await
            .unwrap();
        blogs
            .create(&post(json!({"slug": "live", "title": "Live", "status": "published"})))
            .await
            .unwrap();

        let index = content.blog_index(now).await.unwrap();
        let slugs: Vec<&str> = index.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["live", "earlier"]);

        assert!(matches!(
            content.blog_post("draft", &site(), now).await,
            Err(AppError::NotFound(_))
        ));
        assert!(content.blog_post("later", &site(), now).await.is_err());
        assert!(content
            .blog_post("later", &site(), now + Duration::days(2))
            .await
            .is_ok());

        let view = content.blog_post("live", &site(), now).await.unwrap();
        assert_eq!(view.metadata.open_graph.og_type, "article");
        assert_eq!(view.json_ld[0]["@type"], "Article");
        assert_eq!(view.reading_time_minutes, 1);
    }

    #[tokio::test]
    async fn test_sitemap_entries() {
        let (content, store) = setup().await;
        let now = Utc::now();
        Repository::<Page>::new(store.clone())
            .create(&page(json!({
                "slug": "terms", "title": "Terms", "status": "published",
                "seo": {"robots": {"index": false}}
            })))
            .await
            .unwrap();
        Repository::<Page>::new(store.clone())
            .create(&page(json!({"slug": "about", "title": "About", "status": "published"})))
            .await
            .unwrap();
        Repository::<BlogPost>::new(store.clone())
            .create(&post(json!({"slug": "guide", "title": "Guide", "status": "published"})))
            .await
            .unwrap();
        Repository::<Location>::new(store)
            .create(
                &serde_json::from_value(json!({
                    "slug": "difc", "name": "DIFC", "kind": "free_zone",
                    "emirate": "Dubai", "status": "published"
                }))
                .unwrap(),
            )
            .await
            .unwrap();

        let entries = content.sitemap_entries(now).await.unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"/"));
        assert!(!paths.contains(&"/terms"));
        assert!(paths.contains(&"/blog/guide"));
        assert!(paths.contains(&"/free-zones/difc"));
        assert!(entries
            .iter()
            .find(|e| e.path == "/about")
            .and_then(|e| e.last_modified)
            .is_some());

        let xml = render_sitemap(&site().url, &entries).unwrap();
        assert_eq!(xml.matches("<loc>https://gratuitycalculator.ae/about</loc>").count(), 1);
    }
}
