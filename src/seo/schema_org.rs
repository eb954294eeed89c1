// schema.org JSON-LD builders. Each returns a self-contained block with its own @context.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use super::metadata::SiteInfo;
use crate::models::{BlogPost, Faq, Location};

pub const CONTEXT: &str = "https://schema.org";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub path: String,
}

impl Breadcrumb {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

pub fn organization(site: &SiteInfo) -> Value {
    let mut block = json!({
        "@context": CONTEXT,
        "@type": "Organization",
        "name": site.name,
        "url": site.absolute("/"),
    });
    if let Some(logo) = &site.logo_url {
        block["logo"] = json!(site.absolute(logo));
    }
    if !site.social_urls.is_empty() {
        block["sameAs"] = json!(site.social_urls);
    }
    if site.contact_email.is_some() || site.phone.is_some() {
        let mut contact = json!({"@type": "ContactPoint", "contactType": "customer support"});
        if let Some(email) = &site.contact_email {
            contact["email"] = json!(email);
        }
        if let Some(phone) = &site.phone {
            contact["telephone"] = json!(phone);
        }
        block["contactPoint"] = contact;
    }
    block
}

pub fn website(site: &SiteInfo) -> Value {
    json!({
        "@context": CONTEXT,
        "@type": "WebSite",
        "name": site.name,
        "url": site.absolute("/"),
        "potentialAction": {
            "@type": "SearchAction",
            "target": format!("{}?q={{search_term_string}}", site.absolute("/search")),
            "query-input": "required name=search_term_string",
        }
    })
}

pub fn article(
    post: &BlogPost,
    site: &SiteInfo,
    published: DateTime<Utc>,
    modified: DateTime<Utc>,
) -> Value {
    let (author_type, author_name) = if post.author.trim().is_empty() {
        ("Organization", site.name.as_str())
    } else {
        ("Person", post.author.as_str())
    };
    let mut block = json!({
        "@context": CONTEXT,
        "@type": "Article",
        "headline": post.title,
        "description": post.excerpt,
        "mainEntityOfPage": site.absolute(&post.path()),
        "datePublished": published.to_rfc3339(),
        "dateModified": modified.to_rfc3339(),
        "author": {
            "@type": author_type,
            "name": author_name,
        },
        "publisher": {
            "@type": "Organization",
            "name": site.name,
        },
    });
    if let Some(image) = &post.featured_image {
        block["image"] = json!(site.absolute(image));
    }
    if !post.tags.is_empty() {
        block["keywords"] = json!(post.tags.join(", "));
    }
    block
}

/// `None` when there are no questions; an empty FAQPage is invalid markup.
pub fn faq_page(faqs: &[Faq]) -> Option<Value> {
    if faqs.is_empty() {
        return None;
    }
    let entities: Vec<Value> = faqs
        .iter()
        .map(|faq| {
            json!({
                "@type": "Question",
                "name": faq.question,
                "acceptedAnswer": {"@type": "Answer", "text": faq.answer},
            })
        })
        .collect();
    Some(json!({
        "@context": CONTEXT,
        "@type": "FAQPage",
        "mainEntity": entities,
    }))
}

pub fn breadcrumb_list(crumbs: &[Breadcrumb], site: &SiteInfo) -> Value {
    let items: Vec<Value> = crumbs
        .iter()
        .enumerate()
        .map(|(index, crumb)| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "name": crumb.name,
                "item": site.absolute(&crumb.path),
            })
        })
        .collect();
    json!({
        "@context": CONTEXT,
        "@type": "BreadcrumbList",
        "itemListElement": items,
    })
}

pub fn local_business(location: &Location, site: &SiteInfo) -> Value {
    let mut block = json!({
        "@context": CONTEXT,
        "@type": "LocalBusiness",
        "name": format!("{} - {}", site.name, location.name),
        "url": site.absolute(&location.path()),
        "areaServed": location.name,
        "address": {
            "@type": "PostalAddress",
            "addressLocality": location.name,
            "addressRegion": location.emirate,
            "addressCountry": "AE",
        },
    });
    if let Some(street) = &location.address {
        block["address"]["streetAddress"] = json!(street);
    }
    if let (Some(lat), Some(lng)) = (location.latitude, location.longitude) {
        block["geo"] = json!({"@type": "GeoCoordinates", "latitude": lat, "longitude": lng});
    }
    if let Some(phone) = &site.phone {
        block["telephone"] = json!(phone);
    }
    block
}

pub fn how_to(name: &str, description: &str, steps: &[(&str, &str)]) -> Value {
    let steps: Vec<Value> = steps
        .iter()
        .enumerate()
        .map(|(index, (title, text))| {
            json!({
                "@type": "HowToStep",
                "position": index + 1,
                "name": title,
                "text": text,
            })
        })
        .collect();
    json!({
        "@context": CONTEXT,
        "@type": "HowTo",
        "name": name,
        "description": description,
        "step": steps,
    })
}

/// Steps shown alongside the calculator widget.
pub fn gratuity_how_to(site: &SiteInfo) -> Value {
    how_to(
        &format!("How to calculate gratuity with {}", site.name),
        "Work out your UAE end-of-service gratuity from your basic salary and years of service.",
        &[
            ("Enter your basic salary", "Use your monthly basic salary in AED, excluding allowances."),
            ("Enter your service period", "Add your joining date and last working day, or total years of service."),
            ("Choose your contract", "Select mainland (limited or unlimited), DIFC or ADGM."),
            ("Review the result", "See each accrual tier and whether the two-year cap applies."),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::ContractType;
    use crate::models::{LocationKind, Status};

    fn site() -> SiteInfo {
        let mut site = SiteInfo::new("UAE Gratuity Calculator", "https://gratuitycalculator.ae");
        site.phone = Some("+971 4 000 0000".to_string());
        site.social_urls = vec!["https://x.com/gratuityae".to_string()];
        site
    }

    #[test]
    fn test_organization_and_website() {
        let org = organization(&site());
        assert_eq!(org["@context"], CONTEXT);
        assert_eq!(org["@type"], "Organization");
        assert_eq!(org["sameAs"][0], "https://x.com/gratuityae");
        assert_eq!(org["contactPoint"]["telephone"], "+971 4 000 0000");

        let web = website(&site());
        assert_eq!(
            web["potentialAction"]["target"],
            "https://gratuitycalculator.ae/search?q={search_term_string}"
        );
    }

    #[test]
    fn test_faq_page_skips_empty() {
        assert!(faq_page(&[]).is_none());
        let block = faq_page(&[Faq {
            question: "Who is eligible?".to_string(),
            answer: "Employees with at least one year of service.".to_string(),
        }])
        .unwrap();
        assert_eq!(block["mainEntity"][0]["acceptedAnswer"]["@type"], "Answer");
    }

    #[test]
    fn test_breadcrumb_positions_are_one_based() {
        let block = breadcrumb_list(
            &[Breadcrumb::new("Home", "/"), Breadcrumb::new("Dubai", "/locations/dubai")],
            &site(),
        );
        assert_eq!(block["itemListElement"][0]["position"], 1);
        assert_eq!(block["itemListElement"][1]["position"], 2);
        assert_eq!(
            block["itemListElement"][1]["item"],
            "https://gratuitycalculator.ae/locations/dubai"
        );
    }

    #[test]
    fn test_local_business_geo() {
        let location = Location {
            slug: "difc".to_string(),
            name: "DIFC".to_string(),
            kind: LocationKind::FreeZone,
            emirate: "Dubai".to_string(),
            description: None,
            contract_type: ContractType::Difc,
            address: None,
            latitude: Some(25.21),
            longitude: Some(55.28),
            status: Status::Published,
            publish_at: None,
            seo: None,
            faqs: Vec::new(),
        };
        let block = local_business(&location, &site());
        assert_eq!(block["url"], "https://gratuitycalculator.ae/free-zones/difc");
        assert_eq!(block["address"]["addressRegion"], "Dubai");
        assert_eq!(block["geo"]["latitude"], 25.21);
    }

    #[test]
    fn test_article_author_falls_back_to_site() {
        let post: BlogPost =
            serde_json::from_str(r#"{"slug": "guide", "title": "Guide", "tags": ["law", "uae"]}"#)
                .unwrap();
        let now = Utc::now();
        let block = article(&post, &site(), now, now);
        assert_eq!(block["author"]["@type"], "Organization");
        assert_eq!(block["author"]["name"], "UAE Gratuity Calculator");
        assert_eq!(block["keywords"], "law, uae");
    }

    #[test]
    fn test_how_to_steps() {
        let block = gratuity_how_to(&site());
        assert_eq!(block["@type"], "HowTo");
        assert_eq!(block["step"].as_array().unwrap().len(), 4);
    }
}
