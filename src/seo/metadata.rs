use serde::Serialize;
use serde_json::Value;

use super::{absolute_url, escape_html};
use crate::models::SeoMeta;

pub const DEFAULT_TITLE_TEMPLATE: &str = "{title} | {site}";

/// Site-wide identity and SEO defaults, assembled from config and the settings documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
    pub logo_url: Option<String>,
    pub title_template: Option<String>,
    pub default_description: Option<String>,
    pub default_og_image: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub social_urls: Vec<String>,
    pub extra_disallow: Vec<String>,
}

impl SiteInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into().trim_end_matches('/').to_string(),
            logo_url: None,
            title_template: None,
            default_description: None,
            default_og_image: None,
            contact_email: None,
            phone: None,
            address: None,
            social_urls: Vec::new(),
            extra_disallow: Vec::new(),
        }
    }

    pub fn absolute(&self, path: &str) -> String {
        absolute_url(&self.url, path)
    }

    pub fn page_title(&self, title: &str) -> String {
        if title.trim().is_empty() {
            return self.name.clone();
        }
        if title.contains(&self.name) {
            return title.to_string();
        }
        self.title_template
            .as_deref()
            .unwrap_or(DEFAULT_TITLE_TEMPLATE)
            .replace("{title}", title)
            .replace("{site}", &self.name)
    }
}

pub struct MetadataInput<'a> {
    pub path: &'a str,
    pub title: &'a str,
    pub fallback_description: Option<&'a str>,
    pub seo: Option<&'a SeoMeta>,
    /// OpenGraph type: `website` or `article`.
    pub og_type: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(rename = "type")]
    pub og_type: String,
    pub site_name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub robots: String,
    pub keywords: Vec<String>,
    pub open_graph: OpenGraph,
}

impl PageMetadata {
    pub fn build(input: &MetadataInput<'_>, site: &SiteInfo) -> Self {
        let seo = input.seo;
        let raw_title = seo
            .and_then(|s| s.title.as_deref())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(input.title);
        let title = site.page_title(raw_title);

        let description = seo
            .and_then(|s| s.description.as_deref())
            .or(input.fallback_description)
            .or(site.default_description.as_deref())
            .map(|d| truncate_description(d.trim(), super::scorer::DESCRIPTION_MAX))
            .unwrap_or_default();

        let canonical = seo
            .and_then(|s| s.canonical.as_deref())
            .filter(|c| !c.trim().is_empty())
            .map(|c| site.absolute(c))
            .unwrap_or_else(|| site.absolute(input.path));

        let robots = seo.map(|s| s.robots).unwrap_or_default();
        let image = seo
            .and_then(|s| s.og_image.clone())
            .or_else(|| site.default_og_image.clone())
            .map(|img| site.absolute(&img));

        PageMetadata {
            open_graph: OpenGraph {
                title: title.clone(),
                description: description.clone(),
                url: canonical.clone(),
                og_type: input.og_type.to_string(),
                site_name: site.name.clone(),
                image,
            },
            title,
            description,
            canonical,
            robots: robots.content(),
            keywords: seo.map(|s| s.keyword_list()).unwrap_or_default(),
        }
    }

    pub fn is_indexable(&self) -> bool {
        !self.robots.contains("noindex")
    }
}

/// Cut to at most `max` characters on a word boundary, marking the cut with an ellipsis.
pub fn truncate_description(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let budget: String = text.chars().take(max.saturating_sub(1)).collect();
    let cut = match budget.rfind(char::is_whitespace) {
        Some(at) if at > 0 => &budget[..at],
        _ => budget.as_str(),
    };
    let cut = cut.trim_end_matches(|c: char| c.is_whitespace() || ",;:.-".contains(c));
    format!("{}…", cut)
}

/// `<head>` fragment: title, meta tags, canonical link and JSON-LD scripts.
pub fn render_head(meta: &PageMetadata, json_ld: &[Value]) -> String {
    let mut out = String::new();
    out.push_str(&format!("<title>{}</title>\n", escape_html(&meta.title)));
    push_meta(&mut out, "name", "description", &meta.description);
    push_meta(&mut out, "name", "robots", &meta.robots);
    if !meta.keywords.is_empty() {
        push_meta(&mut out, "name", "keywords", &meta.keywords.join(", "));
    }
    out.push_str(&format!(
        "<link rel=\"canonical\" href=\"{}\">\n",
        escape_html(&meta.canonical)
    ));

    let og = &meta.open_graph;
    push_meta(&mut out, "property", "og:title", &og.title);
    push_meta(&mut out, "property", "og:description", &og.description);
    push_meta(&mut out, "property", "og:url", &og.url);
    push_meta(&mut out, "property", "og:type", &og.og_type);
    push_meta(&mut out, "property", "og:site_name", &og.site_name);
    if let Some(image) = &og.image {
        push_meta(&mut out, "property", "og:image", image);
    }

    for block in json_ld {
        // keep the JSON from closing the script element early
        let json = block.to_string().replace("</", "<\\/");
        out.push_str(&format!(
            "<script type=\"application/ld+json\">{}</script>\n",
            json
        ));
    }
    out
}

fn push_meta(out: &mut String, attr: &str, key: &str, content: &str) {
    out.push_str(&format!(
        "<meta {}=\"{}\" content=\"{}\">\n",
        attr,
        key,
        escape_html(content)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RobotsDirectives;
    use serde_json::json;

    fn site() -> SiteInfo {
        SiteInfo::new("UAE Gratuity Calculator", "https://gratuitycalculator.ae/")
    }

    #[test]
    fn test_title_template() {
        let mut site = site();
        assert_eq!(site.page_title("About"), "About | UAE Gratuity Calculator");
        assert_eq!(
            site.page_title("UAE Gratuity Calculator - Home"),
            "UAE Gratuity Calculator - Home"
        );
        site.title_template = Some("{title} - Free Tool".to_string());
        assert_eq!(site.page_title("Dubai"), "Dubai - Free Tool");
        assert_eq!(site.page_title(" "), "UAE Gratuity Calculator");
    }

    #[test]
    fn test_truncate_description_on_word_boundary() {
        let text = "Calculate your end of service gratuity in Dubai, Abu Dhabi and every other emirate with the latest rules.";
        let cut = truncate_description(text, 40);
        assert!(cut.chars().count() <= 40);
        assert!(cut.ends_with('…'));
        assert_eq!(cut, "Calculate your end of service gratuity…");
        assert_eq!(truncate_description("short", 40), "short");
    }

    #[test]
    fn test_build_prefers_record_seo_overrides() {
        let seo = SeoMeta {
            title: Some("Dubai Gratuity Rules".to_string()),
            description: Some("How gratuity works in Dubai.".to_string()),
            canonical: Some("/locations/dubai".to_string()),
            robots: RobotsDirectives {
                index: false,
                follow: true,
            },
            og_image: Some("/images/dubai.png".to_string()),
            focus_keyword: Some("dubai gratuity".to_string()),
            ..Default::default()
        };
        let meta = PageMetadata::build(
            &MetadataInput {
                path: "/dubai-old",
                title: "Dubai",
                fallback_description: Some("unused"),
                seo: Some(&seo),
                og_type: "website",
            },
            &site(),
        );
        assert_eq!(meta.title, "Dubai Gratuity Rules | UAE Gratuity Calculator");
        assert_eq!(meta.description, "How gratuity works in Dubai.");
        assert_eq!(meta.canonical, "https://gratuitycalculator.ae/locations/dubai");
        assert_eq!(meta.robots, "noindex, follow");
        assert!(!meta.is_indexable());
        assert_eq!(meta.keywords, vec!["dubai gratuity"]);
        assert_eq!(
            meta.open_graph.image.as_deref(),
            Some("https://gratuitycalculator.ae/images/dubai.png")
        );
    }

    #[test]
    fn test_build_falls_back_to_record_and_site_defaults() {
        let mut site = site();
        site.default_description = Some("Free UAE gratuity calculator.".to_string());
        let meta = PageMetadata::build(
            &MetadataInput {
                path: "/faq",
                title: "FAQ",
                fallback_description: None,
                seo: None,
                og_type: "website",
            },
            &site,
        );
        assert_eq!(meta.description, "Free UAE gratuity calculator.");
        assert_eq!(meta.canonical, "https://gratuitycalculator.ae/faq");
        assert_eq!(meta.robots, "index, follow");
        assert!(meta.is_indexable());
    }

    #[test]
    fn test_render_head_escapes_and_embeds_json_ld() {
        let meta = PageMetadata::build(
            &MetadataInput {
                path: "/",
                title: "Fees & \"Charges\"",
                fallback_description: Some("<b>bold</b>"),
                seo: None,
                og_type: "website",
            },
            &site(),
        );
        let head = render_head(&meta, &[json!({"@type": "Thing", "name": "</script>"})]);
        assert!(head.contains("<title>Fees &amp; &quot;Charges&quot; | UAE Gratuity Calculator</title>"));
        assert!(head.contains("content=\"&lt;b&gt;bold&lt;/b&gt;\""));
        assert!(head.contains("<script type=\"application/ld+json\">"));
        assert!(!head.contains("\"</script>\""));
        assert!(head.contains("<link rel=\"canonical\" href=\"https://gratuitycalculator.ae/\">"));
    }
}
