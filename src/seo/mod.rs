//! SEO building blocks shared by the public site and the admin: the page
//! scorer, `<head>` metadata, schema.org JSON-LD, and sitemap/robots output.

pub mod metadata;
pub mod schema_org;
pub mod scorer;
pub mod sitemap;

use once_cell::sync::Lazy;
use regex::Regex;

pub use metadata::{render_head, MetadataInput, PageMetadata, SiteInfo};
pub use scorer::{score, SeoCheck, SeoGrade, SeoInput, SeoReport};
pub use sitemap::{render_robots, render_sitemap, ChangeFrequency, SitemapEntry};

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("slug regex"));
static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("slugify regex"));

/// Lowercase, hyphen-separated form used for URLs.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_ALNUM_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// Escape text for HTML attribute or body content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Join the site URL and a path into an absolute URL. Absolute inputs pass through.
pub fn absolute_url(site_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = site_url.trim_end_matches('/');
    if path.is_empty() || path == "/" {
        return format!("{}/", base);
    }
    format!("{}/{}", base, path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Gratuity Calculator: Dubai (DIFC)"), "gratuity-calculator-dubai-difc");
        assert_eq!(slugify("  --Abu   Dhabi-- "), "abu-dhabi");
        assert!(is_valid_slug(&slugify("Ras Al Khaimah")));
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("jebel-ali-free-zone"));
        assert!(!is_valid_slug("Jebel-Ali"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_absolute_url() {
        let site = "https://gratuitycalculator.ae/";
        assert_eq!(absolute_url(site, "/"), "https://gratuitycalculator.ae/");
        assert_eq!(absolute_url(site, "/blog/x"), "https://gratuitycalculator.ae/blog/x");
        assert_eq!(absolute_url(site, "https://cdn.example/img.png"), "https://cdn.example/img.png");
    }
}
