use chrono::{DateTime, Utc};
use quick_xml::{
    events::{BytesDecl, BytesText, Event},
    Writer,
};
use serde::Serialize;
use std::collections::HashSet;

use super::absolute_url;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    /// Site-relative path or absolute URL.
    pub path: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub change_frequency: ChangeFrequency,
    pub priority: f32,
}

impl SitemapEntry {
    pub fn new(path: impl Into<String>, change_frequency: ChangeFrequency, priority: f32) -> Self {
        Self {
            path: path.into(),
            last_modified: None,
            change_frequency,
            priority: priority.clamp(0.0, 1.0),
        }
    }

    pub fn modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }
}

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

fn xml_error(e: std::io::Error) -> AppError {
    AppError::Internal(format!("failed to write sitemap: {}", e))
}

/// Render a sitemaps.org `urlset`. Duplicate locations keep their first entry.
pub fn render_sitemap(site_url: &str, entries: &[SitemapEntry]) -> AppResult<String> {
    let mut seen = HashSet::new();
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    writer
        .create_element("urlset")
        .with_attribute(("xmlns", SITEMAP_NS))
        .write_inner_content(|w| {
            for entry in entries {
                let loc = absolute_url(site_url, &entry.path);
                if !seen.insert(loc.clone()) {
                    continue;
                }
                w.create_element("url").write_inner_content(|w| {
                    w.create_element("loc").write_text_content(BytesText::new(&loc))?;
                    if let Some(modified) = entry.last_modified {
                        let lastmod = modified.format("%Y-%m-%d").to_string();
                        w.create_element("lastmod")
                            .write_text_content(BytesText::new(&lastmod))?;
                    }
                    w.create_element("changefreq")
                        .write_text_content(BytesText::new(entry.change_frequency.as_str()))?;
                    let priority = format!("{:.1}", entry.priority);
                    w.create_element("priority")
                        .write_text_content(BytesText::new(&priority))?;
                    Ok(())
                })?;
            }
            Ok(())
        })
        .map_err(xml_error)?;

    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|e| AppError::Internal(format!("sitemap is not UTF-8: {}", e)))?;
    xml.push('\n');
    Ok(xml)
}

pub const DEFAULT_DISALLOW: [&str; 2] = ["/admin", "/api/"];

pub fn render_robots(site_url: &str, extra_disallow: &[String]) -> String {
    let mut out = String::from("User-agent: *\nAllow: /\n");
    for path in DEFAULT_DISALLOW
        .iter()
        .copied()
        .chain(extra_disallow.iter().map(String::as_str))
    {
        out.push_str(&format!("Disallow: {}\n", path));
    }
    out.push_str(&format!(
        "\nSitemap: {}\n",
        absolute_url(site_url, "/sitemap.xml")
    ));
    out
}
