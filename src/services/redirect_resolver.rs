// Redirect resolution for requests that match no route, plus loop checks
// for redirects written through the admin.

use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::repository::{Record, Repository};
use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::DocumentStore;
use crate::models::Redirect;

/// Longest chain followed before a redirect set is treated as looping.
pub const MAX_CHAIN_LENGTH: usize = 10;

/// Request path with query, fragment and trailing slashes removed, case kept.
fn path_part(path: &str) -> &str {
    path.split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or("")
        .trim()
        .trim_end_matches('/')
}

/// Lowercased path without query, fragment or trailing slash (the root stays `/`).
pub fn normalize_path(path: &str) -> String {
    let out = path_part(path).to_lowercase();
    if out.is_empty() {
        "/".to_string()
    } else {
        out
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Path prefix of a `/*` rule, normalized.
fn rule_prefix(pattern: &str) -> String {
    normalize_path(pattern.trim_end_matches("/*"))
}

/// True when `path` is `prefix` or lies below it.
fn is_under(path: &str, prefix: &str) -> bool {
    prefix == "/" || path == prefix || path.starts_with(&format!("{}/", prefix))
}

fn is_external(destination: &str) -> bool {
    destination.starts_with("http://") || destination.starts_with("https://")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRedirect {
    pub id: String,
    pub location: String,
    pub status_code: u16,
}

/// Find the rule for `path` among `rules`: an exact match wins, otherwise the
/// longest matching `/*` prefix rule. Matching ignores case; the remainder
/// carried to the destination keeps the case of the request.
/// Returns the rule index and target location.
fn match_rule(rules: &[&Redirect], path: &str) -> Option<(usize, String)> {
    let normalized = normalize_path(path);
    let query = path.split_once('?').map(|(_, q)| q).filter(|q| !q.is_empty());

    if let Some(index) = rules
        .iter()
        .position(|rule| !rule.is_prefix_rule() && normalize_path(&rule.source) == normalized)
    {
        return Some((index, with_query(rules[index].destination.clone(), query)));
    }

    let requested = segments(path_part(path));
    let mut best: Option<(usize, usize, String)> = None;
    for (index, rule) in rules.iter().enumerate().filter(|(_, r)| r.is_prefix_rule()) {
        let prefix = rule_prefix(&rule.source);
        let prefix_segments = segments(&prefix);
        if prefix_segments.len() > requested.len()
            || !prefix_segments
                .iter()
                .zip(&requested)
                .all(|(p, r)| r.to_lowercase() == *p)
        {
            continue;
        }
        if best.as_ref().is_some_and(|(_, len, _)| *len >= prefix_segments.len()) {
            continue;
        }
        let remainder = requested[prefix_segments.len()..].join("/");
        let base = rule
            .destination
            .trim_end_matches("/*")
            .trim_end_matches('/');
        let location = match (base.is_empty(), remainder.is_empty()) {
            (true, true) => "/".to_string(),
            (_, true) => base.to_string(),
            (_, false) => format!("{}/{}", base, remainder),
        };
        best = Some((index, prefix_segments.len(), location));
    }
    best.map(|(index, _, location)| (index, with_query(location, query)))
}

fn with_query(location: String, query: Option<&str>) -> String {
    match query {
        Some(q) if !location.contains('?') => format!("{}?{}", location, q),
        _ => location,
    }
}

/// Resolve `path` against the active redirects.
pub fn resolve(redirects: &[Record<Redirect>], path: &str) -> Option<ResolvedRedirect> {
    let active: Vec<&Record<Redirect>> = redirects.iter().filter(|r| r.data.active).collect();
    let rules: Vec<&Redirect> = active.iter().map(|r| &r.data).collect();
    match_rule(&rules, path).map(|(index, location)| ResolvedRedirect {
        id: active[index].id.clone(),
        location,
        status_code: active[index].data.status_code,
    })
}

/// Stand-in path segment used to follow a prefix rule.
const SAMPLE_SEGMENT: &str = "__sample";

/// Paths whose redirect chains decide whether `candidate` is safe to add.
/// An exact rule starts from its source. A prefix rule starts from a sample
/// path below its prefix plus every known rule path that falls under it.
fn starting_paths(rules: &[&Redirect], candidate: &Redirect) -> Vec<String> {
    if !candidate.is_prefix_rule() {
        return vec![candidate.source.clone()];
    }
    let prefix = rule_prefix(&candidate.source);
    let sample = if prefix == "/" {
        format!("/{}", SAMPLE_SEGMENT)
    } else {
        format!("{}/{}", prefix, SAMPLE_SEGMENT)
    };
    let mut paths = vec![sample];
    for rule in rules {
        for path in [&rule.source, &rule.destination] {
            if is_external(path) {
                continue;
            }
            let path = normalize_path(path.trim_end_matches("/*"));
            if is_under(&path, &prefix) && !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

/// Follow the chain from `start`, whose first hop is taken by `candidate`.
fn follow_chain(rules: &[&Redirect], candidate: &Redirect, start: &str) -> AppResult<()> {
    let Some((_, mut current)) = match_rule(&[candidate], start) else {
        return Ok(());
    };
    let mut visited = HashSet::from([normalize_path(start)]);
    for _ in 0..MAX_CHAIN_LENGTH {
        if is_external(&current) {
            return Ok(());
        }
        let normalized = normalize_path(&current);
        if !visited.insert(normalized.clone()) {
            return Err(AppError::Validation(format!(
                "redirect from '{}' creates a loop through '{}'",
                candidate.source, normalized
            )));
        }
        match match_rule(rules, &current) {
            Some((_, next)) => current = next,
            None => return Ok(()),
        }
    }
    Err(AppError::Validation(format!(
        "redirect from '{}' starts a chain longer than {} hops",
        candidate.source, MAX_CHAIN_LENGTH
    )))
}

/// Reject `candidate` if following it through `existing` ever revisits a path
/// or runs past `MAX_CHAIN_LENGTH` hops. `replacing` names the record being edited.
pub fn check_for_loop(
    existing: &[Record<Redirect>],
    candidate: &Redirect,
    replacing: Option<&str>,
) -> AppResult<()> {
    if !candidate.active {
        return Ok(());
    }
    if candidate.is_prefix_rule() && !is_external(&candidate.destination) {
        let source = rule_prefix(&candidate.source);
        let destination = rule_prefix(&candidate.destination);
        // the remainder is appended to the target, so a target below the
        // source grows the path on every hop
        if is_under(&destination, &source) {
            return Err(AppError::Validation(format!(
                "redirect from '{}' sends every path below it back under itself",
                candidate.source
            )));
        }
    }

    let mut rules: Vec<&Redirect> = existing
        .iter()
        .filter(|r| r.data.active && Some(r.id.as_str()) != replacing)
        .map(|r| &r.data)
        .collect();
    rules.push(candidate);

    for start in starting_paths(&rules, candidate) {
        follow_chain(&rules, candidate, &start)?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct RedirectService {
    repo: Repository<Redirect>,
}

impl RedirectService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    /// Resolve and count a hit. A failed counter write never fails the redirect.
    pub async fn resolve_path(&self, path: &str) -> AppResult<Option<ResolvedRedirect>> {
        let redirects = self.repo.list().await?;
        let Some(resolved) = resolve(&redirects, path) else {
            return Ok(None);
        };
        let hits = redirects
            .iter()
            .find(|r| r.id == resolved.id)
            .map(|r| r.data.hits)
            .unwrap_or_default();
        if let Err(e) = self
            .repo
            .update(&resolved.id, json!({"hits": hits + 1}))
            .await
        {
            warn!("Failed to count hit for redirect {}: {}", resolved.id, e);
        }
        debug!("Redirecting {} -> {} ({})", path, resolved.location, resolved.status_code);
        Ok(Some(resolved))
    }

    /// Loop check against the stored redirects; `replacing` is the id being edited.
    pub async fn ensure_no_loop(&self, candidate: &Redirect, replacing: Option<&str>) -> AppResult<()> {
        let existing = self.repo.list().await?;
        check_for_loop(&existing, candidate, replacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDocumentStore;
    use chrono::Utc;

    fn rule(source: &str, destination: &str) -> Redirect {
        Redirect {
            source: source.to_string(),
            destination: destination.to_string(),
            status_code: 301,
            active: true,
            hits: 0,
        }
    }

    fn records(rules: Vec<Redirect>) -> Vec<Record<Redirect>> {
        let now = Utc::now();
        rules
            .into_iter()
            .enumerate()
            .map(|(i, data)| Record {
                id: format!("r{}", i),
                created_at: now,
                updated_at: now,
                data,
            })
            .collect()
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/Old-Page/"), "/old-page");
        assert_eq!(normalize_path("/old-page?utm=x#top"), "/old-page");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn test_exact_match_beats_prefix() {
        let set = records(vec![
            rule("/guides/*", "/blog/*"),
            rule("/guides/limited", "/blog/limited-contracts"),
        ]);
        let hit = resolve(&set, "/Guides/Limited/").unwrap();
        assert_eq!(hit.id, "r1");
        assert_eq!(hit.location, "/blog/limited-contracts");
    }

    #[test]
    fn test_prefix_rule_carries_remainder_and_query() {
        let set = records(vec![
            rule("/old/*", "/new/*"),
            rule("/old/deep/*", "https://archive.example/deep"),
        ]);
        assert_eq!(resolve(&set, "/old/a/b").unwrap().location, "/new/a/b");
        assert_eq!(resolve(&set, "/old").unwrap().location, "/new");
        assert_eq!(resolve(&set, "/old/x?ref=1").unwrap().location, "/new/x?ref=1");
        assert_eq!(
            resolve(&set, "/old/deep/page").unwrap().location,
            "https://archive.example/deep/page"
        );
        assert!(resolve(&set, "/older").is_none());
    }

    #[test]
    fn test_inactive_rules_are_ignored() {
        let mut inactive = rule("/gone", "/here");
        inactive.active = false;
        assert!(resolve(&records(vec![inactive]), "/gone").is_none());
    }

    #[test]
    fn test_loop_detection() {
        let existing = records(vec![rule("/a", "/b"), rule("/b", "/c")]);
        let err = check_for_loop(&existing, &rule("/c", "/a"), None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(check_for_loop(&existing, &rule("/c", "/d"), None).is_ok());
        assert!(check_for_loop(&existing, &rule("/c", "https://example.com/a"), None).is_ok());
        // editing r1 so it no longer points onwards breaks the cycle
        assert!(check_for_loop(&existing, &rule("/b", "/z"), Some("r1")).is_ok());
    }

    #[test]
    fn test_prefix_remainder_keeps_request_case() {
        let set = records(vec![rule("/guides/*", "/blog/*")]);
        assert_eq!(
            resolve(&set, "/Guides/DIFC-Rules").unwrap().location,
            "/blog/DIFC-Rules"
        );
    }

    #[test]
    fn test_mutual_prefix_rules_rejected() {
        let existing = records(vec![rule("/y/*", "/x/*")]);
        let err = check_for_loop(&existing, &rule("/x/*", "/y/*"), None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(check_for_loop(&existing, &rule("/x/*", "/z/*"), None).is_ok());
    }

    #[test]
    fn test_prefix_rule_into_itself_rejected() {
        assert!(check_for_loop(&[], &rule("/a/*", "/a/b/*"), None).is_err());
        assert!(check_for_loop(&[], &rule("/*", "/new/*"), None).is_err());
        // the remainder is appended even without a trailing /*
        assert!(check_for_loop(&[], &rule("/a/*", "/a/landing"), None).is_err());
        assert!(check_for_loop(&[], &rule("/a/*", "/b/*"), None).is_ok());
        assert!(check_for_loop(&[], &rule("/a/*", "https://example.com/a/*"), None).is_ok());
    }

    #[test]
    fn test_mixed_exact_and_prefix_cycles_rejected() {
        let existing = records(vec![rule("/docs/*", "/guides/*")]);
        assert!(check_for_loop(&existing, &rule("/guides/start", "/docs/start"), None).is_err());

        let existing = records(vec![rule("/guides/start", "/docs/start")]);
        assert!(check_for_loop(&existing, &rule("/docs/*", "/guides/*"), None).is_err());
        assert!(check_for_loop(&existing, &rule("/docs/*", "/manuals/*"), None).is_ok());
    }

    #[test]
    fn test_long_chain_rejected() {
        let chain: Vec<Redirect> = (0..MAX_CHAIN_LENGTH)
            .map(|i| rule(&format!("/p{}", i + 1), &format!("/p{}", i + 2)))
            .collect();
        let err = check_for_loop(&records(chain), &rule("/p0", "/p1"), None).unwrap_err();
        assert!(err.to_string().contains("longer than"));
    }

    #[tokio::test]
    async fn test_resolve_path_counts_hits() {
        let store: Arc<dyn DocumentStore> =
            Arc::new(SqliteDocumentStore::new_in_memory(16).await.unwrap());
        let service = RedirectService::new(store.clone());
        let repo = Repository::<Redirect>::new(store.clone());
        service.ensure_no_loop(&rule("/old", "/new"), None).await.unwrap();
        let created = repo.create(&rule("/old", "/new")).await.unwrap();

        assert!(service.ensure_no_loop(&rule("/new", "/old"), None).await.is_err());
        // editing the stored rule itself is not a loop
        assert!(service
            .ensure_no_loop(&rule("/old", "/newer"), Some(&created.id))
            .await
            .is_ok());

        let hit = service.resolve_path("/old").await.unwrap().unwrap();
        assert_eq!(hit.location, "/new");
        service.resolve_path("/old").await.unwrap();
        let stored = repo.require(&created.id).await.unwrap();
        assert_eq!(stored.data.hits, 2);

        assert!(service.resolve_path("/missing").await.unwrap().is_none());
    }
}
