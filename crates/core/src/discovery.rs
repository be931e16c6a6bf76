use crate::config::normalize_origin;
use crate::sitemap::TagScanner;
use crate::types::Route;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

/// Where the discovered routes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    Sitemap,
    FallbackMissing,
    FallbackUnreadable,
    FallbackEmpty,
}

impl fmt::Display for RouteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteSource::Sitemap => write!(f, "sitemap"),
            RouteSource::FallbackMissing => write!(f, "fallback list (sitemap not found)"),
            RouteSource::FallbackUnreadable => write!(f, "fallback list (sitemap unreadable)"),
            RouteSource::FallbackEmpty => write!(f, "fallback list (sitemap had no usable entries)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub routes: Vec<Route>,
    pub source: RouteSource,
}

/// The site's own origin, used to decide which sitemap entries are ours
#[derive(Debug, Clone)]
pub struct SiteOrigin {
    raw: String,
    parsed: Option<url::Origin>,
}

impl SiteOrigin {
    pub fn new(origin: &str) -> Self {
        let raw = normalize_origin(origin);
        let parsed = Url::parse(&raw)
            .ok()
            .map(|u| u.origin())
            .filter(|o| o.is_tuple());
        Self { raw, parsed }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Path component of `loc` if it belongs to this origin.
    ///
    /// Absolute URLs are compared by origin. Anything that does not parse
    /// falls back to a plain prefix match on the origin string.
    pub fn path_for(&self, loc: &str) -> Option<String> {
        if let (Ok(url), Some(expected)) = (Url::parse(loc), &self.parsed) {
            if &url.origin() != expected {
                return None;
            }
            let path = url.path();
            return Some(if path.is_empty() { "/".to_string() } else { path.to_string() });
        }

        if self.raw.is_empty() {
            return None;
        }

        let rest = loc.strip_prefix(self.raw.as_str())?;
        if rest.is_empty() {
            return Some("/".to_string());
        }

        // `https://site.example.evil` shares the prefix but is another host
        if !rest.starts_with('/') {
            return None;
        }

        let path = rest.split(['?', '#']).next().unwrap_or(rest);
        Some(path.to_string())
    }
}

/// Collect same-origin routes from sitemap text, deduplicated in first-seen order
pub fn routes_from_sitemap(text: &str, origin: &SiteOrigin) -> Vec<Route> {
    let scanner = TagScanner::new("loc");
    let mut routes: Vec<Route> = Vec::new();
    let mut seen: HashSet<Route> = HashSet::new();

    for loc in scanner.scan(text) {
        let Some(path) = origin.path_for(&loc) else {
            debug!(loc = %loc, "skipping sitemap entry from another origin");
            continue;
        };

        match Route::parse(&path) {
            Ok(route) => {
                if seen.insert(route.clone()) {
                    routes.push(route);
                }
            }
            Err(e) => debug!(loc = %loc, error = %e, "skipping sitemap entry"),
        }
    }

    routes
}

/// Find the routes to prerender.
///
/// Never fails: a missing, unreadable or empty sitemap degrades to
/// `fallback`, and bad individual entries are skipped.
pub fn discover_routes(sitemap: &Path, origin: &str, fallback: &[Route]) -> Discovery {
    let fallback_with = |source| Discovery {
        routes: fallback.to_vec(),
        source,
    };

    if !sitemap.exists() {
        info!(path = %sitemap.display(), "sitemap not found, using fallback routes");
        return fallback_with(RouteSource::FallbackMissing);
    }

    let text = match fs::read_to_string(sitemap) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %sitemap.display(), error = %e, "failed to read sitemap, using fallback routes");
            return fallback_with(RouteSource::FallbackUnreadable);
        }
    };

    let routes = routes_from_sitemap(&text, &SiteOrigin::new(origin));
    if routes.is_empty() {
        warn!(
            path = %sitemap.display(),
            origin = %origin,
            "sitemap has no entries for this origin, using fallback routes"
        );
        return fallback_with(RouteSource::FallbackEmpty);
    }

    Discovery {
        routes,
        source: RouteSource::Sitemap,
    }
}
