use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Routes rendered when the sitemap is missing or yields nothing usable.
///
/// Other deployment tooling relies on this exact list and order.
pub const DEFAULT_FALLBACK_ROUTES: &[&str] = &[
    "/",
    "/about_us",
    "/privacy-policy",
    "/blog",
    "/services/website-development",
    "/services/social-media-marketing",
    "/services/brand-building",
    "/services/paid-marketing",
    "/services/marketplaces",
    "/services/seo-content",
    "/industries/d2c-ecommerce",
    "/industries/saas-startups",
    "/industries/healthcare",
    "/industries/local-services",
    "/industries/edtech",
    "/industries/b2b-services",
    "/tools",
];

/// A URL path within the site that gets its own rendered HTML file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Route(String);

impl Route {
    /// Validate a URL path.
    ///
    /// Routes end up as filesystem paths under the build directory, so
    /// anything that could escape it (`..`, backslashes, NUL) is rejected
    /// along with query strings and fragments. Trailing slashes are
    /// dropped, so `/blog/` and `/blog` are the same route.
    pub fn parse(path: &str) -> Result<Self> {
        if !path.starts_with('/') {
            return Err(Error::InvalidRoute(format!(
                "'{}' must start with '/'",
                path
            )));
        }

        if path.contains(['\\', '\0', '?', '#']) {
            return Err(Error::InvalidRoute(format!(
                "'{}' contains a character not allowed in a route",
                path
            )));
        }

        if path.split('/').any(|segment| segment == ".." || segment == ".") {
            return Err(Error::InvalidRoute(format!(
                "Relative segments not allowed in '{}'",
                path
            )));
        }

        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(Self("/".to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL for this route on `base_url` (no trailing slash)
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url, self.0)
    }

    /// File in the build output that holds the HTML for this route.
    ///
    /// `/` is `index.html` and `/a/b` is `a/b/index.html`. When that file
    /// is absent but a flat `a/b.html` exists, the flat file wins. Routes
    /// already ending in `.html` map straight to that file.
    pub fn target(&self, build_dir: &Path) -> PathBuf {
        let relative = self.0.trim_matches('/');
        if relative.is_empty() {
            return build_dir.join("index.html");
        }

        if relative.ends_with(".html") {
            return build_dir.join(relative);
        }

        let nested = build_dir.join(relative).join("index.html");
        if nested.exists() {
            return nested;
        }

        let flat = build_dir.join(format!("{}.html", relative));
        if flat.exists() { flat } else { nested }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for Route {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse a list of route strings, failing on the first invalid one
pub fn parse_routes<S: AsRef<str>>(paths: &[S]) -> Result<Vec<Route>> {
    paths.iter().map(|p| Route::parse(p.as_ref())).collect()
}

/// The shipped fallback list as validated routes
pub fn default_fallback_routes() -> Vec<Route> {
    DEFAULT_FALLBACK_ROUTES
        .iter()
        .map(|p| Route(p.to_string()))
        .collect()
}

/// A route that could not be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFailure {
    pub route: Route,
    pub error: String,
}

/// Outcome of a prerender run, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub succeeded: Vec<Route>,
    pub failed: Vec<RouteFailure>,
}

impl RenderSummary {
    pub fn rendered(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed(&self) -> usize {
        self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_route_parse_valid() {
        assert!(Route::parse("/").is_ok());
        assert!(Route::parse("/about_us").is_ok());
        assert!(Route::parse("/services/seo-content").is_ok());
        assert!(Route::parse("/blog/").is_ok());
    }

    #[test]
    fn test_route_parse_rejects_relative() {
        let result = Route::parse("about_us");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("must start with '/'"));

        assert!(Route::parse("").is_err());
    }

    #[test]
    fn test_route_parse_rejects_traversal() {
        let result = Route::parse("/../etc/passwd");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Relative segments not allowed")
        );

        assert!(Route::parse("/blog/../../secret").is_err());
        assert!(Route::parse("/./blog").is_err());
        assert!(Route::parse("/blog\\..\\x").is_err());
    }

    #[test]
    fn test_route_parse_rejects_query_and_fragment() {
        assert!(Route::parse("/blog?page=2").is_err());
        assert!(Route::parse("/blog#top").is_err());
    }

    #[test]
    fn test_default_fallback_routes_are_valid() {
        let routes = default_fallback_routes();
        assert_eq!(routes.len(), 17);
        assert_eq!(routes[0].as_str(), "/");
        assert_eq!(routes[16].as_str(), "/tools");
        for route in &routes {
            assert!(Route::parse(route.as_str()).is_ok(), "{}", route);
        }
    }

    #[test]
    fn test_target_root_and_nested() {
        let dir = tempfile::tempdir().unwrap();
        let root = Route::parse("/").unwrap();
        assert_eq!(root.target(dir.path()), dir.path().join("index.html"));

        let seo = Route::parse("/services/seo-content").unwrap();
        assert_eq!(
            seo.target(dir.path()),
            dir.path().join("services/seo-content/index.html")
        );

        let trailing = Route::parse("/blog/").unwrap();
        assert_eq!(trailing.target(dir.path()), dir.path().join("blog/index.html"));
    }

    #[test]
    fn test_route_parse_drops_trailing_slash() {
        assert_eq!(Route::parse("/blog/").unwrap(), Route::parse("/blog").unwrap());
        assert_eq!(Route::parse("/blog//").unwrap().as_str(), "/blog");
        assert_eq!(Route::parse("//").unwrap().as_str(), "/");
        assert_eq!(Route::parse("/").unwrap().as_str(), "/");
    }

    #[test]
    fn test_route_display_honors_width() {
        let route = Route::parse("/a").unwrap();
        assert_eq!(format!("[{:<6}]", route), "[/a    ]");
        assert_eq!(format!("[{:>4}]", route), "[  /a]");
    }

    #[test]
    fn test_route_url() {
        let route = Route::parse("/services/seo-content").unwrap();
        assert_eq!(
            route.url("http://127.0.0.1:4000"),
            "http://127.0.0.1:4000/services/seo-content"
        );
        assert_eq!(Route::parse("/").unwrap().url("http://x"), "http://x/");
    }

    #[test]
    fn test_target_prefers_flat_file_when_nested_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("about_us.html"), "<html></html>").unwrap();

        let route = Route::parse("/about_us").unwrap();
        assert_eq!(route.target(dir.path()), dir.path().join("about_us.html"));

        fs::create_dir_all(dir.path().join("about_us")).unwrap();
        fs::write(dir.path().join("about_us/index.html"), "<html></html>").unwrap();
        assert_eq!(
            route.target(dir.path()),
            dir.path().join("about_us/index.html")
        );
    }

    #[test]
    fn test_target_explicit_html() {
        let dir = tempfile::tempdir().unwrap();
        let route = Route::parse("/404.html").unwrap();
        assert_eq!(route.target(dir.path()), dir.path().join("404.html"));
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RenderSummary::default();
        assert!(summary.is_success());

        summary.succeeded.push(Route::parse("/").unwrap());
        summary.failed.push(RouteFailure {
            route: Route::parse("/blog").unwrap(),
            error: "timed out".to_string(),
        });

        assert_eq!(summary.rendered(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_success());
    }
}
