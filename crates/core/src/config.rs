use crate::error::{Error, Result};
use crate::types::{Route, default_fallback_routes, parse_routes};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ORIGIN: &str = "https://www.godigitalpro.in";
pub const DEFAULT_SITEMAP: &str = "public/sitemap.xml";
pub const DEFAULT_BUILD_DIR: &str = "dist";
pub const CONFIG_FILE_NAME: &str = "prerender.toml";

/// Environment variable holding the canonical site origin
pub const ORIGIN_ENV: &str = "SITE_URL";
/// Environment variable naming the headless browser binary
pub const BROWSER_ENV: &str = "PRERENDER_BROWSER";

const DEFAULT_SETTLE_MS: u64 = 1500;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved prerender configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical origin, without trailing slash
    pub origin: String,
    pub sitemap: PathBuf,
    pub build_dir: PathBuf,
    pub render: RenderConfig,
    pub fallback_routes: Vec<Route>,
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Time allowed for client-side rendering before the DOM is captured
    pub settle: Duration,
    /// Upper bound for a single route, including browser startup
    pub timeout: Duration,
    pub concurrency: usize,
    pub browser: Option<PathBuf>,
    pub no_sandbox: bool,
    /// Write routes whose target file does not exist yet
    pub create_missing: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: 1,
            browser: None,
            no_sandbox: false,
            create_missing: false,
        }
    }
}

impl Config {
    /// Defaults for a project rooted at `root`
    pub fn with_root(root: &Path) -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            sitemap: root.join(DEFAULT_SITEMAP),
            build_dir: root.join(DEFAULT_BUILD_DIR),
            render: RenderConfig::default(),
            fallback_routes: default_fallback_routes(),
        }
    }

    /// Apply environment overrides; `lookup` is `std::env::var` in production
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(origin) = lookup(ORIGIN_ENV).filter(|v| !v.trim().is_empty()) {
            self.origin = normalize_origin(&origin);
        }

        if let Some(browser) = lookup(BROWSER_ENV).filter(|v| !v.trim().is_empty()) {
            self.render.browser = Some(PathBuf::from(browser.trim()));
        }
    }
}

/// Strip whitespace and trailing slashes from an origin
pub fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_string()
}

/// Raw TOML configuration structure
/// This matches the prerender.toml file structure exactly
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    site: RawSite,
    #[serde(default)]
    paths: RawPaths,
    #[serde(default)]
    render: RawRender,
    #[serde(default)]
    routes: RawRoutes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSite {
    origin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPaths {
    sitemap: Option<String>,
    build_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRender {
    settle_ms: Option<u64>,
    timeout_secs: Option<u64>,
    concurrency: Option<usize>,
    browser: Option<String>,
    no_sandbox: Option<bool>,
    create_missing: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRoutes {
    fallback: Option<Vec<String>>,
}

/// Load configuration for the project at `root`.
///
/// An explicitly given `config_path` must exist. Without one,
/// `<root>/prerender.toml` is read when present and defaults apply
/// otherwise. Environment overrides are not applied here.
pub fn load_config(root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let path = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::ConfigParse(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => {
            let path = root.join(CONFIG_FILE_NAME);
            if !path.exists() {
                return Ok(Config::with_root(root));
            }
            path
        }
    };

    let content = fs::read_to_string(&path)?;
    parse_config_str(&content, root)
}

/// Parse prerender.toml from a string (useful for testing)
pub fn parse_config_str(content: &str, root: &Path) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)?;
    let mut config = Config::with_root(root);

    if let Some(origin) = raw.site.origin {
        let origin = normalize_origin(&origin);
        if origin.is_empty() {
            return Err(Error::ConfigParse("Empty 'site.origin'".to_string()));
        }
        config.origin = origin;
    }

    if let Some(sitemap) = raw.paths.sitemap {
        config.sitemap = root.join(validate_path(&sitemap, "paths.sitemap")?);
    }

    if let Some(build_dir) = raw.paths.build_dir {
        config.build_dir = root.join(validate_path(&build_dir, "paths.build_dir")?);
    }

    if let Some(settle_ms) = raw.render.settle_ms {
        config.render.settle = Duration::from_millis(settle_ms);
    }

    if let Some(timeout_secs) = raw.render.timeout_secs {
        if timeout_secs == 0 {
            return Err(Error::ConfigParse(
                "'render.timeout_secs' must be at least 1".to_string(),
            ));
        }
        config.render.timeout = Duration::from_secs(timeout_secs);
    }

    if let Some(concurrency) = raw.render.concurrency {
        if concurrency == 0 {
            return Err(Error::ConfigParse(
                "'render.concurrency' must be at least 1".to_string(),
            ));
        }
        config.render.concurrency = concurrency;
    }

    if let Some(browser) = raw.render.browser {
        config.render.browser = Some(PathBuf::from(browser));
    }

    config.render.no_sandbox = raw.render.no_sandbox.unwrap_or(false);
    config.render.create_missing = raw.render.create_missing.unwrap_or(false);

    if let Some(fallback) = raw.routes.fallback {
        if fallback.is_empty() {
            return Err(Error::ConfigParse(
                "'routes.fallback' must list at least one route".to_string(),
            ));
        }
        let mut routes = parse_routes(&fallback)
            .map_err(|e| Error::ConfigParse(format!("In 'routes.fallback': {}", e)))?;
        let mut seen = HashSet::new();
        routes.retain(|route| seen.insert(route.clone()));
        config.fallback_routes = routes;
    }

    Ok(config)
}

/// Validate and convert a path string to PathBuf.
///
/// Paths in prerender.toml are relative to the project root. Absolute
/// paths and parent directory references (`..`) are rejected.
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    let path = Path::new(path_str);

    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use paths relative to the project root.",
            field_name, path_str
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    Ok(path.to_path_buf())
}
