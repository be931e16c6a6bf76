use crate::Renderer;
use crate::server::StaticServer;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use prerender_core::config::RenderConfig;
use prerender_core::{
    Config, Discovery, Error, RenderSummary, Route, RouteFailure, discover_routes,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Per-route rendering knobs
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub settle: Duration,
    pub timeout: Duration,
    /// Renders in flight at once; 1 renders strictly in order
    pub concurrency: usize,
    pub create_missing: bool,
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            settle: config.settle,
            timeout: config.timeout,
            concurrency: config.concurrency,
            create_missing: config.create_missing,
        }
    }
}

/// What a pipeline run discovered and rendered
#[derive(Debug, Clone)]
pub struct PrerenderReport {
    pub discovery: Discovery,
    pub summary: RenderSummary,
}

impl PrerenderReport {
    pub fn nothing_to_do(&self) -> bool {
        self.discovery.routes.is_empty()
    }
}

/// Discover routes, then render them into the build output.
///
/// `launch` is only called once the build directory is known to exist.
/// The renderer and the local server are torn down on every path after
/// they start; teardown problems are logged and do not change the result.
pub async fn run<L, Fut, R>(config: &Config, launch: L) -> Result<PrerenderReport>
where
    L: FnOnce() -> Fut,
    Fut: Future<Output = Result<R>>,
    R: Renderer,
{
    let discovery = discover_routes(&config.sitemap, &config.origin, &config.fallback_routes);
    info!(
        count = discovery.routes.len(),
        source = %discovery.source,
        "discovered routes"
    );

    if discovery.routes.is_empty() {
        info!("nothing to prerender");
        return Ok(PrerenderReport {
            discovery,
            summary: RenderSummary::default(),
        });
    }

    if !config.build_dir.is_dir() {
        return Err(Error::MissingBuildDir(config.build_dir.clone()).into());
    }

    let server = StaticServer::start(&config.build_dir).await?;

    let renderer = match launch().await {
        Ok(renderer) => renderer,
        Err(e) => {
            if let Err(err) = server.shutdown().await {
                warn!(error = %err, "failed to stop static server");
            }
            return Err(e.context("Failed to launch headless browser"));
        }
    };

    let options = RenderOptions::from(&config.render);
    let summary = execute(
        &renderer,
        server.base_url(),
        &discovery.routes,
        &config.build_dir,
        &options,
    )
    .await;

    if let Err(e) = renderer.close().await {
        warn!(error = %e, "failed to close browser session");
    }
    if let Err(e) = server.shutdown().await {
        warn!(error = %e, "failed to stop static server");
    }

    Ok(PrerenderReport { discovery, summary })
}

/// Render every route and write the result over its build output file.
///
/// Failures are isolated per route and collected in the summary, which
/// keeps discovery order whatever order renders finish in.
pub async fn execute<R>(
    renderer: &R,
    base_url: &str,
    routes: &[Route],
    build_dir: &Path,
    options: &RenderOptions,
) -> RenderSummary
where
    R: Renderer + ?Sized,
{
    let results: Vec<(Route, Result<PathBuf>)> = stream::iter(routes.iter().cloned())
        .map(|route| async move {
            let result = render_route(renderer, base_url, &route, build_dir, options).await;
            (route, result)
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut summary = RenderSummary::default();
    for (route, result) in results {
        match result {
            Ok(target) => {
                info!(route = %route, file = %target.display(), "rendered");
                summary.succeeded.push(route);
            }
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(route = %route, error = %error, "render failed");
                summary.failed.push(RouteFailure { route, error });
            }
        }
    }

    summary
}

async fn render_route<R>(
    renderer: &R,
    base_url: &str,
    route: &Route,
    build_dir: &Path,
    options: &RenderOptions,
) -> Result<PathBuf>
where
    R: Renderer + ?Sized,
{
    let target = route.target(build_dir);
    if !options.create_missing && !target.exists() {
        anyhow::bail!("No prerender target at {}", target.display());
    }

    let url = route.url(base_url);
    let html = tokio::time::timeout(options.timeout, renderer.render(&url, options.settle))
        .await
        .map_err(|_| anyhow::anyhow!("Timed out after {:?}", options.timeout))??;

    if options.create_missing
        && let Some(parent) = target.parent()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    tokio::fs::write(&target, html)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoRenderer;

    #[async_trait]
    impl Renderer for EchoRenderer {
        async fn render(&self, url: &str, _settle: Duration) -> Result<String> {
            Ok(format!("<html><body>{}</body></html>", url))
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    fn options() -> RenderOptions {
        RenderOptions {
            settle: Duration::ZERO,
            timeout: Duration::from_secs(5),
            concurrency: 1,
            create_missing: false,
        }
    }

    #[tokio::test]
    async fn test_missing_target_fails_without_creating_file() {
        let dir = tempfile::tempdir().unwrap();
        let routes = vec![Route::parse("/about_us").unwrap()];

        let summary = execute(&EchoRenderer, "http://local", &routes, dir.path(), &options()).await;

        assert_eq!(summary.rendered(), 0);
        assert_eq!(summary.failed(), 1);
        assert!(summary.failed[0].error.contains("No prerender target"));
        assert!(!dir.path().join("about_us").exists());
    }

    #[tokio::test]
    async fn test_create_missing_writes_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let routes = vec![Route::parse("/about_us").unwrap()];
        let options = RenderOptions {
            create_missing: true,
            ..options()
        };

        let summary = execute(&EchoRenderer, "http://local", &routes, dir.path(), &options).await;

        assert!(summary.is_success());
        let written = std::fs::read_to_string(dir.path().join("about_us/index.html")).unwrap();
        assert_eq!(written, "<html><body>http://local/about_us</body></html>");
    }

    #[test]
    fn test_options_from_config() {
        let config = RenderConfig {
            concurrency: 3,
            create_missing: true,
            ..RenderConfig::default()
        };
        let options = RenderOptions::from(&config);
        assert_eq!(options.concurrency, 3);
        assert!(options.create_missing);
        assert_eq!(options.timeout, config.timeout);
    }
}
