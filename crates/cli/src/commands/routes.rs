use anyhow::Result;
use prerender_core::discover_routes;
use std::path::PathBuf;

/// Print the routes a run would render and where they came from
pub fn run(root: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = super::resolve_config(&root, config)?;
    let discovery = discover_routes(&config.sitemap, &config.origin, &config.fallback_routes);

    println!("Origin:  {}", config.origin);
    println!("Sitemap: {}", config.sitemap.display());
    println!("Source:  {}", discovery.source);
    println!();

    for route in &discovery.routes {
        println!("  {:<40} → {}", route, route.target(&config.build_dir).display());
    }

    println!();
    println!("{} routes", discovery.routes.len());

    Ok(())
}
