use anyhow::Result;
use prerender_renderer::{ChromeOptions, ChromeRenderer, PrerenderReport, pipeline};
use std::path::PathBuf;

/// Prerender all discovered routes into the build output
pub async fn run(root: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = super::resolve_config(&root, config)?;

    println!("🖨  Prerendering static pages...");
    println!("   Origin: {}", config.origin);
    println!("   Build:  {}", config.build_dir.display());
    println!();

    let chrome = ChromeOptions {
        browser: config.render.browser.clone(),
        no_sandbox: config.render.no_sandbox,
    };
    let report = pipeline::run(&config, || ChromeRenderer::launch(chrome)).await?;

    if !report.nothing_to_do() {
        println!();
    }
    println!("{}", summary_line(&report));

    let summary = &report.summary;
    if !summary.is_success() {
        eprintln!();
        eprintln!("⚠ {} routes failed:", summary.failed());
        for failure in &summary.failed {
            eprintln!("   ✗ {}: {}", failure.route, failure.error);
        }
    }

    outcome(&report)
}

fn summary_line(report: &PrerenderReport) -> String {
    if report.nothing_to_do() {
        "Nothing to prerender.".to_string()
    } else {
        format!("Rendered {} routes.", report.summary.rendered())
    }
}

/// Any failed route makes the whole run fail
fn outcome(report: &PrerenderReport) -> Result<()> {
    let summary = &report.summary;
    if !summary.is_success() {
        anyhow::bail!(
            "{} of {} routes failed to render",
            summary.failed(),
            summary.rendered() + summary.failed()
        );
    }

    Ok(())
}
