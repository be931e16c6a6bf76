// Headless Chrome/Chromium driven through its command line

use crate::Renderer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

/// Browser binaries tried, in order, when none is configured
const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

#[derive(Debug, Clone, Default)]
pub struct ChromeOptions {
    /// Explicit binary name or path; PATH is searched when unset
    pub browser: Option<PathBuf>,
    /// Pass `--no-sandbox` (needed when running as root in containers)
    pub no_sandbox: bool,
}

/// One prerender session backed by a headless Chrome binary.
///
/// Every render runs in its own short-lived profile under a session
/// directory. The directory is removed on `close` or drop, and render
/// processes are killed if their future is dropped.
pub struct ChromeRenderer {
    binary: PathBuf,
    no_sandbox: bool,
    profile_root: PathBuf,
    profiles: Mutex<Option<TempDir>>,
}

impl ChromeRenderer {
    /// Locate the browser, check it runs, and set up the session directory
    pub async fn launch(options: ChromeOptions) -> Result<Self> {
        let binary = resolve_browser(options.browser.as_deref())?;

        let version = Command::new(&binary)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to start browser {}", binary.display()))?;

        if !version.status.success() {
            anyhow::bail!(
                "Browser {} failed to report its version ({})",
                binary.display(),
                version.status
            );
        }

        info!(
            browser = %binary.display(),
            version = %String::from_utf8_lossy(&version.stdout).trim(),
            "launched headless browser session"
        );

        let profiles = tempfile::Builder::new()
            .prefix("prerender-session-")
            .tempdir()
            .context("Failed to create browser session directory")?;

        Ok(Self {
            binary,
            no_sandbox: options.no_sandbox,
            profile_root: profiles.path().to_path_buf(),
            profiles: Mutex::new(Some(profiles)),
        })
    }

    fn is_open(&self) -> bool {
        self.profiles
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &str, settle: Duration) -> Result<String> {
        if !self.is_open() {
            anyhow::bail!("Browser session already closed");
        }

        let profile = tempfile::Builder::new()
            .prefix("profile-")
            .tempdir_in(&self.profile_root)
            .context("Failed to create browser profile")?;

        let args = chrome_args(profile.path(), url, settle, self.no_sandbox);
        debug!(url, ?args, "rendering");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to start browser {}", self.binary.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "Browser exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr)
            );
        }

        let html = String::from_utf8_lossy(&output.stdout);
        let html = html.trim();
        if html.is_empty() {
            anyhow::bail!(
                "Browser returned an empty document: {}",
                stderr_tail(&output.stderr)
            );
        }

        Ok(with_doctype(html))
    }

    async fn close(&self) -> Result<()> {
        let profiles = self
            .profiles
            .lock()
            .map_err(|_| anyhow::anyhow!("Browser session lock poisoned"))?
            .take();

        if let Some(dir) = profiles {
            dir.close()
                .context("Failed to remove browser session directory")?;
        }

        Ok(())
    }
}

/// Find the browser binary, honoring an explicit choice first
fn resolve_browser(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(browser) = explicit {
        return which::which(browser)
            .with_context(|| format!("Configured browser not found: {}", browser.display()));
    }

    BROWSER_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
        .with_context(|| {
            format!(
                "No headless browser found on PATH (tried {}). Install Chromium or set PRERENDER_BROWSER",
                BROWSER_CANDIDATES.join(", ")
            )
        })
}

fn chrome_args(profile: &Path, url: &str, settle: Duration, no_sandbox: bool) -> Vec<String> {
    let mut args = vec![
        "--headless=new".to_string(),
        "--disable-gpu".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--hide-scrollbars".to_string(),
        "--mute-audio".to_string(),
        format!("--user-data-dir={}", profile.display()),
    ];

    if no_sandbox {
        args.push("--no-sandbox".to_string());
    }

    if !settle.is_zero() {
        args.push(format!("--virtual-time-budget={}", settle.as_millis()));
    }

    args.push("--dump-dom".to_string());
    args.push(url.to_string());
    args
}

/// `--dump-dom` serializes the element tree only
fn with_doctype(html: &str) -> String {
    if html
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"))
    {
        html.to_string()
    } else {
        format!("<!DOCTYPE html>\n{}", html)
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(5);
    if lines.is_empty() {
        "no output".to_string()
    } else {
        lines[start..].join(" | ")
    }
}
