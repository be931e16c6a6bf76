// Headless rendering of built routes back into the build output

pub mod chrome;
pub mod pipeline;
pub mod server;

use async_trait::async_trait;
use std::time::Duration;

pub use chrome::{ChromeOptions, ChromeRenderer};
pub use pipeline::{PrerenderReport, RenderOptions, execute, run};
pub use server::StaticServer;

/// A browser session able to turn a URL into its rendered DOM
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Load `url`, give client-side code `settle` to finish, and return
    /// the serialized document.
    async fn render(&self, url: &str, settle: Duration) -> anyhow::Result<String>;

    /// Release the session. Renders after `close` fail.
    async fn close(&self) -> anyhow::Result<()>;
}
