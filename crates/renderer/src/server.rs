use anyhow::{Context, Result};
use axum::{
    Router,
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::{net::SocketAddr, path::Path, sync::Arc};
use tokio::{sync::oneshot, task::JoinHandle};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::debug;

/// Local HTTP server over the build output, used as the browser's origin.
///
/// Unknown paths get the application shell (`index.html`) as it was when
/// the server started, so client-side routing works for every route and
/// an already prerendered `/` is never served in place of the shell.
pub struct StaticServer {
    addr: SocketAddr,
    base_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl StaticServer {
    /// Serve `build_dir` on an ephemeral localhost port
    pub async fn start(build_dir: &Path) -> Result<Self> {
        let shell = tokio::fs::read_to_string(build_dir.join("index.html"))
            .await
            .ok()
            .map(Arc::new);

        if shell.is_none() {
            debug!(dir = %build_dir.display(), "no index.html shell, unknown paths will 404");
        }

        let fallback = move || {
            let shell = shell.clone();
            async move { shell_response(shell.as_deref()) }
        };

        let app = Router::new()
            .fallback_service(ServeDir::new(build_dir).fallback(fallback.into_service()))
            .layer(TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .context("Failed to bind local static server")?;
        let addr = listener
            .local_addr()
            .context("Failed to read static server address")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // A dropped sender also stops the server
                    let _ = shutdown_rx.await;
                })
                .await
        });

        debug!(%addr, dir = %build_dir.display(), "static server listening");

        Ok(Self {
            addr,
            base_url: format!("http://{}", addr),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://127.0.0.1:<port>`, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop accepting connections and wait for the server task
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("Static server task panicked")?
                .context("Static server error")?;
        }

        Ok(())
    }
}

fn shell_response(shell: Option<&String>) -> Response {
    match shell {
        Some(html) => Html(html.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
