// src/server/mod.rs

//! Development server with live reload (`browserSync`).
//!
//! Static files are served from `server.base_dir`. HTML responses get a small
//! client script that listens on [`RELOAD_PATH`] (server-sent events) and
//! either reloads the page or re-fetches stylesheets.

pub mod reload;

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::stream::{self, Stream, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::tasks::{TaskContext, wait_for_shutdown};

pub use reload::{LiveReload, ReloadSignal};

/// Event stream endpoint subscribed to by the injected client.
pub const RELOAD_PATH: &str = "/__assetdag/reload";

const CLIENT_SCRIPT: &str = concat!(
    "<script>(function(){",
    "var es=new EventSource(\"/__assetdag/reload\");",
    "es.onmessage=function(e){",
    "if(e.data===\"css\"){",
    "document.querySelectorAll('link[rel=\"stylesheet\"]').forEach(function(l){",
    "var u=new URL(l.href);u.searchParams.set(\"_r\",Date.now());l.href=u.toString();});",
    "}else{location.reload();}};",
    "})();</script>"
);

#[derive(Clone)]
struct AppState {
    reload: LiveReload,
    shutdown: watch::Receiver<bool>,
}

/// Router serving `base_dir` with reload injection.
///
/// Event streams end when `shutdown` flips to `true`, so graceful shutdown
/// does not wait on open browser tabs.
pub fn router(base_dir: PathBuf, reload: LiveReload, shutdown: watch::Receiver<bool>) -> Router {
    Router::new()
        .route(RELOAD_PATH, get(reload_events))
        .fallback_service(ServeDir::new(base_dir))
        .layer(middleware::from_fn(inject_reload_client))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { reload, shutdown })
}

/// Run the dev server until shutdown is requested on `ctx`.
pub async fn browser_sync(ctx: Arc<TaskContext>) -> Result<()> {
    let server = &ctx.config.server;
    let addr = format!("{}:{}", server.host, server.port);
    let base_dir = ctx.path(&server.base_dir);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding dev server to {addr}"))?;
    info!(base = %base_dir.display(), "dev server listening on http://{addr}");

    let app = router(base_dir, ctx.reload.clone(), ctx.shutdown_receiver());
    let shutdown = wait_for_shutdown(ctx.shutdown_receiver());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("dev server failed")?;

    info!("dev server stopped");
    Ok(())
}

async fn reload_events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.reload.subscribe();

    let events = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(signal) => Some((Ok(Event::default().data(signal.as_str())), rx)),
            Err(broadcast::error::RecvError::Lagged(_)) => {
                // Whatever was missed, a full reload covers it.
                Some((Ok(Event::default().data(ReloadSignal::Page.as_str())), rx))
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    })
    .take_until(wait_for_shutdown(state.shutdown));

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

async fn inject_reload_client(req: Request, next: Next) -> Response {
    let head = req.method() == Method::HEAD;
    let response = next.run(req).await;

    // Only full, unencoded HTML bodies are rewritten.
    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    let encoded = response.headers().contains_key(CONTENT_ENCODING);
    if head || response.status() != StatusCode::OK || !is_html || encoded {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to buffer HTML response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_script(&bytes);
    parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(html.len()));
    Response::from_parts(parts, Body::from(html))
}

/// Insert the reload client before the last `</body>`, or append it.
///
/// Works on raw bytes, so documents in any ASCII-compatible encoding pass
/// through unchanged apart from the inserted script.
pub fn inject_script(html: &[u8]) -> Vec<u8> {
    const CLOSE_BODY: &[u8] = b"</body>";
    let at = html
        .windows(CLOSE_BODY.len())
        .rposition(|w| w.eq_ignore_ascii_case(CLOSE_BODY))
        .unwrap_or(html.len());

    let mut out = Vec::with_capacity(html.len() + CLIENT_SCRIPT.len());
    out.extend_from_slice(&html[..at]);
    out.extend_from_slice(CLIENT_SCRIPT.as_bytes());
    out.extend_from_slice(&html[at..]);
    out
}
