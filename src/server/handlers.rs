// src/server/handlers.rs

//! Dev server request handlers.

use std::convert::Infallible;
use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use futures::Stream;
use percent_encoding::percent_decode_str;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tower::ServiceExt as _;
use tower_http::services::ServeFile;
use tracing::{debug, warn};

use super::DevServerState;
use super::inject::{CLIENT_SCRIPT, inject_client};

/// Serve the live-reload client.
pub async fn client_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        CLIENT_SCRIPT,
    )
}

/// Stream reload instructions to one browser tab.
pub async fn events(
    State(state): State<DevServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(clients = state.reload.client_count() + 1, "live reload client connected");

    let stream = BroadcastStream::new(state.reload.subscribe()).map(|msg| {
        let event = match msg {
            Ok(message) => Event::default()
                .event(message.event_name())
                .data(message.to_json()),
            // A slow client missed messages; a full reload covers all of them.
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "live reload client lagged; forcing full reload");
                Event::default().event("reload").data(r#"{"type":"reload"}"#)
            }
        };
        Ok(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Serve a file from the first base directory that has it.
///
/// Directories resolve to their `index.html`. HTML responses get the
/// live-reload client injected; everything else is streamed as-is.
pub async fn serve_static(State(state): State<DevServerState>, req: Request) -> Response {
    let Some(rel) = sanitize_path(req.uri().path()) else {
        warn!(path = %req.uri().path(), "rejected request path");
        return StatusCode::NOT_FOUND.into_response();
    };

    let Some(file) = resolve(&state.base_dirs, &rel).await else {
        debug!(path = %req.uri().path(), "not found in any base directory");
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    if is_html(&file) {
        return match tokio::fs::read_to_string(&file).await {
            Ok(body) => Html(inject_client(&body)).into_response(),
            Err(err) => {
                warn!(path = %file.display(), error = %err, "failed to read html file");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };
    }

    match ServeFile::new(&file).oneshot(req).await {
        Ok(res) => res.map(Body::new).into_response(),
        Err(never) => match never {},
    }
}

/// Turn a URL path into a relative filesystem path.
///
/// Segments are percent-decoded first, so `%2e%2e` counts as `..`. Returns
/// `None` for anything that could escape a base directory or that doesn't
/// decode to UTF-8.
pub fn sanitize_path(url_path: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for raw in url_path.split('/') {
        let segment = percent_decode_str(raw).decode_utf8().ok()?;
        match segment.as_ref() {
            "" | "." => continue,
            ".." => return None,
            s if s.contains(['/', '\\', '\0']) => return None,
            s => out.push(s),
        }
    }

    // A segment like `C:` would still make the path absolute on Windows.
    if out.components().all(|c| matches!(c, Component::Normal(_))) {
        Some(out)
    } else {
        None
    }
}

async fn resolve(base_dirs: &[PathBuf], rel: &Path) -> Option<PathBuf> {
    for base in base_dirs {
        let candidate = base.join(rel);
        let Ok(meta) = tokio::fs::metadata(&candidate).await else {
            continue;
        };

        if meta.is_file() {
            return Some(candidate);
        }
        if meta.is_dir() {
            let index = candidate.join("index.html");
            if tokio::fs::metadata(&index).await.is_ok_and(|m| m.is_file()) {
                return Some(index);
            }
        }
    }
    None
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}
