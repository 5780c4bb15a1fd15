//! The `prism serve` command: HTTP surface over the render core.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use clap::Args;
use prism_core::{
    CacheStore, Config, MemoryStore, Prism, RenderError, RenderRequest, RequestKind, Rendered,
    Trace,
};
use tokio::net::TcpListener;

use super::help::HELP_PAGE;

/// How often expired cache entries are dropped.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address, overrides `server.bind`
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    let bind = config.server.bind.clone();

    let store = Arc::new(MemoryStore::new());
    let shared: Arc<dyn CacheStore> = store.clone();
    let prism = Arc::new(Prism::new(config, shared)?);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            store.purge_expired();
        }
    });

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("cannot bind {bind}"))?;
    tracing::info!(addr = %bind, "Prism listening");

    axum::serve(listener, router(prism).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Prism stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
}

/// Routes `/uri/*` and `/oid/*`; everything else gets the help page.
pub fn router(prism: Arc<Prism>) -> Router {
    Router::new()
        .route("/uri/{*rest}", get(direct))
        .route("/oid/{*rest}", get(identifier))
        .fallback(help)
        .with_state(prism)
}

async fn help() -> Html<&'static str> {
    Html(HELP_PAGE)
}

async fn direct(
    State(prism): State<Arc<Prism>>,
    Path(rest): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    respond(&prism, RequestKind::Direct, &rest, &query, &headers).await
}

async fn identifier(
    State(prism): State<Arc<Prism>>,
    Path(rest): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    respond(&prism, RequestKind::Identifier, &rest, &query, &headers).await
}

/// Flags are presence-based: `?debug` and `?debug=0` both enable tracing.
async fn respond(
    prism: &Prism,
    kind: RequestKind,
    rest: &str,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Response {
    if query.contains_key("help") {
        return help().await.into_response();
    }

    let debug = query.contains_key("debug");
    let trace = if debug {
        Trace::collecting()
    } else {
        Trace::discard()
    };
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let request = match RenderRequest::parse(kind, rest, trace.clone()) {
        Ok(request) => request
            .with_accept(accept)
            .with_refresh(query.contains_key("cacheRefresh")),
        Err(e) => {
            tracing::debug!(path = %rest, "{e}");
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };

    let result = prism.render(&request).await;
    if let Err(e) = &result {
        if e.is_fatal() {
            tracing::error!(path = %request.path, "Render failed: {e}");
        }
        trace.note(format!("error: {e}"));
    }

    match (debug, result) {
        (true, result) => {
            let status = match &result {
                Ok(_) => StatusCode::OK,
                Err(e) => error_status(e),
            };
            (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                trace.render(),
            )
                .into_response()
        }
        (false, Ok(rendered)) => image_response(rendered),
        (false, Err(e)) => (error_status(&e), e.to_string()).into_response(),
    }
}

fn error_status(error: &RenderError) -> StatusCode {
    match error {
        RenderError::InvalidRequest(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn image_response(rendered: Rendered) -> Response {
    let content_type = rendered.content_type();
    let etag = rendered.etag();
    let mut response = Response::new(Body::from(rendered.bytes));

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::{Method, Request};
    use image::{DynamicImage, GenericImageView, ImageFormat};
    use std::io::Cursor;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut buffer, ImageFormat::Jpeg)
            .unwrap();
        buffer.into_inner()
    }

    /// Router over a mirror holding the placeholder and `mgid:file:/a.jpg`.
    /// The endpoints point at a closed port so nothing leaves the process.
    fn app() -> (Router, TempDir) {
        let mirror = TempDir::new().unwrap();
        std::fs::write(mirror.path().join("default_missing.jpg"), jpeg(16, 16)).unwrap();
        std::fs::create_dir_all(mirror.path().join("mgid_file_")).unwrap();
        std::fs::write(mirror.path().join("mgid_file_/a.jpg"), jpeg(200, 100)).unwrap();

        let mut config = Config::default();
        config.origin.base_url = "http://127.0.0.1:9".to_string();
        config.origin.timeout_ms = 500;
        config.metadata.base_url = "http://127.0.0.1:9/".to_string();
        config.metadata.timeout_ms = 500;
        config.mirror.base_dir = mirror.path().to_string_lossy().into_owned();

        let prism = Arc::new(Prism::with_memory_store(config).unwrap());
        (router(prism), mirror)
    }

    async fn send(app: &Router, uri: &str, accept: Option<&str>) -> Response {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(accept) = accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        app.clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_unknown_route_serves_help() {
        let (app, _mirror) = app();
        let response = send(&app, "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
        let text = String::from_utf8(body(response).await).unwrap();
        assert!(text.contains("cacheRefresh"));
    }

    #[tokio::test]
    async fn test_help_flag_wins_over_rendering() {
        let (app, _mirror) = app();
        let response = send(&app, "/uri/rw=50/mgid:file:/a.jpg?help", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_missing_identifier_is_not_found() {
        let (app, _mirror) = app();
        let response = send(&app, "/uri/rw=50/nothing-here.jpg", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_direct_render_from_mirror() {
        let (app, _mirror) = app();
        let response = send(&app, "/uri/rw=50/mgid:file:/a.jpg", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpg");
        let etag = response.headers()[header::ETAG].to_str().unwrap().to_string();
        assert!(etag.starts_with('"') && etag.ends_with('"'));

        let bytes = body(response).await;
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!(image.dimensions(), (50, 25));
    }

    #[tokio::test]
    async fn test_accept_header_negotiates_webp() {
        let (app, _mirror) = app();
        let response = send(
            &app,
            "/uri/rw=40/mgid:file:/a.jpg",
            Some("image/avif,image/webp,*/*"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/webp");
    }

    #[tokio::test]
    async fn test_debug_returns_trace_instead_of_image() {
        let (app, _mirror) = app();
        let response = send(&app, "/uri/rw=50/mgid:file:/a.jpg?debug", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
        let text = String::from_utf8(body(response).await).unwrap();
        assert!(text.contains("resize: 50x25"));
    }

    #[tokio::test]
    async fn test_unreachable_metadata_serves_placeholder() {
        let (app, _mirror) = app();
        let response = send(&app, "/oid/rw=8/mgid:arc:video:example.com:abc", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = body(response).await;
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!(image.dimensions(), (8, 8));
    }

    #[tokio::test]
    async fn test_missing_placeholder_is_server_error() {
        let (app, mirror) = app();
        std::fs::remove_file(mirror.path().join("default_missing.jpg")).unwrap();
        let response = send(&app, "/oid/rw=8/mgid:other:video:example.com:abc", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
