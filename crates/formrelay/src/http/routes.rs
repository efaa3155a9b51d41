//! Front door request handlers.
//!
//! Pages, static files and the form relay, with the status codes each
//! path can produce.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::{error, warn};

use super::assets::{content_type, Assets, Page};
use super::AppState;
use crate::error::Error;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Build the front door routes.
///
/// `/`, `/index` and `/message` serve pages; any other GET falls through
/// to the static root. POST to any path relays the body.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/index", get(index).post(submit))
        .route("/message", get(message).post(submit))
        .fallback(fallback)
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Response {
    render(&state.assets, Page::Index, StatusCode::OK).await
}

async fn message(State(state): State<AppState>) -> Response {
    render(&state.assets, Page::Message, StatusCode::OK).await
}

async fn fallback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match method {
        Method::GET | Method::HEAD => serve_static(&state, uri.path()).await,
        Method::POST => submit(State(state), headers, body).await,
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

//
// POST <any>
// Relay the raw body to the decoder and send the browser back to /index.
// Relay failures, a full queue included, are logged only; the browser
// always sees the redirect.
//
async fn submit(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(length) = content_length(&headers) else {
        warn!("Rejecting POST without a valid Content-Length");
        return (StatusCode::BAD_REQUEST, "missing or invalid Content-Length").into_response();
    };

    let payload = body.slice(..length.min(body.len())).to_vec();
    match state.relay.forward(payload).await {
        Ok(()) => {}
        Err(e @ Error::QueueFull { .. }) => warn!("Decoder is behind: {e}"),
        Err(e) => error!("Failed to relay form data: {e}"),
    }

    (StatusCode::FOUND, [(header::LOCATION, "/index")]).into_response()
}

async fn serve_static(state: &AppState, path: &str) -> Response {
    let Some(file) = state.assets.resolve_static(path).await else {
        return render(&state.assets, Page::Error, StatusCode::NOT_FOUND).await;
    };

    match tokio::fs::read(&file).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type(&file))],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to read static file {}: {e}", file.display());
            render(&state.assets, Page::Error, StatusCode::NOT_FOUND).await
        }
    }
}

async fn render(assets: &Assets, page: Page, status: StatusCode) -> Response {
    match assets.page(page).await {
        Ok(body) => (status, [(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!("Failed to read template {}: {e}", page.file_name());
            // Keep a not-found a not-found even without its page
            let status = if status.is_success() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                status
            };
            (status, "page unavailable").into_response()
        }
    }
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
