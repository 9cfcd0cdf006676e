use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod routes;

pub use api::ApiState;

/// Axum app: every request goes through [routes::route_request] on the blocking pool,
/// since a solve is CPU-bound and synchronous.
pub fn app(state: Arc<ApiState>) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(
    State(state): State<Arc<ApiState>>,
    method: Method,
    uri: Uri,
    body: String,
) -> Response {
    let method = method.as_str().to_string();
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let handled = tokio::task::spawn_blocking(move || {
        routes::route_request(&state, &method, &path, &body)
    })
    .await;

    match handled {
        Ok(response) => {
            let status =
                StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, [(header::CONTENT_TYPE, response.content_type)], response.body).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "request handler panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

pub async fn serve(state: Arc<ApiState>, bind_addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        candidates = state.catalog.len(),
        "porygon server listening"
    );
    axum::serve(listener, app(state)).await
}

/// Blocking entry point for the CLI.
pub fn run_server(state: ApiState, bind_addr: &str) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(Arc::new(state), bind_addr))
}
