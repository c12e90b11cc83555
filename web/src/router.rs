use crate::controller::{chat_controller, index_controller, not_found};
use crate::sse::handler::sse_handler;
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use log::*;
use tower_http::cors::{AllowOrigin, CorsLayer};

const ANY_ORIGIN: &str = "*";

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(chat_routes(app_state.clone()))
        .merge(index_routes(app_state))
        .fallback(not_found)
}

// `get` also answers HEAD unless a HEAD route is given, so HEAD is routed to
// `not_found` explicitly. CORS wraps only the GET/POST endpoints: preflight
// OPTIONS requests fall through to the method fallback.
fn chat_routes(app_state: AppState) -> Router {
    let max_message_bytes = app_state.config.max_message_bytes;
    let cors = cors_layer(&app_state.config.allowed_origins);

    Router::new()
        .route(
            "/chat",
            get(sse_handler)
                .head(not_found)
                .post(chat_controller::submit)
                .route_layer(cors)
                .fallback(not_found),
        )
        .layer(DefaultBodyLimit::max(max_message_bytes))
        .with_state(app_state)
}

fn index_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(index_controller::index)
                .head(not_found)
                .fallback(not_found),
        )
        .with_state(app_state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.iter().any(|origin| origin.trim() == ANY_ORIGIN) {
        info!("CORS allows any origin");
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}
