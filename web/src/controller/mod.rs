use axum::http::StatusCode;

pub(crate) mod chat_controller;
pub(crate) mod index_controller;

/// Any path or method the relay does not serve: 404 with an empty body.
pub(crate) async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
