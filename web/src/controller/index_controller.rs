use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use service::AppState;

/// GET the HTML chat client.
pub(crate) async fn index(State(app_state): State<AppState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], app_state.index_html())
}
