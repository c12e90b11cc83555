use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use log::*;
use service::AppState;

/// POST a chat message. The whole body is the message text.
///
/// The body is fully read before anything is broadcast. Invalid UTF-8 is
/// replaced rather than rejected, and an empty body is relayed as an empty message.
pub(crate) async fn submit(State(app_state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let text = String::from_utf8_lossy(&body);
    let delivered = app_state.sse_manager.broadcast(&text);

    debug!(
        "Relayed chat message of {} byte(s) to {delivered} connection(s)",
        body.len()
    );

    StatusCode::OK
}
