use ::sse::message::KEEP_ALIVE_FRAME;
use async_stream::stream;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use log::*;
use service::AppState;
use std::convert::Infallible;
use tokio::time::{self, Instant, MissedTickBehavior};

/// SSE handler that attaches a receiver and holds the connection open,
/// streaming every chat event broadcast from now on.
pub(crate) async fn sse_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let mut subscription = app_state.sse_manager.attach();
    let keep_alive = app_state.config.keep_alive_interval();

    debug!(
        "Establishing SSE connection {}",
        subscription.id().as_str()
    );

    // The subscription is owned by the stream. When the client disconnects
    // hyper drops the body, and the subscription detaches itself on drop.
    let stream = stream! {
        let mut ticker = keep_alive.map(|period| {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            let frame = match ticker.as_mut() {
                Some(ticker) => {
                    let frame = tokio::select! {
                        frame = subscription.recv() => frame,
                        _ = ticker.tick() => Some(Bytes::from_static(KEEP_ALIVE_FRAME)),
                    };
                    // Only idle streams need keep-alives.
                    ticker.reset();
                    frame
                }
                None => subscription.recv().await,
            };

            match frame {
                Some(frame) => yield Ok::<_, Infallible>(frame),
                None => break,
            }
        }

        // Only reached when the server closes the stream (shutdown).
        debug!(
            "SSE stream for connection {} closed by server",
            subscription.id().as_str()
        );
    };

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CONNECTION, "keep-alive"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
}
