//! HTTP surface of the chat relay.
//!
//! - `GET /` serves the HTML chat client
//! - `GET /chat` opens a `text/event-stream` of chat events
//! - `POST /chat` broadcasts the request body as a chat message
//!
//! Everything else is answered with an empty 404.

pub(crate) mod controller;
pub mod router;
pub(crate) mod sse;

pub use router::define_routes;
pub use service::AppState;
