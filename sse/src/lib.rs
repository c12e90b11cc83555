//! Server-Sent Events (SSE) fan-out for the chat relay.
//!
//! Every submitted chat message is pushed, as one `chat` event, to every client
//! currently holding an open event stream.
//!
//! # Architecture
//!
//! - **Connection registry**: the set of attached receivers, keyed by a
//!   server-generated `ConnectionId`. One lock guards attach, detach and
//!   iteration, so a broadcast never sees a half-updated set and concurrent
//!   broadcasts reach every receiver in the same order.
//! - **Per-receiver queues**: a broadcast only enqueues a frame on each
//!   receiver's unbounded channel. Each connection drains its own queue, so a
//!   slow or dead client never holds up the others.
//! - **Close-driven cleanup**: `Manager::attach` hands back a `Subscription`.
//!   Dropping it, which happens when the HTTP response stream is dropped after
//!   the client disconnects, removes the receiver. The broadcast path never
//!   removes anything itself.
//! - **Ephemeral messages**: nothing is stored. A receiver only sees messages
//!   broadcast while it is attached.
//!
//! # Message Flow
//!
//! 1. Client opens `GET /chat`; the web layer calls `Manager::attach` and streams
//!    the subscription's frames, starting with `event: chat\ndata: Connected\n\n`.
//! 2. Client submits `POST /chat`; once the body is read, the web layer calls
//!    `Manager::broadcast` with the text.
//! 3. The message is framed once (one `data: ` line per line of text) and queued
//!    on every registered receiver.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry, ReceiverHandle and ConnectionId
//! - `manager`: broadcast engine and the self-detaching Subscription
//! - `message`: `text/event-stream` framing of chat events

pub mod connection;
pub mod manager;
pub mod message;

pub use manager::{Manager, Subscription};
