//! Transport for the hamlet town view.
//!
//! - [`SseDecoder`] turns a server-sent event byte stream into
//!   `(event, data)` frames.
//! - [`EventStreamClient`] holds a streaming GET open, forwards frames
//!   and connectivity into a [`TownDriver`](hamlet_engine::TownDriver)
//!   channel, and reconnects per [`ReconnectPolicy`].
//! - [`OutboundClient`] delivers [`OutboundRequest`](hamlet_engine::OutboundRequest)s
//!   fire-and-forget.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod outbound;
pub mod policy;
pub mod sse;

pub use client::EventStreamClient;
pub use error::StreamError;
pub use outbound::OutboundClient;
pub use policy::{ReconnectPolicy, Watchdog};
pub use sse::{SseDecoder, SseFrame};
