//! Fire-and-forget HTTP delivery of outbound requests.

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use hamlet_engine::{OutboundRequest, OutboundSink};

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum Body {
    Post { message: String, sender_id: String },
    Read { reader_id: String },
}

/// Endpoint path and JSON body for `request`.
fn route(request: OutboundRequest) -> (&'static str, Body) {
    match request {
        OutboundRequest::PostMessage { sender, text } => (
            "/api/wall",
            Body::Post {
                message: text,
                sender_id: sender.0,
            },
        ),
        OutboundRequest::MarkRead { reader } => (
            "/api/wall/read",
            Body::Read {
                reader_id: reader.0,
            },
        ),
    }
}

/// [`OutboundSink`] that POSTs each request on a tokio runtime.
///
/// `send` returns immediately; failures are logged and dropped.
#[derive(Clone, Debug)]
pub struct OutboundClient {
    http: reqwest::Client,
    base_url: String,
    runtime: Handle,
}

impl OutboundClient {
    /// Client posting to `base_url`, spawning on `runtime`.
    pub fn new(base_url: impl Into<String>, runtime: Handle) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            runtime,
        }
    }
}

impl OutboundSink for OutboundClient {
    fn send(&mut self, request: OutboundRequest) {
        let (path, body) = route(request);
        let url = format!("{}{path}", self.base_url);
        let http = self.http.clone();
        self.runtime.spawn(async move {
            match http.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(%url, "outbound request delivered");
                }
                Ok(response) => {
                    warn!(%url, status = response.status().as_u16(), "outbound request rejected");
                }
                Err(e) => warn!(%url, error = %e, "outbound request failed"),
            }
        });
    }
}
