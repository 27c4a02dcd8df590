//! User-initiated requests leaving the town.
//!
//! The engine only queues these. Delivery is fire-and-forget: a sink
//! must never block the caller, and failures are its own to log.

use serde::Serialize;

use hamlet_core::SenderId;

/// A request for the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundRequest {
    /// Post `text` to the feed as `sender`.
    PostMessage {
        /// Author.
        sender: SenderId,
        /// Body.
        text: String,
    },
    /// Mark the feed read by `reader`.
    MarkRead {
        /// Reader identity.
        reader: SenderId,
    },
}

/// Destination for outbound requests.
pub trait OutboundSink: Send {
    /// Hand off `request`. Must not block on delivery.
    fn send(&mut self, request: OutboundRequest);
}

impl OutboundSink for Vec<OutboundRequest> {
    fn send(&mut self, request: OutboundRequest) {
        self.push(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_serialize_tagged() {
        let json = serde_json::to_value(OutboundRequest::MarkRead {
            reader: SenderId::new("orchestrator"),
        })
        .unwrap();
        assert_eq!(json["type"], "mark_read");
        assert_eq!(json["reader"], "orchestrator");
    }

    #[test]
    fn vec_sink_collects_in_order() {
        let mut sink = Vec::new();
        sink.send(OutboundRequest::PostMessage {
            sender: SenderId::new("human"),
            text: "hi".into(),
        });
        sink.send(OutboundRequest::MarkRead {
            reader: SenderId::new("human"),
        });
        assert_eq!(sink.len(), 2);
        assert!(matches!(sink[0], OutboundRequest::PostMessage { .. }));
    }
}
