//! Async event-stream client.
//!
//! One session is one streaming GET. Each session reports
//! `ConnectivityChanged(true)` on connect and `false` on any end. A
//! failed or closed session is retried after [`ReconnectPolicy::retry`];
//! a session the watchdog finds silent is dropped and retried at once.
//! The client stops when the driver channel closes.

use std::time::Instant;

use crossbeam_channel::Sender;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use tracing::{debug, info, warn};

use hamlet_core::TownEvent;
use hamlet_engine::DriverInput;

use crate::error::StreamError;
use crate::policy::{ReconnectPolicy, Watchdog};
use crate::sse::SseDecoder;

/// How a session ended without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionEnd {
    /// The server closed the stream.
    Closed,
    /// No event within the silence threshold.
    Silent,
}

/// Streaming GET client feeding a driver channel.
#[derive(Clone, Debug)]
pub struct EventStreamClient {
    http: reqwest::Client,
    url: String,
    policy: ReconnectPolicy,
    sink: Sender<DriverInput>,
}

impl EventStreamClient {
    /// Client for `url`, forwarding into `sink`.
    pub fn new(url: impl Into<String>, sink: Sender<DriverInput>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            policy: ReconnectPolicy::default(),
            sink,
        }
    }

    /// Replace the reconnect policy.
    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reconnect forever, until the driver channel closes.
    pub async fn run(self) {
        loop {
            let outcome = self.session().await;
            if self
                .forward(DriverInput::Event(TownEvent::ConnectivityChanged(false)))
                .is_err()
            {
                break;
            }
            let delay = match outcome {
                Ok(SessionEnd::Silent) => {
                    warn!(url = %self.url, silence = ?self.policy.silence, "event stream silent, reconnecting");
                    continue;
                }
                Ok(SessionEnd::Closed) => {
                    warn!(url = %self.url, "event stream closed by server");
                    self.policy.retry
                }
                Err(StreamError::SinkClosed) => break,
                Err(e) => {
                    warn!(url = %self.url, error = %e, "event stream failed");
                    self.policy.retry
                }
            };
            debug!(?delay, "waiting before reconnect");
            tokio::time::sleep(delay).await;
        }
        info!(url = %self.url, "event stream client stopped");
    }

    async fn session(&self) -> Result<SessionEnd, StreamError> {
        let response = self
            .http
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Status {
                code: status.as_u16(),
            });
        }
        info!(url = %self.url, "event stream connected");
        self.forward(DriverInput::Event(TownEvent::ConnectivityChanged(true)))?;

        let mut decoder = SseDecoder::new();
        let mut watchdog = Watchdog::new(self.policy.silence, Instant::now());
        let mut poll = tokio::time::interval(self.policy.watchdog_poll);
        poll.tick().await;
        let mut stream = response.bytes_stream();

        loop {
            tokio::select! {
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        for frame in decoder.feed(&bytes) {
                            watchdog.record(Instant::now());
                            debug!(event = %frame.event, bytes = frame.data.len(), "frame");
                            self.forward(DriverInput::Raw {
                                kind: frame.event,
                                data: frame.data,
                            })?;
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(SessionEnd::Closed),
                },
                _ = poll.tick() => {
                    if watchdog.is_stale(Instant::now()) {
                        return Ok(SessionEnd::Silent);
                    }
                }
            }
        }
    }

    fn forward(&self, input: DriverInput) -> Result<(), StreamError> {
        self.sink.send(input).map_err(|_| StreamError::SinkClosed)
    }
}
