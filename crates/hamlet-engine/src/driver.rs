//! [`TownDriver`]: runs a [`Town`] on a dedicated thread.
//!
//! The thread exclusively owns the `Town`; everything else talks to it
//! through an unbounded crossbeam channel of [`DriverInput`]s. While
//! agents walk or a repaint is pending the loop wakes at the frame
//! interval; otherwise it sleeps until the next timer deadline or input.
//! Snapshots go to a caller-supplied callback, at most one per frame
//! interval, and outbound requests to an [`OutboundSink`].

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};

use hamlet_core::{SenderId, TownEvent};

use crate::config::ConfigError;
use crate::outbound::OutboundSink;
use crate::snapshot::Snapshot;
use crate::town::Town;

/// Longest sleep when nothing is scheduled.
const IDLE_WAIT: Duration = Duration::from_secs(1);

/// Input to the driver thread.
#[derive(Clone, Debug, PartialEq)]
pub enum DriverInput {
    /// A decoded event.
    Event(TownEvent),
    /// A raw stream frame, decoded on the driver thread.
    Raw {
        /// Stream event name.
        kind: String,
        /// JSON payload.
        data: String,
    },
    /// Post a message to the feed.
    PostMessage {
        /// Author.
        sender: SenderId,
        /// Body.
        text: String,
    },
    /// Mark the feed read.
    MarkRead {
        /// Reader identity.
        reader: SenderId,
    },
    /// Replace the map.
    ReloadMap(String),
    /// Stop the thread.
    Shutdown,
}

/// Handle to a running driver thread.
///
/// Dropping the handle shuts the thread down and discards the `Town`;
/// use [`shutdown`](Self::shutdown) to get it back.
pub struct TownDriver {
    tx: Sender<DriverInput>,
    handle: Option<JoinHandle<Town>>,
}

impl TownDriver {
    /// Move `town` onto a new thread named `hamlet-town`.
    pub fn spawn<F>(
        town: Town,
        sink: Box<dyn OutboundSink>,
        on_frame: F,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(&Snapshot) + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded();
        let state = DriverLoop {
            frame_interval: town.config().motion.frame_interval(),
            town,
            rx,
            sink,
            on_frame: Box::new(on_frame),
            epoch: Instant::now(),
            last_frame: None,
        };
        let handle = thread::Builder::new()
            .name("hamlet-town".into())
            .spawn(move || state.run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("failed to spawn town thread: {e}"),
            })?;
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    /// A sender for feeding input from other threads.
    pub fn sender(&self) -> Sender<DriverInput> {
        self.tx.clone()
    }

    /// Send one input. Returns `false` if the thread has stopped.
    pub fn send(&self, input: DriverInput) -> bool {
        self.tx.send(input).is_ok()
    }

    /// Stop the thread and recover the `Town`.
    ///
    /// Returns `None` if the thread panicked.
    pub fn shutdown(mut self) -> Option<Town> {
        self.stop()
    }

    fn stop(&mut self) -> Option<Town> {
        let handle = self.handle.take()?;
        // The thread may already be gone; joining tells us either way.
        let _ = self.tx.send(DriverInput::Shutdown);
        handle.join().ok()
    }
}

impl Drop for TownDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

struct DriverLoop {
    town: Town,
    rx: Receiver<DriverInput>,
    sink: Box<dyn OutboundSink>,
    on_frame: Box<dyn FnMut(&Snapshot) + Send>,
    epoch: Instant,
    frame_interval: Duration,
    last_frame: Option<Duration>,
}

impl DriverLoop {
    fn run(mut self) -> Town {
        info!("town driver started");
        'outer: loop {
            let wait = self.wait(self.epoch.elapsed());
            match self.rx.recv_timeout(wait) {
                Ok(input) => {
                    if !self.handle(input) {
                        break;
                    }
                    // Drain the burst before ticking.
                    while let Ok(input) = self.rx.try_recv() {
                        if !self.handle(input) {
                            break 'outer;
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let now = self.epoch.elapsed();
            self.town.tick(now);
            self.flush_outbound();
            if self.frame_due(now) {
                if let Some(snapshot) = self.town.frame() {
                    (self.on_frame)(&snapshot);
                    self.last_frame = Some(now);
                }
            }
        }
        self.flush_outbound();
        info!("town driver stopped");
        self.town
    }

    fn flush_outbound(&mut self) {
        for request in self.town.drain_outbound() {
            self.sink.send(request);
        }
    }

    /// Apply one input; `false` means stop.
    fn handle(&mut self, input: DriverInput) -> bool {
        let now = self.epoch.elapsed();
        match input {
            DriverInput::Event(event) => {
                self.town.apply(event, now);
            }
            DriverInput::Raw { kind, data } => {
                self.town.apply_frame(&kind, &data, now);
            }
            DriverInput::PostMessage { sender, text } => self.town.post_message(sender, text),
            DriverInput::MarkRead { reader } => self.town.mark_read(reader),
            DriverInput::ReloadMap(text) => self.town.reload_map(&text, now),
            DriverInput::Shutdown => {
                debug!("shutdown requested");
                return false;
            }
        }
        true
    }

    fn frame_due(&self, now: Duration) -> bool {
        self.last_frame
            .is_none_or(|t| now.saturating_sub(t) >= self.frame_interval)
    }

    fn wait(&self, now: Duration) -> Duration {
        if self.town.needs_frame() {
            return match self.last_frame {
                Some(t) => (t + self.frame_interval).saturating_sub(now),
                None => Duration::ZERO,
            };
        }
        self.town
            .next_wakeup()
            .map_or(IDLE_WAIT, |at| at.saturating_sub(now).min(IDLE_WAIT))
    }
}
