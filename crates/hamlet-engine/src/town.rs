//! The [`Town`] aggregate: map, roster, reconciler, scheduler and
//! coalescer behind one single-threaded API.
//!
//! Every method takes `now`, the caller's monotonic time since the
//! session started. Nothing here blocks or fails at runtime; the only
//! error is invalid configuration at construction.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use hamlet_core::{SenderId, TownEvent};
use hamlet_map::TownMap;

use crate::agent::Roster;
use crate::coalesce::{FrameRequest, RenderCoalescer};
use crate::config::{ConfigError, TownConfig};
use crate::feed::MessageFeed;
use crate::motion::{MotionScheduler, TickReport};
use crate::outbound::OutboundRequest;
use crate::reconcile::Reconciler;
use crate::snapshot::Snapshot;

/// Live town state.
#[derive(Debug)]
pub struct Town {
    config: Arc<TownConfig>,
    map: TownMap,
    roster: Roster,
    reconciler: Reconciler,
    scheduler: MotionScheduler,
    coalescer: RenderCoalescer,
    outbox: Vec<OutboundRequest>,
}

impl Town {
    /// Validate `config` and load `map_text`.
    ///
    /// A map with no landmarks is accepted; no agent can be placed on
    /// it until a map with landmarks is loaded.
    pub fn new(config: TownConfig, map_text: &str) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        let map = load_map(&config, map_text);
        Ok(Self {
            reconciler: Reconciler::new(Arc::clone(&config)),
            scheduler: MotionScheduler::new(&config),
            config,
            map,
            roster: Roster::default(),
            coalescer: RenderCoalescer::new(),
            outbox: Vec::new(),
        })
    }

    // ── Inputs ──────────────────────────────────────────────────

    /// Apply a decoded event. Returns whether visible state changed.
    pub fn apply(&mut self, event: TownEvent, now: Duration) -> bool {
        let kind = event.kind();
        let mut changed = self.reconciler.apply(
            event,
            &mut self.roster,
            &mut self.scheduler,
            &self.map,
            now,
        );
        changed |= self.reconciler.attach_speech(&mut self.roster, now);
        debug!(kind, changed, agents = self.roster.len(), "event applied");
        if changed {
            self.mark_dirty();
        }
        changed
    }

    /// Decode and apply a raw stream frame. Undecodable frames are
    /// logged and dropped.
    pub fn apply_frame(&mut self, kind: &str, data: &str, now: Duration) -> bool {
        match TownEvent::decode(kind, data) {
            Ok(event) => self.apply(event, now),
            Err(e) => {
                warn!(kind, error = %e, "dropping undecodable event");
                false
            }
        }
    }

    /// Queue a message post for the server.
    pub fn post_message(&mut self, sender: SenderId, text: impl Into<String>) {
        self.outbox.push(OutboundRequest::PostMessage {
            sender,
            text: text.into(),
        });
    }

    /// Queue a mark-read for the server.
    pub fn mark_read(&mut self, reader: SenderId) {
        self.outbox.push(OutboundRequest::MarkRead { reader });
    }

    /// Take every queued outbound request.
    pub fn drain_outbound(&mut self) -> Vec<OutboundRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Replace the map and reroute every agent.
    pub fn reload_map(&mut self, map_text: &str, now: Duration) {
        self.map = load_map(&self.config, map_text);
        self.reconciler
            .realign(&mut self.roster, &mut self.scheduler, &self.map, now);
        self.mark_dirty();
    }

    // ── Clock ───────────────────────────────────────────────────

    /// Advance motion and timers to `now` and refresh speech bubbles.
    pub fn tick(&mut self, now: Duration) -> TickReport {
        let report = self.scheduler.tick(&mut self.roster, self.map.grid(), now);
        let speech = self.reconciler.attach_speech(&mut self.roster, now);
        if report.changed() || speech {
            self.mark_dirty();
        }
        report
    }

    /// Whether the caller should keep delivering frames at the frame
    /// interval: agents are walking or a repaint is pending.
    pub fn needs_frame(&self) -> bool {
        self.scheduler.is_armed() || self.coalescer.is_pending()
    }

    /// Earliest future time something changes without input: a dwell
    /// or wander timer, or a speech bubble expiring.
    pub fn next_wakeup(&self) -> Option<Duration> {
        let speech = self
            .roster
            .iter()
            .filter_map(|a| a.speech().map(|s| s.expires_at))
            .min();
        match (self.scheduler.next_deadline(&self.roster), speech) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Consume a display frame: a snapshot if anything changed since the
    /// last painted one, otherwise `None`.
    pub fn frame(&mut self) -> Option<Snapshot> {
        self.coalescer.on_frame().then(|| self.snapshot())
    }

    /// Current state, regardless of the coalescer.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            self.coalescer.generation(),
            self.reconciler.is_connected(),
            &self.roster,
            self.reconciler.feed(),
        )
    }

    fn mark_dirty(&mut self) {
        if self.coalescer.mark_dirty() == FrameRequest::Schedule {
            debug!(generation = self.coalescer.generation(), "frame scheduled");
        }
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Validated configuration.
    pub fn config(&self) -> &TownConfig {
        &self.config
    }

    /// Loaded map.
    pub fn map(&self) -> &TownMap {
        &self.map
    }

    /// Live agents.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Message feed.
    pub fn feed(&self) -> &MessageFeed {
        self.reconciler.feed()
    }

    /// Whether the motion scheduler is armed.
    pub fn is_animating(&self) -> bool {
        self.scheduler.is_armed()
    }
}

fn load_map(config: &TownConfig, text: &str) -> TownMap {
    let map = TownMap::load(text, &config.registry, &config.terrain);
    if map.landmarks().is_empty() {
        warn!(
            width = map.grid().width(),
            height = map.grid().height(),
            "map has no landmarks; agents cannot be placed"
        );
    } else {
        info!(
            width = map.grid().width(),
            height = map.grid().height(),
            landmarks = map.landmarks().len(),
            "map loaded"
        );
    }
    map
}
