//! The reconciler: applies [`TownEvent`]s to the roster and feed.
//!
//! Events are applied in arrival order with last-writer-wins per
//! identity. A roster snapshot is authoritative (absent identities are
//! retired); a delta only ever upserts. Every apply reports whether it
//! changed anything visible so the caller can mark the coalescer dirty.
//!
//! The orchestrator is not a roster child: it is the session row named
//! by the snapshot's `parent_session_id`, re-derived whenever either the
//! roster or the session list changes.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use tracing::{debug, info};

use hamlet_core::{
    AgentId, LandmarkKey, LifecycleStatus, PostedMessage, RosterEntry, SenderId, SessionRow,
    TownEvent,
};
use hamlet_map::{Landmark, TownMap};

use crate::agent::{Agent, Profile, Roster, Speech};
use crate::config::TownConfig;
use crate::feed::MessageFeed;
use crate::motion::{Dwell, MotionScheduler};

/// Single writer of agent identity, role and status.
#[derive(Debug)]
pub struct Reconciler {
    config: Arc<TownConfig>,
    feed: MessageFeed,
    sender_map: IndexMap<SenderId, AgentId>,
    sessions: Vec<SessionRow>,
    parent: Option<AgentId>,
    orchestrator: Option<AgentId>,
    connected: bool,
}

impl Reconciler {
    /// A reconciler with an empty feed, initially disconnected.
    pub fn new(config: Arc<TownConfig>) -> Self {
        Self {
            feed: MessageFeed::new(&config.feed),
            config,
            sender_map: IndexMap::new(),
            sessions: Vec::new(),
            parent: None,
            orchestrator: None,
            connected: false,
        }
    }

    /// The message feed.
    pub fn feed(&self) -> &MessageFeed {
        &self.feed
    }

    /// Last reported stream connectivity.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Apply one event. Returns whether visible state changed.
    pub fn apply(
        &mut self,
        event: TownEvent,
        roster: &mut Roster,
        scheduler: &mut MotionScheduler,
        map: &TownMap,
        now: Duration,
    ) -> bool {
        match event {
            TownEvent::RosterSnapshot(mut snapshot) => {
                self.sender_map = snapshot.sender_map;
                self.parent = snapshot.parent_session_id;
                if let Some(rows) = snapshot.sessions {
                    self.sessions = rows;
                }
                let orchestrator = self.orchestrator_entry();
                self.orchestrator = orchestrator.as_ref().map(|e| e.id.clone());
                if let Some(entry) = orchestrator {
                    if !snapshot.agents.iter().any(|e| e.id == entry.id) {
                        snapshot.agents.push(entry);
                    }
                }
                let mut dirty = false;
                for entry in &snapshot.agents {
                    dirty |= self.upsert(entry, roster, scheduler, map, now);
                }
                let present: HashSet<&AgentId> = snapshot.agents.iter().map(|e| &e.id).collect();
                let retired = roster.retain(|id| {
                    let keep = present.contains(id);
                    if !keep {
                        debug!(agent = %id, "retired: absent from roster snapshot");
                    }
                    keep
                });
                dirty |= retired > 0;
                for message in snapshot.feed_window {
                    dirty |= self.feed.push(message, now, true);
                }
                dirty
            }
            TownEvent::RosterDelta(delta) => delta.agents.iter().fold(false, |dirty, entry| {
                self.upsert(entry, roster, scheduler, map, now) || dirty
            }),
            TownEvent::MessagePosted(message) => self.message_posted(message, roster, scheduler, now),
            TownEvent::MessageRead(read) => match roster.by_speaker_mut(&read.reader) {
                Some(agent) => scheduler.begin_dwell(agent, Dwell::Reading, now),
                None => false,
            },
            TownEvent::SessionsChanged(list) => {
                self.sessions = list.rows;
                self.sessions_changed(roster, scheduler, map, now)
            }
            TownEvent::ConnectivityChanged(connected) => {
                let changed = self.connected != connected;
                self.connected = connected;
                changed
            }
            TownEvent::Reset => {
                info!(agents = roster.len(), messages = self.feed.len(), "reset");
                roster.clear();
                self.feed.clear();
                self.sender_map.clear();
                self.sessions.clear();
                self.parent = None;
                self.orchestrator = None;
                scheduler.reset();
                true
            }
        }
    }

    /// The orchestrator's session row as a roster entry, unless it is a
    /// dashboard or unknown.
    fn orchestrator_entry(&self) -> Option<RosterEntry> {
        let parent = self.parent.as_ref()?;
        let row = self.sessions.iter().find(|row| &row.id == parent)?;
        if row.is_dashboard() {
            debug!(session = %row.id, "dashboard session is not drawn");
            return None;
        }
        Some(row.as_entry(&self.config.orchestrator_role))
    }

    fn sessions_changed(
        &mut self,
        roster: &mut Roster,
        scheduler: &mut MotionScheduler,
        map: &TownMap,
        now: Duration,
    ) -> bool {
        let entry = self.orchestrator_entry();
        let next = entry.as_ref().map(|e| e.id.clone());
        let mut dirty = false;
        if let Some(old) = self.orchestrator.take() {
            if next.as_ref() != Some(&old) {
                debug!(agent = %old, "retired: no longer the orchestrator");
                dirty |= roster.retain(|id| *id != old) > 0;
            }
        }
        if let Some(entry) = &entry {
            dirty |= self.upsert(entry, roster, scheduler, map, now);
        }
        self.orchestrator = next;
        dirty
    }

    fn message_posted(
        &mut self,
        message: PostedMessage,
        roster: &mut Roster,
        scheduler: &mut MotionScheduler,
        now: Duration,
    ) -> bool {
        let sender = message.sender.clone();
        if !self.feed.push(message, now, false) {
            debug!(%sender, "duplicate message dropped");
            return false;
        }
        if let Some(agent) = roster.by_speaker_mut(&sender) {
            scheduler.begin_dwell(agent, Dwell::Posting, now);
        }
        true
    }

    // ── Upsert ──────────────────────────────────────────────────

    fn upsert(
        &self,
        entry: &RosterEntry,
        roster: &mut Roster,
        scheduler: &mut MotionScheduler,
        map: &TownMap,
        now: Duration,
    ) -> bool {
        let profile = self.profile(entry);
        let Some(target) = self.select_landmark(&profile, map) else {
            debug!(agent = %entry.id, "no landmark on the map; not placed");
            return false;
        };

        if let Some(agent) = roster.get_mut(entry.id.as_str()) {
            let before = agent.clone();
            agent.profile = profile;
            retarget(agent, target, scheduler, map, now);
            return *agent != before;
        }

        // Unknown age counts as new.
        let recent = entry
            .elapsed_seconds
            .is_none_or(|s| s < self.config.spawn.recent_threshold_secs);
        let spawn_at = if recent || profile.status.hides_in_retirement() {
            map.landmarks()
                .get(&self.config.retirement)
                .unwrap_or(target)
        } else {
            target
        };
        debug!(agent = %profile.id, role = %profile.role, at = %spawn_at.key, "spawned");
        let mut agent = Agent::new(profile, scheduler.spawn(spawn_at));
        retarget(&mut agent, target, scheduler, map, now);
        roster.insert(agent);
        true
    }

    fn profile(&self, entry: &RosterEntry) -> Profile {
        let name = entry.name.clone().unwrap_or_else(|| entry.id.to_string());
        let role = entry
            .role
            .clone()
            .unwrap_or_else(|| self.config.roles.infer(&name));
        let speaker = if role == self.config.orchestrator_role {
            self.config.orchestrator_sender.clone()
        } else {
            // Later sender_map entries win over earlier ones.
            self.sender_map
                .iter()
                .rev()
                .find(|(_, agent)| **agent == entry.id)
                .map(|(sender, _)| sender.clone())
                .or_else(|| entry.wall_id.clone())
                .unwrap_or_else(|| SenderId::new(name.as_str()))
        };
        Profile {
            id: entry.id.clone(),
            name,
            role,
            status: entry.status,
            speaker,
        }
    }

    /// Retirement if resting, else the role's landmark, else the fallback;
    /// the retirement landmark when the chosen one is not on the map.
    fn select_landmark<'m>(&self, profile: &Profile, map: &'m TownMap) -> Option<&'m Landmark> {
        let key: &LandmarkKey = if profile.status.is_resting() {
            &self.config.retirement
        } else {
            self.config
                .registry
                .landmark_for_role(&profile.role)
                .unwrap_or(&self.config.fallback)
        };
        let landmarks = map.landmarks();
        landmarks
            .get(key)
            .or_else(|| landmarks.get(&self.config.retirement))
    }

    // ── Speech ──────────────────────────────────────────────────

    /// Attach each agent's latest live message younger than the display
    /// duration; clear expired ones. Returns whether any bubble changed.
    pub fn attach_speech(&self, roster: &mut Roster, now: Duration) -> bool {
        let display = self.config.speech.display();
        let max_chars = self.config.speech.max_chars;
        let mut changed = false;
        for agent in roster.iter_mut() {
            let speech = self
                .feed
                .latest_from(&agent.profile.speaker, now, display)
                .map(|m| Speech {
                    text: truncate(&m.text, max_chars),
                    expires_at: m.received_at + display,
                });
            if agent.speech != speech {
                agent.speech = speech;
                changed = true;
            }
        }
        changed
    }

    /// Reroute every agent after the map was replaced.
    pub fn realign(
        &self,
        roster: &mut Roster,
        scheduler: &mut MotionScheduler,
        map: &TownMap,
        now: Duration,
    ) {
        let mut lost = Vec::new();
        for agent in roster.iter_mut() {
            scheduler.forget_route(agent);
            match self.select_landmark(&agent.profile, map) {
                Some(target) => {
                    if !map.grid().contains(agent.motion.position.cell()) {
                        scheduler.relocate(agent, target);
                    }
                    retarget(agent, target, scheduler, map, now);
                }
                None => lost.push(agent.profile.id.clone()),
            }
        }
        if !lost.is_empty() {
            debug!(count = lost.len(), "agents have no landmark on the new map");
            roster.retain(|id| !lost.contains(id));
        }
    }
}

/// Route to `target` if it changed; otherwise refresh the settled state.
fn retarget(
    agent: &mut Agent,
    target: &Landmark,
    scheduler: &mut MotionScheduler,
    map: &TownMap,
    now: Duration,
) -> bool {
    if agent.motion.target.as_ref() != Some(&target.key) {
        scheduler.assign_route(agent, target, map.grid(), now)
    } else if agent.motion.path.is_empty() {
        scheduler.settle(agent, now)
    } else {
        false
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
