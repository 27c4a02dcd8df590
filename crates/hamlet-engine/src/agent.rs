//! Agent entities and the roster that owns them.
//!
//! An [`Agent`] is split by writer: [`Profile`] is written only by the
//! reconciler, [`Motion`] only by the motion scheduler. Renderers see
//! neither directly; they read [`Snapshot`](crate::Snapshot)s.

use std::collections::VecDeque;
use std::time::Duration;

use indexmap::IndexMap;

use hamlet_core::{
    AgentId, BehaviorState, GridCell, LandmarkKey, LifecycleStatus, Position, Role, SenderId,
};

/// Identity, role and status as last reported.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    /// Worker identity.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Reported or inferred role.
    pub role: Role,
    /// Reported lifecycle status.
    pub status: LifecycleStatus,
    /// Identity this agent posts under on the feed.
    pub speaker: SenderId,
}

/// A pending timed transition. One slot: a dwell replaces a wander.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timer {
    /// Leave `posting`/`reading` at `until`.
    Dwell {
        /// Expiry.
        until: Duration,
    },
    /// Try a wander at `at`.
    Wander {
        /// Fire time.
        at: Duration,
    },
}

impl Timer {
    /// When the timer fires.
    pub fn due(self) -> Duration {
        match self {
            Self::Dwell { until } => until,
            Self::Wander { at } => at,
        }
    }
}

/// Position, path and behavioral state.
#[derive(Clone, Debug, PartialEq)]
pub struct Motion {
    /// Continuous position in tile units.
    pub position: Position,
    /// Landmark the agent is assigned to.
    pub target: Option<LandmarkKey>,
    /// Cell of that landmark; wander offsets are taken from here.
    pub home: GridCell,
    /// Remaining cells to walk, next first.
    pub path: VecDeque<GridCell>,
    /// Behavioral state.
    pub state: BehaviorState,
    /// Excluded from rendering.
    pub hidden: bool,
    /// Pending timed transition.
    pub timer: Option<Timer>,
}

impl Motion {
    /// Standing still at `position`, assigned to `target` at `home`.
    pub fn standing(position: Position, target: LandmarkKey, home: GridCell) -> Self {
        Self {
            position,
            target: Some(target),
            home,
            path: VecDeque::new(),
            state: BehaviorState::Idle,
            hidden: false,
            timer: None,
        }
    }
}

/// Speech bubble text with its expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Speech {
    /// Possibly truncated text.
    pub text: String,
    /// When the bubble disappears.
    pub expires_at: Duration,
}

/// One tracked worker.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub(crate) profile: Profile,
    pub(crate) motion: Motion,
    pub(crate) speech: Option<Speech>,
}

impl Agent {
    pub(crate) fn new(profile: Profile, motion: Motion) -> Self {
        Self {
            profile,
            motion,
            speech: None,
        }
    }

    /// Worker identity.
    pub fn id(&self) -> &AgentId {
        &self.profile.id
    }

    /// Reconciler-owned fields.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Scheduler-owned fields.
    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    /// Current speech bubble.
    pub fn speech(&self) -> Option<&Speech> {
        self.speech.as_ref()
    }

    /// Reported lifecycle status.
    pub fn status(&self) -> LifecycleStatus {
        self.profile.status
    }

    /// Behavioral state.
    pub fn state(&self) -> BehaviorState {
        self.motion.state
    }

    /// Continuous position.
    pub fn position(&self) -> Position {
        self.motion.position
    }

    /// Excluded from rendering.
    pub fn is_hidden(&self) -> bool {
        self.motion.hidden
    }

    /// Whether the agent still has cells to walk.
    pub fn is_walking(&self) -> bool {
        !self.motion.path.is_empty()
    }
}

/// Every live agent, in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    agents: IndexMap<AgentId, Agent>,
}

impl Roster {
    /// Agent by identity.
    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    /// Agents in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Number of live agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agents are live.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Whether any agent still has a path to walk.
    pub fn any_walking(&self) -> bool {
        self.agents.values().any(Agent::is_walking)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub(crate) fn insert(&mut self, agent: Agent) {
        self.agents.insert(agent.profile.id.clone(), agent);
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.values_mut()
    }

    /// First agent speaking as `speaker`, falling back to identity.
    pub(crate) fn by_speaker_mut(&mut self, speaker: &SenderId) -> Option<&mut Agent> {
        let idx = self
            .agents
            .values()
            .position(|a| &a.profile.speaker == speaker)
            .or_else(|| self.agents.get_index_of(speaker.as_str()))?;
        self.agents.get_index_mut(idx).map(|(_, a)| a)
    }

    /// Keep only agents for which `keep` returns true; returns how many were removed.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&AgentId) -> bool) -> usize {
        let before = self.agents.len();
        self.agents.retain(|id, _| keep(id));
        before - self.agents.len()
    }

    pub(crate) fn clear(&mut self) {
        self.agents.clear();
    }
}
