//! Immutable, serializable view of the town for renderers.

use serde::Serialize;

use hamlet_core::{
    AgentId, BehaviorState, GridCell, LandmarkKey, LifecycleStatus, Position, Role, SenderId,
};

use crate::agent::{Agent, Roster};
use crate::feed::{FeedMessage, MessageFeed};

/// One agent as a renderer sees it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentView {
    /// Worker identity.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Role.
    pub role: Role,
    /// Reported lifecycle status.
    pub status: LifecycleStatus,
    /// Behavioral state.
    pub state: BehaviorState,
    /// Continuous position in tile units.
    pub position: Position,
    /// Cell under `position`.
    pub cell: GridCell,
    /// Assigned landmark.
    pub target: Option<LandmarkKey>,
    /// Excluded from rendering.
    pub hidden: bool,
    /// Error overlay, derived from status.
    pub error: bool,
    /// Speech bubble text, if any.
    pub speech: Option<String>,
}

impl From<&Agent> for AgentView {
    fn from(agent: &Agent) -> Self {
        let profile = agent.profile();
        let motion = agent.motion();
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            role: profile.role.clone(),
            status: profile.status,
            state: motion.state,
            position: motion.position,
            cell: motion.position.cell(),
            target: motion.target.clone(),
            hidden: motion.hidden,
            error: profile.status == LifecycleStatus::Error,
            speech: agent.speech().map(|s| s.text.clone()),
        }
    }
}

/// One feed message as a renderer sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    /// Author.
    pub sender: SenderId,
    /// Body.
    pub text: String,
    /// Server timestamp.
    pub timestamp: String,
}

impl From<&FeedMessage> for FeedEntry {
    fn from(m: &FeedMessage) -> Self {
        Self {
            sender: m.sender.clone(),
            text: m.text.clone(),
            timestamp: m.timestamp.clone(),
        }
    }
}

/// Everything a renderer or title bar may read.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    /// Coalescer generation this snapshot was taken at.
    pub generation: u64,
    /// Whether the event stream is connected.
    pub connected: bool,
    /// Agents in first-seen order, hidden ones included.
    pub agents: Vec<AgentView>,
    /// Retained feed, oldest first.
    pub feed: Vec<FeedEntry>,
    /// Most recent messages for the bulletin, oldest first.
    pub bulletin: Vec<FeedEntry>,
}

impl Snapshot {
    pub(crate) fn capture(
        generation: u64,
        connected: bool,
        roster: &Roster,
        feed: &MessageFeed,
    ) -> Self {
        Self {
            generation,
            connected,
            agents: roster.iter().map(AgentView::from).collect(),
            feed: feed.iter().map(FeedEntry::from).collect(),
            bulletin: feed.bulletin().map(FeedEntry::from).collect(),
        }
    }

    /// Agent by identity.
    pub fn agent(&self, id: &str) -> Option<&AgentView> {
        self.agents.iter().find(|a| a.id.as_str() == id)
    }

    /// Agents that should be drawn.
    pub fn visible(&self) -> impl Iterator<Item = &AgentView> {
        self.agents.iter().filter(|a| !a.hidden)
    }

    /// Agents whose status is `active`.
    pub fn active_count(&self) -> usize {
        self.agents
            .iter()
            .filter(|a| a.status == LifecycleStatus::Active)
            .count()
    }

    /// Title-bar suffix: `disconnected`, `all done`, `(N active)`, or empty
    /// when connected and nobody is active.
    pub fn headline(&self) -> String {
        if !self.connected {
            return "disconnected".to_string();
        }
        let all_done = !self.agents.is_empty()
            && self
                .agents
                .iter()
                .all(|a| a.status == LifecycleStatus::Complete);
        match self.active_count() {
            _ if all_done => "all done".to_string(),
            0 => String::new(),
            n => format!("({n} active)"),
        }
    }
}
