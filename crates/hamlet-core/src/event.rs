//! Typed events consumed by the reconciler.
//!
//! Each stream event kind decodes into exactly one [`TownEvent`]
//! variant, so handling is exhaustive: adding a kind is a compile-time
//! gap in every `match`, not a silently ignored field.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EventError;
use crate::id::{AgentId, Role, SenderId};
use crate::status::LifecycleStatus;

// ── Payloads ───────────────────────────────────────────────────────

/// One worker as reported in a roster event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireEntry")]
pub struct RosterEntry {
    /// Worker identity.
    pub id: AgentId,
    /// Display name; also the input for role inference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Identity the worker posts under on the feed, when it differs from `id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_id: Option<SenderId>,
    /// Reported role. Inferred from the name when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Reported lifecycle status.
    pub status: LifecycleStatus,
    /// Seconds since the worker was created, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
}

#[derive(Deserialize)]
struct WireEntry {
    id: AgentId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    wall_id: Option<SenderId>,
    #[serde(default)]
    gtwall_id: Option<SenderId>,
    #[serde(default)]
    role: Option<Role>,
    status: LifecycleStatus,
    #[serde(default)]
    elapsed_seconds: Option<f64>,
}

impl From<WireEntry> for RosterEntry {
    fn from(w: WireEntry) -> Self {
        Self {
            id: w.id,
            name: w.name,
            wall_id: w.gtwall_id.or(w.wall_id),
            role: w.role,
            status: w.status,
            elapsed_seconds: w.elapsed_seconds,
        }
    }
}

impl RosterEntry {
    /// Entry with only identity and status.
    pub fn new(id: impl Into<AgentId>, status: LifecycleStatus) -> Self {
        Self {
            id: id.into(),
            name: None,
            wall_id: None,
            role: None,
            status,
            elapsed_seconds: None,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: impl Into<Role>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the feed identity.
    pub fn with_wall_id(mut self, wall_id: impl Into<SenderId>) -> Self {
        self.wall_id = Some(wall_id.into());
        self
    }

    /// Set the elapsed seconds since creation.
    pub fn with_elapsed(mut self, seconds: f64) -> Self {
        self.elapsed_seconds = Some(seconds);
        self
    }
}

/// A session row from the server's session list.
///
/// Only the row named by [`RosterSnapshot::parent_session_id`] matters:
/// it becomes the orchestrator agent. Statuses outside
/// [`LifecycleStatus`] decode as `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    /// Session identity.
    pub id: AgentId,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Reported status, if it is one the town knows.
    #[serde(
        default,
        deserialize_with = "lenient_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<LifecycleStatus>,
    /// Seconds since the session started, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
}

impl SessionRow {
    /// Row with only an identity.
    pub fn new(id: impl Into<AgentId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            status: None,
            elapsed_seconds: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: LifecycleStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Dashboard sessions watch the town; they are never drawn in it.
    pub fn is_dashboard(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains("dashboard"))
    }

    /// The roster entry for this session acting as `role`.
    ///
    /// A missing or unrecognised status counts as active.
    pub fn as_entry(&self, role: &Role) -> RosterEntry {
        RosterEntry {
            id: self.id.clone(),
            name: self.name.clone(),
            wall_id: None,
            role: Some(role.clone()),
            status: self.status.unwrap_or(LifecycleStatus::Active),
            elapsed_seconds: self.elapsed_seconds,
        }
    }
}

/// The server's session list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionList {
    /// Every known session.
    #[serde(default)]
    pub rows: Vec<SessionRow>,
}

fn lenient_status<'de, D: Deserializer<'de>>(de: D) -> Result<Option<LifecycleStatus>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(de)?;
    Ok(raw.and_then(|v| LifecycleStatus::deserialize(v).ok()))
}

/// Authoritative roster: identities absent here are retired.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireSnapshot")]
pub struct RosterSnapshot {
    /// Every live worker.
    pub agents: Vec<RosterEntry>,
    /// Feed sender id to worker identity, in payload order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub sender_map: IndexMap<SenderId, AgentId>,
    /// Session whose row is drawn as the orchestrator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<AgentId>,
    /// Session list delivered with the roster; `None` keeps the last one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<Vec<SessionRow>>,
    /// Recent feed backlog delivered with the roster.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub feed_window: Vec<PostedMessage>,
}

#[derive(Deserialize)]
struct WireSnapshot {
    #[serde(default)]
    agents: Option<Vec<RosterEntry>>,
    #[serde(default)]
    children: Option<Vec<RosterEntry>>,
    #[serde(default)]
    sender_map: IndexMap<SenderId, AgentId>,
    #[serde(default)]
    parent_session_id: Option<AgentId>,
    #[serde(default)]
    sessions: Option<Vec<SessionRow>>,
    #[serde(default)]
    feed_window: Vec<PostedMessage>,
}

impl From<WireSnapshot> for RosterSnapshot {
    fn from(w: WireSnapshot) -> Self {
        Self {
            agents: w.children.or(w.agents).unwrap_or_default(),
            sender_map: w.sender_map,
            parent_session_id: w.parent_session_id,
            sessions: w.sessions,
            feed_window: w.feed_window,
        }
    }
}

/// Partial roster update. Never implies retirement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireDelta")]
pub struct RosterDelta {
    /// Workers whose state changed.
    pub agents: Vec<RosterEntry>,
}

#[derive(Deserialize)]
struct WireDelta {
    #[serde(default)]
    agents: Option<Vec<RosterEntry>>,
    #[serde(default)]
    children: Option<Vec<RosterEntry>>,
}

impl From<WireDelta> for RosterDelta {
    fn from(w: WireDelta) -> Self {
        Self {
            agents: w.children.or(w.agents).unwrap_or_default(),
        }
    }
}

/// A message posted to the shared feed.
///
/// Decodes from either the stream's spellings (`sender_id`, `message`,
/// `time`) or the field names; when a payload carries both, the
/// stream's spelling wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireMessage")]
pub struct PostedMessage {
    /// Author.
    pub sender: SenderId,
    /// Body.
    pub text: String,
    /// Server timestamp, kept verbatim for deduplication.
    pub timestamp: String,
}

impl PostedMessage {
    /// Build a message.
    pub fn new(
        sender: impl Into<SenderId>,
        text: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            timestamp: timestamp.into(),
        }
    }
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    sender: Option<SenderId>,
    #[serde(default)]
    sender_id: Option<SenderId>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, deserialize_with = "timestamp_text")]
    timestamp: Option<String>,
    #[serde(default, deserialize_with = "timestamp_text")]
    time: Option<String>,
}

impl TryFrom<WireMessage> for PostedMessage {
    type Error = String;

    fn try_from(w: WireMessage) -> Result<Self, String> {
        let sender = w
            .sender_id
            .or(w.sender)
            .ok_or_else(|| "missing field `sender_id`".to_string())?;
        Ok(Self {
            sender,
            text: w.message.or(w.text).unwrap_or_default(),
            timestamp: w.time.or(w.timestamp).unwrap_or_default(),
        })
    }
}

/// A worker read the feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireRead")]
pub struct MessageRead {
    /// Feed identity of the reader.
    pub reader: SenderId,
}

#[derive(Deserialize)]
struct WireRead {
    #[serde(default)]
    reader: Option<SenderId>,
    #[serde(default)]
    reader_id: Option<SenderId>,
}

impl TryFrom<WireRead> for MessageRead {
    type Error = String;

    fn try_from(w: WireRead) -> Result<Self, String> {
        w.reader_id
            .or(w.reader)
            .map(|reader| Self { reader })
            .ok_or_else(|| "missing field `reader_id`".to_string())
    }
}

/// Servers send timestamps as either strings or numbers.
fn timestamp_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Text(s) => Some(s),
        Raw::Number(n) => Some(n.to_string()),
        Raw::Null(()) => None,
    })
}

// ── TownEvent ──────────────────────────────────────────────────────

/// Every event the reconciler applies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TownEvent {
    /// Full roster; replaces the known identity set.
    RosterSnapshot(RosterSnapshot),
    /// Partial roster.
    RosterDelta(RosterDelta),
    /// New feed message.
    MessagePosted(PostedMessage),
    /// A worker read the feed.
    MessageRead(MessageRead),
    /// Fresh session list; may change who the orchestrator is.
    SessionsChanged(SessionList),
    /// The stream connected (`true`) or dropped (`false`).
    ConnectivityChanged(bool),
    /// Drop every agent, message and pending path.
    Reset,
}

#[derive(Deserialize)]
struct Bootstrap {
    #[serde(default)]
    tree: Option<RosterSnapshot>,
    #[serde(default)]
    wall: Backlog,
    #[serde(default)]
    sessions: Option<SessionList>,
}

#[derive(Default, Deserialize)]
struct Backlog {
    #[serde(default)]
    lines: Vec<PostedMessage>,
}

fn parse<T: DeserializeOwned>(kind: &str, data: &str) -> Result<T, EventError> {
    serde_json::from_str(data).map_err(|e| EventError::Malformed {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

impl TownEvent {
    /// Decode a stream frame by event name and JSON payload.
    ///
    /// Accepts both the stream's short names (`tree`, `wall`, ...) and
    /// the variant names (`roster_snapshot`, `message_posted`, ...).
    pub fn decode(kind: &str, data: &str) -> Result<Self, EventError> {
        match kind {
            "bootstrap" => {
                let boot: Bootstrap = parse(kind, data)?;
                let mut snapshot = boot.tree.unwrap_or_default();
                snapshot.feed_window.extend(boot.wall.lines);
                snapshot.sessions = Some(boot.sessions.unwrap_or_default().rows);
                Ok(Self::RosterSnapshot(snapshot))
            }
            "tree" | "roster_snapshot" => Ok(Self::RosterSnapshot(parse(kind, data)?)),
            "tree_delta" | "roster_delta" => Ok(Self::RosterDelta(parse(kind, data)?)),
            "wall" | "message_posted" => Ok(Self::MessagePosted(parse(kind, data)?)),
            "wall_read" | "message_read" => Ok(Self::MessageRead(parse(kind, data)?)),
            "sessions" | "sessions_changed" => Ok(Self::SessionsChanged(parse(kind, data)?)),
            "wall_reset" | "reset" => Ok(Self::Reset),
            "connectivity" | "connectivity_changed" => {
                Ok(Self::ConnectivityChanged(parse(kind, data)?))
            }
            other => Err(EventError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RosterSnapshot(_) => "roster_snapshot",
            Self::RosterDelta(_) => "roster_delta",
            Self::MessagePosted(_) => "message_posted",
            Self::MessageRead(_) => "message_read",
            Self::SessionsChanged(_) => "sessions_changed",
            Self::ConnectivityChanged(_) => "connectivity_changed",
            Self::Reset => "reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_tree_with_children_alias() {
        let data = r#"{"children":[{"id":"a","gtwall_id":"alpha","status":"active","elapsed_seconds":3}],
                       "sender_map":{"alpha":"a"}}"#;
        let TownEvent::RosterSnapshot(snap) = TownEvent::decode("tree", data).unwrap() else {
            panic!("expected roster snapshot");
        };
        assert_eq!(snap.agents.len(), 1);
        assert_eq!(snap.agents[0].wall_id, Some(SenderId::new("alpha")));
        assert_eq!(snap.agents[0].elapsed_seconds, Some(3.0));
        assert_eq!(snap.sender_map.get("alpha"), Some(&AgentId::new("a")));
    }

    #[test]
    fn decode_bootstrap_merges_wall_backlog() {
        let data = r#"{"tree":{"children":[]},
                       "wall":{"lines":[{"sender_id":"bob","message":"hi","timestamp":"t1"}]}}"#;
        let TownEvent::RosterSnapshot(snap) = TownEvent::decode("bootstrap", data).unwrap() else {
            panic!("expected roster snapshot");
        };
        assert!(snap.agents.is_empty());
        assert_eq!(snap.feed_window, vec![PostedMessage::new("bob", "hi", "t1")]);
    }

    #[test]
    fn decode_bootstrap_without_tree_is_empty_roster() {
        let ev = TownEvent::decode("bootstrap", "{}").unwrap();
        let expected = RosterSnapshot {
            sessions: Some(Vec::new()),
            ..RosterSnapshot::default()
        };
        assert_eq!(ev, TownEvent::RosterSnapshot(expected));
    }

    #[test]
    fn decode_bootstrap_carries_parent_and_sessions() {
        let data = r#"{"tree":{"parent_session_id":"s1","children":[]},
                       "sessions":{"rows":[{"id":"s1","name":"Lead","status":"running"},
                                           {"id":"s2","name":"x","status":"complete"}]}}"#;
        let TownEvent::RosterSnapshot(snap) = TownEvent::decode("bootstrap", data).unwrap() else {
            panic!("expected roster snapshot");
        };
        assert_eq!(snap.parent_session_id, Some(AgentId::new("s1")));
        let rows = snap.sessions.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, None);
        assert_eq!(rows[1].status, Some(LifecycleStatus::Complete));
    }

    #[test]
    fn plain_tree_leaves_sessions_unset() {
        let TownEvent::RosterSnapshot(snap) = TownEvent::decode("tree", r#"{"children":[]}"#).unwrap()
        else {
            panic!("expected roster snapshot");
        };
        assert_eq!(snap.sessions, None);
    }

    #[test]
    fn decode_sessions_event() {
        let ev = TownEvent::decode("sessions", r#"{"rows":[{"id":"s9","name":"Ops Dashboard"}]}"#)
            .unwrap();
        let TownEvent::SessionsChanged(list) = ev else {
            panic!("expected sessions");
        };
        assert_eq!(list.rows.len(), 1);
        assert!(list.rows[0].is_dashboard());
        assert_eq!(list.rows[0].status, None);
    }

    #[test]
    fn session_row_entry_defaults_to_active() {
        let row = SessionRow::new("s1").with_name("lead");
        let entry = row.as_entry(&Role::new("orchestrator"));
        assert_eq!(entry.status, LifecycleStatus::Active);
        assert_eq!(entry.role, Some(Role::new("orchestrator")));
        let done = row.with_status(LifecycleStatus::Complete).as_entry(&Role::new("orchestrator"));
        assert_eq!(done.status, LifecycleStatus::Complete);
    }

    #[test]
    fn both_spellings_present_prefers_the_stream_names() {
        let data = r#"{"sender":"a","sender_id":"b","text":"old","message":"new",
                       "timestamp":"t0","time":"t1"}"#;
        assert_eq!(
            TownEvent::decode("wall", data).unwrap(),
            TownEvent::MessagePosted(PostedMessage::new("b", "new", "t1"))
        );
        assert_eq!(
            TownEvent::decode("wall_read", r#"{"reader":"x","reader_id":"y"}"#).unwrap(),
            TownEvent::MessageRead(MessageRead {
                reader: SenderId::new("y")
            })
        );
        let tree = r#"{"agents":[{"id":"q","status":"idle"}],
                       "children":[{"id":"a","wall_id":"w","gtwall_id":"g","status":"active"}]}"#;
        let TownEvent::RosterSnapshot(snap) = TownEvent::decode("tree", tree).unwrap() else {
            panic!("expected roster snapshot");
        };
        assert_eq!(snap.agents.len(), 1);
        assert_eq!(snap.agents[0].wall_id, Some(SenderId::new("g")));
    }

    #[test]
    fn message_without_body_or_time_defaults_to_empty() {
        assert_eq!(
            TownEvent::decode("wall", r#"{"sender_id":"a"}"#).unwrap(),
            TownEvent::MessagePosted(PostedMessage::new("a", "", ""))
        );
        match TownEvent::decode("wall", r#"{"message":"orphan"}"#) {
            Err(EventError::Malformed { kind, .. }) => assert_eq!(kind, "wall"),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn sender_map_keeps_payload_order() {
        let data = r#"{"children":[],"sender_map":{"zed":"a","amy":"a"}}"#;
        let TownEvent::RosterSnapshot(snap) = TownEvent::decode("tree", data).unwrap() else {
            panic!("expected roster snapshot");
        };
        let keys: Vec<&str> = snap.sender_map.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["zed", "amy"]);
    }

    #[test]
    fn numeric_timestamp_is_kept_as_text() {
        let ev = TownEvent::decode("wall", r#"{"sender":"a","text":"x","time":1712}"#).unwrap();
        assert_eq!(ev, TownEvent::MessagePosted(PostedMessage::new("a", "x", "1712")));
    }

    #[test]
    fn decode_read_and_reset() {
        assert_eq!(
            TownEvent::decode("wall_read", r#"{"reader_id":"r"}"#).unwrap(),
            TownEvent::MessageRead(MessageRead {
                reader: SenderId::new("r")
            })
        );
        assert_eq!(TownEvent::decode("wall_reset", "").unwrap(), TownEvent::Reset);
        assert_eq!(
            TownEvent::decode("connectivity", "false").unwrap(),
            TownEvent::ConnectivityChanged(false)
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(
            TownEvent::decode("file_created", "{}"),
            Err(EventError::UnknownKind {
                kind: "file_created".into()
            })
        );
    }

    #[test]
    fn malformed_payload_is_rejected() {
        match TownEvent::decode("tree", r#"{"children":[{"id":"a"}]}"#) {
            Err(EventError::Malformed { kind, .. }) => assert_eq!(kind, "tree"),
            other => panic!("expected Malformed, got {other:?}"),
        }
        assert!(TownEvent::decode("wall", "not json").is_err());
    }

    #[test]
    fn tagged_json_form() {
        let ev = TownEvent::ConnectivityChanged(true);
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(json, r#"{"type":"connectivity_changed","data":true}"#);
        let back: TownEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }
}
