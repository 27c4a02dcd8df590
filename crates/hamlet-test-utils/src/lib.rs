//! Test fixtures for hamlet development.
//!
//! Small maps with known geometry ([`fixtures`]) plus shorthand for
//! building roster and feed events.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::time::Duration;

use hamlet_core::{
    LifecycleStatus, MessageRead, PostedMessage, RosterDelta, RosterEntry, RosterSnapshot,
    SenderId, TownEvent,
};

/// Roster entry with an explicit role and status.
pub fn entry(id: &str, role: &str, status: LifecycleStatus) -> RosterEntry {
    RosterEntry::new(id, status).with_role(role)
}

/// Authoritative roster event with no sender map or backlog.
pub fn roster_snapshot(agents: Vec<RosterEntry>) -> TownEvent {
    TownEvent::RosterSnapshot(RosterSnapshot {
        agents,
        ..RosterSnapshot::default()
    })
}

/// Partial roster event.
pub fn roster_delta(agents: Vec<RosterEntry>) -> TownEvent {
    TownEvent::RosterDelta(RosterDelta { agents })
}

/// Live feed message event.
pub fn message(sender: &str, text: &str, timestamp: &str) -> TownEvent {
    TownEvent::MessagePosted(PostedMessage::new(sender, text, timestamp))
}

/// Feed-read event.
pub fn read_by(reader: &str) -> TownEvent {
    TownEvent::MessageRead(MessageRead {
        reader: SenderId::new(reader),
    })
}

/// Fractional seconds as a `Duration`.
pub fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value)
}

/// Milliseconds as a `Duration`.
pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}
