//! Core types for the hamlet agent-town view.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other hamlet crate: identifiers,
//! lifecycle and behavioral states, grid geometry, and the typed
//! [`TownEvent`] union that the stream feeds into the reconciler.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod geom;
pub mod id;
pub mod status;

pub use error::EventError;
pub use event::{
    MessageRead, PostedMessage, RosterDelta, RosterEntry, RosterSnapshot, SessionList, SessionRow,
    TownEvent,
};
pub use geom::{GridCell, Position};
pub use id::{AgentId, LandmarkKey, Role, SenderId};
pub use status::{BehaviorState, LifecycleStatus};
