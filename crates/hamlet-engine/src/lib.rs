//! Live state for the hamlet town view.
//!
//! [`Town`] is the single owner of every agent. Two components write
//! to agents, each to its own half:
//!
//! - the [`Reconciler`](reconcile::Reconciler) applies [`TownEvent`]s,
//!   creating, updating and retiring agents and writing identity, role
//!   and status;
//! - the [`MotionScheduler`](motion::MotionScheduler) advances position,
//!   path and behavioral state on the animation clock.
//!
//! Every visible change marks the [`RenderCoalescer`](coalesce::RenderCoalescer)
//! dirty; renderers only ever see immutable [`Snapshot`]s.
//!
//! [`TownDriver`] runs a `Town` on its own thread, fed by a channel.
//!
//! [`TownEvent`]: hamlet_core::TownEvent

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod coalesce;
pub mod config;
pub mod driver;
pub mod feed;
pub mod motion;
pub mod outbound;
pub mod reconcile;
pub mod roles;
pub mod snapshot;
pub mod town;

pub use agent::{Agent, Roster};
pub use coalesce::{FrameRequest, RenderCoalescer};
pub use config::{
    BehaviorConfig, ConfigError, FeedConfig, MotionConfig, SpawnConfig, SpeechConfig, TownConfig,
    WanderConfig,
};
pub use driver::{DriverInput, TownDriver};
pub use feed::{FeedMessage, MessageFeed};
pub use motion::{Dwell, MotionScheduler, TickReport};
pub use outbound::{OutboundRequest, OutboundSink};
pub use roles::{RoleRule, RoleRules};
pub use snapshot::{AgentView, FeedEntry, Snapshot};
pub use town::Town;
