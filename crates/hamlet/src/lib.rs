//! Hamlet: a live view of a multi-agent session as a tile-map village.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all hamlet sub-crates. For most users, adding `hamlet` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use hamlet::prelude::*;
//!
//! let mut town = Town::new(TownConfig::default(), hamlet::map::VILLAGE_MAP).unwrap();
//!
//! let roster = TownEvent::decode(
//!     "tree",
//!     r#"{"children":[{"id":"w1","role":"worker","status":"active"}]}"#,
//! )
//! .unwrap();
//! town.apply(roster, Duration::ZERO);
//!
//! let frame = town.frame().unwrap();
//! let w1 = frame.agent("w1").unwrap();
//! assert_eq!(w1.target.as_ref().map(|k| k.as_str()), Some("factory"));
//! assert_eq!(frame.headline(), "disconnected");
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `hamlet-core` | Identifiers, statuses, geometry, `TownEvent` |
//! | [`map`] | `hamlet-map` | Terrain, landmarks, `TownMap`, `find_path` |
//! | [`engine`] | `hamlet-engine` | `Town`, reconciler, motion scheduler, driver |
//! | [`stream`] | `hamlet-stream` | SSE client and outbound HTTP sink |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and events (`hamlet-core`).
pub use hamlet_core as types;

/// Tile map, landmarks and pathfinding (`hamlet-map`).
///
/// [`map::TownMap::load`] never fails; [`map::find_path`] returns an
/// empty path when no route exists.
pub use hamlet_map as map;

/// Live town state (`hamlet-engine`).
///
/// [`engine::Town`] for direct single-threaded use,
/// [`engine::TownDriver`] to run it on its own thread.
pub use hamlet_engine as engine;

/// Transport (`hamlet-stream`).
pub use hamlet_stream as stream;

/// Common imports for typical hamlet usage.
///
/// ```rust
/// use hamlet::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use hamlet_core::{
        AgentId, BehaviorState, GridCell, LandmarkKey, LifecycleStatus, Position, Role, SenderId,
        TownEvent,
    };

    // Map
    pub use hamlet_map::{find_path, LandmarkRegistry, TerrainTable, TownMap};

    // Engine
    pub use hamlet_engine::{
        DriverInput, OutboundRequest, OutboundSink, Snapshot, Town, TownConfig, TownDriver,
    };

    // Transport
    pub use hamlet_stream::{EventStreamClient, OutboundClient, ReconnectPolicy};
}
