//! Benchmark profiles for the hamlet town view.
//!
//! - [`maze_map`]: a large map with alternating walls, so routes are long
//!   and the open set grows.
//! - [`burst_roster`]: a deterministic roster of many agents with mixed
//!   roles and statuses.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use hamlet_core::{LifecycleStatus, RosterEntry, RosterSnapshot, TownEvent};

/// Serpentine maze of `width` × `height`: every other row is a wall of
/// trees with one gap, alternating sides. Barn top-left, factory
/// bottom-right.
pub fn maze_map(width: usize, height: usize) -> String {
    let mut rows = Vec::with_capacity(height);
    for r in 0..height {
        let row: String = if r % 2 == 0 {
            ".".repeat(width)
        } else {
            let gap = if (r / 2) % 2 == 0 { width - 1 } else { 0 };
            (0..width).map(|c| if c == gap { ':' } else { 'T' }).collect()
        };
        rows.push(row);
    }
    if let Some(first) = rows.first_mut() {
        first.replace_range(0..1, "B");
    }
    if let Some(last) = rows.last_mut() {
        last.replace_range(width - 1..width, "C");
    }
    rows.join("\n")
}

const ROLES: [&str; 6] = [
    "worker",
    "researcher",
    "reviewer",
    "writer",
    "orchestrator",
    "generic",
];

const STATUSES: [LifecycleStatus; 4] = [
    LifecycleStatus::Active,
    LifecycleStatus::Idle,
    LifecycleStatus::Complete,
    LifecycleStatus::Error,
];

/// A roster snapshot of `count` agents drawn from `seed`.
pub fn burst_roster(count: usize, seed: u64) -> TownEvent {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let agents = (0..count)
        .map(|i| {
            let role = ROLES[rng.random_range(0..ROLES.len())];
            let status = STATUSES[rng.random_range(0..STATUSES.len())];
            RosterEntry::new(format!("agent-{i}"), status)
                .with_role(role)
                .with_elapsed(rng.random_range(0.0..60.0))
        })
        .collect();
    TownEvent::RosterSnapshot(RosterSnapshot {
        agents,
        ..RosterSnapshot::default()
    })
}
