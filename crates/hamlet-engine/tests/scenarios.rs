//! Integration test: end-to-end scenarios through the `Town` API.

use hamlet_core::{BehaviorState, GridCell, LandmarkKey, LifecycleStatus};
use hamlet_engine::{Town, TownConfig};
use hamlet_map::{find_path, path_cost};
use hamlet_test_utils::fixtures::{island_map, load, pen_map, scenario_a_map};
use hamlet_test_utils::{entry, message, ms, roster_delta, roster_snapshot, secs};

fn town(map: &str) -> Town {
    Town::new(TownConfig::default(), map).unwrap()
}

// ── Scenario A: routing on a 3×3 grass grid ──────────────────────────

#[test]
fn scenario_a_path_ends_on_landmark_with_grass_cost() {
    let map = load(scenario_a_map());
    let goal = map
        .landmarks()
        .get(&LandmarkKey::new("factory"))
        .unwrap()
        .cell;
    assert_eq!(goal, GridCell::new(1, 1));

    for start in [GridCell::new(0, 0), GridCell::new(2, 2), GridCell::new(0, 2)] {
        let path = find_path(map.grid(), start, goal);
        assert_eq!(path.last(), Some(&goal));
        // One grass step (5) then the landmark (1).
        assert_eq!(path_cost(map.grid(), start, &path), Some(6));
    }
    let path = find_path(map.grid(), GridCell::new(1, 0), goal);
    assert_eq!(path, vec![goal]);
}

#[test]
fn scenario_a_new_worker_walks_to_its_landmark() {
    let mut t = town("B..\n.C.\n...");
    t.apply(
        roster_snapshot(vec![entry("w", "worker", LifecycleStatus::Active)
            .with_elapsed(1.0)]),
        ms(0),
    );
    let w = t.roster().get("w").unwrap();
    assert_eq!(w.position().cell(), GridCell::new(0, 0));
    assert_eq!(w.state(), BehaviorState::Walking);
    assert_eq!(w.motion().path.back(), Some(&GridCell::new(1, 1)));

    let mut now = ms(0);
    while t.is_animating() {
        now += ms(16);
        t.tick(now);
    }
    let w = t.roster().get("w").unwrap();
    assert_eq!(w.position().cell(), GridCell::new(1, 1));
    assert_eq!(w.state(), BehaviorState::Working);
}

// ── Scenario B: at-least-once delivery ───────────────────────────────

#[test]
fn scenario_b_duplicate_message_counted_once() {
    let mut t = town(pen_map());
    let before = t.feed().len();
    assert!(t.apply(message("w", "build green", "2024-05-01T10:00:00Z"), ms(0)));
    assert!(!t.apply(message("w", "build green", "2024-05-01T10:00:00Z"), ms(5)));
    assert_eq!(t.feed().len(), before + 1);

    // Same text at a different time is a different message.
    assert!(t.apply(message("w", "build green", "2024-05-01T10:00:01Z"), ms(10)));
    assert_eq!(t.feed().len(), before + 2);
}

// ── Scenario C: completing at the retirement landmark ────────────────

#[test]
fn scenario_c_complete_at_retirement_hides_in_same_step() {
    let mut t = town(pen_map());
    t.apply(
        roster_snapshot(vec![entry("w", "worker", LifecycleStatus::Active)
            .with_elapsed(0.5)]),
        ms(0),
    );
    let w = t.roster().get("w").unwrap();
    assert_eq!(w.position().cell(), GridCell::new(1, 1));
    assert!(w.is_walking());

    // Still standing on the barn when the worker finishes.
    t.apply(
        roster_delta(vec![entry("w", "worker", LifecycleStatus::Complete)]),
        ms(0),
    );
    let w = t.roster().get("w").unwrap();
    assert_eq!(w.state(), BehaviorState::Idle);
    assert!(w.is_hidden());
    assert!(!w.is_walking());
    assert_eq!(t.next_wakeup(), None);

    // Nothing fires, however long we wait.
    let position = w.position();
    for step in 1..=120 {
        t.tick(secs(step as f64 * 0.5));
    }
    let w = t.roster().get("w").unwrap();
    assert_eq!(w.position(), position);
    assert!(w.is_hidden());
    assert_eq!(w.state(), BehaviorState::Idle);

    // New activity reveals and repaths immediately.
    t.apply(
        roster_delta(vec![entry("w", "worker", LifecycleStatus::Active)]),
        secs(61.0),
    );
    let w = t.roster().get("w").unwrap();
    assert!(!w.is_hidden());
    assert_eq!(w.state(), BehaviorState::Walking);
    assert!(t.is_animating());
}

// ── Pathing failure ──────────────────────────────────────────────────

#[test]
fn unreachable_landmark_keeps_agent_where_it_is() {
    let mut t = town(island_map());
    t.apply(
        roster_snapshot(vec![entry("w", "worker", LifecycleStatus::Active)
            .with_elapsed(0.5)]),
        ms(0),
    );
    let w = t.roster().get("w").unwrap();
    assert_eq!(w.position().cell(), GridCell::new(0, 0));
    assert!(!w.is_walking());
    // The spawn landmark stays the target.
    assert_eq!(w.motion().target, Some(LandmarkKey::new("barn")));
    assert!(!t.is_animating());
}
