//! Motion and behavior scheduler.
//!
//! Advances every agent along its path on the animation clock and runs
//! the timed transitions (dwell expiry, idle wander). The scheduler is
//! *armed* while any agent has a path; once the last path empties it
//! suspends and only timer deadlines ([`MotionScheduler::next_deadline`])
//! need waking for. Any path assignment re-arms it.
//!
//! Elapsed time per tick is clamped to [`MotionConfig::max_step`], so a
//! stalled host does not teleport agents across the map on resume.
//!
//! [`MotionConfig::max_step`]: crate::MotionConfig::max_step

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use hamlet_core::{BehaviorState, LandmarkKey, LifecycleStatus, Position};
use hamlet_map::{find_path, Landmark, TileGrid};

use crate::agent::{Agent, Motion, Roster, Timer};
use crate::config::{secs, TownConfig, WanderConfig};

/// Which time-boxed state to enter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dwell {
    /// After posting a message.
    Posting,
    /// After reading messages.
    Reading,
}

/// What one [`MotionScheduler::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Agents whose position changed.
    pub moved: usize,
    /// Agents that reached the end of their path.
    pub arrived: usize,
    /// Timers that fired.
    pub timers_fired: usize,
}

impl TickReport {
    /// Whether anything visible changed.
    pub fn changed(&self) -> bool {
        self.moved + self.arrived + self.timers_fired > 0
    }
}

/// Single writer of every agent's [`Motion`].
#[derive(Debug)]
pub struct MotionScheduler {
    speed: f64,
    max_step: Duration,
    posting_dwell: Duration,
    reading_dwell: Duration,
    wander: WanderConfig,
    retirement: LandmarkKey,
    jitter: (f64, f64),
    rng: ChaCha8Rng,
    armed: bool,
    last_tick: Duration,
}

impl MotionScheduler {
    /// Scheduler for `config`, seeded from `config.seed`.
    pub fn new(config: &TownConfig) -> Self {
        Self {
            speed: config.motion.speed,
            max_step: config.motion.max_step(),
            posting_dwell: secs(config.behavior.posting_dwell_secs),
            reading_dwell: secs(config.behavior.reading_dwell_secs),
            wander: config.behavior.wander.clone(),
            retirement: config.retirement.clone(),
            jitter: (config.spawn.jitter_x, config.spawn.jitter_y),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            armed: false,
            last_tick: Duration::ZERO,
        }
    }

    /// Whether the scheduler wants animation frames.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    fn arm(&mut self, now: Duration) {
        if !self.armed {
            self.armed = true;
            self.last_tick = now;
        }
    }

    /// Drop all pending motion state (the roster is cleared separately).
    pub fn reset(&mut self) {
        self.armed = false;
    }

    // ── Placement and routing ───────────────────────────────────

    /// Initial motion for an agent appearing at `landmark`.
    pub(crate) fn spawn(&mut self, landmark: &Landmark) -> Motion {
        let (jx, jy) = self.jitter;
        let centre = Position::centre_of(landmark.cell);
        let position = Position::new(
            centre.x + self.rng.random_range(-jx..=jx),
            centre.y + self.rng.random_range(-jy..=jy),
        );
        Motion::standing(position, landmark.key.clone(), landmark.cell)
    }

    /// Drop the agent's route and target, e.g. before a map reload.
    pub(crate) fn forget_route(&mut self, agent: &mut Agent) {
        let m = &mut agent.motion;
        m.path.clear();
        m.target = None;
        m.timer = None;
        if m.state == BehaviorState::Walking {
            m.state = BehaviorState::Idle;
        }
    }

    /// Stand `agent` at `landmark` without walking, keeping its state.
    pub(crate) fn relocate(&mut self, agent: &mut Agent, landmark: &Landmark) {
        let state = agent.motion.state;
        agent.motion = self.spawn(landmark);
        agent.motion.state = state;
    }

    /// Send `agent` to `landmark`.
    ///
    /// If no route exists the agent keeps its previous target, path and
    /// state, and `false` is returned. An agent already standing on the
    /// landmark adopts it without walking.
    pub fn assign_route(
        &mut self,
        agent: &mut Agent,
        landmark: &Landmark,
        grid: &TileGrid,
        now: Duration,
    ) -> bool {
        let from = agent.motion.position.cell();
        if from == landmark.cell {
            let m = &mut agent.motion;
            m.target = Some(landmark.key.clone());
            m.home = landmark.cell;
            m.path.clear();
            if m.state == BehaviorState::Walking {
                m.state = BehaviorState::Idle;
            }
            self.settle(agent, now);
            return true;
        }
        let path = find_path(grid, from, landmark.cell);
        if path.is_empty() {
            debug!(agent = %agent.profile.id, target = %landmark.key, %from, "no route; keeping previous target");
            return false;
        }
        let m = &mut agent.motion;
        m.target = Some(landmark.key.clone());
        m.home = landmark.cell;
        m.path = path.into();
        m.hidden = false;
        m.state = BehaviorState::Walking;
        m.timer = None;
        self.arm(now);
        true
    }

    /// Refresh the settled state of an agent with no path.
    ///
    /// `working` if active, else `idle`; hidden when resting at the
    /// retirement landmark with an `idle`/`complete` status. A running
    /// dwell is left alone and a pending wander timer is kept while it
    /// stays valid. Returns whether anything visible changed.
    pub fn settle(&mut self, agent: &mut Agent, now: Duration) -> bool {
        let status = agent.profile.status;
        let at_retirement = agent.motion.target.as_ref() == Some(&self.retirement);
        let m = &mut agent.motion;
        if !m.path.is_empty() {
            return false;
        }
        let hidden = at_retirement && status.hides_in_retirement();
        let mut changed = m.hidden != hidden;
        m.hidden = hidden;
        if m.state.is_dwelling() && !hidden {
            return changed;
        }
        let state = if status == LifecycleStatus::Active {
            BehaviorState::Working
        } else {
            BehaviorState::Idle
        };
        if m.state != state {
            m.state = state;
            changed = true;
        }
        match (self.may_wander(agent), agent.motion.timer) {
            (false, _) => agent.motion.timer = None,
            (true, Some(Timer::Wander { .. })) => {}
            (true, _) => {
                agent.motion.timer = Some(Timer::Wander {
                    at: now + self.wander_delay(at_retirement),
                });
            }
        }
        changed
    }

    /// Idle, visible, and not finished inside the pen.
    fn may_wander(&self, agent: &Agent) -> bool {
        let m = &agent.motion;
        let in_pen = m.target.as_ref() == Some(&self.retirement);
        m.state == BehaviorState::Idle
            && !m.hidden
            && !(agent.profile.status == LifecycleStatus::Complete && in_pen)
    }

    /// Enter `posting` or `reading` for the configured dwell.
    ///
    /// Ignored while walking, hidden, or already dwelling.
    pub fn begin_dwell(&mut self, agent: &mut Agent, dwell: Dwell, now: Duration) -> bool {
        let m = &mut agent.motion;
        if m.hidden || m.state.is_dwelling() || !m.path.is_empty() {
            return false;
        }
        let (state, length) = match dwell {
            Dwell::Posting => (BehaviorState::Posting, self.posting_dwell),
            Dwell::Reading => (BehaviorState::Reading, self.reading_dwell),
        };
        m.state = state;
        m.timer = Some(Timer::Dwell { until: now + length });
        true
    }

    // ── Clock ───────────────────────────────────────────────────

    /// Advance every agent to `now`.
    pub fn tick(&mut self, roster: &mut Roster, grid: &TileGrid, now: Duration) -> TickReport {
        let mut report = TickReport::default();
        let dt = if self.armed {
            now.saturating_sub(self.last_tick).min(self.max_step)
        } else {
            Duration::ZERO
        };
        self.last_tick = now;
        let step = self.speed * dt.as_secs_f64();

        for agent in roster.iter_mut() {
            if !agent.motion.path.is_empty() && step > 0.0 {
                report.moved += 1;
                if advance(&mut agent.motion, step) {
                    report.arrived += 1;
                    self.settle(agent, now);
                }
            }
            if let Some(timer) = agent.motion.timer {
                if timer.due() <= now {
                    report.timers_fired += 1;
                    self.fire(agent, timer, grid, now);
                }
            }
        }

        if !roster.any_walking() {
            self.armed = false;
        }
        report
    }

    /// Earliest pending timer across the roster.
    pub fn next_deadline(&self, roster: &Roster) -> Option<Duration> {
        roster
            .iter()
            .filter_map(|a| a.motion.timer.map(Timer::due))
            .min()
    }

    fn fire(&mut self, agent: &mut Agent, timer: Timer, grid: &TileGrid, now: Duration) {
        agent.motion.timer = None;
        match timer {
            Timer::Dwell { .. } => {
                // Posting and reading always end idle, whatever the status.
                agent.motion.state = BehaviorState::Idle;
                if self.may_wander(agent) {
                    let in_pen = agent.motion.target.as_ref() == Some(&self.retirement);
                    agent.motion.timer = Some(Timer::Wander {
                        at: now + self.wander_delay(in_pen),
                    });
                }
            }
            Timer::Wander { .. } => self.wander(agent, grid, now),
        }
    }

    // ── Wander ──────────────────────────────────────────────────

    fn wander_delay(&mut self, in_pen: bool) -> Duration {
        let w = &self.wander;
        let (min, max) = if in_pen {
            (w.pen_min_secs, w.pen_max_secs)
        } else {
            (w.min_secs, w.max_secs)
        };
        let mean = (max - min) / 2.0;
        let u: f64 = self.rng.random();
        let jitter = -mean * (1.0 - u).ln();
        secs((min + jitter).min(max))
    }

    fn wander(&mut self, agent: &mut Agent, grid: &TileGrid, now: Duration) {
        let in_pen = agent.motion.target.as_ref() == Some(&self.retirement);
        if !self.may_wander(agent) || agent.is_walking() {
            return;
        }
        let m = &agent.motion;
        let radius = if in_pen {
            self.wander.pen_radius
        } else {
            self.wander.radius
        };
        let from = m.position.cell();
        let home = m.home;
        for _ in 0..self.wander.attempts {
            let spot = home.offset(
                self.rng.random_range(-radius..=radius),
                self.rng.random_range(-radius..=radius),
            );
            if spot == from || !grid.cost_of(spot).is_passable() {
                continue;
            }
            let path = find_path(grid, from, spot);
            if path.is_empty() {
                continue;
            }
            debug!(agent = %agent.profile.id, %spot, "wandering");
            let m = &mut agent.motion;
            m.path = path.into();
            m.state = BehaviorState::Walking;
            self.arm(now);
            return;
        }
        agent.motion.timer = Some(Timer::Wander {
            at: now + self.wander_delay(in_pen),
        });
    }
}

/// Move toward the next waypoint by at most `step`; pop it on reaching it.
/// Returns whether the path is now exhausted.
fn advance(m: &mut Motion, step: f64) -> bool {
    let Some(&next) = m.path.front() else {
        return true;
    };
    let (position, reached) = m.position.step_toward(Position::centre_of(next), step);
    m.position = position;
    if reached {
        m.path.pop_front();
    }
    m.path.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Profile;
    use hamlet_core::{AgentId, GridCell, Role, SenderId};
    use hamlet_map::{LandmarkRegistry, TerrainTable, TownMap};
    use proptest::prelude::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn map(text: &str) -> TownMap {
        TownMap::load(text, &LandmarkRegistry::village(), &TerrainTable::default())
    }

    fn landmark<'a>(m: &'a TownMap, key: &str) -> &'a Landmark {
        m.landmarks().get(&LandmarkKey::new(key)).unwrap()
    }

    fn agent_at(cell: GridCell, target: &str, status: LifecycleStatus) -> Agent {
        Agent::new(
            Profile {
                id: AgentId::new("a"),
                name: "a".into(),
                role: Role::new("worker"),
                status,
                speaker: SenderId::new("a"),
            },
            Motion::standing(Position::centre_of(cell), LandmarkKey::new(target), cell),
        )
    }

    fn roster_of(agent: Agent) -> Roster {
        let mut r = Roster::default();
        r.insert(agent);
        r
    }

    #[test]
    fn route_arms_and_walking_disarms_on_arrival() {
        let m = map("B::::C");
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(0, 0), "barn", LifecycleStatus::Active);
        assert!(s.assign_route(&mut a, landmark(&m, "factory"), m.grid(), ms(0)));
        assert!(s.is_armed());
        assert_eq!(a.state(), BehaviorState::Walking);

        let mut roster = roster_of(a);
        let mut now = ms(0);
        for _ in 0..200 {
            now += ms(16);
            s.tick(&mut roster, m.grid(), now);
        }
        let a = roster.get("a").unwrap();
        assert_eq!(a.position(), Position::centre_of(GridCell::new(5, 0)));
        assert_eq!(a.state(), BehaviorState::Working);
        assert!(!s.is_armed());
    }

    #[test]
    fn unreachable_target_keeps_previous_state() {
        let m = map("B.T.C");
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(0, 0), "barn", LifecycleStatus::Active);
        let before = a.clone();
        assert!(!s.assign_route(&mut a, landmark(&m, "factory"), m.grid(), ms(0)));
        assert_eq!(a, before);
        assert!(!s.is_armed());
    }

    #[test]
    fn already_on_target_settles_immediately() {
        let m = map("B:C");
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(2, 0), "barn", LifecycleStatus::Active);
        assert!(s.assign_route(&mut a, landmark(&m, "factory"), m.grid(), ms(0)));
        assert_eq!(a.motion().target, Some(LandmarkKey::new("factory")));
        assert_eq!(a.state(), BehaviorState::Working);
        assert!(!s.is_armed());
    }

    #[test]
    fn huge_gap_moves_at_most_one_clamped_step() {
        let m = map("B::::::::::C");
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(0, 0), "barn", LifecycleStatus::Active);
        s.assign_route(&mut a, landmark(&m, "factory"), m.grid(), ms(0));
        let start = a.position();
        let mut roster = roster_of(a);
        s.tick(&mut roster, m.grid(), Duration::from_secs(3600));
        let moved = start.distance(roster.get("a").unwrap().position());
        assert!(moved <= 4.0 * 0.05 + 1e-9, "moved {moved}");
        assert!(moved > 0.0);
    }

    #[test]
    fn complete_at_retirement_hides_without_wander() {
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(0, 0), "barn", LifecycleStatus::Complete);
        a.motion.state = BehaviorState::Working;
        assert!(s.settle(&mut a, ms(0)));
        assert_eq!(a.state(), BehaviorState::Idle);
        assert!(a.is_hidden());
        assert_eq!(a.motion().timer, None);
    }

    #[test]
    fn error_at_retirement_stays_visible_and_wanders_in_pen() {
        let m = map(":::\n:B:\n:::");
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(1, 1), "barn", LifecycleStatus::Error);
        s.settle(&mut a, ms(0));
        assert!(!a.is_hidden());
        let Some(Timer::Wander { at }) = a.motion().timer else {
            panic!("expected wander timer");
        };
        assert!(at >= Duration::from_secs(5) && at <= Duration::from_secs(13));

        let mut roster = roster_of(a);
        s.tick(&mut roster, m.grid(), at);
        let a = roster.get("a").unwrap();
        assert_eq!(a.state(), BehaviorState::Walking);
        let dest = *a.motion().path.back().unwrap();
        assert!(dest.col.abs_diff(1) <= 1 && dest.row.abs_diff(1) <= 1);
        assert!(s.is_armed());
    }

    #[test]
    fn settle_keeps_a_pending_wander_timer() {
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(0, 0), "forge", LifecycleStatus::Idle);
        s.settle(&mut a, ms(0));
        let first = a.motion().timer;
        assert!(matches!(first, Some(Timer::Wander { .. })));
        s.settle(&mut a, ms(5000));
        assert_eq!(a.motion().timer, first);
    }

    #[test]
    fn dwell_reverts_without_further_input() {
        let m = map("B:C");
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(2, 0), "factory", LifecycleStatus::Idle);
        s.settle(&mut a, ms(0));
        assert!(s.begin_dwell(&mut a, Dwell::Posting, ms(100)));
        assert_eq!(a.state(), BehaviorState::Posting);
        assert!(!s.begin_dwell(&mut a, Dwell::Reading, ms(200)));

        let mut roster = roster_of(a);
        s.tick(&mut roster, m.grid(), ms(2599));
        assert_eq!(roster.get("a").unwrap().state(), BehaviorState::Posting);
        s.tick(&mut roster, m.grid(), ms(2600));
        let a = roster.get("a").unwrap();
        assert_eq!(a.state(), BehaviorState::Idle);
        assert!(matches!(a.motion().timer, Some(Timer::Wander { .. })));
    }

    #[test]
    fn active_poster_ends_dwell_idle_and_wanders() {
        let m = map("B:C");
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(2, 0), "factory", LifecycleStatus::Active);
        s.settle(&mut a, ms(0));
        assert_eq!(a.state(), BehaviorState::Working);
        assert_eq!(a.motion().timer, None);
        assert!(s.begin_dwell(&mut a, Dwell::Posting, ms(1000)));

        let mut roster = roster_of(a);
        s.tick(&mut roster, m.grid(), ms(3500));
        let a = roster.get("a").unwrap();
        assert_eq!(a.state(), BehaviorState::Idle);
        let Some(Timer::Wander { at }) = a.motion().timer else {
            panic!("expected wander timer, got {:?}", a.motion().timer);
        };
        assert!(at >= ms(3500) + Duration::from_secs(8));
        assert!(at <= ms(3500) + Duration::from_secs(20));
    }

    #[test]
    fn settle_does_not_cut_a_dwell_short() {
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(0, 0), "forge", LifecycleStatus::Active);
        s.settle(&mut a, ms(0));
        s.begin_dwell(&mut a, Dwell::Reading, ms(0));
        s.settle(&mut a, ms(10));
        assert_eq!(a.state(), BehaviorState::Reading);
    }

    #[test]
    fn walking_agents_ignore_dwell() {
        let m = map("B::C");
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(0, 0), "barn", LifecycleStatus::Active);
        s.assign_route(&mut a, landmark(&m, "factory"), m.grid(), ms(0));
        assert!(!s.begin_dwell(&mut a, Dwell::Posting, ms(0)));
    }

    #[test]
    fn next_deadline_is_earliest_timer() {
        let mut s = MotionScheduler::new(&TownConfig::default());
        let mut a = agent_at(GridCell::new(0, 0), "forge", LifecycleStatus::Active);
        s.settle(&mut a, ms(0));
        s.begin_dwell(&mut a, Dwell::Posting, ms(1000));
        let roster = roster_of(a);
        assert_eq!(s.next_deadline(&roster), Some(ms(3500)));
    }

    #[test]
    fn wander_delay_stays_in_bounds() {
        let mut s = MotionScheduler::new(&TownConfig::default());
        for _ in 0..500 {
            let d = s.wander_delay(false).as_secs_f64();
            assert!((8.0..=20.0).contains(&d), "{d}");
            let p = s.wander_delay(true).as_secs_f64();
            assert!((5.0..=13.0).contains(&p), "{p}");
        }
    }

    proptest! {
        #[test]
        fn displacement_is_bounded_by_clamped_dt(gap_ms in 0u64..10_000_000, ticks in 1usize..5) {
            let m = map("B::::::::::::::::::::C");
            let cfg = TownConfig::default();
            let mut s = MotionScheduler::new(&cfg);
            let mut a = agent_at(GridCell::new(0, 0), "barn", LifecycleStatus::Active);
            s.assign_route(&mut a, landmark(&m, "factory"), m.grid(), ms(0));
            let mut roster = roster_of(a);
            let mut now = ms(0);
            for _ in 0..ticks {
                let before = roster.get("a").unwrap().position();
                now += ms(gap_ms);
                s.tick(&mut roster, m.grid(), now);
                let after = roster.get("a").unwrap().position();
                let dt = ms(gap_ms).min(cfg.motion.max_step()).as_secs_f64();
                prop_assert!(before.distance(after) <= cfg.motion.speed * dt + 1e-9);
            }
        }
    }
}
