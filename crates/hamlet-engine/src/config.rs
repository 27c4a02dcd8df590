//! Town configuration, validation, and error types.
//!
//! [`TownConfig`] carries every tunable of the view, including the
//! landmark registry and role rules, as one immutable value passed to
//! [`Town::new`](crate::Town::new). [`validate()`](TownConfig::validate)
//! checks structural invariants at startup.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use hamlet_core::{LandmarkKey, Role, SenderId};
use hamlet_map::{LandmarkRegistry, MapError, TerrainTable};

use crate::roles::RoleRules;

/// Seconds to `Duration`, saturating invalid input to zero.
pub(crate) fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

// ── MotionConfig ───────────────────────────────────────────────────

/// Walking speed and animation clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Walking speed in tiles per second. Default: 4.0.
    pub speed: f64,
    /// Largest elapsed time a single tick integrates, in seconds. Default: 0.05.
    pub max_step_secs: f64,
    /// Interval between animation frames, in seconds. Default: 1/60.
    pub frame_interval_secs: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed: 4.0,
            max_step_secs: 0.05,
            frame_interval_secs: 1.0 / 60.0,
        }
    }
}

impl MotionConfig {
    /// Clamp for a single tick's elapsed time.
    pub fn max_step(&self) -> Duration {
        secs(self.max_step_secs)
    }

    /// Animation frame interval.
    pub fn frame_interval(&self) -> Duration {
        secs(self.frame_interval_secs)
    }
}

// ── BehaviorConfig ─────────────────────────────────────────────────

/// Idle wander timing and reach.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Shortest delay between wanders, in seconds. Default: 8.
    pub min_secs: f64,
    /// Longest delay between wanders, in seconds. Default: 20.
    pub max_secs: f64,
    /// Shortest delay inside the retirement pen, in seconds. Default: 5.
    pub pen_min_secs: f64,
    /// Longest delay inside the retirement pen, in seconds. Default: 13.
    pub pen_max_secs: f64,
    /// Largest offset from home, in cells. Default: 2.
    pub radius: i32,
    /// Largest offset from home inside the pen, in cells. Default: 1.
    pub pen_radius: i32,
    /// Candidate cells tried before giving up until the next timer. Default: 8.
    pub attempts: u32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            min_secs: 8.0,
            max_secs: 20.0,
            pen_min_secs: 5.0,
            pen_max_secs: 13.0,
            radius: 2,
            pen_radius: 1,
            attempts: 8,
        }
    }
}

/// Dwell durations for the time-boxed states, plus wander settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Time spent in `posting`, in seconds. Default: 2.5.
    pub posting_dwell_secs: f64,
    /// Time spent in `reading`, in seconds. Default: 3.5.
    pub reading_dwell_secs: f64,
    /// Idle wander settings.
    pub wander: WanderConfig,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            posting_dwell_secs: 2.5,
            reading_dwell_secs: 3.5,
            wander: WanderConfig::default(),
        }
    }
}

// ── SpeechConfig / FeedConfig / SpawnConfig ────────────────────────

/// Speech bubble display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// How long a message stays attached to its sender, in seconds. Default: 8.
    pub display_secs: f64,
    /// Characters shown before truncating with `...`. Default: 120.
    pub max_chars: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            display_secs: 8.0,
            max_chars: 120,
        }
    }
}

impl SpeechConfig {
    /// Display duration.
    pub fn display(&self) -> Duration {
        secs(self.display_secs)
    }
}

/// Message feed bounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Messages retained for speech attribution. Default: 64.
    pub window: usize,
    /// Messages shown on the bulletin. Default: 6.
    pub bulletin: usize,
    /// Dedupe keys remembered; at least `window`. Default: 512.
    pub dedupe_memory: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            window: 64,
            bulletin: 6,
            dedupe_memory: 512,
        }
    }
}

/// Where new agents appear.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Agents younger than this (seconds) spawn at the retirement
    /// landmark and walk to work. Default: 10.
    pub recent_threshold_secs: f64,
    /// Horizontal spawn jitter in tiles, below 0.5. Default: 0.45.
    pub jitter_x: f64,
    /// Vertical spawn jitter in tiles, below 0.5. Default: 0.25.
    pub jitter_y: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            recent_threshold_secs: 10.0,
            jitter_x: 0.45,
            jitter_y: 0.25,
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`TownConfig::validate()`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Terrain table or registry is invalid.
    Map(MapError),
    /// A landmark key the config depends on is not registered.
    UnknownLandmark {
        /// Which setting names it.
        setting: &'static str,
        /// The missing key.
        key: LandmarkKey,
    },
    /// A landmark the config routes agents to attracts no roles.
    DecorativeLandmark {
        /// Which setting names it.
        setting: &'static str,
        /// The decorative key.
        key: LandmarkKey,
    },
    /// Speed is NaN, infinite, zero, or negative.
    InvalidSpeed {
        /// The invalid value.
        value: f64,
    },
    /// A duration setting is NaN, infinite, or out of range.
    InvalidDuration {
        /// Setting name.
        name: &'static str,
        /// The invalid value.
        value: f64,
    },
    /// Wander settings are inconsistent.
    InvalidWander {
        /// Which invariant was violated.
        reason: String,
    },
    /// Speech truncation length is zero.
    ZeroSpeechLength,
    /// Feed window is zero.
    ZeroFeedWindow,
    /// Bulletin shows more messages than the window keeps.
    BulletinExceedsWindow {
        /// Configured bulletin size.
        bulletin: usize,
        /// Configured window.
        window: usize,
    },
    /// Dedupe memory is smaller than the feed window.
    DedupeBelowWindow {
        /// Configured dedupe memory.
        memory: usize,
        /// Configured window.
        window: usize,
    },
    /// Spawn jitter would move agents out of their spawn cell.
    InvalidJitter {
        /// The invalid value.
        value: f64,
    },
    /// The driver thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map(e) => write!(f, "map: {e}"),
            Self::UnknownLandmark { setting, key } => {
                write!(f, "{setting} names unregistered landmark '{key}'")
            }
            Self::DecorativeLandmark { setting, key } => {
                write!(f, "{setting} names decorative landmark '{key}'")
            }
            Self::InvalidSpeed { value } => {
                write!(f, "speed must be finite and positive, got {value}")
            }
            Self::InvalidDuration { name, value } => {
                write!(f, "{name} is out of range: {value}")
            }
            Self::InvalidWander { reason } => write!(f, "invalid wander config: {reason}"),
            Self::ZeroSpeechLength => write!(f, "speech max_chars must be at least 1"),
            Self::ZeroFeedWindow => write!(f, "feed window must be at least 1"),
            Self::BulletinExceedsWindow { bulletin, window } => {
                write!(f, "bulletin size {bulletin} exceeds feed window {window}")
            }
            Self::DedupeBelowWindow { memory, window } => {
                write!(f, "dedupe memory {memory} is below feed window {window}")
            }
            Self::InvalidJitter { value } => {
                write!(f, "spawn jitter must be in [0, 0.5), got {value}")
            }
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Map(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MapError> for ConfigError {
    fn from(e: MapError) -> Self {
        Self::Map(e)
    }
}

// ── TownConfig ─────────────────────────────────────────────────────

/// Complete configuration for a [`Town`](crate::Town).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TownConfig {
    /// Landmark codes, keys and roles. Default: the village registry.
    pub registry: LandmarkRegistry,
    /// Terrain costs.
    pub terrain: TerrainTable,
    /// Role inference for entries without a role.
    pub roles: RoleRules,
    /// Landmark for idle, finished and failed agents. Default: `barn`.
    pub retirement: LandmarkKey,
    /// Landmark for roles without one of their own. Default: `forge`.
    pub fallback: LandmarkKey,
    /// Role whose feed identity is fixed. Default: `orchestrator`.
    pub orchestrator_role: Role,
    /// Feed identity of the orchestrator role. Default: `orchestrator`.
    pub orchestrator_sender: SenderId,
    /// Walking and animation clock.
    pub motion: MotionConfig,
    /// Dwell and wander.
    pub behavior: BehaviorConfig,
    /// Speech bubbles.
    pub speech: SpeechConfig,
    /// Feed bounds.
    pub feed: FeedConfig,
    /// Spawn placement.
    pub spawn: SpawnConfig,
    /// RNG seed for wander and spawn jitter. Default: 0.
    pub seed: u64,
}

impl Default for TownConfig {
    fn default() -> Self {
        Self {
            registry: LandmarkRegistry::village(),
            terrain: TerrainTable::default(),
            roles: RoleRules::default(),
            retirement: LandmarkKey::new("barn"),
            fallback: LandmarkKey::new("forge"),
            orchestrator_role: Role::new("orchestrator"),
            orchestrator_sender: SenderId::new("orchestrator"),
            motion: MotionConfig::default(),
            behavior: BehaviorConfig::default(),
            speech: SpeechConfig::default(),
            feed: FeedConfig::default(),
            spawn: SpawnConfig::default(),
            seed: 0,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDuration { name, value })
    }
}

impl TownConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Terrain table.
        self.terrain.validate()?;

        // 2. Retirement and fallback must be registered role landmarks.
        for (setting, key) in [("retirement", &self.retirement), ("fallback", &self.fallback)] {
            match self.registry.by_key(key) {
                None => {
                    return Err(ConfigError::UnknownLandmark {
                        setting,
                        key: key.clone(),
                    })
                }
                Some(def) if def.is_decorative() => {
                    return Err(ConfigError::DecorativeLandmark {
                        setting,
                        key: key.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        // 3. Motion clock.
        let m = &self.motion;
        if !m.speed.is_finite() || m.speed <= 0.0 {
            return Err(ConfigError::InvalidSpeed { value: m.speed });
        }
        positive("max_step_secs", m.max_step_secs)?;
        positive("frame_interval_secs", m.frame_interval_secs)?;

        // 4. Dwell and wander.
        let b = &self.behavior;
        positive("posting_dwell_secs", b.posting_dwell_secs)?;
        positive("reading_dwell_secs", b.reading_dwell_secs)?;
        let w = &b.wander;
        positive("wander.min_secs", w.min_secs)?;
        positive("wander.pen_min_secs", w.pen_min_secs)?;
        for (lo, hi, which) in [
            (w.min_secs, w.max_secs, "max_secs"),
            (w.pen_min_secs, w.pen_max_secs, "pen_max_secs"),
        ] {
            if !hi.is_finite() || hi < lo {
                return Err(ConfigError::InvalidWander {
                    reason: format!("{which} ({hi}) must be finite and at least {lo}"),
                });
            }
        }
        if w.radius < 1 || w.pen_radius < 1 {
            return Err(ConfigError::InvalidWander {
                reason: format!(
                    "radius ({}) and pen_radius ({}) must be at least 1",
                    w.radius, w.pen_radius
                ),
            });
        }
        if w.attempts == 0 {
            return Err(ConfigError::InvalidWander {
                reason: "attempts must be at least 1".to_string(),
            });
        }

        // 5. Speech.
        positive("speech.display_secs", self.speech.display_secs)?;
        if self.speech.max_chars == 0 {
            return Err(ConfigError::ZeroSpeechLength);
        }

        // 6. Feed bounds.
        let feed = &self.feed;
        if feed.window == 0 {
            return Err(ConfigError::ZeroFeedWindow);
        }
        if feed.bulletin > feed.window {
            return Err(ConfigError::BulletinExceedsWindow {
                bulletin: feed.bulletin,
                window: feed.window,
            });
        }
        if feed.dedupe_memory < feed.window {
            return Err(ConfigError::DedupeBelowWindow {
                memory: feed.dedupe_memory,
                window: feed.window,
            });
        }

        // 7. Spawn.
        let s = &self.spawn;
        if !s.recent_threshold_secs.is_finite() || s.recent_threshold_secs < 0.0 {
            return Err(ConfigError::InvalidDuration {
                name: "recent_threshold_secs",
                value: s.recent_threshold_secs,
            });
        }
        for value in [s.jitter_x, s.jitter_y] {
            if !(0.0..0.5).contains(&value) {
                return Err(ConfigError::InvalidJitter { value });
            }
        }

        Ok(())
    }
}
