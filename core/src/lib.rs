#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Nightwatch engine.
//!
//! This crate defines the vocabulary that connects the grid model, the
//! sentinel controller, and whatever host drives them. Hosts deliver
//! detection signals and simulation ticks to sentinels, sentinels broadcast
//! [`Event`] values describing what happened, and side effects that leave the
//! simulation (projectiles, audio, level flow) go through the capability
//! traits declared here so they can be swapped for recorders in tests.

use serde::{Deserialize, Serialize};

/// Continuous position on the level plane, measured in world units.
///
/// The x axis grows to the right and the y axis grows "up", matching the
/// direction grid rows grow in.
pub type WorldPosition = glam::Vec2;

/// Location of a single grid cell expressed as integer x and y coordinates.
///
/// Coordinates are signed so that callers can probe cells left of or below
/// the grid; such cells are simply reported as invalid by the grid model.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCoord {
    x: i32,
    y: i32,
}

impl GridCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate shifted by the provided delta, or `None` when
    /// the shift would overflow the coordinate range.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCoord) -> u64 {
        u64::from(self.x.abs_diff(other.x)) + u64::from(self.y.abs_diff(other.y))
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Identity of a tile placed in the level layout.
///
/// The grid model only compares identities; what a tile looks like is the
/// level collaborator's business.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identity with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tile identity.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SentinelId(u32);

impl SentinelId {
    /// Creates a new sentinel identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Behavioural state of a sentinel. Exactly one holds at any tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SentinelState {
    /// Walking the patrol route, looping indefinitely.
    Patrolling,
    /// The intruder was just detected; pursuit begins on the next tick.
    Alerted,
    /// Chasing the intruder along computed grid paths.
    Pursuing,
    /// The intruder was lost; patrol resumes on the next tick.
    Returning,
}

impl SentinelState {
    /// Reports whether the state belongs to the alert phase (alerted or pursuing).
    #[must_use]
    pub const fn is_alert(self) -> bool {
        matches!(self, Self::Alerted | Self::Pursuing)
    }
}

/// Visual detection cue exposed to the rendering layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DetectionIndicator {
    /// The sentinel is unaware of the intruder.
    #[default]
    Normal,
    /// The sentinel has detected the intruder.
    Alert,
}

impl DetectionIndicator {
    /// Colour the indicator should be drawn with.
    #[must_use]
    pub const fn color(self) -> IndicatorColor {
        match self {
            Self::Normal => IndicatorColor::new(1.0, 1.0, 1.0, 1.0),
            Self::Alert => IndicatorColor::new(1.0, 0.0, 0.0, 1.0),
        }
    }
}

/// RGBA colour used by detection indicators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndicatorColor {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl IndicatorColor {
    /// Creates a new colour from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }
}

/// Sound effects a sentinel may request from the audio collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Played once when the intruder is detected.
    Detection,
    /// Played for every fired attack.
    Shot,
}

/// Events broadcast by sentinels while handling signals and ticks.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A sentinel moved between behavioural states.
    StateChanged {
        /// Sentinel that changed state.
        sentinel: SentinelId,
        /// State held before the transition.
        from: SentinelState,
        /// State held after the transition.
        to: SentinelState,
    },
    /// A sentinel's detection indicator changed.
    IndicatorChanged {
        /// Sentinel whose indicator changed.
        sentinel: SentinelId,
        /// Indicator shown after the change.
        indicator: DetectionIndicator,
    },
    /// A sentinel computed a fresh pursuit path.
    PathComputed {
        /// Sentinel that ran the search.
        sentinel: SentinelId,
        /// Cell the search started from.
        from: GridCoord,
        /// Cell the search aimed for.
        to: GridCoord,
        /// Number of waypoints in the path; zero when no path exists.
        length: usize,
    },
    /// A sentinel finished a movement step onto a cell.
    WaypointReached {
        /// Sentinel that arrived.
        sentinel: SentinelId,
        /// Cell the sentinel arrived on.
        cell: GridCoord,
    },
    /// A sentinel fired at the intruder.
    AttackFired {
        /// Sentinel that fired.
        sentinel: SentinelId,
        /// World position the projectile leaves from.
        origin: WorldPosition,
        /// Direction of fire in radians, counter-clockwise from the +x axis.
        bearing: f32,
    },
}

/// Capability that hands fired projectiles to the projectile collaborator.
pub trait ProjectileSpawner {
    /// Spawns a projectile at `origin` travelling along `bearing` radians.
    fn spawn_projectile(&self, origin: WorldPosition, bearing: f32);
}

/// Fire-and-forget capability for the audio collaborator.
pub trait SoundPlayer {
    /// Plays the requested sound effect.
    fn play(&self, effect: SoundEffect);
}

/// Capability used to tell the scene collaborator that a level was cleared.
pub trait LevelReporter {
    /// Reports that every sentinel in the level has been defeated.
    fn level_complete(&self);
}
