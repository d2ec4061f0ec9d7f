//! Time-sliced rotation and translation toward a single target position.
//!
//! A [`MoveStep`] spans several ticks: it first turns the body toward the
//! target over a fixed duration, then translates it at constant speed. Each
//! call to [`MoveStep::advance`] writes a complete [`Pose`], so dropping a
//! step between ticks cancels it without leaving a half-applied update.

use glam::{Quat, Vec3};
use nightwatch_core::WorldPosition;

/// Squared distance under which a translation snaps onto its target.
pub const ARRIVAL_EPSILON_SQ: f32 = 0.01;

/// Position and facing of a body on the level plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Current world position.
    pub position: WorldPosition,
    /// Current facing, a rotation about the plane normal.
    pub heading: Quat,
}

impl Pose {
    /// Creates a pose at `position` facing `bearing` radians.
    #[must_use]
    pub fn new(position: WorldPosition, bearing: f32) -> Self {
        Self {
            position,
            heading: Quat::from_rotation_z(bearing),
        }
    }

    /// Facing in radians, counter-clockwise from the +x axis.
    #[must_use]
    pub fn bearing(&self) -> f32 {
        let facing = self.heading * Vec3::X;
        facing.y.atan2(facing.x)
    }
}

/// Progress of a time-boxed turn between two headings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    start: Quat,
    target: Quat,
    elapsed: f32,
    duration: f32,
}

impl Rotation {
    /// Starts a turn from `start` to face `bearing` radians over `duration` seconds.
    #[must_use]
    pub fn toward(start: Quat, bearing: f32, duration: f32) -> Self {
        Self {
            start,
            target: Quat::from_rotation_z(bearing),
            elapsed: 0.0,
            duration,
        }
    }

    /// Heading the turn ends on.
    #[must_use]
    pub const fn target(&self) -> Quat {
        self.target
    }

    /// Advances the turn by `dt` seconds.
    ///
    /// Returns the interpolated heading and, once the turn has completed, the
    /// part of `dt` it did not need.
    pub fn advance(&mut self, dt: f32) -> (Quat, Option<f32>) {
        let remaining = (self.duration - self.elapsed).max(0.0);
        if self.duration <= 0.0 || dt >= remaining {
            self.elapsed = self.duration.max(0.0);
            return (self.target, Some(dt - remaining));
        }

        self.elapsed += dt;
        let heading = self.start.slerp(self.target, self.elapsed / self.duration);
        (heading, None)
    }
}

/// Outcome of advancing a [`MoveStep`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    /// The body has not reached the target yet.
    InProgress,
    /// The body now sits exactly on the target.
    Arrived,
}

/// In-flight movement toward one target position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveStep {
    target: WorldPosition,
    rotation: Option<Rotation>,
}

impl MoveStep {
    /// Plans a step from `pose` to `target`, turning over `rotation_duration` seconds first.
    #[must_use]
    pub fn new(pose: &Pose, target: WorldPosition, rotation_duration: f32) -> Self {
        let offset = target - pose.position;
        let rotation = (offset.length_squared() > f32::EPSILON).then(|| {
            Rotation::toward(pose.heading, offset.y.atan2(offset.x), rotation_duration)
        });
        Self { target, rotation }
    }

    /// Position the step ends on.
    #[must_use]
    pub const fn target(&self) -> WorldPosition {
        self.target
    }

    /// Reports whether the body is still turning.
    #[must_use]
    pub const fn is_turning(&self) -> bool {
        self.rotation.is_some()
    }

    /// Advances the step by `dt` seconds at `speed` world units per second.
    pub fn advance(&mut self, pose: &mut Pose, dt: f32, speed: f32) -> StepStatus {
        let mut budget = dt;

        if let Some(rotation) = self.rotation.as_mut() {
            let (heading, leftover) = rotation.advance(budget);
            pose.heading = heading;
            match leftover {
                Some(leftover) => {
                    self.rotation = None;
                    budget = leftover;
                }
                None => return StepStatus::InProgress,
            }
        }

        pose.position = move_towards(pose.position, self.target, speed * budget);
        if pose.position.distance_squared(self.target) <= ARRIVAL_EPSILON_SQ {
            pose.position = self.target;
            return StepStatus::Arrived;
        }

        StepStatus::InProgress
    }
}

/// Moves `current` toward `target` by at most `max_delta`, never overshooting.
#[must_use]
pub fn move_towards(current: WorldPosition, target: WorldPosition, max_delta: f32) -> WorldPosition {
    let offset = target - current;
    let distance = offset.length();
    if distance <= max_delta || distance <= f32::EPSILON {
        return target;
    }
    current + offset / distance * max_delta.max(0.0)
}
