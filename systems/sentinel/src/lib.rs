#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Sentinel controller that patrols, pursues and fires at the intruder.
//!
//! A [`Sentinel`] is driven by its host through three entry points:
//! [`Sentinel::on_zone_enter`] and [`Sentinel::on_zone_exit`] deliver the
//! detection signals raised by the host's trigger volumes, and
//! [`Sentinel::tick`] advances the state machine by one simulation step.
//! Every entry point appends the [`Event`] values it produced to a caller
//! supplied buffer. Side effects leaving the simulation go through the
//! injected [`Capabilities`].

use std::{fmt, rc::Rc, time::Duration};

use glam::Quat;
use nightwatch_core::{
    DetectionIndicator, Event, GridCoord, ProjectileSpawner, SentinelId, SentinelState,
    SoundEffect, SoundPlayer, WorldPosition,
};
use nightwatch_world::{find_path, GridMap, Path};

mod config;
mod cooldown;
pub mod motion;
mod patrol;

pub use config::{ConfigError, SentinelConfig};
pub use cooldown::AttackCooldown;
pub use motion::{MoveStep, Pose, StepStatus};
pub use patrol::PatrolRoute;

/// Outbound capabilities handed to a sentinel at construction.
#[derive(Clone)]
pub struct Capabilities {
    projectiles: Rc<dyn ProjectileSpawner>,
    sounds: Rc<dyn SoundPlayer>,
}

impl Capabilities {
    /// Bundles the projectile and audio collaborators.
    #[must_use]
    pub fn new(projectiles: Rc<dyn ProjectileSpawner>, sounds: Rc<dyn SoundPlayer>) -> Self {
        Self {
            projectiles,
            sounds,
        }
    }

    /// Capabilities that discard every request.
    #[must_use]
    pub fn silent() -> Self {
        let silent = Rc::new(Silent);
        Self {
            projectiles: silent.clone(),
            sounds: silent,
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}

struct Silent;

impl ProjectileSpawner for Silent {
    fn spawn_projectile(&self, _origin: WorldPosition, _bearing: f32) {}
}

impl SoundPlayer for Silent {
    fn play(&self, _effect: SoundEffect) {}
}

/// Everything needed to place a sentinel in a level.
#[derive(Clone, Debug)]
pub struct SentinelSetup {
    /// Identifier the sentinel reports in its events.
    pub id: SentinelId,
    /// Shared grid the sentinel navigates.
    pub grid: Option<Rc<GridMap>>,
    /// Cell the sentinel starts on.
    pub spawn: GridCoord,
    /// Initial facing in radians, counter-clockwise from the +x axis.
    pub bearing: f32,
    /// Patrol waypoints, visited in order and looped.
    pub patrol: Vec<GridCoord>,
    /// Tunable parameters.
    pub config: SentinelConfig,
}

impl SentinelSetup {
    /// Creates a setup with default parameters, facing +x.
    #[must_use]
    pub fn new(id: SentinelId, grid: Rc<GridMap>, spawn: GridCoord, patrol: Vec<GridCoord>) -> Self {
        Self {
            id,
            grid: Some(grid),
            spawn,
            bearing: 0.0,
            patrol,
            config: SentinelConfig::default(),
        }
    }

    /// Replaces the tunable parameters.
    #[must_use]
    pub fn with_config(mut self, config: SentinelConfig) -> Self {
        self.config = config;
        self
    }
}

/// Patrolling and pursuing agent.
#[derive(Debug)]
pub struct Sentinel {
    id: SentinelId,
    config: SentinelConfig,
    grid: Option<Rc<GridMap>>,
    capabilities: Capabilities,
    patrol: PatrolRoute,
    pose: Pose,
    state: SentinelState,
    indicator: DetectionIndicator,
    motion: Option<MoveStep>,
    path: Path,
    dwell: Duration,
    cooldown: AttackCooldown,
    ranged_enabled: bool,
    fault: Option<ConfigError>,
}

impl Sentinel {
    /// Creates a sentinel standing on its spawn cell.
    ///
    /// A misconfigured sentinel is still created, but it logs the fault and
    /// ignores every signal and tick afterwards.
    #[must_use]
    pub fn new(setup: SentinelSetup, capabilities: Capabilities) -> Self {
        let SentinelSetup {
            id,
            grid,
            spawn,
            bearing,
            patrol,
            config,
        } = setup;

        let fault = validate(grid.as_deref(), &patrol, &config).err();
        if let Some(error) = &fault {
            tracing::error!(sentinel = id.get(), %error, "sentinel misconfigured; it will stay idle");
        }

        let position = grid
            .as_deref()
            .map_or(WorldPosition::ZERO, |grid| grid.to_world(spawn));

        Self {
            id,
            config,
            grid,
            capabilities,
            patrol: PatrolRoute::new(patrol),
            pose: Pose::new(position, bearing),
            state: SentinelState::Patrolling,
            indicator: DetectionIndicator::Normal,
            motion: None,
            path: Path::default(),
            dwell: Duration::ZERO,
            cooldown: AttackCooldown::new(),
            ranged_enabled: false,
            fault,
        }
    }

    /// Identifier of the sentinel.
    #[must_use]
    pub const fn id(&self) -> SentinelId {
        self.id
    }

    /// Current behavioural state.
    #[must_use]
    pub const fn state(&self) -> SentinelState {
        self.state
    }

    /// Detection cue for the rendering layer.
    #[must_use]
    pub const fn indicator(&self) -> DetectionIndicator {
        self.indicator
    }

    /// Current position and facing.
    #[must_use]
    pub const fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> WorldPosition {
        self.pose.position
    }

    /// Current facing as a rotation about the plane normal.
    #[must_use]
    pub const fn heading(&self) -> Quat {
        self.pose.heading
    }

    /// Current facing in radians, counter-clockwise from the +x axis.
    #[must_use]
    pub fn bearing(&self) -> f32 {
        self.pose.bearing()
    }

    /// Grid cell under the sentinel, if it has a grid.
    #[must_use]
    pub fn cell(&self) -> Option<GridCoord> {
        self.grid
            .as_deref()
            .map(|grid| grid.to_grid(self.pose.position))
    }

    /// Waypoints still to be walked on the current leg or pursuit.
    #[must_use]
    pub const fn path(&self) -> &Path {
        &self.path
    }

    /// Movement step in flight, if any.
    #[must_use]
    pub const fn motion(&self) -> Option<&MoveStep> {
        self.motion.as_ref()
    }

    /// Index of the patrol waypoint the sentinel heads to next.
    #[must_use]
    pub const fn patrol_index(&self) -> usize {
        self.patrol.index()
    }

    /// Patrol route of the sentinel.
    #[must_use]
    pub const fn patrol(&self) -> &PatrolRoute {
        &self.patrol
    }

    /// Attack cooldown of the sentinel.
    #[must_use]
    pub const fn cooldown(&self) -> &AttackCooldown {
        &self.cooldown
    }

    /// Tunable parameters of the sentinel.
    #[must_use]
    pub const fn config(&self) -> &SentinelConfig {
        &self.config
    }

    /// Reports whether ranged attacks are currently enabled.
    #[must_use]
    pub const fn ranged_enabled(&self) -> bool {
        self.ranged_enabled
    }

    /// Configuration fault detected at construction, if any.
    #[must_use]
    pub const fn fault(&self) -> Option<&ConfigError> {
        self.fault.as_ref()
    }

    /// Reports whether the sentinel ignores signals because it is misconfigured.
    #[must_use]
    pub const fn is_inert(&self) -> bool {
        self.fault.is_some()
    }

    /// Handles the intruder entering the detection zone.
    ///
    /// Repeated signals while already alerted or pursuing have no effect.
    pub fn on_zone_enter(&mut self, out: &mut Vec<Event>) {
        if self.is_inert() || self.state.is_alert() {
            return;
        }

        let leg_in_progress = self.state == SentinelState::Patrolling
            && (self.motion.is_some() || !self.path.is_empty());

        self.motion = None;
        self.path.clear();
        self.dwell = Duration::ZERO;
        if leg_in_progress {
            self.patrol.advance();
        }

        self.ranged_enabled = true;
        self.set_indicator(DetectionIndicator::Alert, out);
        self.capabilities.sounds.play(SoundEffect::Detection);
        tracing::info!(sentinel = self.id.get(), "intruder detected");
        self.transition(SentinelState::Alerted, out);
    }

    /// Handles the intruder leaving the detection zone.
    ///
    /// Ignored unless the sentinel is alerted or pursuing.
    pub fn on_zone_exit(&mut self, out: &mut Vec<Event>) {
        if self.is_inert() || !self.state.is_alert() {
            return;
        }
        self.lose_intruder(out);
    }

    /// Advances the sentinel by `dt`.
    ///
    /// `intruder` is the intruder's current position, or `None` when there is
    /// no intruder to track.
    pub fn tick(&mut self, dt: Duration, intruder: Option<WorldPosition>, out: &mut Vec<Event>) {
        if self.is_inert() {
            return;
        }

        self.cooldown.tick(dt);

        match self.state {
            SentinelState::Patrolling => self.patrol_tick(dt, out),
            SentinelState::Returning => {
                self.transition(SentinelState::Patrolling, out);
                self.patrol_tick(dt, out);
            }
            SentinelState::Alerted => {
                self.transition(SentinelState::Pursuing, out);
                self.pursue_tick(dt, intruder, out);
            }
            SentinelState::Pursuing => self.pursue_tick(dt, intruder, out),
        }
    }

    /// Fires at `intruder` when ranged attacks are enabled, the intruder is
    /// within attack range and the cooldown has elapsed.
    ///
    /// Returns whether an attack was fired. Attempts that do not qualify are
    /// dropped without any side effect.
    pub fn attempt_attack(&mut self, intruder: WorldPosition, out: &mut Vec<Event>) -> bool {
        if self.is_inert() || !self.ranged_enabled || !self.cooldown.ready() {
            return false;
        }

        let offset = intruder - self.pose.position;
        if offset.length() > self.config.attack_range {
            return false;
        }

        let origin = self.pose.position;
        let bearing = offset.y.atan2(offset.x);
        self.capabilities.projectiles.spawn_projectile(origin, bearing);
        self.capabilities.sounds.play(SoundEffect::Shot);
        self.cooldown.start(self.config.shoot_cooldown());

        tracing::info!(sentinel = self.id.get(), bearing, "attack fired");
        out.push(Event::AttackFired {
            sentinel: self.id,
            origin,
            bearing,
        });
        true
    }

    fn patrol_tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let mut budget = dt;
        if !self.dwell.is_zero() {
            let spent = self.dwell.min(budget);
            self.dwell -= spent;
            budget -= spent;
            if !self.dwell.is_zero() {
                return;
            }
        }

        if self.motion.is_none() && self.path.is_empty() && !self.plan_patrol_leg() {
            return;
        }

        if self.follow_path(budget.as_secs_f32(), out) && self.path.is_empty() {
            self.patrol.advance();
            self.dwell = self.config.patrol_pause();
        }
    }

    fn plan_patrol_leg(&mut self) -> bool {
        let (Some(grid), Some(waypoint)) = (self.grid.as_deref(), self.patrol.current()) else {
            return false;
        };

        let current = grid.to_grid(self.pose.position);
        self.path = if current == waypoint {
            Path::new([waypoint])
        } else {
            find_path(current, waypoint, grid)
        };

        if self.path.is_empty() {
            tracing::debug!(
                sentinel = self.id.get(),
                ?current,
                ?waypoint,
                "patrol waypoint unreachable; skipping it"
            );
            self.patrol.advance();
            return false;
        }

        true
    }

    fn pursue_tick(&mut self, dt: Duration, intruder: Option<WorldPosition>, out: &mut Vec<Event>) {
        let position = self.pose.position;
        let radius = self.config.detection_radius;
        let Some(intruder) = intruder.filter(|intruder| position.distance(*intruder) <= radius)
        else {
            tracing::debug!(sentinel = self.id.get(), "intruder out of range");
            self.lose_intruder(out);
            return;
        };

        if self.motion.is_none() {
            self.refresh_path(intruder, out);
        }
        let _ = self.follow_path(dt.as_secs_f32(), out);
        let _ = self.attempt_attack(intruder, out);
    }

    fn refresh_path(&mut self, intruder: WorldPosition, out: &mut Vec<Event>) {
        let Some(grid) = self.grid.as_deref() else {
            return;
        };

        let target = grid.to_grid(intruder);
        if self.path.terminal() == Some(target) {
            return;
        }

        let from = grid.to_grid(self.pose.position);
        self.path = find_path(from, target, grid);
        if self.path.is_empty() {
            tracing::trace!(
                sentinel = self.id.get(),
                ?from,
                ?target,
                "no path to intruder; retrying next tick"
            );
            return;
        }

        out.push(Event::PathComputed {
            sentinel: self.id,
            from,
            to: target,
            length: self.path.len(),
        });
    }

    /// Walks toward the next waypoint of the held path. Returns `true` on the
    /// tick a waypoint is reached.
    fn follow_path(&mut self, dt: f32, out: &mut Vec<Event>) -> bool {
        if self.motion.is_none() {
            let (Some(grid), Some(next)) = (self.grid.as_deref(), self.path.next()) else {
                return false;
            };
            self.motion = Some(MoveStep::new(
                &self.pose,
                grid.to_world(next),
                self.config.rotation_duration,
            ));
        }

        let Some(step) = self.motion.as_mut() else {
            return false;
        };
        if step.advance(&mut self.pose, dt, self.config.move_speed) == StepStatus::InProgress {
            return false;
        }

        self.motion = None;
        let Some(cell) = self.path.advance() else {
            return false;
        };
        out.push(Event::WaypointReached {
            sentinel: self.id,
            cell,
        });
        true
    }

    fn lose_intruder(&mut self, out: &mut Vec<Event>) {
        self.motion = None;
        self.path.clear();
        self.ranged_enabled = false;
        self.set_indicator(DetectionIndicator::Normal, out);
        tracing::info!(sentinel = self.id.get(), "intruder lost");
        self.transition(SentinelState::Returning, out);
    }

    fn transition(&mut self, to: SentinelState, out: &mut Vec<Event>) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        tracing::debug!(sentinel = self.id.get(), ?from, ?to, "state changed");
        out.push(Event::StateChanged {
            sentinel: self.id,
            from,
            to,
        });
    }

    fn set_indicator(&mut self, indicator: DetectionIndicator, out: &mut Vec<Event>) {
        if self.indicator == indicator {
            return;
        }
        self.indicator = indicator;
        out.push(Event::IndicatorChanged {
            sentinel: self.id,
            indicator,
        });
    }
}

fn validate(
    grid: Option<&GridMap>,
    patrol: &[GridCoord],
    config: &SentinelConfig,
) -> Result<(), ConfigError> {
    config.validate()?;

    let grid = grid.ok_or(ConfigError::MissingGrid)?;
    if patrol.is_empty() {
        return Err(ConfigError::EmptyPatrolRoute);
    }

    if let Some((index, cell)) = patrol
        .iter()
        .enumerate()
        .find(|(_, cell)| !grid.is_walkable(**cell))
    {
        return Err(ConfigError::UnwalkableWaypoint {
            index,
            cell: *cell,
        });
    }

    Ok(())
}
