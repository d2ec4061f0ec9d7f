//! Fixed-step replay of a scenario against a level of sentinels.

use std::{cell::Cell, collections::BTreeSet, fmt, rc::Rc, time::Duration};

use anyhow::Result;
use nightwatch_core::{
    Event, LevelReporter, ProjectileSpawner, SentinelId, SentinelState, SoundEffect, SoundPlayer,
    WorldPosition,
};
use nightwatch_system_level::Level;
use nightwatch_system_sentinel::{motion::move_towards, Capabilities};

use crate::scenario::{IntruderSpec, Scenario};

/// Aggregated outcome of a replay.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Summary {
    pub(crate) ticks: u32,
    pub(crate) elapsed: Duration,
    pub(crate) sentinels: usize,
    pub(crate) detections: usize,
    pub(crate) paths_computed: usize,
    pub(crate) attacks: usize,
    pub(crate) defeated: usize,
    pub(crate) remaining: usize,
    pub(crate) level_complete: bool,
}

impl Summary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::StateChanged {
                    to: SentinelState::Alerted,
                    ..
                } => self.detections += 1,
                Event::PathComputed { .. } => self.paths_computed += 1,
                Event::AttackFired { .. } => self.attacks += 1,
                _ => {}
            }
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "simulated {} ticks ({:.2}s)",
            self.ticks,
            self.elapsed.as_secs_f32()
        )?;
        writeln!(f, "sentinels:      {}", self.sentinels)?;
        writeln!(f, "detections:     {}", self.detections)?;
        writeln!(f, "paths computed: {}", self.paths_computed)?;
        writeln!(f, "attacks fired:  {}", self.attacks)?;
        writeln!(
            f,
            "defeated:       {} ({} remaining)",
            self.defeated, self.remaining
        )?;
        write!(
            f,
            "level complete: {}",
            if self.level_complete { "yes" } else { "no" }
        )
    }
}

/// Capability sink that logs every outbound request.
#[derive(Debug, Default)]
struct LogSink {
    projectiles: Cell<usize>,
}

impl ProjectileSpawner for LogSink {
    fn spawn_projectile(&self, origin: WorldPosition, bearing: f32) {
        self.projectiles.set(self.projectiles.get() + 1);
        tracing::info!(
            x = origin.x,
            y = origin.y,
            bearing,
            total = self.projectiles.get(),
            "projectile spawned"
        );
    }
}

impl SoundPlayer for LogSink {
    fn play(&self, effect: SoundEffect) {
        tracing::debug!(?effect, "sound played");
    }
}

impl LevelReporter for LogSink {
    fn level_complete(&self) {
        tracing::info!("advancing to the next level");
    }
}

/// Intruder following its scripted waypoints.
#[derive(Debug)]
struct Intruder {
    position: WorldPosition,
    waypoints: Vec<WorldPosition>,
    next: usize,
    speed: f32,
    looped: bool,
}

impl Intruder {
    fn new(spec: &IntruderSpec) -> Self {
        let waypoints: Vec<WorldPosition> = spec
            .waypoints
            .iter()
            .copied()
            .map(WorldPosition::from)
            .collect();
        Self {
            position: waypoints.first().copied().unwrap_or(WorldPosition::ZERO),
            waypoints,
            next: 1,
            speed: spec.speed,
            looped: spec.looped,
        }
    }

    fn advance(&mut self, dt: Duration) {
        let mut budget = self.speed * dt.as_secs_f32();
        if self.looped {
            let lap = self.lap_length();
            if lap > f32::EPSILON {
                budget %= lap;
            }
        }
        let mut idle_hops = 0;
        while budget > 0.0 && idle_hops <= self.waypoints.len() {
            let Some(target) = self.target() else {
                return;
            };
            let distance = self.position.distance(target);
            self.position = move_towards(self.position, target, budget);
            budget -= distance;
            if self.position == target {
                self.next += 1;
            }
            idle_hops = if distance <= f32::EPSILON { idle_hops + 1 } else { 0 };
        }
    }

    /// Length of one full loop through every waypoint and back to the first.
    fn lap_length(&self) -> f32 {
        self.waypoints
            .iter()
            .zip(self.waypoints.iter().cycle().skip(1))
            .map(|(from, to)| from.distance(*to))
            .sum()
    }

    fn target(&self) -> Option<WorldPosition> {
        if self.waypoints.len() < 2 {
            return None;
        }
        if self.looped {
            return self.waypoints.get(self.next % self.waypoints.len()).copied();
        }
        self.waypoints.get(self.next).copied()
    }
}

/// Runs `ticks` fixed steps of `dt` and reports what happened.
pub(crate) fn run(scenario: &Scenario, ticks: u32, dt: Duration) -> Result<Summary> {
    let grid = Rc::new(scenario.grid()?);
    let sink = Rc::new(LogSink::default());
    let mut level = Level::new(
        grid,
        Capabilities::new(sink.clone(), sink.clone()),
        sink.clone(),
    );
    for placement in scenario.placements() {
        let _ = level.spawn(placement);
    }

    let mut intruder = Intruder::new(&scenario.intruder);
    let mut inside = BTreeSet::new();
    let mut events = Vec::new();
    let mut summary = Summary {
        sentinels: level.remaining(),
        ..Summary::default()
    };

    for tick in 0..ticks {
        for defeat in scenario.defeats.iter().filter(|defeat| defeat.at_tick == tick) {
            let id = SentinelId::new(defeat.sentinel);
            if level.defeat(id) {
                let _ = inside.remove(&id);
                summary.defeated += 1;
            } else {
                tracing::warn!(
                    tick,
                    sentinel = defeat.sentinel,
                    "scripted defeat of unknown sentinel"
                );
            }
        }

        intruder.advance(dt);
        let position = intruder.position;

        let zones: Vec<(SentinelId, bool)> = level
            .sentinels()
            .map(|sentinel| {
                let within =
                    sentinel.position().distance(position) <= sentinel.config().detection_radius;
                (sentinel.id(), within)
            })
            .collect();
        for (id, within) in zones {
            if within && inside.insert(id) {
                level.signal_enter(id, &mut events);
            } else if !within && inside.remove(&id) {
                level.signal_exit(id, &mut events);
            }
        }

        level.tick(dt, Some(position), &mut events);
        summary.record(&events);
        events.clear();

        summary.ticks += 1;
        summary.elapsed += dt;
    }

    summary.level_complete = level.complete_level();
    summary.remaining = level.remaining();
    tracing::debug!(projectiles = sink.projectiles.get(), "replay finished");
    Ok(summary)
}
