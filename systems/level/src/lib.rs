#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Roster of the sentinels guarding one level.
//!
//! The level allocates sentinel identifiers, routes detection signals to the
//! addressed sentinel, ticks every sentinel in identifier order and decides
//! when the level may be reported as complete.

use std::{collections::BTreeMap, fmt, rc::Rc, time::Duration};

use nightwatch_core::{Event, GridCoord, LevelReporter, SentinelId, WorldPosition};
use nightwatch_system_sentinel::{Capabilities, Sentinel, SentinelConfig, SentinelSetup};
use nightwatch_world::GridMap;

/// Where and how a sentinel is placed in the level.
#[derive(Clone, Debug, Default)]
pub struct Placement {
    /// Cell the sentinel starts on.
    pub spawn: GridCoord,
    /// Initial facing in radians, counter-clockwise from the +x axis.
    pub bearing: f32,
    /// Patrol waypoints, visited in order and looped.
    pub patrol: Vec<GridCoord>,
    /// Tunable parameters.
    pub config: SentinelConfig,
}

/// Sentinels of a level together with the collaborators they share.
pub struct Level {
    grid: Rc<GridMap>,
    capabilities: Capabilities,
    reporter: Rc<dyn LevelReporter>,
    sentinels: BTreeMap<SentinelId, Sentinel>,
    next_sentinel_id: SentinelId,
    reported: bool,
}

impl Level {
    /// Creates a level without sentinels.
    #[must_use]
    pub fn new(
        grid: Rc<GridMap>,
        capabilities: Capabilities,
        reporter: Rc<dyn LevelReporter>,
    ) -> Self {
        Self {
            grid,
            capabilities,
            reporter,
            sentinels: BTreeMap::new(),
            next_sentinel_id: SentinelId::new(0),
            reported: false,
        }
    }

    /// Grid shared by every sentinel of the level.
    #[must_use]
    pub fn grid(&self) -> &Rc<GridMap> {
        &self.grid
    }

    /// Places a new sentinel and returns its identifier.
    ///
    /// Identifiers are allocated in ascending order. A misconfigured sentinel
    /// still joins the roster, idle, and must be defeated like any other.
    pub fn spawn(&mut self, placement: Placement) -> SentinelId {
        let id = self.next_sentinel_id;
        self.next_sentinel_id = SentinelId::new(id.get().saturating_add(1));

        let Placement {
            spawn,
            bearing,
            patrol,
            config,
        } = placement;
        let setup = SentinelSetup {
            id,
            grid: Some(Rc::clone(&self.grid)),
            spawn,
            bearing,
            patrol,
            config,
        };

        let sentinel = Sentinel::new(setup, self.capabilities.clone());
        tracing::debug!(
            sentinel = id.get(),
            ?spawn,
            inert = sentinel.is_inert(),
            "sentinel spawned"
        );
        let _ = self.sentinels.insert(id, sentinel);
        id
    }

    /// Removes a defeated sentinel. Returns `false` if it was not in the roster.
    pub fn defeat(&mut self, id: SentinelId) -> bool {
        if self.sentinels.remove(&id).is_none() {
            return false;
        }
        tracing::info!(
            sentinel = id.get(),
            remaining = self.sentinels.len(),
            "sentinel defeated"
        );
        true
    }

    /// Forwards a zone-enter signal to the sentinel `id`.
    pub fn signal_enter(&mut self, id: SentinelId, out: &mut Vec<Event>) {
        match self.sentinels.get_mut(&id) {
            Some(sentinel) => sentinel.on_zone_enter(out),
            None => tracing::debug!(sentinel = id.get(), "zone enter for unknown sentinel"),
        }
    }

    /// Forwards a zone-exit signal to the sentinel `id`.
    pub fn signal_exit(&mut self, id: SentinelId, out: &mut Vec<Event>) {
        match self.sentinels.get_mut(&id) {
            Some(sentinel) => sentinel.on_zone_exit(out),
            None => tracing::debug!(sentinel = id.get(), "zone exit for unknown sentinel"),
        }
    }

    /// Ticks every sentinel in identifier order.
    pub fn tick(&mut self, dt: Duration, intruder: Option<WorldPosition>, out: &mut Vec<Event>) {
        for sentinel in self.sentinels.values_mut() {
            sentinel.tick(dt, intruder, out);
        }
    }

    /// Sentinel registered under `id`, if it has not been defeated.
    #[must_use]
    pub fn sentinel(&self, id: SentinelId) -> Option<&Sentinel> {
        self.sentinels.get(&id)
    }

    /// Remaining sentinels in identifier order.
    pub fn sentinels(&self) -> impl Iterator<Item = &Sentinel> + '_ {
        self.sentinels.values()
    }

    /// Number of sentinels still standing.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.sentinels.len()
    }

    /// Reports whether every sentinel of the level has been defeated.
    #[must_use]
    pub fn on_all_defeated(&self) -> bool {
        self.sentinels.is_empty()
    }

    /// Reports completion once every sentinel has been defeated.
    ///
    /// The reporter is notified on the first successful call only. Returns
    /// whether the level is complete.
    pub fn complete_level(&mut self) -> bool {
        if !self.on_all_defeated() {
            tracing::info!(
                remaining = self.sentinels.len(),
                "sentinels remain; level not complete"
            );
            return false;
        }

        if !self.reported {
            self.reported = true;
            tracing::info!("level complete");
            self.reporter.level_complete();
        }
        true
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Level")
            .field("sentinels", &self.sentinels.len())
            .field("next_sentinel_id", &self.next_sentinel_id)
            .field("reported", &self.reported)
            .finish_non_exhaustive()
    }
}
