//! Looping patrol routes.

use nightwatch_core::GridCoord;

/// Ordered patrol waypoints together with the index of the active one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatrolRoute {
    waypoints: Vec<GridCoord>,
    index: usize,
}

impl PatrolRoute {
    /// Creates a route that starts at its first waypoint.
    #[must_use]
    pub fn new(waypoints: Vec<GridCoord>) -> Self {
        Self {
            waypoints,
            index: 0,
        }
    }

    /// Waypoint the sentinel is heading to, if the route has any.
    #[must_use]
    pub fn current(&self) -> Option<GridCoord> {
        self.waypoints.get(self.index).copied()
    }

    /// Index of the active waypoint.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// All waypoints of the route in patrol order.
    #[must_use]
    pub fn waypoints(&self) -> &[GridCoord] {
        &self.waypoints
    }

    /// Moves on to the following waypoint, wrapping after the last one.
    pub fn advance(&mut self) {
        if self.waypoints.is_empty() {
            return;
        }
        self.index = (self.index + 1) % self.waypoints.len();
    }
}
