//! Breadth-first path search over the grid model.

use std::collections::VecDeque;

use nightwatch_core::GridCoord;

use crate::GridMap;

/// Ordered waypoints leading from a start cell to a target cell.
///
/// The start cell is never included; the last waypoint is the target. Paths
/// are consumed from the front as movement steps complete, so an empty path
/// means either that no route exists or that the walker has arrived.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    steps: VecDeque<GridCoord>,
}

impl Path {
    /// Creates a path that visits the provided cells in order.
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = GridCoord>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// Waypoint that should be walked to next.
    #[must_use]
    pub fn next(&self) -> Option<GridCoord> {
        self.steps.front().copied()
    }

    /// Final waypoint of the path.
    #[must_use]
    pub fn terminal(&self) -> Option<GridCoord> {
        self.steps.back().copied()
    }

    /// Removes and returns the next waypoint.
    pub fn advance(&mut self) -> Option<GridCoord> {
        self.steps.pop_front()
    }

    /// Number of waypoints still to be walked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Reports whether no waypoints remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Discards every remaining waypoint.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Iterator over the remaining waypoints in walking order.
    pub fn iter(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.steps.iter().copied()
    }
}

/// Finds a shortest 4-connected path from `start` to `target`.
///
/// Returns an empty path when both cells coincide, when either cell is not
/// walkable, or when `target` cannot be reached. Neighbours are expanded in
/// the grid's fixed order and every cell is finalised the first time it is
/// discovered, so the result is identical for identical inputs.
#[must_use]
pub fn find_path(start: GridCoord, target: GridCoord, grid: &GridMap) -> Path {
    if start == target || !grid.is_walkable(start) || !grid.is_walkable(target) {
        return Path::default();
    }

    let (Some(start_index), Some(target_index)) = (grid.index(start), grid.index(target)) else {
        return Path::default();
    };

    let cell_count = grid.cell_count();
    let mut visited = vec![false; cell_count];
    let mut came_from: Vec<Option<usize>> = vec![None; cell_count];
    let mut frontier = VecDeque::new();

    visited[start_index] = true;
    frontier.push_back(start);

    while let Some(cell) = frontier.pop_front() {
        let Some(current_index) = grid.index(cell) else {
            continue;
        };

        if current_index == target_index {
            return reconstruct(grid, &came_from, start_index, target_index);
        }

        for neighbor in grid.neighbors(cell) {
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };

            if visited[neighbor_index] {
                continue;
            }

            visited[neighbor_index] = true;
            came_from[neighbor_index] = Some(current_index);
            frontier.push_back(neighbor);
        }
    }

    Path::default()
}

fn reconstruct(
    grid: &GridMap,
    came_from: &[Option<usize>],
    start_index: usize,
    target_index: usize,
) -> Path {
    let mut reversed = Vec::new();
    let mut cursor = target_index;

    while cursor != start_index {
        let (Some(cell), Some(previous)) = (grid.coord(cursor), came_from[cursor]) else {
            return Path::default();
        };
        reversed.push(cell);
        cursor = previous;
    }

    Path::new(reversed.into_iter().rev())
}
