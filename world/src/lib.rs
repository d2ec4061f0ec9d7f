#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid model for Nightwatch levels.
//!
//! The [`GridMap`] is built once from a [`TileLayout`] when a level loads and
//! is read-only afterwards. It answers walkability, bounds and neighbour
//! queries and converts between grid cells and world positions. Path search
//! over the map lives in [`navigation`].

use nightwatch_core::{GridCoord, TileId, WorldPosition};

mod layout;
pub mod navigation;

pub use layout::{LayoutError, TileLayout};
pub use navigation::{find_path, Path};

/// Axis-aligned unit offsets in the order neighbours are reported:
/// up, down, right, left.
const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Placement of the grid on the world plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellGeometry {
    cell_size: f32,
    origin: WorldPosition,
}

impl CellGeometry {
    /// Creates a geometry with square cells of `cell_size` world units whose
    /// cell `(0, 0)` has its lower-left corner at `origin`.
    #[must_use]
    pub const fn new(cell_size: f32, origin: WorldPosition) -> Self {
        Self { cell_size, origin }
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World position of the lower-left corner of cell `(0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> WorldPosition {
        self.origin
    }

    /// World position of the centre of the provided cell.
    #[must_use]
    pub fn to_world(&self, coord: GridCoord) -> WorldPosition {
        let cell = WorldPosition::new(coord.x() as f32, coord.y() as f32);
        self.origin + (cell + WorldPosition::splat(0.5)) * self.cell_size
    }

    /// Cell containing the provided world position.
    ///
    /// Positions that cannot be mapped onto a finite cell (non-finite input or
    /// a degenerate cell size) resolve to a coordinate no grid contains.
    #[must_use]
    pub fn to_grid(&self, position: WorldPosition) -> GridCoord {
        let local = ((position - self.origin) / self.cell_size).floor();
        if !local.is_finite() {
            return GridCoord::new(i32::MIN, i32::MIN);
        }
        GridCoord::new(local.x as i32, local.y as i32)
    }
}

impl Default for CellGeometry {
    fn default() -> Self {
        Self::new(1.0, WorldPosition::ZERO)
    }
}

/// Boolean walkability table derived from a tile layout.
#[derive(Clone, Debug, PartialEq)]
pub struct GridMap {
    width: u32,
    height: u32,
    walkable: Vec<bool>,
    geometry: CellGeometry,
}

impl GridMap {
    /// Builds the walkability table by scanning every cell of `layout` once.
    ///
    /// A cell is walkable iff its tile equals `walkable_tile`. An absent
    /// layout produces an empty map in which nothing is walkable.
    #[must_use]
    pub fn build(
        layout: Option<&TileLayout>,
        walkable_tile: TileId,
        geometry: CellGeometry,
    ) -> Self {
        let Some(layout) = layout else {
            tracing::warn!("no tile layout supplied; building an empty grid map");
            return Self::empty(geometry);
        };

        let (width, height) = (layout.columns(), layout.rows());
        let mut walkable = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                walkable.push(layout.tile(x, y) == Some(walkable_tile));
            }
        }

        let map = Self {
            width,
            height,
            walkable,
            geometry,
        };
        tracing::debug!(
            width,
            height,
            walkable = map.walkable_count(),
            "grid map built"
        );
        map
    }

    /// Creates a map without any cells.
    #[must_use]
    pub fn empty(geometry: CellGeometry) -> Self {
        Self {
            width: 0,
            height: 0,
            walkable: Vec::new(),
            geometry,
        }
    }

    /// Number of columns in the map.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the map.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Placement of the map on the world plane.
    #[must_use]
    pub const fn geometry(&self) -> &CellGeometry {
        &self.geometry
    }

    /// Number of walkable cells.
    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.walkable.iter().filter(|cell| **cell).count()
    }

    /// Reports whether the coordinate lies inside the map.
    #[must_use]
    pub fn is_valid(&self, coord: GridCoord) -> bool {
        self.index(coord).is_some()
    }

    /// Reports whether the cell can be walked on. Cells outside the map are
    /// never walkable.
    #[must_use]
    pub fn is_walkable(&self, coord: GridCoord) -> bool {
        self.index(coord)
            .and_then(|index| self.walkable.get(index).copied())
            .unwrap_or(false)
    }

    /// Walkable cells adjacent to `coord`, in up, down, right, left order.
    pub fn neighbors(&self, coord: GridCoord) -> impl Iterator<Item = GridCoord> + '_ {
        NEIGHBOR_OFFSETS
            .into_iter()
            .filter_map(move |(dx, dy)| coord.offset(dx, dy))
            .filter(move |neighbor| self.is_walkable(*neighbor))
    }

    /// World position of the centre of the provided cell.
    #[must_use]
    pub fn to_world(&self, coord: GridCoord) -> WorldPosition {
        self.geometry.to_world(coord)
    }

    /// Cell containing the provided world position.
    #[must_use]
    pub fn to_grid(&self, position: WorldPosition) -> GridCoord {
        self.geometry.to_grid(position)
    }

    /// Total number of cells, walkable or not.
    pub(crate) fn cell_count(&self) -> usize {
        self.walkable.len()
    }

    /// Row-major storage index of the cell, if it lies inside the map.
    pub(crate) fn index(&self, coord: GridCoord) -> Option<usize> {
        let x = u32::try_from(coord.x()).ok()?;
        let y = u32::try_from(coord.y()).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        usize::try_from(y)
            .ok()?
            .checked_mul(width)?
            .checked_add(usize::try_from(x).ok()?)
    }

    /// Inverse of [`GridMap::index`].
    pub(crate) fn coord(&self, index: usize) -> Option<GridCoord> {
        let width = usize::try_from(self.width).ok()?;
        if width == 0 || index >= self.cell_count() {
            return None;
        }
        let x = i32::try_from(index % width).ok()?;
        let y = i32::try_from(index / width).ok()?;
        Some(GridCoord::new(x, y))
    }
}
