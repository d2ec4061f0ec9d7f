//! Source tile layouts the grid model is built from.

use nightwatch_core::TileId;
use thiserror::Error;

/// Errors raised while assembling a tile layout.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout contained no cells at all.
    #[error("tile layout is empty")]
    Empty,
    /// The tile table length does not match the declared dimensions.
    #[error("tile layout declares {expected} cells but {found} were provided")]
    SizeMismatch {
        /// Cell count implied by the dimensions.
        expected: usize,
        /// Cell count actually supplied.
        found: usize,
    },
    /// A row of ASCII art had a different width than the first row.
    #[error("layout row {row} is {found} cells wide, expected {expected}")]
    Ragged {
        /// Zero-based row index of the offending line.
        row: u32,
        /// Width of the first row.
        expected: u32,
        /// Width of the offending row.
        found: u32,
    },
    /// A glyph of the ASCII art has no entry in the legend.
    #[error("glyph '{glyph}' at ({x}, {y}) is not in the legend")]
    UnknownGlyph {
        /// Character that could not be resolved.
        glyph: char,
        /// Column of the glyph.
        x: u32,
        /// Row of the glyph.
        y: u32,
    },
    /// The layout is too large to address with grid coordinates.
    #[error("tile layout of {columns}x{rows} cells exceeds the addressable grid")]
    TooLarge {
        /// Requested column count.
        columns: usize,
        /// Requested row count.
        rows: usize,
    },
}

/// Dense table of tile identities, one optional tile per cell.
///
/// Cells are stored row-major with row `y = 0` first. A cell without a tile is
/// represented by `None`, mirroring an unpainted tilemap cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayout {
    columns: u32,
    rows: u32,
    tiles: Vec<Option<TileId>>,
}

impl TileLayout {
    /// Creates a layout from a row-major tile table.
    pub fn new(columns: u32, rows: u32, tiles: Vec<Option<TileId>>) -> Result<Self, LayoutError> {
        let expected = cell_count(columns, rows)?;
        if tiles.len() != expected {
            return Err(LayoutError::SizeMismatch {
                expected,
                found: tiles.len(),
            });
        }

        Ok(Self {
            columns,
            rows,
            tiles,
        })
    }

    /// Creates a layout where every cell holds the same tile.
    pub fn filled(columns: u32, rows: u32, tile: Option<TileId>) -> Result<Self, LayoutError> {
        let count = cell_count(columns, rows)?;
        Self::new(columns, rows, vec![tile; count])
    }

    /// Parses ASCII art into a layout using the provided glyph legend.
    ///
    /// Each non-blank line is one row; line `i` becomes row `y = i`. Leading
    /// and trailing whitespace on a line is ignored, so glyphs must be visible
    /// characters.
    pub fn from_ascii(art: &str, legend: &[(char, TileId)]) -> Result<Self, LayoutError> {
        let lines: Vec<&str> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let Some(first) = lines.first() else {
            return Err(LayoutError::Empty);
        };

        let columns = first.chars().count();
        let rows = lines.len();
        let too_large = || LayoutError::TooLarge { columns, rows };
        let columns_u32 = u32::try_from(columns).map_err(|_| too_large())?;
        let rows_u32 = u32::try_from(rows).map_err(|_| too_large())?;

        let mut tiles = Vec::with_capacity(cell_count(columns_u32, rows_u32)?);
        for (y, line) in (0u32..).zip(lines.iter()) {
            let width = line.chars().count();
            if width != columns {
                return Err(LayoutError::Ragged {
                    row: y,
                    expected: columns_u32,
                    found: u32::try_from(width).unwrap_or(u32::MAX),
                });
            }

            for (x, glyph) in (0u32..).zip(line.chars()) {
                let tile = legend
                    .iter()
                    .find(|(candidate, _)| *candidate == glyph)
                    .map(|(_, tile)| *tile)
                    .ok_or(LayoutError::UnknownGlyph { glyph, x, y })?;
                tiles.push(Some(tile));
            }
        }

        Self::new(columns_u32, rows_u32, tiles)
    }

    /// Number of columns in the layout.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the layout.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile painted at the provided cell, if any.
    #[must_use]
    pub fn tile(&self, x: u32, y: u32) -> Option<TileId> {
        if x >= self.columns || y >= self.rows {
            return None;
        }
        let index = usize::try_from(y).ok()? * usize::try_from(self.columns).ok()?
            + usize::try_from(x).ok()?;
        self.tiles.get(index).copied().flatten()
    }

    /// Paints the provided cell, returning `false` when it lies outside the layout.
    pub fn set(&mut self, x: u32, y: u32, tile: Option<TileId>) -> bool {
        if x >= self.columns || y >= self.rows {
            return false;
        }
        let (Ok(x), Ok(y), Ok(columns)) = (
            usize::try_from(x),
            usize::try_from(y),
            usize::try_from(self.columns),
        ) else {
            return false;
        };
        match self.tiles.get_mut(y * columns + x) {
            Some(slot) => {
                *slot = tile;
                true
            }
            None => false,
        }
    }
}

fn cell_count(columns: u32, rows: u32) -> Result<usize, LayoutError> {
    let too_large = || LayoutError::TooLarge {
        columns: columns as usize,
        rows: rows as usize,
    };

    // Grid coordinates are signed, so every cell must stay addressable by i32.
    if i32::try_from(columns).is_err() || i32::try_from(rows).is_err() {
        return Err(too_large());
    }

    usize::try_from(u64::from(columns) * u64::from(rows)).map_err(|_| too_large())
}
