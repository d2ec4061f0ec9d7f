//! TOML scenario files describing a guarded level and a scripted intrusion.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use nightwatch_core::{GridCoord, TileId, WorldPosition};
use nightwatch_system_level::Placement;
use nightwatch_system_sentinel::SentinelConfig;
use nightwatch_world::{CellGeometry, GridMap, TileLayout};
use serde::Deserialize;

/// Complete scenario as read from disk.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    pub(crate) level: LevelSpec,
    /// Parameters shared by every sentinel that does not override them.
    #[serde(default)]
    pub(crate) sentinel_config: SentinelConfig,
    #[serde(default)]
    pub(crate) sentinels: Vec<SentinelSpec>,
    pub(crate) intruder: IntruderSpec,
    #[serde(default)]
    pub(crate) defeats: Vec<DefeatSpec>,
}

/// Level geometry. The first non-blank layout line is row zero.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelSpec {
    pub(crate) layout: String,
    pub(crate) legend: Vec<LegendEntry>,
    pub(crate) walkable: u32,
    #[serde(default = "default_cell_size")]
    pub(crate) cell_size: f32,
    #[serde(default)]
    pub(crate) origin: [f32; 2],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LegendEntry {
    pub(crate) glyph: char,
    pub(crate) tile: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SentinelSpec {
    pub(crate) spawn: [i32; 2],
    /// Initial facing in radians.
    #[serde(default)]
    pub(crate) bearing: f32,
    pub(crate) patrol: Vec<[i32; 2]>,
    pub(crate) config: Option<SentinelConfig>,
}

/// Scripted intruder walking through world positions at constant speed.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct IntruderSpec {
    pub(crate) speed: f32,
    pub(crate) waypoints: Vec<[f32; 2]>,
    #[serde(default)]
    pub(crate) looped: bool,
}

/// Projectile hit scripted to remove a sentinel at the start of a tick.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DefeatSpec {
    pub(crate) at_tick: u32,
    pub(crate) sentinel: u32,
}

fn default_cell_size() -> f32 {
    1.0
}

impl Scenario {
    /// Reads and validates the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(text).context("failed to parse scenario TOML")?;

        let intruder = &scenario.intruder;
        if intruder.waypoints.is_empty() {
            bail!("intruder script has no waypoints");
        }
        if !intruder.speed.is_finite() || intruder.speed < 0.0 {
            bail!("intruder speed {} is not a non-negative number", intruder.speed);
        }
        if !scenario.level.cell_size.is_finite() || scenario.level.cell_size <= 0.0 {
            bail!("cell size {} must be positive", scenario.level.cell_size);
        }

        Ok(scenario)
    }

    /// Builds the walkability grid of the level.
    pub(crate) fn grid(&self) -> Result<GridMap> {
        let legend: Vec<(char, TileId)> = self
            .level
            .legend
            .iter()
            .map(|entry| (entry.glyph, TileId::new(entry.tile)))
            .collect();
        let layout =
            TileLayout::from_ascii(&self.level.layout, &legend).context("invalid level layout")?;
        let geometry = CellGeometry::new(
            self.level.cell_size,
            WorldPosition::from(self.level.origin),
        );
        Ok(GridMap::build(
            Some(&layout),
            TileId::new(self.level.walkable),
            geometry,
        ))
    }

    /// Placements of every sentinel, in file order.
    pub(crate) fn placements(&self) -> Vec<Placement> {
        self.sentinels
            .iter()
            .map(|spec| Placement {
                spawn: cell(spec.spawn),
                bearing: spec.bearing,
                patrol: spec.patrol.iter().copied().map(cell).collect(),
                config: spec
                    .config
                    .clone()
                    .unwrap_or_else(|| self.sentinel_config.clone()),
            })
            .collect()
    }
}

fn cell([x, y]: [i32; 2]) -> GridCoord {
    GridCoord::new(x, y)
}
