use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use super::movement::{GridService, SlopeTransition, TileStep};
use super::scene::{Direction, TilePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terrain {
    Water,
    Blocked,
    Ground { layer: i32 },
}

impl Terrain {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '~' => Some(Terrain::Water),
            '#' => Some(Terrain::Blocked),
            '.' => Some(Terrain::Ground { layer: 0 }),
            '^' => Some(Terrain::Ground { layer: 1 }),
            _ => None,
        }
    }

    pub fn layer(self) -> Option<i32> {
        match self {
            Terrain::Ground { layer } => Some(layer),
            Terrain::Water | Terrain::Blocked => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SlopeRule {
    pub from: TilePosition,
    pub direction: Direction,
    pub to: TilePosition,
    pub diagonal: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StepSpec {
    pub dx: i32,
    pub dy: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EnterRule {
    pub tile: TilePosition,
    /// Only fires for legs travelling this way; any direction when absent.
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub step: Option<StepSpec>,
    #[serde(default)]
    pub layer: Option<i32>,
}

/// Serialized grid: one string per row, one character per tile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GridData {
    pub width: u32,
    pub height: u32,
    pub terrain: Vec<String>,
    #[serde(default)]
    pub slopes: Vec<SlopeRule>,
    #[serde(default)]
    pub enter_rules: Vec<EnterRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid must have at least one tile, got {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[error("grid row count mismatch: expected {expected}, got {actual}")]
    RowCountMismatch { expected: usize, actual: usize },
    #[error("grid row {row} has {actual} tiles, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown terrain '{character}' at ({x}, {y})")]
    UnknownTerrain { character: char, x: usize, y: usize },
}

/// Reference [`GridService`]: walkable terrain on elevation layers, with
/// scripted slope diagonals and tile-entry rules.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<Terrain>,
    slopes: HashMap<(TilePosition, Direction), SlopeTransition>,
    enter_rules: Vec<EnterRule>,
    current_layer: i32,
}

impl TileGrid {
    pub fn from_data(data: &GridData) -> Result<Self, GridError> {
        if data.width == 0 || data.height == 0 {
            return Err(GridError::Empty {
                width: data.width,
                height: data.height,
            });
        }
        let expected_rows = data.height as usize;
        if data.terrain.len() != expected_rows {
            return Err(GridError::RowCountMismatch {
                expected: expected_rows,
                actual: data.terrain.len(),
            });
        }

        let expected_width = data.width as usize;
        let mut tiles = Vec::with_capacity(expected_rows * expected_width);
        for (y, row) in data.terrain.iter().enumerate() {
            let count = row.chars().count();
            if count != expected_width {
                return Err(GridError::RowWidthMismatch {
                    row: y,
                    expected: expected_width,
                    actual: count,
                });
            }
            for (x, character) in row.chars().enumerate() {
                let terrain = Terrain::from_char(character)
                    .ok_or(GridError::UnknownTerrain { character, x, y })?;
                tiles.push(terrain);
            }
        }

        let slopes = data
            .slopes
            .iter()
            .map(|rule| {
                (
                    (rule.from, rule.direction),
                    SlopeTransition {
                        slope_x: rule.to.x,
                        slope_y: rule.to.y,
                        diagonal: rule.diagonal,
                    },
                )
            })
            .collect();

        Ok(Self {
            width: data.width,
            height: data.height,
            tiles,
            slopes,
            enter_rules: data.enter_rules.clone(),
            current_layer: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn terrain_at(&self, tile: TilePosition) -> Option<Terrain> {
        if tile.x < 0 || tile.y < 0 {
            return None;
        }
        let (x, y) = (tile.x as u32, tile.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Starts the layer tracking from `tile`'s own elevation.
    pub fn with_layer_at(mut self, tile: TilePosition) -> Self {
        if let Some(layer) = self.terrain_at(tile).and_then(Terrain::layer) {
            self.current_layer = layer;
        }
        self
    }
}

impl GridService for TileGrid {
    fn can_move_to(&self, from: TilePosition, to: TilePosition) -> bool {
        let Some(target) = self.terrain_at(to).and_then(Terrain::layer) else {
            return false;
        };
        let origin = self
            .terrain_at(from)
            .and_then(Terrain::layer)
            .unwrap_or(self.current_layer);
        target == origin
    }

    fn slope_transition(
        &self,
        from: TilePosition,
        direction: Direction,
    ) -> Option<SlopeTransition> {
        self.slopes.get(&(from, direction)).copied()
    }

    fn on_enter_tile(&mut self, tile: TilePosition, direction: Direction) -> TileStep {
        let rule = self
            .enter_rules
            .iter()
            .find(|rule| rule.tile == tile && rule.direction.map_or(true, |d| d == direction))
            .copied();

        let layer = rule
            .and_then(|rule| rule.layer)
            .or_else(|| self.terrain_at(tile).and_then(Terrain::layer));
        if let Some(layer) = layer {
            self.current_layer = layer;
        }

        match rule.and_then(|rule| rule.step) {
            Some(step) => TileStep {
                dx: step.dx,
                dy: step.dy,
            },
            None => TileStep::NONE,
        }
    }

    fn current_layer(&self) -> i32 {
        self.current_layer
    }
}
