use tracing::info;

use super::input::InputSnapshot;
use super::scene::{Direction, Facing, TilePosition, Vec2};

pub const DEFAULT_TILE_TRAVERSAL_MS: u32 = 250;

/// Diagonal leg that replaces a blocked orthogonal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlopeTransition {
    pub slope_x: i32,
    pub slope_y: i32,
    pub diagonal: Direction,
}

/// Follow-up step requested when a tile is entered. Zero means none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileStep {
    pub dx: i32,
    pub dy: i32,
}

impl TileStep {
    pub const NONE: TileStep = TileStep { dx: 0, dy: 0 };

    pub const fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Terrain, collision and slope topology consulted by movement.
pub trait GridService {
    fn can_move_to(&self, from: TilePosition, to: TilePosition) -> bool;
    fn slope_transition(&self, from: TilePosition, direction: Direction)
        -> Option<SlopeTransition>;
    fn on_enter_tile(&mut self, tile: TilePosition, direction: Direction) -> TileStep;
    fn current_layer(&self) -> i32;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementState {
    Idle,
    Moving { direction: Direction, progress: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    pub tile_traversal_ms: u32,
    pub start: TilePosition,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            grid_width: 25,
            grid_height: 19,
            tile_traversal_ms: DEFAULT_TILE_TRAVERSAL_MS,
            start: TilePosition::new(17, 4),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Leg {
    direction: Direction,
    origin: TilePosition,
    elapsed_ms: f32,
}

/// Player movement state machine. Owns the logical tile and the grid handle.
#[derive(Debug)]
pub struct MovementController<G> {
    grid: G,
    config: MovementConfig,
    tile: TilePosition,
    leg: Option<Leg>,
    facing: Facing,
}

impl<G: GridService> MovementController<G> {
    pub fn new(grid: G, config: MovementConfig) -> Self {
        let config = MovementConfig {
            tile_traversal_ms: config.tile_traversal_ms.max(1),
            ..config
        };
        let tile = config.start.clamped(config.grid_width, config.grid_height);
        Self {
            grid,
            config,
            tile,
            leg: None,
            facing: Facing::default(),
        }
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    pub fn tile(&self) -> TilePosition {
        self.tile
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn state(&self) -> MovementState {
        match self.leg {
            Some(leg) => MovementState::Moving {
                direction: leg.direction,
                progress: self.progress_of(leg),
            },
            None => MovementState::Idle,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.leg.is_some()
    }

    /// Logical tile offset by the in-flight leg, in tile units.
    pub fn visual_position(&self) -> Vec2 {
        let base = self.tile.to_vec2();
        let Some(leg) = self.leg else {
            return base;
        };
        let progress = self.progress_of(leg).min(1.0);
        let (dx, dy) = leg.direction.unit_step();
        Vec2::new(base.x + dx as f32 * progress, base.y + dy as f32 * progress)
    }

    /// `delta_ms` is elapsed wall time in fractional milliseconds.
    pub fn update(&mut self, delta_ms: f32, input: &InputSnapshot) {
        if self.leg.is_none() {
            let Some(direction) = input.held_direction() else {
                return;
            };
            if !self.try_start_from_input(direction) {
                return;
            }
        }
        self.advance(delta_ms);
    }

    /// Abandons the in-flight leg; the player stays on the leg's start tile.
    pub fn cancel_movement(&mut self) {
        if let Some(leg) = self.leg.take() {
            self.tile = leg.origin;
            info!(
                x = self.tile.x,
                y = self.tile.y,
                direction = ?leg.direction,
                "movement_cancelled"
            );
        }
    }

    fn try_start_from_input(&mut self, direction: Direction) -> bool {
        let candidate = self.tile.stepped(direction);
        if self.grid.can_move_to(self.tile, candidate) {
            self.begin_leg(direction);
            return true;
        }
        match self.grid.slope_transition(self.tile, direction) {
            Some(slope) => {
                self.tile = TilePosition::new(slope.slope_x, slope.slope_y)
                    .clamped(self.config.grid_width, self.config.grid_height);
                self.begin_leg(slope.diagonal);
                true
            }
            None => false,
        }
    }

    fn begin_leg(&mut self, direction: Direction) {
        if let Some(facing) = direction.horizontal_facing() {
            self.facing = facing;
        }
        self.leg = Some(Leg {
            direction,
            origin: self.tile,
            elapsed_ms: 0.0,
        });
    }

    fn advance(&mut self, delta_ms: f32) {
        let Some(leg) = self.leg.as_mut() else {
            return;
        };
        leg.elapsed_ms += delta_ms.max(0.0);
        if leg.elapsed_ms < self.config.tile_traversal_ms as f32 {
            return;
        }

        let direction = leg.direction;
        self.leg = None;
        self.tile = self
            .tile
            .stepped(direction)
            .clamped(self.config.grid_width, self.config.grid_height);

        let step = self.grid.on_enter_tile(self.tile, direction);
        if let Some(chained) = Direction::from_step(step.dx, step.dy) {
            self.begin_leg(chained);
        }
    }

    fn progress_of(&self, leg: Leg) -> f32 {
        leg.elapsed_ms / self.config.tile_traversal_ms as f32
    }
}
