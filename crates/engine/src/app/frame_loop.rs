use tracing::info;

use super::animation::{AnimationScheduler, ClockCategory};
use super::assets::AssetBundle;
use super::camera::{CameraConfig, CameraController, SmoothingMode};
use super::grid::GridData;
use super::input::InputSnapshot;
use super::level::{instantiate_props, LevelData, PropInstance, PLAYER_ENTITY};
use super::movement::{GridService, MovementConfig, MovementController, MovementState};
use super::rendering::{
    Anchor, DepthCompositor, DrawKind, DrawSprite, DynamicDraw, FrameInputs, RasterTarget,
    StaticLayer, SurfaceGrid,
};
use super::scene::TilePosition;
use super::sprites::{SpriteId, SpriteKind, TeamColor, UnitClass};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    pub tile_size: u32,
    pub grid_columns: u32,
    pub grid_rows: u32,
    pub tile_traversal_ms: u32,
    pub zoomed_factor: f32,
    pub smoothing_factor: f32,
    pub identity_epsilon: f32,
    pub smoothing_mode: SmoothingMode,
    pub hero: UnitClass,
    pub team: TeamColor,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            tile_size: 64,
            grid_columns: 25,
            grid_rows: 19,
            tile_traversal_ms: 250,
            zoomed_factor: 2.0,
            smoothing_factor: 0.05,
            identity_epsilon: 0.01,
            smoothing_mode: SmoothingMode::PerFrame,
            hero: UnitClass::Warrior,
            team: TeamColor::Blue,
        }
    }
}

impl SceneConfig {
    pub fn surface_grid(&self) -> SurfaceGrid {
        SurfaceGrid {
            columns: self.grid_columns,
            rows: self.grid_rows,
            tile_size: self.tile_size,
        }
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_grid().surface_size()
    }

    /// Grid dimensions taken from the level's own terrain.
    pub fn sized_to(self, grid: &GridData) -> Self {
        Self {
            grid_columns: grid.width,
            grid_rows: grid.height,
            ..self
        }
    }

    fn camera_config(&self) -> CameraConfig {
        let (width, height) = self.surface_size();
        CameraConfig {
            zoomed_factor: self.zoomed_factor,
            smoothing_factor: self.smoothing_factor,
            identity_epsilon: self.identity_epsilon,
            smoothing_mode: self.smoothing_mode,
            ..CameraConfig::for_surface(width as f32, height as f32)
        }
    }
}

/// Sheets needed to draw `level` with the configured hero.
pub fn required_sprites(config: &SceneConfig, level: &LevelData) -> Vec<SpriteId> {
    let mut ids = level.sprite_ids();
    ids.push(SpriteId::unit_idle(config.hero, config.team));
    ids.push(SpriteId::unit_run(config.hero, config.team));
    ids
}

/// Per-frame driver. Constructing one requires a resolved [`AssetBundle`], so
/// no tick or render can happen before the asset barrier.
#[derive(Debug)]
pub struct FrameLoop<G> {
    config: SceneConfig,
    animation: AnimationScheduler,
    movement: MovementController<G>,
    camera: CameraController,
    compositor: DepthCompositor,
    assets: AssetBundle,
    statics: Vec<StaticLayer>,
    props: Vec<PropInstance>,
    zoom_triggers: Vec<TilePosition>,
    last_layer: i32,
    draws: Vec<DynamicDraw>,
}

impl<G: GridService> FrameLoop<G> {
    pub fn new(config: SceneConfig, grid: G, level: &LevelData, assets: AssetBundle) -> Self {
        let config = config.sized_to(&level.grid);
        let movement = MovementController::new(
            grid,
            MovementConfig {
                grid_width: config.grid_columns,
                grid_height: config.grid_rows,
                tile_traversal_ms: config.tile_traversal_ms,
                start: level.player_start,
            },
        );
        let last_layer = movement.grid().current_layer();
        info!(
            level = %level.name,
            columns = config.grid_columns,
            rows = config.grid_rows,
            hero = config.hero.name(),
            team = config.team.name(),
            props = level.props.len(),
            "scene_ready"
        );
        Self {
            config,
            animation: AnimationScheduler::new(),
            movement,
            camera: CameraController::new(config.camera_config()),
            compositor: DepthCompositor::new(config.surface_grid()),
            assets,
            statics: level.statics.clone(),
            props: instantiate_props(&level.props),
            zoom_triggers: level.zoom_triggers.clone(),
            last_layer,
            draws: Vec::new(),
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn movement(&self) -> &MovementController<G> {
        &self.movement
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn animation(&self) -> &AnimationScheduler {
        &self.animation
    }

    pub fn compositor(&self) -> &DepthCompositor {
        &self.compositor
    }

    /// One simulation step: interaction, animation, movement, camera.
    pub fn tick(&mut self, delta_ms: f32, input: &InputSnapshot) {
        if input.interact_pressed() {
            self.handle_interact();
        }
        self.animation.tick();
        self.movement.update(delta_ms, input);
        self.camera.tick(delta_ms);

        let layer = self.movement.grid().current_layer();
        if layer != self.last_layer {
            let tile = self.movement.tile();
            info!(from = self.last_layer, to = layer, x = tile.x, y = tile.y, "layer_changed");
            self.last_layer = layer;
        }
    }

    pub fn render<T: RasterTarget>(&mut self, target: &mut T) {
        self.draws.clear();
        self.draws
            .extend(self.props.iter().map(|prop| prop.draw(&self.animation)));
        let player = self.player_draw();
        self.draws.push(player);

        let inputs = FrameInputs {
            view: self.camera.view_transform(),
            statics: &self.statics,
            dynamics: &self.draws,
            animation: &self.animation,
            assets: &self.assets,
        };
        self.compositor.render_frame(target, &inputs);
    }

    fn handle_interact(&mut self) {
        if self.camera.is_zoomed() {
            self.camera.cancel_zoom();
            return;
        }
        let tile = self.movement.tile();
        if !self.zoom_triggers.contains(&tile) {
            return;
        }
        self.movement.cancel_movement();
        let tile = self.movement.tile();
        let size = self.config.tile_size as f32;
        self.camera
            .request_zoom((tile.x as f32 + 0.5) * size, (tile.y as f32 + 0.5) * size);
    }

    fn player_draw(&self) -> DynamicDraw {
        let (hero, team) = (self.config.hero, self.config.team);
        let (sprite, kind) = match self.movement.state() {
            MovementState::Idle => (SpriteId::unit_idle(hero, team), SpriteKind::UnitIdle(hero)),
            MovementState::Moving { .. } => {
                (SpriteId::unit_run(hero, team), SpriteKind::UnitRun(hero))
            }
        };
        DynamicDraw {
            kind: DrawKind::Player(DrawSprite {
                entity: PLAYER_ENTITY,
                sprite,
                frame: self.animation.frame_in(ClockCategory::Player, kind, 0, 1),
                position: self.movement.visual_position(),
                anchor: Anchor::Centered,
                flip_h: self.movement.facing().is_mirrored(),
            }),
            depth: None,
        }
    }
}
