mod animation;
mod assets;
mod camera;
mod frame_loop;
mod grid;
mod input;
mod level;
mod loop_runner;
mod metrics;
mod movement;
mod rendering;
mod scene;
mod sprites;

pub use animation::{
    stagger_offset, AnimationClock, AnimationScheduler, BehaviorClass, BehaviorCycle,
    BehaviorFrame, BehaviorPhase, BehaviorSpec, ClockCategory,
};
pub use assets::{AssetBundle, AssetError, AssetLoader, SpriteSheet};
pub use camera::{CameraConfig, CameraController, CameraState, SmoothingMode};
pub use frame_loop::{required_sprites, FrameLoop, SceneConfig};
pub use grid::{EnterRule, GridData, GridError, SlopeRule, StepSpec, Terrain, TileGrid};
pub use input::{InputAction, InputSnapshot};
pub use level::{
    instantiate_props, LevelData, PropGroup, PropInstance, PropPlacement, PropSpec, PLAYER_ENTITY,
};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use movement::{
    GridService, MovementConfig, MovementController, MovementState, SlopeTransition, TileStep,
    DEFAULT_TILE_TRAVERSAL_MS,
};
pub use rendering::{
    anchored_dest, project_rect, Anchor, DepthCompositor, DestRect, DrawCommand, DrawKind,
    DrawSprite, DynamicDraw, FrameBuffer, FrameInputs, RasterTarget, Renderer, SourceRect,
    SpriteImage, StaticLayer, SurfaceGrid, TileRef, ViewTransform,
};
pub use scene::{Direction, EntityId, Facing, TilePosition, Vec2};
pub use sprites::{BuildingKind, SpriteId, SpriteKind, TeamColor, UnitClass};
