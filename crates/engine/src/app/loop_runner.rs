use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::AppPaths;

use super::assets::AssetLoader;
use super::frame_loop::{required_sprites, FrameLoop, SceneConfig};
use super::grid::{GridError, TileGrid};
use super::input::ActionStates;
use super::level::LevelData;
use super::metrics::MetricsAccumulator;
use super::{InputAction, InputSnapshot, MetricsHandle, Renderer};

pub const SLOW_FRAME_ENV_VAR: &str = "ISLE_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Isle".to_string(),
            window_width: 1200,
            window_height: 912,
            max_frame_delta: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid level grid: {0}")]
    Grid(#[from] GridError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    scene: SceneConfig,
    level: LevelData,
    paths: &AppPaths,
) -> Result<(), AppError> {
    let metrics_handle = MetricsHandle::default();
    run_app_with_metrics(config, scene, level, paths, metrics_handle)
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    scene: SceneConfig,
    level: LevelData,
    paths: &AppPaths,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let grid = TileGrid::from_data(&level.grid)?.with_layer_at(level.player_start);

    let loader = AssetLoader::new(paths.sprite_root.clone());
    let assets = pollster::block_on(loader.load_bundle(required_sprites(&scene, &level)));
    let mut frame_loop = FrameLoop::new(scene, grid, &level, assets);

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let (surface_width, surface_height) = frame_loop.config().surface_size();
    let mut renderer = Renderer::new(Arc::clone(&window), surface_width, surface_height)
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::default();

    info!(
        surface_width,
        surface_height,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => {
                    input_collector.release_held_actions();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if slow_frame_delay > Duration::ZERO {
                        // Debug perturbation only; not the FPS cap.
                        thread::sleep(slow_frame_delay);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);

                    let input_snapshot = input_collector.snapshot_for_tick();
                    frame_loop.tick(frame_delta_ms(clamped_frame_dt), &input_snapshot);

                    // Single FPS cap sleep point for render pacing.
                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    if let Err(error) = renderer.render_scene(&mut frame_loop) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let sprites_drawn = frame_loop.compositor().last_queue().len();
                    metrics_accumulator.record_frame(raw_frame_dt, sprites_drawn);
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        metrics_handle.publish(snapshot);
                        let tile = frame_loop.movement().tile();
                        info!(
                            fps = snapshot.fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            worst_frame_ms = snapshot.worst_frame_ms,
                            sprites_per_frame = snapshot.sprites_per_frame,
                            player_x = tile.x,
                            player_y = tile.y,
                            zoomed = frame_loop.camera().is_zoomed(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    interact_is_down: bool,
    interact_pressed_edge: bool,
    action_states: ActionStates,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &winit::event::KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        self.update_action_state_from_physical_key(key_event.physical_key, is_pressed);
        self.handle_interact_key_state(is_interact_key(key_event), key_event.state);
    }

    fn handle_interact_key_state(&mut self, is_interact_key: bool, state: ElementState) {
        if !is_interact_key {
            return;
        }

        match state {
            ElementState::Pressed => {
                if !self.interact_is_down {
                    self.interact_pressed_edge = true;
                }
                self.interact_is_down = true;
            }
            ElementState::Released => self.interact_is_down = false,
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.action_states,
            self.interact_pressed_edge,
            self.quit_requested,
        );
        self.interact_pressed_edge = false;
        snapshot
    }

    /// Focus loss swallows key releases, so held keys are dropped here.
    fn release_held_actions(&mut self) {
        self.action_states = ActionStates::default();
        self.interact_is_down = false;
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        match key {
            PhysicalKey::Code(KeyCode::KeyW) | PhysicalKey::Code(KeyCode::ArrowUp) => {
                self.action_states.set(InputAction::MoveUp, is_pressed);
            }
            PhysicalKey::Code(KeyCode::KeyS) | PhysicalKey::Code(KeyCode::ArrowDown) => {
                self.action_states.set(InputAction::MoveDown, is_pressed);
            }
            PhysicalKey::Code(KeyCode::KeyA) | PhysicalKey::Code(KeyCode::ArrowLeft) => {
                self.action_states.set(InputAction::MoveLeft, is_pressed);
            }
            PhysicalKey::Code(KeyCode::KeyD) | PhysicalKey::Code(KeyCode::ArrowRight) => {
                self.action_states.set(InputAction::MoveRight, is_pressed);
            }
            PhysicalKey::Code(KeyCode::KeyE) => {
                self.action_states.set(InputAction::Interact, is_pressed);
            }
            PhysicalKey::Code(KeyCode::Escape) => {
                self.action_states.set(InputAction::Quit, is_pressed);
                if is_pressed {
                    self.mark_quit_requested();
                }
            }
            _ => {}
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn frame_delta_ms(frame_dt: Duration) -> f32 {
    (frame_dt.as_secs_f64() * 1000.0) as f32
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => parse_slow_frame_ms(&value).unwrap_or_else(|| {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                value = value.as_str(),
                "invalid slow-frame env var value; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }),
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}

fn parse_slow_frame_ms(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_millis)
}

fn is_interact_key(key_event: &winit::event::KeyEvent) -> bool {
    matches!(key_event.physical_key, PhysicalKey::Code(KeyCode::KeyE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::movement::{
        GridService, MovementConfig, MovementController, MovementState, SlopeTransition, TileStep,
    };
    use crate::app::scene::{Direction, TilePosition};

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    struct OpenGrid;

    impl GridService for OpenGrid {
        fn can_move_to(&self, _from: TilePosition, _to: TilePosition) -> bool {
            true
        }

        fn slope_transition(
            &self,
            _from: TilePosition,
            _direction: Direction,
        ) -> Option<SlopeTransition> {
            None
        }

        fn on_enter_tile(&mut self, _tile: TilePosition, _direction: Direction) -> TileStep {
            TileStep::NONE
        }

        fn current_layer(&self) -> i32 {
            0
        }
    }

    fn hold_down() -> InputSnapshot {
        InputSnapshot::empty().with_action_down(InputAction::MoveDown, true)
    }

    #[test]
    fn frame_delta_ms_keeps_sub_millisecond_fraction() {
        assert!((frame_delta_ms(Duration::from_micros(16_900)) - 16.9).abs() < 0.0001);
        assert!((frame_delta_ms(Duration::from_micros(900)) - 0.9).abs() < 0.0001);
        assert_eq!(frame_delta_ms(Duration::ZERO), 0.0);
    }

    #[test]
    fn fifteen_60hz_frames_commit_one_tile() {
        let mut movement = MovementController::new(OpenGrid, MovementConfig::default());
        let down = hold_down();
        let frame = frame_delta_ms(Duration::from_micros(16_667));

        for _ in 0..14 {
            movement.update(frame, &down);
        }
        assert_eq!(movement.tile(), TilePosition::new(17, 4));

        movement.update(frame, &InputSnapshot::empty());
        assert_eq!(movement.tile(), TilePosition::new(17, 5));
        assert_eq!(movement.state(), MovementState::Idle);
    }

    #[test]
    fn sub_millisecond_frames_still_move_the_player() {
        let mut movement = MovementController::new(OpenGrid, MovementConfig::default());
        let down = hold_down();
        let frame = frame_delta_ms(Duration::from_micros(900));

        for _ in 0..1000 {
            movement.update(frame, &down);
        }

        // 278 frames per leg; the fourth leg is still in flight
        assert_eq!(movement.tile(), TilePosition::new(17, 7));
        assert!(movement.is_moving());
    }

    #[test]
    fn interact_press_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.handle_interact_key_state(true, ElementState::Pressed);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!(first.interact_pressed());
        assert!(!second.interact_pressed());
    }

    #[test]
    fn held_interact_does_not_spam_press_edges() {
        let mut input = InputCollector::default();

        input.handle_interact_key_state(true, ElementState::Pressed);
        let first = input.snapshot_for_tick();

        input.handle_interact_key_state(true, ElementState::Pressed);
        let second = input.snapshot_for_tick();

        input.handle_interact_key_state(true, ElementState::Released);
        input.handle_interact_key_state(true, ElementState::Pressed);
        let third = input.snapshot_for_tick();

        assert!(first.interact_pressed());
        assert!(!second.interact_pressed());
        assert!(third.interact_pressed());
    }

    #[test]
    fn other_keys_do_not_raise_interact_edge() {
        let mut input = InputCollector::default();
        input.handle_interact_key_state(false, ElementState::Pressed);
        assert!(!input.snapshot_for_tick().interact_pressed());
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_actions() {
        let mut input = InputCollector::default();

        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyW), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowLeft), true);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveUp));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert_eq!(snapshot.held_direction(), Some(Direction::Up));
    }

    #[test]
    fn key_release_clears_action_state() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyD), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyD), false);

        let snapshot = input.snapshot_for_tick();
        assert!(!snapshot.is_down(InputAction::MoveRight));
        assert_eq!(snapshot.held_direction(), None);
    }

    #[test]
    fn focus_loss_releases_held_movement() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowDown), true);
        input.release_held_actions();

        assert_eq!(input.snapshot_for_tick().held_direction(), None);
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Escape), true);

        assert!(input.quit_requested);
        assert!(input.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn slow_frame_value_parses_whole_milliseconds() {
        assert_eq!(parse_slow_frame_ms(" 40 "), Some(Duration::from_millis(40)));
        assert_eq!(parse_slow_frame_ms("fast"), None);
        assert_eq!(parse_slow_frame_ms("-3"), None);
    }

    #[test]
    fn target_frame_duration_none_when_cap_off() {
        assert_eq!(target_frame_duration(None), None);
    }

    #[test]
    fn target_frame_duration_for_60hz_is_expected() {
        let duration = target_frame_duration(Some(60)).expect("duration");
        assert!((duration.as_secs_f64() - (1.0 / 60.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(20), target_frame_duration(Some(60)));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), target_frame_duration(Some(60)));
        assert!(sleep > Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
    }

    #[test]
    fn format_render_cap_reports_off() {
        assert_eq!(format_render_cap(None), "off");
        assert_eq!(format_render_cap(Some(30)), "30");
    }
}
