use tracing::info;

use super::rendering::ViewTransform;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SmoothingMode {
    /// Fixed factor per tick, as tuned for a 60 Hz display.
    #[default]
    PerFrame,
    /// Factor rescaled so a tick of `reference_frame_ms` matches `PerFrame`.
    TimeNormalized,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub surface_width: f32,
    pub surface_height: f32,
    pub zoomed_factor: f32,
    pub smoothing_factor: f32,
    pub identity_epsilon: f32,
    pub smoothing_mode: SmoothingMode,
    pub reference_frame_ms: f32,
}

impl CameraConfig {
    pub fn for_surface(surface_width: f32, surface_height: f32) -> Self {
        Self {
            surface_width,
            surface_height,
            zoomed_factor: 2.0,
            smoothing_factor: 0.05,
            identity_epsilon: 0.01,
            smoothing_mode: SmoothingMode::PerFrame,
            reference_frame_ms: 1000.0 / 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub target_x: f32,
    pub target_y: f32,
    pub target_zoom: f32,
    pub current_x: f32,
    pub current_y: f32,
    pub current_zoom: f32,
}

/// Smooth zoom and pan over a fixed-size raster surface, in surface pixels.
#[derive(Debug, Clone)]
pub struct CameraController {
    config: CameraConfig,
    state: CameraState,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        let (center_x, center_y) = (config.surface_width * 0.5, config.surface_height * 0.5);
        Self {
            config,
            state: CameraState {
                target_x: center_x,
                target_y: center_y,
                target_zoom: 1.0,
                current_x: center_x,
                current_y: center_y,
                current_zoom: 1.0,
            },
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    /// True while a zoom is requested, even if still animating in.
    pub fn is_zoomed(&self) -> bool {
        self.state.target_zoom != 1.0
    }

    pub fn request_zoom(&mut self, x: f32, y: f32) {
        self.state.target_zoom = self.config.zoomed_factor;
        self.state.target_x = x;
        self.state.target_y = y;
        info!(x, y, zoom = self.config.zoomed_factor, "zoom_requested");
    }

    pub fn cancel_zoom(&mut self) {
        self.state.target_zoom = 1.0;
        self.state.target_x = self.config.surface_width * 0.5;
        self.state.target_y = self.config.surface_height * 0.5;
        info!("zoom_cancelled");
    }

    pub fn tick(&mut self, delta_ms: f32) {
        let factor = self.effective_factor(delta_ms);
        let state = &mut self.state;
        state.current_zoom += (state.target_zoom - state.current_zoom) * factor;
        state.current_x += (state.target_x - state.current_x) * factor;
        state.current_y += (state.target_y - state.current_y) * factor;
    }

    /// Camera centre kept far enough from the edges that the zoomed viewport
    /// stays on the surface.
    pub fn clamped_center(&self) -> (f32, f32) {
        let zoom = self.state.current_zoom.max(f32::EPSILON);
        (
            clamp_axis(self.state.current_x, self.config.surface_width, zoom),
            clamp_axis(self.state.current_y, self.config.surface_height, zoom),
        )
    }

    /// `None` while the zoom is within epsilon of 1.
    pub fn view_transform(&self) -> Option<ViewTransform> {
        if (self.state.current_zoom - 1.0).abs() <= self.config.identity_epsilon {
            return None;
        }
        let (center_x, center_y) = self.clamped_center();
        Some(ViewTransform {
            anchor_x: self.config.surface_width * 0.5,
            anchor_y: self.config.surface_height * 0.5,
            scale: self.state.current_zoom,
            center_x,
            center_y,
        })
    }

    fn effective_factor(&self, delta_ms: f32) -> f32 {
        let base = self.config.smoothing_factor.clamp(0.0, 1.0);
        match self.config.smoothing_mode {
            SmoothingMode::PerFrame => base,
            SmoothingMode::TimeNormalized => {
                let frames = delta_ms.max(0.0) / self.config.reference_frame_ms.max(f32::EPSILON);
                1.0 - (1.0 - base).powf(frames)
            }
        }
    }
}

fn clamp_axis(value: f32, extent: f32, zoom: f32) -> f32 {
    let half = (extent * 0.5) / zoom;
    let (min, max) = (half, extent - half);
    if min > max {
        return extent * 0.5;
    }
    value.clamp(min, max)
}
