use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::frame_loop::FrameLoop;
use crate::app::movement::GridService;

use super::raster::FrameBuffer;

/// Presents the scene raster through `pixels`. The buffer stays at the scene
/// surface size and is scaled onto whatever size the window has.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    surface_width: u32,
    surface_height: u32,
}

impl Renderer {
    pub fn new(window: Arc<Window>, surface_width: u32, surface_height: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(
            Arc::clone(&window),
            (surface_width, surface_height),
            (size.width, size.height),
        )?;
        Ok(Self {
            window,
            pixels,
            surface_width,
            surface_height,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(
            Arc::clone(&self.window),
            (self.surface_width, self.surface_height),
            (width, height),
        )?;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        (buffer_width, buffer_height): (u32, u32),
        (window_width, window_height): (u32, u32),
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(window_width, window_height, window);
        Pixels::new(buffer_width, buffer_height, surface)
    }

    pub(crate) fn render_scene<G: GridService>(
        &mut self,
        scene: &mut FrameLoop<G>,
    ) -> Result<(), Error> {
        let mut target = FrameBuffer::new(
            self.pixels.frame_mut(),
            self.surface_width,
            self.surface_height,
        );
        scene.render(&mut target);
        self.pixels.render()
    }
}
