mod compositor;
mod raster;
mod renderer;
mod transform;

pub use compositor::{
    anchored_dest, Anchor, DepthCompositor, DrawCommand, DrawKind, DrawSprite, DynamicDraw,
    FrameInputs, StaticLayer, SurfaceGrid, TileRef,
};
pub use raster::{DestRect, FrameBuffer, RasterTarget, SourceRect, SpriteImage};
pub use renderer::Renderer;
pub use transform::{project_rect, ViewTransform};
