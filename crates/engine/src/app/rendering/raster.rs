use super::transform::{project_rect, ViewTransform};

/// Decoded RGBA8 image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SpriteImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * 4;
        (rgba.len() == expected).then_some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba[offset],
            self.rgba[offset + 1],
            self.rgba[offset + 2],
            self.rgba[offset + 3],
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SourceRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn fits(&self, image: &SpriteImage) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|right| right <= image.width)
            && self.y.checked_add(self.height).is_some_and(|bottom| bottom <= image.height)
    }
}

/// Destination in untransformed surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DestRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Draw surface consumed by the compositor.
pub trait RasterTarget {
    fn size(&self) -> (u32, u32);
    fn clear(&mut self, color: [u8; 4]);
    fn transform(&self) -> Option<ViewTransform>;
    fn set_transform(&mut self, transform: Option<ViewTransform>);
    /// Draws `source` of `image` into `dest`. With `flip_h` the sprite is
    /// mirrored inside `dest`, around its own horizontal centre.
    fn blit(&mut self, image: &SpriteImage, source: SourceRect, dest: DestRect, flip_h: bool);
}

/// Software raster over an RGBA8 frame such as `Pixels::frame_mut`.
pub struct FrameBuffer<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    transform: Option<ViewTransform>,
}

impl<'a> FrameBuffer<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
            transform: None,
        }
    }

    fn write_blended(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let Some(dst) = self.frame.get_mut(offset..offset + 4) else {
            return;
        };
        let alpha = color[3];
        if alpha == u8::MAX {
            dst.copy_from_slice(&color);
            return;
        }
        let a = u32::from(alpha);
        for channel in 0..3 {
            let src = u32::from(color[channel]);
            let old = u32::from(dst[channel]);
            dst[channel] = ((src * a + old * (255 - a) + 127) / 255) as u8;
        }
        dst[3] = dst[3].max(alpha);
    }
}

impl RasterTarget for FrameBuffer<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    fn transform(&self) -> Option<ViewTransform> {
        self.transform
    }

    fn set_transform(&mut self, transform: Option<ViewTransform>) {
        self.transform = transform;
    }

    fn blit(&mut self, image: &SpriteImage, source: SourceRect, dest: DestRect, flip_h: bool) {
        if !source.fits(image) || self.width == 0 || self.height == 0 {
            return;
        }
        let (left, top, right, bottom) = project_rect(
            self.transform.as_ref(),
            dest.x,
            dest.y,
            dest.width,
            dest.height,
        );
        let span_x = i64::from(right - left);
        let span_y = i64::from(bottom - top);
        if span_x <= 0 || span_y <= 0 {
            return;
        }

        let draw_left = left.max(0);
        let draw_top = top.max(0);
        let draw_right = right.min(self.width as i32);
        let draw_bottom = bottom.min(self.height as i32);

        for out_y in draw_top..draw_bottom {
            let dy = i64::from(out_y - top);
            let src_y = source.y + (dy * i64::from(source.height) / span_y) as u32;
            for out_x in draw_left..draw_right {
                let dx = i64::from(out_x - left);
                let mut column = (dx * i64::from(source.width) / span_x) as u32;
                if flip_h {
                    column = source.width - 1 - column;
                }
                let color = image.pixel(source.x + column, src_y);
                if color[3] == 0 {
                    continue;
                }
                self.write_blended(out_x, out_y, color);
            }
        }
    }
}
