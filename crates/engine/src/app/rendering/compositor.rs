use std::collections::HashSet;

use serde::Deserialize;
use tracing::warn;

use crate::app::animation::AnimationScheduler;
use crate::app::assets::{AssetBundle, SpriteSheet};
use crate::app::scene::{EntityId, Vec2};
use crate::app::sprites::{SpriteId, SpriteKind};

use super::raster::{DestRect, RasterTarget, SourceRect};
use super::transform::ViewTransform;

const CLEAR_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Where a sprite's frame sits relative to its tile position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Frame top-left on the tile's top-left.
    TopLeft,
    /// Frame bottom edge on the tile's bottom edge.
    BottomAligned,
    /// Frame centred horizontally on the tile and lifted half a tile.
    Centered,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawSprite {
    pub entity: EntityId,
    pub sprite: SpriteId,
    pub frame: u32,
    /// Tile units, possibly fractional.
    pub position: Vec2,
    pub anchor: Anchor,
    pub flip_h: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawKind {
    Player(DrawSprite),
    Creature(DrawSprite),
    Unit(DrawSprite),
    Tree(DrawSprite),
    Building(DrawSprite),
    Rock(DrawSprite),
    Bush(DrawSprite),
}

impl DrawKind {
    pub fn sprite(&self) -> &DrawSprite {
        match self {
            DrawKind::Player(sprite)
            | DrawKind::Creature(sprite)
            | DrawKind::Unit(sprite)
            | DrawKind::Tree(sprite)
            | DrawKind::Building(sprite)
            | DrawKind::Rock(sprite)
            | DrawKind::Bush(sprite) => sprite,
        }
    }
}

/// One dynamic sprite for this frame. `depth` overrides the feet-derived key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicDraw {
    pub kind: DrawKind,
    pub depth: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub depth_key: f32,
    pub kind: DrawKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TileRef {
    #[serde(default)]
    pub x: Option<i32>,
    #[serde(default)]
    pub sx: u32,
    #[serde(default)]
    pub sy: u32,
}

/// Background layers, drawn in authoring order and never depth-sorted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum StaticLayer {
    /// Water tiles over the whole surface plus a one-tile margin.
    WaterFill,
    /// Tileset cells along row `y`; `x` continues from the previous cell
    /// unless given.
    TileRow {
        tileset: u8,
        y: i32,
        tiles: Vec<TileRef>,
    },
    Shadow { y: i32, xs: Vec<i32> },
    Foam { y: i32, xs: Vec<i32> },
    WaterRock { variant: u8, x: f32, y: f32 },
}

impl StaticLayer {
    pub fn sprite_ids(&self) -> Vec<SpriteId> {
        match self {
            StaticLayer::WaterFill => vec![SpriteId::single(SpriteKind::Water)],
            StaticLayer::TileRow { tileset, .. } => {
                vec![SpriteId::new(SpriteKind::Tileset, *tileset)]
            }
            StaticLayer::Shadow { .. } => vec![SpriteId::single(SpriteKind::Shadow)],
            StaticLayer::Foam { .. } => vec![SpriteId::single(SpriteKind::Foam)],
            StaticLayer::WaterRock { variant, .. } => {
                vec![SpriteId::new(SpriteKind::WaterRock, *variant)]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGrid {
    pub columns: u32,
    pub rows: u32,
    pub tile_size: u32,
}

impl SurfaceGrid {
    pub fn surface_size(&self) -> (u32, u32) {
        (self.columns * self.tile_size, self.rows * self.tile_size)
    }
}

pub struct FrameInputs<'a> {
    pub view: Option<ViewTransform>,
    pub statics: &'a [StaticLayer],
    pub dynamics: &'a [DynamicDraw],
    pub animation: &'a AnimationScheduler,
    pub assets: &'a AssetBundle,
}

/// Painter's-algorithm compositor. Static layers first, then dynamic sprites
/// ordered by feet Y.
#[derive(Debug)]
pub struct DepthCompositor {
    grid: SurfaceGrid,
    queue: Vec<DrawCommand>,
    warned_missing: HashSet<SpriteId>,
}

impl DepthCompositor {
    pub fn new(grid: SurfaceGrid) -> Self {
        Self {
            grid,
            queue: Vec::new(),
            warned_missing: HashSet::new(),
        }
    }

    pub fn grid(&self) -> SurfaceGrid {
        self.grid
    }

    /// Commands of the last rendered frame, in draw order.
    pub fn last_queue(&self) -> &[DrawCommand] {
        &self.queue
    }

    pub fn render_frame<T: RasterTarget>(&mut self, target: &mut T, inputs: &FrameInputs<'_>) {
        target.clear(CLEAR_COLOR);
        let saved = target.transform();
        if inputs.view.is_some() {
            target.set_transform(inputs.view);
        }

        for layer in inputs.statics {
            self.draw_static(target, layer, inputs);
        }

        let tile_size = self.grid.tile_size;
        self.queue.clear();
        self.queue.extend(inputs.dynamics.iter().map(|draw| DrawCommand {
            depth_key: draw.depth.unwrap_or_else(|| {
                sprite_feet_depth(tile_size, draw.kind.sprite(), inputs.assets)
            }),
            kind: draw.kind,
        }));
        // stable: equal keys keep submission order
        self.queue
            .sort_by(|a, b| a.depth_key.total_cmp(&b.depth_key));

        for index in 0..self.queue.len() {
            let command = self.queue[index];
            self.draw_sprite(target, command.kind.sprite(), inputs.assets);
        }

        target.set_transform(saved);
    }

    /// Visual feet row in tile units.
    pub fn feet_depth(&self, sprite: &DrawSprite, assets: &AssetBundle) -> f32 {
        sprite_feet_depth(self.grid.tile_size, sprite, assets)
    }

    fn draw_static<T: RasterTarget>(
        &mut self,
        target: &mut T,
        layer: &StaticLayer,
        inputs: &FrameInputs<'_>,
    ) {
        let tile = self.grid.tile_size as f32;
        match layer {
            StaticLayer::WaterFill => {
                let Some(sheet) = self.resolve(SpriteId::single(SpriteKind::Water), inputs.assets)
                else {
                    return;
                };
                let source = frame_source(sheet, 0);
                for row in -1..=self.grid.rows as i32 {
                    for col in -1..=self.grid.columns as i32 {
                        let dest = DestRect::new(
                            col as f32 * tile,
                            row as f32 * tile,
                            tile + 1.0,
                            tile + 1.0,
                        );
                        target.blit(&sheet.image, source, dest, false);
                    }
                }
            }
            StaticLayer::TileRow { tileset, y, tiles } => {
                let id = SpriteId::new(SpriteKind::Tileset, *tileset);
                let Some(sheet) = self.resolve(id, inputs.assets) else {
                    return;
                };
                let size = self.grid.tile_size;
                let mut x = 0;
                for cell in tiles {
                    if let Some(explicit) = cell.x {
                        x = explicit;
                    }
                    let source = SourceRect::new(cell.sx * size, cell.sy * size, size, size);
                    let dest = DestRect::new(x as f32 * tile, *y as f32 * tile, tile, tile);
                    target.blit(&sheet.image, source, dest, false);
                    x += 1;
                }
            }
            StaticLayer::Shadow { y, xs } => {
                let Some(sheet) = self.resolve(SpriteId::single(SpriteKind::Shadow), inputs.assets)
                else {
                    return;
                };
                let source = frame_source(sheet, 0);
                for x in xs {
                    let dest = natural_dest(sheet, *x as f32 * tile, *y as f32 * tile);
                    target.blit(&sheet.image, source, dest, false);
                }
            }
            StaticLayer::Foam { y, xs } => {
                let Some(sheet) = self.resolve(SpriteId::single(SpriteKind::Foam), inputs.assets)
                else {
                    return;
                };
                let total = xs.len() as u32;
                for (index, x) in xs.iter().enumerate() {
                    let frame = inputs
                        .animation
                        .frame_for(SpriteKind::Foam, index as u32, total);
                    let dest = natural_dest(sheet, *x as f32 * tile, *y as f32 * tile);
                    target.blit(&sheet.image, frame_source(sheet, frame), dest, false);
                }
            }
            StaticLayer::WaterRock { variant, x, y } => {
                let id = SpriteId::new(SpriteKind::WaterRock, *variant);
                let Some(sheet) = self.resolve(id, inputs.assets) else {
                    return;
                };
                let frame = inputs.animation.frame_for(SpriteKind::WaterRock, 0, 1);
                let dest = DestRect::new(x * tile, y * tile, tile, tile);
                target.blit(&sheet.image, frame_source(sheet, frame), dest, false);
            }
        }
    }

    fn draw_sprite<T: RasterTarget>(
        &mut self,
        target: &mut T,
        sprite: &DrawSprite,
        assets: &AssetBundle,
    ) {
        let Some(sheet) = self.resolve(sprite.sprite, assets) else {
            return;
        };
        let dest = anchored_dest(sheet, sprite, self.grid.tile_size as f32);
        target.blit(
            &sheet.image,
            frame_source(sheet, sprite.frame),
            dest,
            sprite.flip_h,
        );
    }

    fn resolve<'b>(&mut self, id: SpriteId, assets: &'b AssetBundle) -> Option<&'b SpriteSheet> {
        let sheet = assets.sheet(id);
        if sheet.is_none() && self.warned_missing.insert(id) {
            warn!(sprite_key = %id.key(), "sprite_missing_skipped");
        }
        sheet
    }
}

fn sprite_feet_depth(tile_size: u32, sprite: &DrawSprite, assets: &AssetBundle) -> f32 {
    match sprite.anchor {
        Anchor::BottomAligned | Anchor::Centered => sprite.position.y,
        Anchor::TopLeft => {
            let tile = tile_size.max(1) as f32;
            let height = frame_height(sprite.sprite, assets);
            sprite.position.y + (height / tile - 1.0).max(0.0)
        }
    }
}

fn frame_height(id: SpriteId, assets: &AssetBundle) -> f32 {
    match assets.sheet(id) {
        Some(sheet) => sheet.clock.frame_height as f32,
        None => id.kind.clock().frame_height as f32,
    }
}

fn frame_source(sheet: &SpriteSheet, frame: u32) -> SourceRect {
    let (x, y, width, height) = sheet.clock.source_rect(frame);
    SourceRect::new(x, y, width, height)
}

fn natural_dest(sheet: &SpriteSheet, x: f32, y: f32) -> DestRect {
    DestRect::new(
        x,
        y,
        sheet.clock.frame_width as f32,
        sheet.clock.frame_height as f32,
    )
}

/// Destination rect in surface pixels for an anchored sprite.
pub fn anchored_dest(sheet: &SpriteSheet, sprite: &DrawSprite, tile: f32) -> DestRect {
    let width = sheet.clock.frame_width as f32;
    let height = sheet.clock.frame_height as f32;
    let x = sprite.position.x * tile;
    let y = sprite.position.y * tile;
    match sprite.anchor {
        Anchor::TopLeft => DestRect::new(x, y, width, height),
        Anchor::BottomAligned => DestRect::new(x, y - (height - tile), width, height),
        Anchor::Centered => DestRect::new(
            x - (width - tile) * 0.5,
            y - (height - tile) * 0.5 - tile * 0.5,
            width,
            height,
        ),
    }
}
