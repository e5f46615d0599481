use std::collections::HashMap;

use serde::Deserialize;

use super::animation::{AnimationScheduler, BehaviorClass};
use super::grid::GridData;
use super::rendering::{Anchor, DrawKind, DrawSprite, DynamicDraw, StaticLayer};
use super::scene::{EntityId, TilePosition, Vec2};
use super::sprites::{BuildingKind, SpriteId, SpriteKind, TeamColor, UnitClass};

/// Entity id reserved for the player; props are numbered from 1.
pub const PLAYER_ENTITY: EntityId = EntityId(0);

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LevelData {
    pub name: String,
    pub grid: GridData,
    pub player_start: TilePosition,
    #[serde(default)]
    pub statics: Vec<StaticLayer>,
    #[serde(default)]
    pub props: Vec<PropPlacement>,
    #[serde(default)]
    pub zoom_triggers: Vec<TilePosition>,
}

impl LevelData {
    /// Every sheet the level can draw, excluding the player's.
    pub fn sprite_ids(&self) -> Vec<SpriteId> {
        let statics = self.statics.iter().flat_map(StaticLayer::sprite_ids);
        let props = self.props.iter().flat_map(|prop| prop.spec.sprite_ids());
        statics.chain(props).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropSpec {
    Tree {
        variant: u8,
    },
    Bush {
        variant: u8,
    },
    Rock {
        variant: u8,
    },
    Building {
        building: BuildingKind,
        #[serde(default)]
        team: TeamColor,
    },
    Sheep,
    Unit {
        class: UnitClass,
        #[serde(default)]
        team: TeamColor,
    },
}

/// Props that share a stagger group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropGroup {
    Trees,
    Bushes,
    Rocks,
    Buildings,
    Sheep,
    Units,
}

impl PropSpec {
    pub fn group(&self) -> PropGroup {
        match self {
            PropSpec::Tree { .. } => PropGroup::Trees,
            PropSpec::Bush { .. } => PropGroup::Bushes,
            PropSpec::Rock { .. } => PropGroup::Rocks,
            PropSpec::Building { .. } => PropGroup::Buildings,
            PropSpec::Sheep => PropGroup::Sheep,
            PropSpec::Unit { .. } => PropGroup::Units,
        }
    }

    pub fn sprite_ids(&self) -> Vec<SpriteId> {
        match *self {
            PropSpec::Tree { variant } => vec![SpriteId::new(SpriteKind::Tree, variant)],
            PropSpec::Bush { variant } => vec![SpriteId::new(SpriteKind::Bush, variant)],
            PropSpec::Rock { variant } => vec![SpriteId::new(SpriteKind::StaticRock, variant)],
            PropSpec::Building { building, team } => vec![SpriteId::building(building, team)],
            PropSpec::Sheep => vec![
                SpriteId::single(SpriteKind::SheepIdle),
                SpriteId::single(SpriteKind::SheepGraze),
            ],
            PropSpec::Unit { class, team } => vec![SpriteId::unit_idle(class, team)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PropPlacement {
    #[serde(flatten)]
    pub spec: PropSpec,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub flip: bool,
    #[serde(default)]
    pub depth: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropInstance {
    pub entity: EntityId,
    pub spec: PropSpec,
    pub position: Vec2,
    pub flip: bool,
    pub depth: Option<f32>,
    pub group_index: u32,
    pub group_total: u32,
}

impl PropInstance {
    pub fn draw(&self, animation: &AnimationScheduler) -> DynamicDraw {
        let (id, index, total) = (self.entity, self.group_index, self.group_total);
        let sprite = |sprite: SpriteId, frame: u32, anchor: Anchor| DrawSprite {
            entity: id,
            sprite,
            frame,
            position: self.position,
            anchor,
            flip_h: self.flip,
        };

        let kind = match self.spec {
            PropSpec::Tree { variant } => DrawKind::Tree(sprite(
                SpriteId::new(SpriteKind::Tree, variant),
                animation.frame_for(SpriteKind::Tree, index, total),
                Anchor::BottomAligned,
            )),
            PropSpec::Bush { variant } => DrawKind::Bush(sprite(
                SpriteId::new(SpriteKind::Bush, variant),
                animation.frame_for(SpriteKind::Bush, index, total),
                Anchor::TopLeft,
            )),
            PropSpec::Rock { variant } => DrawKind::Rock(sprite(
                SpriteId::new(SpriteKind::StaticRock, variant),
                0,
                Anchor::TopLeft,
            )),
            PropSpec::Building { building, team } => DrawKind::Building(sprite(
                SpriteId::building(building, team),
                0,
                Anchor::BottomAligned,
            )),
            PropSpec::Sheep => {
                let behavior = animation.behavior_frame(BehaviorClass::Sheep, index, total);
                DrawKind::Creature(sprite(
                    SpriteId::single(behavior.sprite),
                    behavior.frame,
                    Anchor::TopLeft,
                ))
            }
            PropSpec::Unit { class, team } => DrawKind::Unit(sprite(
                SpriteId::unit_idle(class, team),
                animation.frame_for(SpriteKind::UnitIdle(class), index, total),
                Anchor::BottomAligned,
            )),
        };

        DynamicDraw {
            kind,
            depth: self.depth,
        }
    }
}

/// Numbers props in authoring order and records each one's slot within its
/// stagger group.
pub fn instantiate_props(placements: &[PropPlacement]) -> Vec<PropInstance> {
    let mut totals: HashMap<PropGroup, u32> = HashMap::new();
    for placement in placements {
        *totals.entry(placement.spec.group()).or_default() += 1;
    }

    let mut next_index: HashMap<PropGroup, u32> = HashMap::new();
    placements
        .iter()
        .enumerate()
        .map(|(order, placement)| {
            let group = placement.spec.group();
            let slot = next_index.entry(group).or_default();
            let group_index = *slot;
            *slot += 1;
            PropInstance {
                entity: EntityId(order as u64 + 1),
                spec: placement.spec,
                position: Vec2::new(placement.x, placement.y),
                flip: placement.flip,
                depth: placement.depth,
                group_index,
                group_total: totals.get(&group).copied().unwrap_or(1),
            }
        })
        .collect()
}
