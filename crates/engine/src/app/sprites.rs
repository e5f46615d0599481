use serde::Deserialize;

use super::animation::{AnimationClock, ClockCategory};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitClass {
    #[default]
    Warrior,
    Lancer,
    Archer,
    Monk,
    Pawn,
}

impl UnitClass {
    pub const ALL: [UnitClass; 5] = [
        UnitClass::Warrior,
        UnitClass::Lancer,
        UnitClass::Archer,
        UnitClass::Monk,
        UnitClass::Pawn,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            UnitClass::Warrior => "warrior",
            UnitClass::Lancer => "lancer",
            UnitClass::Archer => "archer",
            UnitClass::Monk => "monk",
            UnitClass::Pawn => "pawn",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|class| class.name().eq_ignore_ascii_case(name.trim()))
    }

    const fn frame_size(self) -> u32 {
        match self {
            UnitClass::Lancer => 320,
            _ => 192,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamColor {
    #[default]
    Blue,
    Red,
    Yellow,
    Purple,
    Black,
}

impl TeamColor {
    pub const ALL: [TeamColor; 5] = [
        TeamColor::Blue,
        TeamColor::Red,
        TeamColor::Yellow,
        TeamColor::Purple,
        TeamColor::Black,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            TeamColor::Blue => "blue",
            TeamColor::Red => "red",
            TeamColor::Yellow => "yellow",
            TeamColor::Purple => "purple",
            TeamColor::Black => "black",
        }
    }

    pub const fn variant(self) -> u8 {
        match self {
            TeamColor::Blue => 0,
            TeamColor::Red => 1,
            TeamColor::Yellow => 2,
            TeamColor::Purple => 3,
            TeamColor::Black => 4,
        }
    }

    pub fn from_variant(variant: u8) -> Self {
        Self::ALL
            .get(usize::from(variant))
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    Archery,
    Barracks,
    Castle,
    House1,
    House2,
    House3,
    Monastery,
    Tower,
}

impl BuildingKind {
    pub const fn name(self) -> &'static str {
        match self {
            BuildingKind::Archery => "archery",
            BuildingKind::Barracks => "barracks",
            BuildingKind::Castle => "castle",
            BuildingKind::House1 => "house1",
            BuildingKind::House2 => "house2",
            BuildingKind::House3 => "house3",
            BuildingKind::Monastery => "monastery",
            BuildingKind::Tower => "tower",
        }
    }
}

/// Sprite sheet families. Frame geometry and timing come from [`SpriteKind::clock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Water,
    Tileset,
    Foam,
    Shadow,
    WaterRock,
    StaticRock,
    Bush,
    Tree,
    Building(BuildingKind),
    SheepIdle,
    SheepGraze,
    UnitIdle(UnitClass),
    UnitRun(UnitClass),
}

impl SpriteKind {
    /// Sheet clock. Buildings report a zero frame size; the loaded image
    /// supplies it.
    pub const fn clock(self) -> AnimationClock {
        match self {
            SpriteKind::Water | SpriteKind::Tileset | SpriteKind::StaticRock => {
                AnimationClock::still(64, 64)
            }
            SpriteKind::Shadow => AnimationClock::still(192, 192),
            SpriteKind::Foam => AnimationClock::new(192, 192, 16, 10),
            SpriteKind::WaterRock => AnimationClock::new(64, 64, 16, 10),
            SpriteKind::Bush => AnimationClock::new(128, 128, 8, 15),
            SpriteKind::Tree => AnimationClock::new(192, 256, 8, 15),
            SpriteKind::Building(_) => AnimationClock::still(0, 0),
            SpriteKind::SheepIdle => AnimationClock::new(128, 128, 6, 15),
            SpriteKind::SheepGraze => AnimationClock::new(128, 128, 12, 15),
            SpriteKind::UnitIdle(class) => {
                let size = class.frame_size();
                match class {
                    UnitClass::Lancer => AnimationClock::new(size, size, 12, 15),
                    UnitClass::Warrior | UnitClass::Pawn => AnimationClock::new(size, size, 8, 15),
                    UnitClass::Archer | UnitClass::Monk => AnimationClock::new(size, size, 6, 20),
                }
            }
            SpriteKind::UnitRun(class) => {
                let size = class.frame_size();
                match class {
                    UnitClass::Archer | UnitClass::Monk => AnimationClock::new(size, size, 4, 10),
                    _ => AnimationClock::new(size, size, 6, 10),
                }
            }
        }
    }

    pub const fn category(self) -> ClockCategory {
        match self {
            SpriteKind::Water
            | SpriteKind::Tileset
            | SpriteKind::Foam
            | SpriteKind::Shadow
            | SpriteKind::WaterRock
            | SpriteKind::StaticRock
            | SpriteKind::Building(_) => ClockCategory::Terrain,
            SpriteKind::Bush | SpriteKind::Tree => ClockCategory::Foliage,
            SpriteKind::SheepIdle | SpriteKind::SheepGraze => ClockCategory::Livestock,
            SpriteKind::UnitIdle(_) | SpriteKind::UnitRun(_) => ClockCategory::Units,
        }
    }
}

/// A concrete sheet: kind plus variant. The variant is the decoration index
/// for props, the palette number for tilesets and the team colour for units
/// and buildings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId {
    pub kind: SpriteKind,
    pub variant: u8,
}

impl SpriteId {
    pub const fn new(kind: SpriteKind, variant: u8) -> Self {
        Self { kind, variant }
    }

    pub const fn single(kind: SpriteKind) -> Self {
        Self { kind, variant: 0 }
    }

    pub const fn unit_idle(class: UnitClass, team: TeamColor) -> Self {
        Self::new(SpriteKind::UnitIdle(class), team.variant())
    }

    pub const fn unit_run(class: UnitClass, team: TeamColor) -> Self {
        Self::new(SpriteKind::UnitRun(class), team.variant())
    }

    pub const fn building(kind: BuildingKind, team: TeamColor) -> Self {
        Self::new(SpriteKind::Building(kind), team.variant())
    }

    /// Asset key relative to the sprite root, without extension.
    pub fn key(&self) -> String {
        let team = TeamColor::from_variant(self.variant).name();
        match self.kind {
            SpriteKind::Water => "terrain/water".to_string(),
            SpriteKind::Tileset => format!("terrain/tilemap_color{}", self.variant),
            SpriteKind::Foam => "terrain/water_foam".to_string(),
            SpriteKind::Shadow => "terrain/shadow".to_string(),
            SpriteKind::WaterRock => format!("decorations/water_rock_{}", self.variant),
            SpriteKind::StaticRock => format!("decorations/rock_{}", self.variant),
            SpriteKind::Bush => format!("decorations/bush_{}", self.variant),
            SpriteKind::Tree => format!("resources/tree_{}", self.variant),
            SpriteKind::SheepIdle => "resources/sheep_idle".to_string(),
            SpriteKind::SheepGraze => "resources/sheep_grass".to_string(),
            SpriteKind::Building(kind) => format!("buildings/{team}/{}", kind.name()),
            SpriteKind::UnitIdle(class) => format!("units/{team}/{}_idle", class.name()),
            SpriteKind::UnitRun(class) => format!("units/{team}/{}_run", class.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite_keys::validate_sprite_key;

    #[test]
    fn every_generated_key_is_valid() {
        let mut ids = vec![
            SpriteId::single(SpriteKind::Water),
            SpriteId::new(SpriteKind::Tileset, 5),
            SpriteId::single(SpriteKind::Foam),
            SpriteId::single(SpriteKind::Shadow),
            SpriteId::new(SpriteKind::WaterRock, 1),
            SpriteId::new(SpriteKind::StaticRock, 4),
            SpriteId::new(SpriteKind::Bush, 2),
            SpriteId::new(SpriteKind::Tree, 3),
            SpriteId::single(SpriteKind::SheepIdle),
            SpriteId::single(SpriteKind::SheepGraze),
            SpriteId::building(BuildingKind::House2, TeamColor::Red),
        ];
        for class in UnitClass::ALL {
            ids.push(SpriteId::unit_idle(class, TeamColor::Purple));
            ids.push(SpriteId::unit_run(class, TeamColor::Black));
        }
        for id in ids {
            let key = id.key();
            assert!(validate_sprite_key(&key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn unit_keys_carry_team_and_animation() {
        assert_eq!(
            SpriteId::unit_run(UnitClass::Lancer, TeamColor::Yellow).key(),
            "units/yellow/lancer_run"
        );
        assert_eq!(
            SpriteId::building(BuildingKind::Castle, TeamColor::Blue).key(),
            "buildings/blue/castle"
        );
    }

    #[test]
    fn catalogue_clocks_match_sheet_layouts() {
        assert_eq!(
            SpriteKind::UnitIdle(UnitClass::Lancer).clock(),
            AnimationClock::new(320, 320, 12, 15)
        );
        assert_eq!(
            SpriteKind::UnitIdle(UnitClass::Archer).clock(),
            AnimationClock::new(192, 192, 6, 20)
        );
        assert_eq!(
            SpriteKind::UnitRun(UnitClass::Monk).clock(),
            AnimationClock::new(192, 192, 4, 10)
        );
        assert_eq!(
            SpriteKind::Tree.clock(),
            AnimationClock::new(192, 256, 8, 15)
        );
        assert_eq!(SpriteKind::Foam.clock().full_cycle_period(), 160);
    }

    #[test]
    fn unit_class_parses_case_insensitively() {
        assert_eq!(UnitClass::from_name(" Lancer "), Some(UnitClass::Lancer));
        assert_eq!(UnitClass::from_name("knight"), None);
    }

    #[test]
    fn unknown_team_variant_falls_back_to_blue() {
        assert_eq!(TeamColor::from_variant(42), TeamColor::Blue);
        assert_eq!(TeamColor::from_variant(3), TeamColor::Purple);
    }
}
