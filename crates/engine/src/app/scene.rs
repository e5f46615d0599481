use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct EntityId(pub u64);

/// Sub-tile position in tile units. Only produced by interpolation; logical
/// positions are always [`TilePosition`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
}

impl TilePosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn stepped(self, direction: Direction) -> Self {
        let (dx, dy) = direction.unit_step();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn clamped(self, width: u32, height: u32) -> Self {
        Self {
            x: clamp_axis(self.x, width),
            y: clamp_axis(self.y, height),
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2 {
            x: self.x as f32,
            y: self.y as f32,
        }
    }
}

fn clamp_axis(value: i32, extent: u32) -> i32 {
    let max = (extent as i32 - 1).max(0);
    value.clamp(0, max)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    /// Integer step on the tile grid, Y increasing downward.
    pub const fn unit_step(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::UpLeft => (-1, -1),
            Direction::UpRight => (1, -1),
            Direction::DownLeft => (-1, 1),
            Direction::DownRight => (1, 1),
        }
    }

    /// Direction implied by a step; only the signs of `dx`/`dy` matter.
    pub fn from_step(dx: i32, dy: i32) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            (-1, -1) => Some(Direction::UpLeft),
            (1, -1) => Some(Direction::UpRight),
            (-1, 1) => Some(Direction::DownLeft),
            (1, 1) => Some(Direction::DownRight),
            _ => None,
        }
    }

    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::UpLeft | Direction::UpRight | Direction::DownLeft | Direction::DownRight
        )
    }

    pub const fn horizontal_facing(self) -> Option<Facing> {
        match self.unit_step().0 {
            -1 => Some(Facing::Left),
            1 => Some(Facing::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub const fn is_mirrored(self) -> bool {
        matches!(self, Facing::Left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_step_round_trips_every_direction() {
        for direction in Direction::ALL {
            let (dx, dy) = direction.unit_step();
            assert_eq!(Direction::from_step(dx, dy), Some(direction));
        }
        assert_eq!(Direction::from_step(0, 0), None);
    }

    #[test]
    fn from_step_uses_signs_only() {
        assert_eq!(Direction::from_step(3, -7), Some(Direction::UpRight));
    }

    #[test]
    fn vertical_directions_have_no_facing() {
        assert_eq!(Direction::Up.horizontal_facing(), None);
        assert_eq!(Direction::Down.horizontal_facing(), None);
        assert_eq!(Direction::DownLeft.horizontal_facing(), Some(Facing::Left));
        assert_eq!(Direction::UpRight.horizontal_facing(), Some(Facing::Right));
    }

    #[test]
    fn clamped_keeps_positions_inside_grid() {
        assert_eq!(
            TilePosition::new(-3, 40).clamped(25, 19),
            TilePosition::new(0, 18)
        );
        assert_eq!(
            TilePosition::new(5, 5).clamped(25, 19),
            TilePosition::new(5, 5)
        );
    }
}
