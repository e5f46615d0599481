use super::scene::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Interact,
    Quit,
}

const ACTION_COUNT: usize = 6;

/// Held-state polling order for movement. First held entry wins.
const MOVE_PRIORITY: [(InputAction, Direction); 4] = [
    (InputAction::MoveUp, Direction::Up),
    (InputAction::MoveDown, Direction::Down),
    (InputAction::MoveLeft, Direction::Left),
    (InputAction::MoveRight, Direction::Right),
];

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Interact => 4,
            InputAction::Quit => 5,
        }
    }
}

/// Input seen by one frame: held actions plus edge-triggered presses.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    actions: ActionStates,
    interact_pressed: bool,
    quit_requested: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(actions: ActionStates, interact_pressed: bool, quit_requested: bool) -> Self {
        Self {
            actions,
            interact_pressed,
            quit_requested,
        }
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_interact_pressed(mut self, interact_pressed: bool) -> Self {
        self.interact_pressed = interact_pressed;
        self
    }

    pub fn interact_pressed(&self) -> bool {
        self.interact_pressed
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Orthogonal direction from held movement keys. Diagonals never come
    /// from input.
    pub fn held_direction(&self) -> Option<Direction> {
        MOVE_PRIORITY
            .iter()
            .find(|(action, _)| self.is_down(*action))
            .map(|(_, direction)| *direction)
    }
}
