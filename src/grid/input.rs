use tracing::debug;

use super::PhotoGrid;
use crate::widget::{Direction, InputEvent, Key};

/// What a key asks the grid to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridCommand {
    Navigate(Direction),
    Activate,
}

/// Map a pressed key to a grid command; `None` for keys the grid ignores.
pub fn route_key(key: &Key) -> Option<GridCommand> {
    let command = match key {
        Key::Left | Key::KeypadLeft => GridCommand::Navigate(Direction::West),
        Key::Up | Key::KeypadUp => GridCommand::Navigate(Direction::North),
        Key::Right | Key::KeypadRight => GridCommand::Navigate(Direction::East),
        Key::Down | Key::KeypadDown => GridCommand::Navigate(Direction::South),
        Key::Return | Key::KeypadEnter => GridCommand::Activate,
        Key::Other(name) => {
            debug!(key = %name, "unhandled key");
            return None;
        }
    };
    Some(command)
}

impl<T> PhotoGrid<T> {
    pub fn dispatch(&mut self, command: GridCommand) {
        match command {
            GridCommand::Navigate(direction) => self.navigate(direction),
            GridCommand::Activate => self.activate(),
        }
    }

    /// Returns `true` if the event was turned into a grid command.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::KeyPress(key) => {
                debug!(?key, "key press");
                match route_key(key) {
                    Some(command) => {
                        self.dispatch(command);
                        true
                    }
                    None => false,
                }
            }
            InputEvent::KeyRelease(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_keypad_route_alike() {
        for (plain, keypad, dir) in [
            (Key::Left, Key::KeypadLeft, Direction::West),
            (Key::Right, Key::KeypadRight, Direction::East),
            (Key::Up, Key::KeypadUp, Direction::North),
            (Key::Down, Key::KeypadDown, Direction::South),
        ] {
            assert_eq!(route_key(&plain), Some(GridCommand::Navigate(dir)));
            assert_eq!(route_key(&keypad), Some(GridCommand::Navigate(dir)));
        }
        assert_eq!(route_key(&Key::Return), Some(GridCommand::Activate));
        assert_eq!(route_key(&Key::KeypadEnter), Some(GridCommand::Activate));
    }

    #[test]
    fn other_keys_are_ignored() {
        assert_eq!(route_key(&Key::Other("a".into())), None);

        let mut grid: PhotoGrid<()> = PhotoGrid::new(300, 300, 3, 3, "/photos");
        assert!(!grid.handle_event(&InputEvent::KeyPress(Key::Other("space".into()))));
        assert!(!grid.handle_event(&InputEvent::KeyRelease(Key::Return)));
        assert!(grid.handle_event(&InputEvent::KeyPress(Key::Return)));
    }
}
