use crate::paint::Painter;

/// Compass direction for keyboard navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

/// Backend-neutral key symbols the widgets care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    KeypadLeft,
    KeypadRight,
    KeypadUp,
    KeypadDown,
    Return,
    KeypadEnter,
    /// Anything else, named for logging.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    KeyPress(Key),
    KeyRelease(Key),
}

/// Capability set every widget implements.
pub trait Widget<P: Painter> {
    /// Called once when the widget is mapped.
    fn show(&mut self);

    fn paint(&mut self, painter: &mut P);

    /// Returns `true` when the event was consumed.
    fn handle_event(&mut self, event: &InputEvent) -> bool;

    /// Returns and clears a pending repaint request.
    fn take_paint_request(&mut self) -> bool;
}
