//! Keyboard input and the input-to-command mapping.
//!
//! The window event loop pushes key transitions into an [`EventQueue`]; the
//! session drains it once per iteration and maps each event to a [`Command`]
//! through a [`CommandMapper`].

use std::collections::VecDeque;

use winit::keyboard::KeyCode;

/// Keys the capture tool distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Space,
    Other,
}

impl Key {
    pub fn from_key_code(code: KeyCode) -> Self {
        match code {
            KeyCode::ArrowUp => Key::Up,
            KeyCode::ArrowDown => Key::Down,
            KeyCode::ArrowLeft => Key::Left,
            KeyCode::ArrowRight => Key::Right,
            KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
            KeyCode::Space => Key::Space,
            _ => Key::Other,
        }
    }
}

/// A key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
}

/// Requested platform motion. Only recorded; nothing drives hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Motion {
    /// +1 forward, -1 backward
    pub linear: i8,
    /// +1 left, -1 right
    pub angular: i8,
}

impl Motion {
    pub const NEUTRAL: Motion = Motion { linear: 0, angular: 0 };
    pub const FORWARD: Motion = Motion { linear: 1, angular: 0 };
    pub const BACKWARD: Motion = Motion { linear: -1, angular: 0 };
    pub const TURN_LEFT: Motion = Motion { linear: 0, angular: 1 };
    pub const TURN_RIGHT: Motion = Motion { linear: 0, angular: -1 };

    /// Message logged when this motion is requested.
    pub fn placeholder_message(&self) -> &'static str {
        match (self.linear, self.angular) {
            (1, _) => "Forward (placeholder)",
            (-1, _) => "Backward (placeholder)",
            (_, 1) => "Turn Left (placeholder)",
            (_, -1) => "Turn Right (placeholder)",
            _ => "Stop (placeholder)",
        }
    }
}

/// Intent derived from an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Persist the current frame on this iteration.
    Capture,
    /// Motion request. There is no motion backend; it is logged and ignored.
    Move(Motion),
    /// Return motion to neutral.
    Stop,
}

/// Maps input events to commands.
pub trait CommandMapper {
    /// Return the command for `event`, or `None` if the event is unmapped.
    fn map(&self, event: &InputEvent) -> Option<Command>;
}

/// Default keyboard layout: arrows move, Enter captures, Space or any
/// key release stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyboardMapper;

impl CommandMapper for KeyboardMapper {
    fn map(&self, event: &InputEvent) -> Option<Command> {
        match event {
            InputEvent::KeyDown(Key::Up) => Some(Command::Move(Motion::FORWARD)),
            InputEvent::KeyDown(Key::Down) => Some(Command::Move(Motion::BACKWARD)),
            InputEvent::KeyDown(Key::Left) => Some(Command::Move(Motion::TURN_LEFT)),
            InputEvent::KeyDown(Key::Right) => Some(Command::Move(Motion::TURN_RIGHT)),
            InputEvent::KeyDown(Key::Enter) => Some(Command::Capture),
            InputEvent::KeyDown(Key::Space) => Some(Command::Stop),
            InputEvent::KeyDown(Key::Other) => None,
            InputEvent::KeyUp(_) => Some(Command::Stop),
        }
    }
}

/// Source of pending input events.
pub trait InputSource {
    /// Return every event received since the previous call without blocking.
    fn poll_events(&mut self) -> Vec<InputEvent>;
}

/// Buffered events pushed by the window event loop.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<InputEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl InputSource for EventQueue {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_maps_to_capture() {
        let mapper = KeyboardMapper;
        assert_eq!(mapper.map(&InputEvent::KeyDown(Key::Enter)), Some(Command::Capture));
        assert_eq!(mapper.map(&InputEvent::KeyUp(Key::Enter)), Some(Command::Stop));
    }

    #[test]
    fn test_arrows_map_to_motion() {
        let mapper = KeyboardMapper;
        assert_eq!(
            mapper.map(&InputEvent::KeyDown(Key::Up)),
            Some(Command::Move(Motion::FORWARD))
        );
        assert_eq!(
            mapper.map(&InputEvent::KeyDown(Key::Right)),
            Some(Command::Move(Motion::TURN_RIGHT))
        );
        assert_eq!(Motion::TURN_LEFT.placeholder_message(), "Turn Left (placeholder)");
    }

    #[test]
    fn test_space_and_release_stop() {
        let mapper = KeyboardMapper;
        assert_eq!(mapper.map(&InputEvent::KeyDown(Key::Space)), Some(Command::Stop));
        assert_eq!(mapper.map(&InputEvent::KeyUp(Key::Other)), Some(Command::Stop));
        assert_eq!(mapper.map(&InputEvent::KeyDown(Key::Other)), None);
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::from_key_code(KeyCode::NumpadEnter), Key::Enter);
        assert_eq!(Key::from_key_code(KeyCode::ArrowLeft), Key::Left);
        assert_eq!(Key::from_key_code(KeyCode::KeyQ), Key::Other);
    }

    #[test]
    fn test_queue_drains_in_order() {
        let mut queue = EventQueue::new();
        queue.push(InputEvent::KeyDown(Key::Enter));
        queue.push(InputEvent::KeyUp(Key::Enter));
        assert_eq!(queue.len(), 2);

        let events = queue.poll_events();
        assert_eq!(
            events,
            vec![InputEvent::KeyDown(Key::Enter), InputEvent::KeyUp(Key::Enter)]
        );
        assert!(queue.is_empty());
        assert!(queue.poll_events().is_empty());
    }
}
