//! Input coalescing
//!
//! Held keys and buttons become level-triggered intents. Weapon switching
//! and confirm are edge-triggered: they fire once, on the first tick after
//! the key went down.

use glam::Vec2;

use crate::sim::{Intents, TickInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    Enter,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Cursor position in world coordinates
    MouseMove(Vec2),
    MouseDown(MouseButton),
    MouseUp(MouseButton),
}

/// Input accumulated between ticks
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: Intents,
    aim: Option<Vec2>,
    weapon_left: bool,
    weapon_right: bool,
    confirm: bool,
}

impl InputState {
    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => self.set_key(key, true),
            InputEvent::KeyUp(key) => self.set_key(key, false),
            InputEvent::MouseMove(pos) => self.aim = Some(pos),
            InputEvent::MouseDown(button) => self.set_button(button, true),
            InputEvent::MouseUp(button) => self.set_button(button, false),
        }
    }

    fn set_key(&mut self, key: Key, down: bool) {
        match key {
            Key::W => self.held.move_up = down,
            Key::S => self.held.move_down = down,
            Key::A => self.held.move_left = down,
            Key::D => self.held.move_right = down,
            Key::Q if down => self.weapon_left = true,
            Key::E if down => self.weapon_right = true,
            Key::Enter if down => self.confirm = true,
            _ => {}
        }
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        match button {
            MouseButton::Left => self.held.firing = down,
            MouseButton::Right => self.held.placing = down,
            MouseButton::Other => {}
        }
    }

    /// Snapshot for the next tick
    pub fn tick_input(&self) -> TickInput {
        TickInput {
            intents: Intents {
                change_weapon_left: self.weapon_left,
                change_weapon_right: self.weapon_right,
                ..self.held
            },
            aim: self.aim,
            confirm: self.confirm,
        }
    }

    /// Clear one-shot inputs after the first substep consumed them
    pub fn clear_one_shots(&mut self) {
        self.weapon_left = false;
        self.weapon_right = false;
        self.confirm = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_keys_stay_until_released() {
        let mut input = InputState::default();
        input.handle(InputEvent::KeyDown(Key::W));
        input.handle(InputEvent::KeyDown(Key::D));
        input.clear_one_shots();
        let t = input.tick_input();
        assert!(t.intents.move_up && t.intents.move_right);
        assert_eq!(t.intents.move_dir(), Vec2::new(1.0, 1.0));

        input.handle(InputEvent::KeyUp(Key::W));
        assert!(!input.tick_input().intents.move_up);
    }

    #[test]
    fn test_weapon_switch_is_one_shot() {
        let mut input = InputState::default();
        input.handle(InputEvent::KeyDown(Key::Q));
        assert!(input.tick_input().intents.change_weapon_left);
        input.clear_one_shots();
        assert!(!input.tick_input().intents.change_weapon_left);
        // Releasing does nothing
        input.handle(InputEvent::KeyUp(Key::Q));
        assert!(!input.tick_input().intents.change_weapon_left);
    }

    #[test]
    fn test_mouse_sets_aim_fire_and_place() {
        let mut input = InputState::default();
        input.handle(InputEvent::MouseMove(Vec2::new(10.0, 20.0)));
        input.handle(InputEvent::MouseDown(MouseButton::Left));
        input.handle(InputEvent::MouseDown(MouseButton::Right));
        let t = input.tick_input();
        assert_eq!(t.aim, Some(Vec2::new(10.0, 20.0)));
        assert!(t.intents.firing && t.intents.placing);
        input.handle(InputEvent::MouseUp(MouseButton::Left));
        assert!(!input.tick_input().intents.firing);
    }
}
