//! Keyboard and mouse state sampled once per frame
//!
//! Window events feed [`InputState`]; behaviours and key watchers read it
//! during the update phase. Per-frame data (presses, mouse delta) is cleared by
//! [`InputState::end_frame`].

use std::collections::HashSet;

use winit::{
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::gfx::scene::GameScene;

#[derive(Debug, Default)]
pub struct InputState {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    buttons_held: HashSet<MouseButton>,
    cursor_position: (f64, f64),
    mouse_delta: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.set_key(code, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.set_button(*button, *state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_position = (position.x, position.y);
            }
            WindowEvent::Focused(false) => {
                self.keys_held.clear();
                self.buttons_held.clear();
            }
            _ => (),
        }
    }

    pub fn process_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.add_mouse_delta(delta.0, delta.1);
        }
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            // Repeat events arrive while held; only the first counts as a press
            if self.keys_held.insert(key) {
                self.keys_pressed.insert(key);
            }
        } else {
            self.keys_held.remove(&key);
        }
    }

    pub fn set_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.buttons_held.insert(button);
        } else {
            self.buttons_held.remove(&button);
        }
    }

    pub fn add_mouse_delta(&mut self, dx: f64, dy: f64) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn is_button_held(&self, button: MouseButton) -> bool {
        self.buttons_held.contains(&button)
    }

    pub fn cursor_position(&self) -> (f64, f64) {
        self.cursor_position
    }

    pub fn mouse_delta(&self) -> (f64, f64) {
        self.mouse_delta
    }

    /// Clears presses and mouse motion collected during the frame
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_delta = (0.0, 0.0);
    }
}

pub type KeyAction = Box<dyn FnMut(&mut GameScene)>;

/// Runs an action once each time a key goes down
pub struct KeyPressWatcher {
    key: KeyCode,
    action: KeyAction,
    was_down: bool,
}

impl KeyPressWatcher {
    pub fn new<F>(key: KeyCode, action: F) -> Self
    where
        F: FnMut(&mut GameScene) + 'static,
    {
        Self {
            key,
            action: Box::new(action),
            was_down: false,
        }
    }

    /// Fires the action on the released-to-pressed edge; returns whether it fired
    pub fn poll(&mut self, input: &InputState, scene: &mut GameScene) -> bool {
        let is_down = input.is_key_held(self.key) || input.was_key_pressed(self.key);
        let fired = is_down && !self.was_down;
        if fired {
            log::debug!("Key {:?} pressed", self.key);
            (self.action)(scene);
        }
        self.was_down = input.is_key_held(self.key);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn test_key_repeat_is_not_a_new_press() {
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyT, true);
        assert!(input.was_key_pressed(KeyCode::KeyT));
        input.end_frame();
        input.set_key(KeyCode::KeyT, true);
        assert!(!input.was_key_pressed(KeyCode::KeyT));
        assert!(input.is_key_held(KeyCode::KeyT));
    }

    #[test]
    fn test_mouse_delta_accumulates_until_end_frame() {
        let mut input = InputState::new();
        input.add_mouse_delta(1.0, 2.0);
        input.add_mouse_delta(0.5, -1.0);
        assert_eq!(input.mouse_delta(), (1.5, 1.0));
        input.end_frame();
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
    }

    #[test]
    fn test_watcher_fires_once_per_press() {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let mut watcher = KeyPressWatcher::new(KeyCode::KeyT, move |_| {
            counter.set(counter.get() + 1)
        });
        let mut scene = GameScene::new("test");
        let mut input = InputState::new();

        input.set_key(KeyCode::KeyT, true);
        assert!(watcher.poll(&input, &mut scene));
        input.end_frame();

        // Still held: no new press
        assert!(!watcher.poll(&input, &mut scene));
        input.set_key(KeyCode::KeyT, false);
        assert!(!watcher.poll(&input, &mut scene));

        input.set_key(KeyCode::KeyT, true);
        assert!(watcher.poll(&input, &mut scene));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_watcher_catches_tap_within_one_frame() {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let mut watcher = KeyPressWatcher::new(KeyCode::KeyT, move |_| {
            counter.set(counter.get() + 1)
        });
        let mut scene = GameScene::new("test");
        let mut input = InputState::new();

        input.set_key(KeyCode::KeyT, true);
        input.set_key(KeyCode::KeyT, false);
        assert!(watcher.poll(&input, &mut scene));
        assert_eq!(count.get(), 1);
    }
}
