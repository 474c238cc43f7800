//! Polled keyboard and mouse state.
//!
//! The camera and entities only ever *poll* input through [`InputState`]; how
//! the state gets filled is up to the host. [`Input`] is the stock
//! implementation, fed from winit window events.

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Read-only view of the current input state.
pub trait InputState {
    /// Returns true if the key is currently held down.
    fn key_down(&self, key: KeyCode) -> bool;

    /// Returns true if the mouse button is currently held down.
    fn mouse_down(&self, button: MouseButton) -> bool;

    /// Current mouse position in window coordinates.
    fn mouse_position(&self) -> Vec2;

    /// `+1` while only `positive` is held, `-1` while only `negative` is held,
    /// `0` otherwise.
    fn key_delta(&self, positive: KeyCode, negative: KeyCode) -> f32 {
        let axis = |key| if self.key_down(key) { 1.0 } else { 0.0 };
        axis(positive) - axis(negative)
    }
}

/// Keyboard and mouse state fed from winit window events.
#[derive(Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_position: Vec2,
    wheel_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears per-frame accumulators (wheel delta). Call before feeding events.
    pub fn begin_frame(&mut self) {
        self.wheel_delta = Vec2::ZERO;
    }

    /// Folds one winit window event into the polled state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.set_key(key, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.set_mouse_button(*button, *state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.set_mouse_position(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.wheel_delta += match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
            }
            _ => {}
        }
    }

    pub fn set_key(&mut self, key: KeyCode, down: bool) {
        if down {
            self.keys_down.insert(key);
        } else {
            self.keys_down.remove(&key);
        }
    }

    pub fn set_mouse_button(&mut self, button: MouseButton, down: bool) {
        if down {
            self.mouse_buttons_down.insert(button);
        } else {
            self.mouse_buttons_down.remove(&button);
        }
    }

    pub fn set_mouse_position(&mut self, position: Vec2) {
        self.mouse_position = position;
    }

    /// Accumulated scroll since [`Input::begin_frame`], in lines.
    pub fn wheel_delta(&self) -> Vec2 {
        self.wheel_delta
    }
}

impl InputState for Input {
    fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }
}
