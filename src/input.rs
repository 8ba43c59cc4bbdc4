use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Collects keyboard and mouse events between frames.
///
/// Every key press is queued, OS auto-repeats included, so a held key produces
/// one entry per repeat. Mouse motion and scroll accumulate until
/// [`end_frame`](Self::end_frame).
#[derive(Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    presses: Vec<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_position: Option<Vec2>,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event.physical_key, event.state);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(*button, *state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => self.mouse_position = None,
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
                self.handle_scroll(lines);
            }
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(key) = key else {
            return;
        };
        match state {
            ElementState::Pressed => {
                self.keys_down.insert(key);
                self.presses.push(key);
            }
            ElementState::Released => {
                self.keys_down.remove(&key);
            }
        }
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.mouse_buttons_down.insert(button);
            }
            ElementState::Released => {
                self.mouse_buttons_down.remove(&button);
            }
        }
    }

    /// New cursor position in window pixels.
    ///
    /// The first position after the cursor enters the window sets the origin
    /// and produces no delta.
    pub fn handle_cursor(&mut self, position: Vec2) {
        if let Some(previous) = self.mouse_position {
            self.mouse_delta += position - previous;
        }
        self.mouse_position = Some(position);
    }

    /// Scroll amount in lines, positive away from the user.
    pub fn handle_scroll(&mut self, lines: Vec2) {
        self.scroll_delta += lines;
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Key presses since the last drain, oldest first.
    pub fn drain_presses(&mut self) -> std::vec::Drain<'_, KeyCode> {
        self.presses.drain(..)
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    /// Last cursor position, `None` while the cursor is outside the window.
    pub fn mouse_position(&self) -> Option<Vec2> {
        self.mouse_position
    }

    /// Cursor movement since the last [`end_frame`](Self::end_frame).
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll since the last [`end_frame`](Self::end_frame), in lines.
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }

    /// Reset per-frame motion. Held keys and buttons stay down.
    pub fn end_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_are_queued_individually() {
        let mut input = Input::new();
        let w = PhysicalKey::Code(KeyCode::KeyW);
        input.handle_key(w, ElementState::Pressed);
        input.handle_key(w, ElementState::Pressed);
        input.handle_key(PhysicalKey::Code(KeyCode::KeyA), ElementState::Pressed);
        input.handle_key(w, ElementState::Released);

        assert!(!input.key_down(KeyCode::KeyW));
        assert!(input.key_down(KeyCode::KeyA));
        let presses: Vec<_> = input.drain_presses().collect();
        assert_eq!(presses, vec![KeyCode::KeyW, KeyCode::KeyW, KeyCode::KeyA]);
        assert_eq!(input.drain_presses().count(), 0);
    }

    #[test]
    fn mouse_motion_accumulates_until_end_of_frame() {
        let mut input = Input::new();
        input.handle_cursor(Vec2::new(100.0, 100.0));
        assert_eq!(input.mouse_delta(), Vec2::ZERO);

        input.handle_cursor(Vec2::new(110.0, 95.0));
        input.handle_cursor(Vec2::new(115.0, 95.0));
        input.handle_scroll(Vec2::new(0.0, 1.0));
        input.handle_scroll(Vec2::new(0.0, 2.0));
        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);

        assert_eq!(input.mouse_delta(), Vec2::new(15.0, -5.0));
        assert_eq!(input.scroll_delta(), Vec2::new(0.0, 3.0));
        assert_eq!(input.mouse_position(), Some(Vec2::new(115.0, 95.0)));

        input.end_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert_eq!(input.scroll_delta(), Vec2::ZERO);
        assert!(input.mouse_down(MouseButton::Left));

        input.handle_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!input.mouse_down(MouseButton::Left));
    }
}
