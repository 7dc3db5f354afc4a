use winit::dpi::PhysicalPosition;
use winit::event::MouseScrollDelta;
use winit::keyboard::KeyCode;

use crate::renderer::KeyState;

// Browsers report roughly this many pixels per wheel notch.
const WHEEL_LINE_PIXELS: f32 = 100.0;

/// One-shot commands bound to key presses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputCommand {
    ToggleAutoRotate,
    Stop,
}

/// Held keys and the left-drag gesture, fed from window events.
#[derive(Debug, Default)]
pub struct InputState {
    pub keys: KeyState,
    dragging: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
}

impl InputState {
    pub fn key(&mut self, key: KeyCode, pressed: bool) -> Option<InputCommand> {
        let keys = &mut self.keys;

        match key {
            KeyCode::KeyW => keys.forward = pressed,
            KeyCode::KeyS => keys.back = pressed,
            KeyCode::KeyA => keys.left = pressed,
            KeyCode::KeyD => keys.right = pressed,
            KeyCode::KeyQ => keys.zoom_in = pressed,
            KeyCode::KeyE => keys.zoom_out = pressed,
            KeyCode::KeyR if pressed => return Some(InputCommand::ToggleAutoRotate),
            KeyCode::Escape if pressed => return Some(InputCommand::Stop),
            _ => {}
        }
        None
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Records the cursor and returns the drag delta since the last move.
    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) -> Option<(f32, f32)> {
        let delta = match (self.dragging, self.last_cursor) {
            (true, Some(last)) => Some((
                (position.x - last.x) as f32,
                (position.y - last.y) as f32,
            )),
            _ => None,
        };
        self.last_cursor = Some(position);
        delta
    }

    pub fn cursor_left(&mut self) {
        self.dragging = false;
        self.last_cursor = None;
    }

    /// Key releases are not delivered while unfocused, so forget held keys.
    pub fn focus_lost(&mut self) {
        self.keys = KeyState::default();
        self.cursor_left();
    }
}

/// Wheel delta in browser pixels; positive zooms out.
pub fn wheel_delta(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * WHEEL_LINE_PIXELS,
        MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
    }
}
