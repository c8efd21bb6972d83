//! Pointer and keyboard handling, independent of the windowing library.
//!
//! The host translates its own events into [`InputEvent`]s; the router turns
//! those into edits of [`ViewerState`] and, where the host has to act, an
//! [`Action`].

use glam::{DVec2, Vec2};
use log::info;

use crate::core::ViewerState;

/// Degrees of orbit per pixel of drag.
pub const ROTATE_DEGREES_PER_PIXEL: f32 = 0.5;
/// Camera distance per pixel of secondary-button drag.
pub const ZOOM_SPEED_PER_PIXEL: f32 = 0.05;
/// Camera distance per wheel notch.
pub const WHEEL_STEP: f32 = 0.1;
/// Pixel-precise wheels (touchpads) report this many pixels per notch.
pub const PIXELS_PER_LINE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Tertiary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Printable key, matched case-insensitively.
    Char(char),
    F6,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Button { button: MouseButton, pressed: bool },
    PointerMoved { x: f64, y: f64 },
    /// Positive lines scroll away from the user (zoom in).
    Wheel { lines: f32 },
    Modifiers { shift: bool },
    Key(Key),
}

impl InputEvent {
    pub fn wheel_pixels(pixels: f64) -> Self {
        InputEvent::Wheel {
            lines: pixels as f32 / PIXELS_PER_LINE,
        }
    }
}

/// What the host has to do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Redraw,
    ReloadShaders,
    DumpMatrices,
    Quit,
}

#[derive(Debug, Default)]
pub struct InputRouter {
    primary: bool,
    secondary: bool,
    tertiary: bool,
    shift: bool,
    last_pointer: Option<DVec2>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: InputEvent, state: &mut ViewerState) -> Option<Action> {
        match event {
            InputEvent::Button { button, pressed } => {
                match button {
                    MouseButton::Primary => self.primary = pressed,
                    MouseButton::Secondary => self.secondary = pressed,
                    MouseButton::Tertiary => self.tertiary = pressed,
                }
                None
            }
            InputEvent::PointerMoved { x, y } => self.drag(DVec2::new(x, y), state),
            InputEvent::Wheel { lines } => {
                state.camera.zoom(-lines * WHEEL_STEP);
                Some(Action::Redraw)
            }
            InputEvent::Modifiers { shift } => {
                self.shift = shift;
                None
            }
            InputEvent::Key(key) => Self::key(key, state),
        }
    }

    fn drag(&mut self, pointer: DVec2, state: &mut ViewerState) -> Option<Action> {
        let previous = self.last_pointer.replace(pointer)?;
        let delta = (pointer - previous).as_vec2();
        if delta == Vec2::ZERO || !(self.primary || self.secondary || self.tertiary) {
            return None;
        }

        if self.primary {
            let yaw = delta.x * ROTATE_DEGREES_PER_PIXEL;
            let pitch = delta.y * ROTATE_DEGREES_PER_PIXEL;
            match state.light.as_mut() {
                Some(light) if self.shift => light.rotate(yaw, pitch),
                _ => state.camera.rotate(yaw, pitch),
            }
        }
        if self.secondary {
            state.camera.zoom(delta.y * ZOOM_SPEED_PER_PIXEL);
        }
        if self.tertiary {
            let scale = state.pan_scale();
            state.camera.pan_by(Vec2::new(delta.x, -delta.y) * scale);
        }
        Some(Action::Redraw)
    }

    fn key(key: Key, state: &mut ViewerState) -> Option<Action> {
        let c = match key {
            Key::F6 => return Some(Action::ReloadShaders),
            Key::Escape => return Some(Action::Quit),
            Key::Char(c) => c.to_ascii_lowercase(),
        };

        match c {
            'p' => {
                state.projection.toggle();
                info!("projection: {}", state.projection);
            }
            'n' => {
                state.shading.toggle_normals();
                info!("shading: {}", state.shading);
            }
            'r' => {
                state.camera.reset();
                info!("view reset");
            }
            ' ' => {
                state.paused = !state.paused;
                info!("auto-orbit {}", if state.paused { "paused" } else { "resumed" });
            }
            'm' => return Some(Action::DumpMatrices),
            'q' => return Some(Action::Quit),
            _ => return None,
        }
        Some(Action::Redraw)
    }
}
