//! Frame-coherent keyboard and pointer state.
//!
//! Events are accumulated between redraws and consumed once per frame, after
//! which [`KeyboardState::clear_transients`] and
//! [`PointerState::clear_transients`] reset the per-frame parts.

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

/// Pixels treated as one wheel line for trackpad (pixel-delta) scrolling.
const PIXELS_PER_LINE: f32 = 40.0;

/// Minimal description of a key event, usable without a live window.
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    pub key: KeyCode,
    pub state: ElementState,
    pub repeat: bool,
}

/// Tracks held keys plus the presses and releases of the current frame.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pressed: HashSet<KeyCode>,
    just_pressed: HashSet<KeyCode>,
    just_released: HashSet<KeyCode>,
    modifiers: ModifiersState,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a winit key event. Keys without a known code are ignored.
    pub fn process_event(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(key) = event.physical_key {
            self.process_raw(RawKeyEvent {
                key,
                state: event.state,
                repeat: event.repeat,
            });
        }
    }

    /// Repeats are dropped; a held key is already reported by
    /// [`is_pressed`](Self::is_pressed).
    pub fn process_raw(&mut self, event: RawKeyEvent) {
        if event.repeat {
            return;
        }
        match event.state {
            ElementState::Pressed => {
                if self.pressed.insert(event.key) {
                    self.just_pressed.insert(event.key);
                }
            }
            ElementState::Released => {
                if self.pressed.remove(&event.key) {
                    self.just_released.insert(event.key);
                }
            }
        }
    }

    pub fn set_modifiers(&mut self, modifiers: ModifiersState) {
        self.modifiers = modifiers;
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn just_released(&self, key: KeyCode) -> bool {
        self.just_released.contains(&key)
    }

    pub fn shift(&self) -> bool {
        self.modifiers.shift_key()
            || self.is_pressed(KeyCode::ShiftLeft)
            || self.is_pressed(KeyCode::ShiftRight)
    }

    /// Control, or Command on macOS.
    pub fn command(&self) -> bool {
        self.modifiers.control_key()
            || self.modifiers.super_key()
            || self.is_pressed(KeyCode::ControlLeft)
            || self.is_pressed(KeyCode::ControlRight)
    }

    /// Drop everything, e.g. when the window loses focus and releases would
    /// never arrive.
    pub fn reset(&mut self) {
        for key in self.pressed.drain() {
            self.just_released.insert(key);
        }
        self.just_pressed.clear();
        self.modifiers = ModifiersState::empty();
    }

    pub fn clear_transients(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

/// Cursor drag and wheel accumulation for the orbit controls.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    position: Option<Vec2>,
    rotating: bool,
    drag: Vec2,
    scroll: f32,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cursor move in physical pixels; accumulates drag while the
    /// rotate button is held.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let position = Vec2::new(x as f32, y as f32);
        if self.rotating
            && let Some(previous) = self.position
        {
            self.drag += position - previous;
        }
        self.position = Some(position);
    }

    pub fn on_cursor_left(&mut self) {
        self.position = None;
        self.rotating = false;
    }

    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.rotating = state.is_pressed();
        }
    }

    /// Positive values scroll toward the galaxy.
    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
        };
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    /// Drag distance since the last clear, in physical pixels.
    pub fn drag(&self) -> Vec2 {
        self.drag
    }

    /// Wheel lines since the last clear.
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn clear_transients(&mut self) {
        self.drag = Vec2::ZERO;
        self.scroll = 0.0;
    }
}
