//! Keyboard parameter panel.
//!
//! Up/Down select a field. Holding Left/Right nudges a numeric field by its
//! step every frame (Shift for ten steps); on a color field each press moves
//! through [`PALETTE`]. Releasing the arrows finishes the gesture, which
//! emits a single [`PanelEvent::FinishChange`] if the value moved.
//!
//! The application answers a finished change with [`ParameterPanel::accept`]
//! or [`ParameterPanel::reject`]; the latter puts the field back to its value
//! from before the gesture.

use galaxy_core::{GalaxyError, ParamField, ParameterSet, Rgb};
use winit::keyboard::KeyCode;

use crate::input::KeyboardState;

/// Multiplier on the step while Shift is held.
const COARSE_STEPS: f64 = 10.0;

/// Colors offered for the inside/outside color fields.
pub const PALETTE: [Rgb; 8] = [
    Rgb::new(1.0, 96.0 / 255.0, 48.0 / 255.0),
    Rgb::new(27.0 / 255.0, 57.0 / 255.0, 132.0 / 255.0),
    Rgb::new(1.0, 1.0, 1.0),
    Rgb::new(1.0, 215.0 / 255.0, 0.0),
    Rgb::new(1.0, 0.0, 128.0 / 255.0),
    Rgb::new(0.0, 1.0, 170.0 / 255.0),
    Rgb::new(138.0 / 255.0, 43.0 / 255.0, 226.0 / 255.0),
    Rgb::new(0.0, 191.0 / 255.0, 1.0),
];

/// Requests from the panel to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// A gesture on `field` completed with a new value.
    FinishChange { field: ParamField },
    /// Regenerate with the current parameters and fresh random draws.
    Reroll,
    /// Persist the current parameters to the config file.
    SaveParameters,
    /// Re-read the config file and apply its parameters.
    ReloadConfig,
}

#[derive(Debug, Clone)]
struct Gesture {
    field: ParamField,
    before: ParameterSet,
}

#[derive(Debug, Default)]
pub struct ParameterPanel {
    selected: usize,
    active: Option<Gesture>,
    /// Finished gesture waiting for accept/reject.
    awaiting: Option<Gesture>,
    last_error: Option<String>,
}

impl ParameterPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> ParamField {
        ParamField::ALL[self.selected]
    }

    pub fn is_adjusting(&self) -> bool {
        self.active.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Consume this frame's keyboard state, editing `params` in place.
    pub fn update(&mut self, keyboard: &KeyboardState, params: &mut ParameterSet) -> Vec<PanelEvent> {
        let mut events = Vec::new();

        if self.active.is_none() {
            let count = ParamField::ALL.len();
            if keyboard.just_pressed(KeyCode::ArrowUp) {
                self.selected = (self.selected + count - 1) % count;
            }
            if keyboard.just_pressed(KeyCode::ArrowDown) {
                self.selected = (self.selected + 1) % count;
            }
        }

        let left = keyboard.is_pressed(KeyCode::ArrowLeft);
        let right = keyboard.is_pressed(KeyCode::ArrowRight);

        if (left || right) && self.active.is_none() {
            self.active = Some(Gesture {
                field: self.selected(),
                before: params.clone(),
            });
        }

        if let Some(gesture) = &self.active {
            let field = gesture.field;
            if field.is_color() {
                if keyboard.just_pressed(KeyCode::ArrowRight) {
                    cycle_color(params, field, 1);
                }
                if keyboard.just_pressed(KeyCode::ArrowLeft) {
                    cycle_color(params, field, -1);
                }
            } else {
                let direction = f64::from(i8::from(right) - i8::from(left));
                nudge(params, field, direction, keyboard.shift());
            }
        }

        if !left
            && !right
            && let Some(gesture) = self.active.take()
        {
            let field = gesture.field;
            if field_changed(&gesture.before, params, field) {
                self.awaiting = Some(gesture);
                events.push(PanelEvent::FinishChange { field });
            }
        }

        if keyboard.command() {
            if keyboard.just_pressed(KeyCode::KeyS) {
                events.push(PanelEvent::SaveParameters);
            }
        } else if keyboard.just_pressed(KeyCode::KeyR) {
            events.push(PanelEvent::Reroll);
        }
        if keyboard.just_pressed(KeyCode::F5) {
            events.push(PanelEvent::ReloadConfig);
        }

        events
    }

    /// The last finished change produced a new cloud.
    pub fn accept(&mut self) {
        self.awaiting = None;
        self.last_error = None;
    }

    /// The last finished change was refused: restore the field and remember
    /// why for the status line.
    pub fn reject(&mut self, params: &mut ParameterSet, error: &GalaxyError) {
        if let Some(gesture) = self.awaiting.take() {
            restore_field(&gesture.before, params, gesture.field);
        }
        self.last_error = Some(error.to_string());
    }

    /// Record an error that did not come from a gesture.
    pub fn report(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// One-line summary for the window title.
    pub fn status_line(&self, params: &ParameterSet) -> String {
        let field = self.selected();
        let mut line = format!(
            "{} = {}  [{}/{}]",
            field.name(),
            params.describe(field),
            self.selected + 1,
            ParamField::ALL.len()
        );
        if let Some(error) = &self.last_error {
            line.push_str("  | ");
            line.push_str(error);
        }
        line
    }
}

fn nudge(params: &mut ParameterSet, field: ParamField, direction: f64, coarse: bool) {
    if direction == 0.0 {
        return;
    }
    let (Some(bounds), Some(current)) = (field.bounds(), params.numeric(field)) else {
        return;
    };
    let steps = if coarse { COARSE_STEPS } else { 1.0 };
    params.set_numeric(field, current + direction * steps * bounds.step);
}

fn cycle_color(params: &mut ParameterSet, field: ParamField, direction: isize) {
    let Some(current) = params.color(field) else {
        return;
    };
    let len = PALETTE.len() as isize;
    let next = match PALETTE.iter().position(|c| c.to_hex() == current.to_hex()) {
        Some(index) => (index as isize + direction).rem_euclid(len),
        None if direction > 0 => 0,
        None => len - 1,
    };
    params.set_color(field, PALETTE[next as usize]);
}

fn field_changed(before: &ParameterSet, after: &ParameterSet, field: ParamField) -> bool {
    if field.is_color() {
        before.color(field).map(Rgb::to_hex) != after.color(field).map(Rgb::to_hex)
    } else {
        before.numeric(field) != after.numeric(field)
    }
}

fn restore_field(before: &ParameterSet, params: &mut ParameterSet, field: ParamField) {
    if let Some(color) = before.color(field) {
        params.set_color(field, color);
    } else if let Some(value) = before.numeric(field) {
        params.set_numeric(field, value);
    }
}
