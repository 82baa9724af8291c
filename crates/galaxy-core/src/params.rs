//! The parameter vector that drives galaxy generation, and the bounds table
//! every editing surface honors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::GalaxyError;

/// How the per-axis jitter offset is scaled before it is added to a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JitterScale {
    /// `pow(u, power) * sign`; `randomness` has no effect.
    Unit,
    /// `pow(u, power) * sign * randomness`.
    Randomness,
    /// `pow(u, power) * sign * randomness * radius_i`; the core collapses to a point.
    #[default]
    RandomnessRadius,
}

/// Configuration vector for one galaxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    /// Number of points.
    pub count: u32,
    /// Maximum galaxy radius.
    pub radius: f32,
    /// Number of spiral arms.
    pub branches: u32,
    /// Radians of twist per unit radius.
    pub spin: f32,
    /// Scale of the positional jitter.
    pub randomness: f32,
    /// Exponent pulling the jitter toward the ideal spiral curve.
    pub randomness_power: f32,
    /// Rendered point size.
    pub size: f32,
    pub inside_color: Rgb,
    pub outside_color: Rgb,
    /// Rotation about the vertical axis per rendered frame, in radians.
    pub rotate_speed: f32,
    pub jitter: JitterScale,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            count: 160_500,
            radius: 5.0,
            branches: 5,
            spin: 1.0,
            randomness: 0.2,
            randomness_power: 3.0,
            size: 0.001,
            inside_color: Rgb::new(1.0, 96.0 / 255.0, 48.0 / 255.0),
            outside_color: Rgb::new(27.0 / 255.0, 57.0 / 255.0, 132.0 / 255.0),
            rotate_speed: 0.001,
            jitter: JitterScale::default(),
        }
    }
}

/// Inclusive range and increment for one numeric control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParamBounds {
    const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Clamp into `[min, max]` and snap onto the step grid anchored at `min`.
    pub fn snap(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.min;
        }
        let clamped = value.clamp(self.min, self.max);
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Every editable field of a [`ParameterSet`], in control-panel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    Size,
    Count,
    Radius,
    Branches,
    Spin,
    Randomness,
    RandomnessPower,
    RotateSpeed,
    InsideColor,
    OutsideColor,
}

impl ParamField {
    pub const ALL: [ParamField; 10] = [
        ParamField::Size,
        ParamField::Count,
        ParamField::Radius,
        ParamField::Branches,
        ParamField::Spin,
        ParamField::Randomness,
        ParamField::RandomnessPower,
        ParamField::RotateSpeed,
        ParamField::InsideColor,
        ParamField::OutsideColor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParamField::Size => "size",
            ParamField::Count => "count",
            ParamField::Radius => "radius",
            ParamField::Branches => "branches",
            ParamField::Spin => "spin",
            ParamField::Randomness => "randomness",
            ParamField::RandomnessPower => "randomnessPower",
            ParamField::RotateSpeed => "rotateSpeed",
            ParamField::InsideColor => "insideColor",
            ParamField::OutsideColor => "outsideColor",
        }
    }

    /// Bounds for numeric fields; `None` for the color pickers.
    pub fn bounds(self) -> Option<ParamBounds> {
        let b = match self {
            ParamField::Size => ParamBounds::new(0.001, 0.1, 0.001),
            ParamField::Count => ParamBounds::new(100.0, 1_000_000.0, 100.0),
            ParamField::Radius => ParamBounds::new(0.01, 20.0, 0.01),
            ParamField::Branches => ParamBounds::new(2.0, 10.0, 1.0),
            ParamField::Spin => ParamBounds::new(-5.0, 5.0, 0.01),
            ParamField::Randomness => ParamBounds::new(0.0, 2.0, 0.001),
            ParamField::RandomnessPower => ParamBounds::new(1.0, 10.0, 0.001),
            ParamField::RotateSpeed => ParamBounds::new(0.0, 0.01, 0.001),
            ParamField::InsideColor | ParamField::OutsideColor => return None,
        };
        Some(b)
    }

    pub fn is_color(self) -> bool {
        self.bounds().is_none()
    }
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ParameterSet {
    /// Check the constraints generation cannot work without.
    ///
    /// Bounds-table violations are not rejected here; they are a caller error.
    pub fn validate(&self) -> Result<(), GalaxyError> {
        if self.count == 0 {
            return Err(GalaxyError::invalid("count", "must be greater than zero"));
        }
        if self.branches == 0 {
            return Err(GalaxyError::invalid("branches", "must be at least one"));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(GalaxyError::invalid(
                "radius",
                format!("must be a finite value >= 0, got {}", self.radius),
            ));
        }
        if !self.randomness_power.is_finite() {
            return Err(GalaxyError::invalid("randomnessPower", "must be finite"));
        }
        Ok(())
    }

    /// Current value of a numeric field, or `None` for colors.
    pub fn numeric(&self, field: ParamField) -> Option<f64> {
        let v = match field {
            ParamField::Size => f64::from(self.size),
            ParamField::Count => f64::from(self.count),
            ParamField::Radius => f64::from(self.radius),
            ParamField::Branches => f64::from(self.branches),
            ParamField::Spin => f64::from(self.spin),
            ParamField::Randomness => f64::from(self.randomness),
            ParamField::RandomnessPower => f64::from(self.randomness_power),
            ParamField::RotateSpeed => f64::from(self.rotate_speed),
            ParamField::InsideColor | ParamField::OutsideColor => return None,
        };
        Some(v)
    }

    /// Snap `value` into the field's bounds and store it. Returns the stored
    /// value, or `None` if `field` is a color.
    pub fn set_numeric(&mut self, field: ParamField, value: f64) -> Option<f64> {
        let snapped = field.bounds()?.snap(value);
        match field {
            ParamField::Size => self.size = snapped as f32,
            ParamField::Count => self.count = snapped as u32,
            ParamField::Radius => self.radius = snapped as f32,
            ParamField::Branches => self.branches = snapped as u32,
            ParamField::Spin => self.spin = snapped as f32,
            ParamField::Randomness => self.randomness = snapped as f32,
            ParamField::RandomnessPower => self.randomness_power = snapped as f32,
            ParamField::RotateSpeed => self.rotate_speed = snapped as f32,
            ParamField::InsideColor | ParamField::OutsideColor => return None,
        }
        Some(snapped)
    }

    pub fn color(&self, field: ParamField) -> Option<Rgb> {
        match field {
            ParamField::InsideColor => Some(self.inside_color),
            ParamField::OutsideColor => Some(self.outside_color),
            _ => None,
        }
    }

    /// Store a color. Returns `false` if `field` is not a color field.
    pub fn set_color(&mut self, field: ParamField, color: Rgb) -> bool {
        match field {
            ParamField::InsideColor => self.inside_color = color,
            ParamField::OutsideColor => self.outside_color = color,
            _ => return false,
        }
        true
    }

    /// Snap every numeric field into its bounds. Returns the fields whose
    /// value changed.
    pub fn clamp_to_bounds(&mut self) -> Vec<ParamField> {
        let mut changed = Vec::new();
        for field in ParamField::ALL {
            let Some(before) = self.numeric(field) else {
                continue;
            };
            let after = self.set_numeric(field, before).unwrap_or(before);
            // Fields are stored as f32; compare at that precision.
            if after as f32 != before as f32 {
                changed.push(field);
            }
        }
        changed
    }

    /// Display form of a field's value, used by status lines and logs.
    pub fn describe(&self, field: ParamField) -> String {
        match field {
            ParamField::Count | ParamField::Branches => {
                format!("{}", self.numeric(field).unwrap_or_default() as u64)
            }
            ParamField::InsideColor | ParamField::OutsideColor => self
                .color(field)
                .map(|c| c.to_hex())
                .unwrap_or_default(),
            _ => format!("{:.3}", self.numeric(field).unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_look() {
        let p = ParameterSet::default();
        assert_eq!(p.count, 160_500);
        assert_eq!(p.branches, 5);
        assert_eq!(p.inside_color.to_hex(), "#ff6030");
        assert_eq!(p.outside_color.to_hex(), "#1b3984");
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_defaults_sit_inside_bounds() {
        let p = ParameterSet::default();
        for field in ParamField::ALL {
            if let (Some(bounds), Some(value)) = (field.bounds(), p.numeric(field)) {
                assert!(bounds.contains(value), "{field} = {value} out of bounds");
            }
        }
    }

    #[test]
    fn test_validate_rejects_zero_count() {
        let p = ParameterSet {
            count: 0,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(GalaxyError::InvalidParameter { field: "count", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_branches() {
        let p = ParameterSet {
            branches: 0,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(GalaxyError::InvalidParameter {
                field: "branches",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_or_nan_radius() {
        for radius in [-0.5, f32::NAN, f32::INFINITY] {
            let p = ParameterSet {
                radius,
                ..Default::default()
            };
            assert!(p.validate().is_err(), "radius {radius} accepted");
        }
    }

    #[test]
    fn test_zero_radius_is_valid() {
        let p = ParameterSet {
            radius: 0.0,
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_snap_clamps_and_rounds_to_step() {
        let b = ParamField::Count.bounds().unwrap();
        assert_eq!(b.snap(5.0), 100.0);
        assert_eq!(b.snap(2_000_000.0), 1_000_000.0);
        assert_eq!(b.snap(1_249.0), 1_200.0);
        assert_eq!(b.snap(f64::NAN), 100.0);
    }

    #[test]
    fn test_set_numeric_stores_snapped_value() {
        let mut p = ParameterSet::default();
        let stored = p.set_numeric(ParamField::Branches, 12.7).unwrap();
        assert_eq!(stored, 10.0);
        assert_eq!(p.branches, 10);

        let stored = p.set_numeric(ParamField::Spin, -1.234).unwrap();
        assert!((stored + 1.23).abs() < 1e-9);
        assert!((p.spin + 1.23).abs() < 1e-6);
    }

    #[test]
    fn test_set_numeric_ignores_colors() {
        let mut p = ParameterSet::default();
        assert!(p.set_numeric(ParamField::InsideColor, 1.0).is_none());
        assert!(p.numeric(ParamField::OutsideColor).is_none());
    }

    #[test]
    fn test_set_color_only_for_color_fields() {
        let mut p = ParameterSet::default();
        assert!(p.set_color(ParamField::InsideColor, Rgb::WHITE));
        assert_eq!(p.inside_color, Rgb::WHITE);
        assert!(!p.set_color(ParamField::Count, Rgb::WHITE));
    }

    #[test]
    fn test_clamp_to_bounds_reports_changed_fields() {
        let mut p = ParameterSet {
            count: 0,
            branches: 1,
            ..Default::default()
        };
        let changed = p.clamp_to_bounds();
        assert!(changed.contains(&ParamField::Count));
        assert!(changed.contains(&ParamField::Branches));
        assert!(!changed.contains(&ParamField::Radius));
        assert_eq!(p.count, 100);
        assert_eq!(p.branches, 2);
    }

    #[test]
    fn test_color_fields_have_no_bounds() {
        assert!(ParamField::InsideColor.is_color());
        assert!(ParamField::OutsideColor.is_color());
        assert!(!ParamField::Count.is_color());
    }

    #[test]
    fn test_describe_formats_by_kind() {
        let p = ParameterSet::default();
        assert_eq!(p.describe(ParamField::Count), "160500");
        assert_eq!(p.describe(ParamField::Radius), "5.000");
        assert_eq!(p.describe(ParamField::InsideColor), "#ff6030");
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let p: ParameterSet = ron::from_str("(count: 2000)").unwrap();
        assert_eq!(p.count, 2000);
        assert_eq!(p.branches, ParameterSet::default().branches);
    }
}
