//! Spiral-galaxy point synthesis: maps a [`ParameterSet`] to flat position and
//! color buffers.

use std::f32::consts::TAU;

use rand::Rng;

use crate::error::GalaxyError;
use crate::params::{JitterScale, ParameterSet};

/// Interleaved-free point buffers, three floats per point in each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloudBuffers {
    /// `x, y, z` per point.
    pub positions: Vec<f32>,
    /// Linear-light `r, g, b` per point, each channel in `[0, 1]`.
    pub colors: Vec<f32>,
}

impl PointCloudBuffers {
    /// Number of points held.
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [self.positions[i], self.positions[i + 1], self.positions[i + 2]]
    }

    pub fn color(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [self.colors[i], self.colors[i + 1], self.colors[i + 2]]
    }
}

/// Base angle of the arm a point belongs to, chosen by index rather than by a
/// random draw so every arm gets the same share of points.
pub fn branch_angle(index: u32, branches: u32) -> f32 {
    (index % branches) as f32 / branches as f32 * TAU
}

/// Stateless generator; randomness is supplied by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct GalaxyGenerator;

impl GalaxyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate `params.count` points.
    ///
    /// Parameters are validated before anything is allocated. `params` is not
    /// modified.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        params: &ParameterSet,
        rng: &mut R,
    ) -> Result<PointCloudBuffers, GalaxyError> {
        params.validate()?;

        let count = params.count as usize;
        let mut positions = Vec::with_capacity(count * 3);
        let mut colors = Vec::with_capacity(count * 3);
        let inside = params.inside_color.to_linear();
        let outside = params.outside_color.to_linear();

        for i in 0..params.count {
            // Linear in radius, not in area: density piles up at the core.
            let radius_i = rng.random::<f32>() * params.radius;
            let angle = branch_angle(i, params.branches) + radius_i * params.spin;

            let scale = match params.jitter {
                JitterScale::Unit => 1.0,
                JitterScale::Randomness => params.randomness,
                JitterScale::RandomnessRadius => params.randomness * radius_i,
            };
            let ox = jitter(rng, params.randomness_power) * scale;
            let oy = jitter(rng, params.randomness_power) * scale;
            let oz = jitter(rng, params.randomness_power) * scale;

            positions.push(angle.cos() * radius_i + ox);
            positions.push(oy);
            positions.push(angle.sin() * radius_i + oz);

            // 0/0 at radius zero is defined as the inside color.
            let mix = if params.radius > 0.0 {
                (radius_i / params.radius).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let color = inside.lerp(outside, mix);
            colors.extend_from_slice(&color.to_array());
        }

        Ok(PointCloudBuffers { positions, colors })
    }
}

/// Symmetric power-law offset in `[-1, 1]`, concentrated near zero for large
/// `power`.
fn jitter<R: Rng + ?Sized>(rng: &mut R, power: f32) -> f32 {
    let magnitude = rng.random::<f32>().powf(power);
    if rng.random::<f32>() > 0.5 {
        magnitude
    } else {
        -magnitude
    }
}
