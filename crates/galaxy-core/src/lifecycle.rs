//! Ownership of the one live point cloud: regeneration swaps it and releases
//! the previous geometry, material and scene membership in the same call.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::GalaxyError;
use crate::generator::GalaxyGenerator;
use crate::params::ParameterSet;
use crate::scene::{PointCloudHandle, PointCloudId, PointStyle, SceneBackend};

/// Summary of a completed regeneration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regenerated {
    pub id: PointCloudId,
    pub point_count: u32,
    /// Whether a previously live cloud was released by this call.
    pub replaced: bool,
    pub elapsed: Duration,
}

/// Owns the renderer backend and at most one live [`PointCloudHandle`].
///
/// `regenerate` takes `&mut self`, so swaps are serialized and no caller can
/// observe a cloud that is removed from the scene but not yet replaced.
pub struct PointCloudLifecycle<B: SceneBackend> {
    backend: B,
    generator: GalaxyGenerator,
    rng: ChaCha8Rng,
    seed: u64,
    live: Option<PointCloudHandle<B>>,
    next_id: u64,
}

impl<B: SceneBackend> PointCloudLifecycle<B> {
    /// Create an empty lifecycle. The random stream is seeded from `seed`.
    pub fn new(backend: B, seed: u64) -> Self {
        Self {
            backend,
            generator: GalaxyGenerator::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            live: None,
            next_id: 1,
        }
    }

    /// Build a cloud from `params` and install it in place of the current one.
    ///
    /// Generation runs before anything is touched: on `InvalidParameter` the
    /// current cloud stays in the scene unchanged.
    pub fn regenerate(&mut self, params: &ParameterSet) -> Result<Regenerated, GalaxyError> {
        let started = Instant::now();
        let buffers = self.generator.generate(params, &mut self.rng)?;

        let style = PointStyle::glow(params.size);
        let geometry = self.backend.create_geometry(buffers);
        let material = self.backend.create_material(&style);

        let id = PointCloudId(self.next_id);
        self.next_id += 1;

        let replaced = match self.live.take() {
            Some(old) => {
                self.release(old);
                true
            }
            None => false,
        };

        self.backend.add_to_scene(id, &geometry, &material);
        self.live = Some(PointCloudHandle {
            id,
            geometry,
            material,
            style,
            point_count: params.count,
            rotation_y: 0.0,
        });

        let elapsed = started.elapsed();
        log::info!(
            "Regenerated galaxy #{} ({} points) in {:.1}ms",
            id.0,
            params.count,
            elapsed.as_secs_f64() * 1000.0
        );

        Ok(Regenerated {
            id,
            point_count: params.count,
            replaced,
            elapsed,
        })
    }

    /// Remove and dispose the live cloud, if any. Returns whether one existed.
    pub fn clear(&mut self) -> bool {
        match self.live.take() {
            Some(old) => {
                log::debug!("Releasing galaxy #{}", old.id.0);
                self.release(old);
                true
            }
            None => false,
        }
    }

    /// Restart the random stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.seed = seed;
        log::info!("Galaxy seed set to {seed}");
    }

    /// Seed the random stream was last started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn live(&self) -> Option<&PointCloudHandle<B>> {
        self.live.as_ref()
    }

    /// Add `delta` radians to the live cloud's rotation. Returns the new
    /// angle, or `None` when nothing is live.
    pub fn rotate(&mut self, delta: f32) -> Option<f32> {
        let handle = self.live.as_mut()?;
        handle.rotation_y = (handle.rotation_y + delta) % std::f32::consts::TAU;
        Some(handle.rotation_y)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Number of successful regenerations so far.
    pub fn generations(&self) -> u64 {
        self.next_id - 1
    }

    fn release(&mut self, handle: PointCloudHandle<B>) {
        let PointCloudHandle {
            id,
            geometry,
            material,
            ..
        } = handle;
        self.backend.remove_from_scene(id);
        self.backend.dispose_geometry(geometry);
        self.backend.dispose_material(material);
    }
}

impl<B: SceneBackend> Drop for PointCloudLifecycle<B> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
