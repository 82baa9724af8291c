//! Damped orbit camera controls.
//!
//! The camera sits on a sphere around a fixed target. Drag and wheel input
//! accumulate into a pending delta; each [`OrbitControls::update`] applies
//! the `damping` fraction of it and keeps the rest for later frames, so the
//! view keeps gliding after the pointer is released.

use std::f32::consts::{PI, TAU};

use galaxy_config::CameraConfig;
use galaxy_render::Camera;
use glam::{Vec2, Vec3};

/// Keeps the camera off the poles, where the up vector flips.
const POLE_EPSILON: f32 = 1e-4;
/// Remaining delta below which the controls are considered at rest.
const REST_EPSILON: f32 = 1e-6;
/// Per-line wheel zoom factor at zoom speed 1.
const ZOOM_BASE: f32 = 0.95;

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    radius: f32,
    /// Azimuth around +Y, measured from +Z toward +X.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
    damping: f32,
    rotate_speed: f32,
    zoom_speed: f32,
    min_distance: f32,
    max_distance: f32,
}

impl OrbitControls {
    /// Controls orbiting `target` from the camera's current position.
    pub fn new(camera: &Camera, target: Vec3, config: &CameraConfig) -> Self {
        let min_distance = config.min_distance.max(0.0);
        let max_distance = config.max_distance.max(min_distance);
        let offset = camera.position - target;
        let radius = offset.length();
        let (theta, phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        Self {
            target,
            radius: radius.clamp(min_distance, max_distance),
            theta,
            phi: phi.clamp(POLE_EPSILON, PI - POLE_EPSILON),
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
            damping: config.damping.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            min_distance,
            max_distance,
        }
    }

    /// Queue rotation for a pointer drag of `drag` pixels in a viewport
    /// `viewport_height` pixels tall.
    pub fn rotate_by_drag(&mut self, drag: Vec2, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let per_pixel = TAU * self.rotate_speed / viewport_height;
        self.pending_theta -= drag.x * per_pixel;
        self.pending_phi -= drag.y * per_pixel;
    }

    /// Queue a zoom of `lines` wheel lines; positive moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.pending_scale *= ZOOM_BASE.powf(self.zoom_speed * lines);
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    /// Whether queued rotation is still being applied.
    pub fn is_moving(&self) -> bool {
        self.pending_theta.abs() > REST_EPSILON || self.pending_phi.abs() > REST_EPSILON
    }

    /// Advance one frame and place `camera` on the orbit looking at the
    /// target.
    pub fn update(&mut self, camera: &mut Camera) {
        if self.damping > 0.0 {
            self.theta += self.pending_theta * self.damping;
            self.phi += self.pending_phi * self.damping;
            self.pending_theta *= 1.0 - self.damping;
            self.pending_phi *= 1.0 - self.damping;
        } else {
            self.theta += self.pending_theta;
            self.phi += self.pending_phi;
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
        }
        if !self.is_moving() {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
        }

        self.theta = self.theta.rem_euclid(TAU);
        self.phi = self.phi.clamp(POLE_EPSILON, PI - POLE_EPSILON);
        self.radius = (self.radius * self.pending_scale).clamp(self.min_distance, self.max_distance);
        self.pending_scale = 1.0;

        camera.position = self.target + self.offset();
        camera.look_at(self.target);
    }

    fn offset(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta) * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(damping: f32) -> (Camera, OrbitControls) {
        let config = CameraConfig {
            damping,
            ..CameraConfig::default()
        };
        let camera = Camera::perspective(
            config.fov_degrees,
            16.0 / 9.0,
            config.near,
            config.far,
            Vec3::from(config.position),
            Vec3::ZERO,
        );
        let controls = OrbitControls::new(&camera, Vec3::ZERO, &config);
        (camera, controls)
    }

    #[test]
    fn test_update_without_input_keeps_position() {
        let (mut camera, mut controls) = setup(0.05);
        let before = camera.position;
        controls.update(&mut camera);
        assert!((camera.position - before).length() < 1e-4);
        assert!(!controls.is_moving());
    }

    #[test]
    fn test_distance_from_initial_position() {
        let (_, controls) = setup(0.05);
        assert!((controls.distance() - 27.0f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_damped_rotation_glides_then_settles() {
        let (mut camera, mut controls) = setup(0.05);
        controls.rotate_by_drag(Vec2::new(100.0, 0.0), 720.0);

        controls.update(&mut camera);
        let after_one = camera.position;
        assert!(controls.is_moving());

        for _ in 0..1000 {
            controls.update(&mut camera);
        }
        assert!(!controls.is_moving());
        assert!((camera.position - after_one).length() > 0.01);
        // Orbit preserves distance and height for a horizontal drag.
        assert!((camera.position.length() - 27.0f32.sqrt()).abs() < 1e-3);
        assert!((camera.position.y - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_damped_total_matches_undamped() {
        let (mut damped_cam, mut damped) = setup(0.05);
        let (mut direct_cam, mut direct) = setup(0.0);
        let drag = Vec2::new(-60.0, 25.0);
        damped.rotate_by_drag(drag, 720.0);
        direct.rotate_by_drag(drag, 720.0);

        direct.update(&mut direct_cam);
        for _ in 0..2000 {
            damped.update(&mut damped_cam);
        }
        assert!((damped_cam.position - direct_cam.position).length() < 1e-3);
    }

    #[test]
    fn test_camera_faces_target() {
        let (mut camera, mut controls) = setup(0.0);
        controls.rotate_by_drag(Vec2::new(200.0, -50.0), 720.0);
        controls.update(&mut camera);
        let to_target = (controls.target - camera.position).normalize();
        assert!(camera.forward().dot(to_target) > 0.999);
    }

    #[test]
    fn test_zoom_clamped_to_distance_range() {
        let (mut camera, mut controls) = setup(0.05);
        controls.zoom(500.0);
        controls.update(&mut camera);
        assert!((controls.distance() - 0.2).abs() < 1e-5);

        controls.zoom(-5000.0);
        controls.update(&mut camera);
        assert!((controls.distance() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_vertical_drag_stops_at_pole() {
        let (mut camera, mut controls) = setup(0.0);
        controls.rotate_by_drag(Vec2::new(0.0, 10_000.0), 720.0);
        controls.update(&mut camera);
        assert!(camera.position.y > 0.0);
        assert!(camera.position.is_finite());
    }

    #[test]
    fn test_zero_height_viewport_ignored() {
        let (_, mut controls) = setup(0.05);
        controls.rotate_by_drag(Vec2::new(10.0, 10.0), 0.0);
        assert!(!controls.is_moving());
    }
}
