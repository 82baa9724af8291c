//! Perspective camera producing view and projection matrices.

use glam::{Mat4, Quat, Vec3};

/// A camera that generates view and projection matrices for rendering.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation as a unit quaternion; identity looks down -Z.
    pub rotation: Quat,
    pub projection: Projection,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

/// Projection type for the camera.
#[derive(Debug, Clone)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f32,
        /// Width / height.
        aspect_ratio: f32,
    },
}

impl Camera {
    /// Perspective camera at `position` looking at `target` with +Y up.
    pub fn perspective(
        fov_y_degrees: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
        position: Vec3,
        target: Vec3,
    ) -> Self {
        let mut camera = Self {
            position,
            rotation: Quat::IDENTITY,
            projection: Projection::Perspective {
                fov_y: fov_y_degrees.to_radians(),
                aspect_ratio,
            },
            near,
            far,
        };
        camera.look_at(target);
        camera
    }

    /// Turn to face `target`. A target at the camera position leaves the
    /// rotation unchanged.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.length_squared() <= f32::EPSILON {
            return;
        }
        // Pick a different up vector when looking straight up or down.
        let up = if dir.normalize().dot(Vec3::Y).abs() > 0.999 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(self.position, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.rotation = rotation.normalize();
    }

    /// Compute the view matrix (inverse of camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), self.up())
    }

    /// Compute the projection matrix with reverse-Z.
    pub fn projection_matrix(&self) -> Mat4 {
        match &self.projection {
            Projection::Perspective {
                fov_y,
                aspect_ratio,
            } => {
                // Reverse-Z: swap near and far.
                Mat4::perspective_rh(*fov_y, *aspect_ratio, self.far, self.near)
            }
        }
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// The up direction vector (+Y in camera space).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// The right direction vector (+X in camera space).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Update the aspect ratio. Zero heights are ignored.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if height <= 0.0 || width <= 0.0 {
            return;
        }
        let Projection::Perspective { aspect_ratio, .. } = &mut self.projection;
        *aspect_ratio = width / height;
    }

    pub fn aspect_ratio(&self) -> f32 {
        let Projection::Perspective { aspect_ratio, .. } = &self.projection;
        *aspect_ratio
    }

    /// Vertical field of view in radians.
    pub fn fov_y(&self) -> f32 {
        let Projection::Perspective { fov_y, .. } = &self.projection;
        *fov_y
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(75.0, 16.0 / 9.0, 0.1, 100.0, Vec3::splat(3.0), Vec3::ZERO)
    }
}
