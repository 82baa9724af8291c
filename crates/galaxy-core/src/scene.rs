//! The rendering collaborator contract the core drives, and the single live
//! point-cloud handle it hands out.

use crate::generator::PointCloudBuffers;

/// How overlapping points combine in the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointBlending {
    /// Source and destination are summed; dense regions saturate toward white.
    #[default]
    Additive,
    /// Regular alpha-over compositing.
    Normal,
}

/// Material settings for a point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    pub size: f32,
    /// Scale point size with distance to the camera.
    pub size_attenuation: bool,
    pub blending: PointBlending,
    pub depth_write: bool,
    /// Use per-point colors instead of a uniform tint.
    pub vertex_colors: bool,
}

impl PointStyle {
    /// The glowing-dust look: attenuated, additive, no depth writes.
    pub fn glow(size: f32) -> Self {
        Self {
            size,
            size_attenuation: true,
            blending: PointBlending::Additive,
            depth_write: false,
            vertex_colors: true,
        }
    }
}

/// Identity of a point cloud within a backend's scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointCloudId(pub u64);

/// Scene-graph and resource operations a renderer must offer.
///
/// Geometry and material are separate resources; each one created must be
/// disposed exactly once.
pub trait SceneBackend {
    type Geometry;
    type Material;

    /// Upload buffers into a renderable geometry. Takes ownership so the CPU
    /// copy is released once uploaded.
    fn create_geometry(&mut self, buffers: PointCloudBuffers) -> Self::Geometry;
    fn create_material(&mut self, style: &PointStyle) -> Self::Material;

    fn add_to_scene(
        &mut self,
        id: PointCloudId,
        geometry: &Self::Geometry,
        material: &Self::Material,
    );
    fn remove_from_scene(&mut self, id: PointCloudId);

    fn dispose_geometry(&mut self, geometry: Self::Geometry);
    fn dispose_material(&mut self, material: Self::Material);
}

/// The renderable object currently in the scene.
pub struct PointCloudHandle<B: SceneBackend> {
    pub(crate) id: PointCloudId,
    pub(crate) geometry: B::Geometry,
    pub(crate) material: B::Material,
    pub(crate) style: PointStyle,
    pub(crate) point_count: u32,
    /// Rotation about the vertical axis, in radians.
    pub rotation_y: f32,
}

impl<B: SceneBackend> PointCloudHandle<B> {
    pub fn id(&self) -> PointCloudId {
        self.id
    }

    pub fn geometry(&self) -> &B::Geometry {
        &self.geometry
    }

    pub fn material(&self) -> &B::Material {
        &self.material
    }

    pub fn style(&self) -> &PointStyle {
        &self.style
    }

    pub fn point_count(&self) -> u32 {
        self.point_count
    }
}

impl<B: SceneBackend> std::fmt::Debug for PointCloudHandle<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointCloudHandle")
            .field("id", &self.id)
            .field("point_count", &self.point_count)
            .field("rotation_y", &self.rotation_y)
            .finish_non_exhaustive()
    }
}
