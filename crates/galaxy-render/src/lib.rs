//! wgpu rendering for the galaxy viewer: device and surface management, the
//! perspective camera, frame encoding and the point-sprite pipeline.

pub mod camera;
pub mod gpu;
pub mod pass;
pub mod points;
pub mod surface;

pub use camera::{Camera, Projection};
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use pass::{FrameEncoder, RenderPassBuilder};
pub use points::{
    GpuPointBackend, GpuPointGeometry, GpuPointMaterial, POINT_SHADER_SOURCE, PointInstance,
    PointPipelines, PointUniform,
};
pub use surface::{DEFAULT_MAX_PIXEL_RATIO, PhysicalSize, SurfaceResizeEvent, SurfaceWrapper};
