//! Procedural spiral-galaxy point clouds: parameters, generation, the
//! regenerate-and-dispose lifecycle and the per-frame animation driver.
//!
//! Rendering and windowing are reached only through [`SceneBackend`] and
//! [`FrameHost`].

pub mod animation;
pub mod color;
pub mod error;
pub mod generator;
pub mod lifecycle;
pub mod params;
pub mod scene;

pub use animation::{
    AnimationDriver, CancellationToken, DriverState, FrameHost, FrameOutcome, FrameScheduler,
    FrameStats, RenderFailure,
};
pub use color::{ParseColorError, Rgb, srgb_to_linear};
pub use error::GalaxyError;
pub use generator::{GalaxyGenerator, PointCloudBuffers, branch_angle};
pub use lifecycle::{PointCloudLifecycle, Regenerated};
pub use params::{JitterScale, ParamBounds, ParamField, ParameterSet};
pub use scene::{PointBlending, PointCloudHandle, PointCloudId, PointStyle, SceneBackend};
