//! The per-frame driver: rotate the live cloud, advance the camera, render,
//! then ask the host for another frame unless cancelled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::GalaxyError;
use crate::lifecycle::PointCloudLifecycle;
use crate::params::ParameterSet;
use crate::scene::SceneBackend;

/// Shared flag that stops a recurring schedule at its next checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Why a frame did not reach the screen.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderFailure {
    /// Transient: the frame is dropped and the loop keeps going.
    #[error("frame skipped: {0}")]
    Skipped(String),
    /// The surface or device is gone.
    #[error("rendering resource unavailable: {0}")]
    ResourceUnavailable(String),
}

/// Source of the next-frame signal.
pub trait FrameScheduler {
    /// Ask for [`AnimationDriver::activate`] to be called on the next display frame.
    fn request_frame(&mut self);
}

/// The window/renderer side of the loop.
pub trait FrameHost<B: SceneBackend>: FrameScheduler {
    /// Per-frame camera controller update (damping toward its target).
    fn update_camera(&mut self);
    /// Draw the lifecycle's live cloud from the current camera.
    fn render(&mut self, lifecycle: &PointCloudLifecycle<B>) -> Result<(), RenderFailure>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Created, not yet started.
    Idle,
    /// Waiting for the host's next frame.
    Scheduled,
    /// Inside an activation.
    Running,
    /// Cancelled or failed; never schedules again.
    Stopped,
}

/// Result of a single activation.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Rendered,
    Skipped(String),
    /// Activation arrived while not scheduled; nothing was done.
    Ignored,
    /// The token was cancelled; the driver is now stopped.
    Cancelled,
    /// Rendering became impossible; the driver is now stopped.
    Failed(GalaxyError),
}

/// Counters over the driver's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub activations: u64,
    pub rendered: u64,
    pub skipped: u64,
}

/// Self-rescheduling frame task with an explicit cancellation token.
#[derive(Debug)]
pub struct AnimationDriver {
    state: DriverState,
    token: CancellationToken,
    stats: FrameStats,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self {
            state: DriverState::Idle,
            token: CancellationToken::new(),
            stats: FrameStats::default(),
        }
    }

    /// Token that stops this driver; clone it into whatever owns teardown.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Schedule the first frame. Returns `false` if already started or stopped.
    pub fn start(&mut self, host: &mut impl FrameScheduler) -> bool {
        if self.state != DriverState::Idle || self.token.is_cancelled() {
            return false;
        }
        host.request_frame();
        self.state = DriverState::Scheduled;
        true
    }

    /// Run one frame.
    ///
    /// Never panics on render failure: transient failures are reported and the
    /// next frame is still requested, fatal ones stop the driver.
    pub fn activate<B: SceneBackend>(
        &mut self,
        params: &ParameterSet,
        lifecycle: &mut PointCloudLifecycle<B>,
        host: &mut impl FrameHost<B>,
    ) -> FrameOutcome {
        if self.state != DriverState::Scheduled {
            return FrameOutcome::Ignored;
        }
        if self.token.is_cancelled() {
            self.state = DriverState::Stopped;
            return FrameOutcome::Cancelled;
        }

        self.state = DriverState::Running;
        self.stats.activations += 1;

        lifecycle.rotate(params.rotate_speed);
        host.update_camera();

        let outcome = match host.render(lifecycle) {
            Ok(()) => {
                self.stats.rendered += 1;
                FrameOutcome::Rendered
            }
            Err(RenderFailure::Skipped(reason)) => {
                self.stats.skipped += 1;
                log::debug!("Frame skipped: {reason}");
                FrameOutcome::Skipped(reason)
            }
            Err(RenderFailure::ResourceUnavailable(reason)) => {
                log::error!("Stopping animation: {reason}");
                self.state = DriverState::Stopped;
                return FrameOutcome::Failed(GalaxyError::ResourceUnavailable(reason));
            }
        };

        if self.token.is_cancelled() {
            self.state = DriverState::Stopped;
            return FrameOutcome::Cancelled;
        }
        host.request_frame();
        self.state = DriverState::Scheduled;
        outcome
    }

    /// Cancel the token and stop immediately.
    pub fn stop(&mut self) {
        self.token.cancel();
        self.state = DriverState::Stopped;
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == DriverState::Stopped
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::PointCloudBuffers;
    use crate::scene::{PointCloudId, PointStyle};

    struct NullBackend;

    impl SceneBackend for NullBackend {
        type Geometry = ();
        type Material = ();

        fn create_geometry(&mut self, _buffers: PointCloudBuffers) {}
        fn create_material(&mut self, _style: &PointStyle) {}
        fn add_to_scene(&mut self, _id: PointCloudId, _g: &(), _m: &()) {}
        fn remove_from_scene(&mut self, _id: PointCloudId) {}
        fn dispose_geometry(&mut self, _g: ()) {}
        fn dispose_material(&mut self, _m: ()) {}
    }

    /// Host that records calls and replays a scripted sequence of render results.
    #[derive(Default)]
    struct ScriptedHost {
        calls: Vec<&'static str>,
        pending_frames: u32,
        script: Vec<Result<(), RenderFailure>>,
        seen_rotation: Vec<Option<f32>>,
        cancel_on_render: Option<CancellationToken>,
    }

    impl FrameHost<NullBackend> for ScriptedHost {
        fn update_camera(&mut self) {
            self.calls.push("camera");
        }

        fn render(
            &mut self,
            lifecycle: &PointCloudLifecycle<NullBackend>,
        ) -> Result<(), RenderFailure> {
            self.calls.push("render");
            self.seen_rotation.push(lifecycle.live().map(|h| h.rotation_y));
            if let Some(token) = &self.cancel_on_render {
                token.cancel();
            }
            if self.script.is_empty() {
                Ok(())
            } else {
                self.script.remove(0)
            }
        }
    }

    impl FrameScheduler for ScriptedHost {
        fn request_frame(&mut self) {
            self.calls.push("request");
            self.pending_frames += 1;
        }
    }

    fn params() -> ParameterSet {
        ParameterSet {
            count: 10,
            rotate_speed: 0.002,
            ..Default::default()
        }
    }

    fn live_lifecycle() -> PointCloudLifecycle<NullBackend> {
        let mut lc = PointCloudLifecycle::new(NullBackend, 1);
        lc.regenerate(&params()).unwrap();
        lc
    }

    #[test]
    fn test_start_schedules_once() {
        let mut driver = AnimationDriver::new();
        let mut host = ScriptedHost::default();
        assert!(driver.start(&mut host));
        assert!(!driver.start(&mut host));
        assert_eq!(host.pending_frames, 1);
        assert_eq!(driver.state(), DriverState::Scheduled);
    }

    #[test]
    fn test_activation_order() {
        let mut driver = AnimationDriver::new();
        let mut host = ScriptedHost::default();
        let mut lc = live_lifecycle();
        driver.start(&mut host);
        host.calls.clear();

        assert_eq!(driver.activate(&params(), &mut lc, &mut host), FrameOutcome::Rendered);
        assert_eq!(host.calls, vec!["camera", "render", "request"]);
        // Rotation is applied before the render sees the cloud.
        assert_eq!(host.seen_rotation, vec![Some(0.002)]);
        assert_eq!(driver.state(), DriverState::Scheduled);
    }

    #[test]
    fn test_rotation_accumulates_per_frame() {
        let mut driver = AnimationDriver::new();
        let mut host = ScriptedHost::default();
        let mut lc = live_lifecycle();
        driver.start(&mut host);
        for _ in 0..5 {
            driver.activate(&params(), &mut lc, &mut host);
        }
        let rotation = lc.live().unwrap().rotation_y;
        assert!((rotation - 0.01).abs() < 1e-6);
        assert_eq!(driver.stats().rendered, 5);
    }

    #[test]
    fn test_runs_without_live_cloud() {
        let mut driver = AnimationDriver::new();
        let mut host = ScriptedHost::default();
        let mut lc = PointCloudLifecycle::new(NullBackend, 1);
        driver.start(&mut host);
        assert_eq!(driver.activate(&params(), &mut lc, &mut host), FrameOutcome::Rendered);
        assert_eq!(host.seen_rotation, vec![None]);
    }

    #[test]
    fn test_regeneration_between_frames_is_picked_up() {
        let mut driver = AnimationDriver::new();
        let mut host = ScriptedHost::default();
        let mut lc = live_lifecycle();
        driver.start(&mut host);
        driver.activate(&params(), &mut lc, &mut host);

        let first = lc.live().unwrap().id();
        lc.regenerate(&params()).unwrap();
        driver.activate(&params(), &mut lc, &mut host);

        assert_ne!(lc.live().unwrap().id(), first);
        assert_eq!(host.seen_rotation, vec![Some(0.002), Some(0.002)]);
    }

    #[test]
    fn test_skipped_frame_keeps_running() {
        let mut driver = AnimationDriver::new();
        let mut host = ScriptedHost {
            script: vec![Err(RenderFailure::Skipped("timeout".into()))],
            ..Default::default()
        };
        let mut lc = live_lifecycle();
        driver.start(&mut host);

        let outcome = driver.activate(&params(), &mut lc, &mut host);
        assert_eq!(outcome, FrameOutcome::Skipped("timeout".into()));
        assert_eq!(driver.state(), DriverState::Scheduled);
        assert_eq!(driver.activate(&params(), &mut lc, &mut host), FrameOutcome::Rendered);
        assert_eq!(driver.stats().skipped, 1);
    }

    #[test]
    fn test_resource_loss_stops_rescheduling() {
        let mut driver = AnimationDriver::new();
        let mut host = ScriptedHost {
            script: vec![Err(RenderFailure::ResourceUnavailable("surface lost".into()))],
            ..Default::default()
        };
        let mut lc = live_lifecycle();
        driver.start(&mut host);
        let before = host.pending_frames;

        let outcome = driver.activate(&params(), &mut lc, &mut host);
        assert!(matches!(outcome, FrameOutcome::Failed(GalaxyError::ResourceUnavailable(_))));
        assert!(driver.is_stopped());
        assert_eq!(host.pending_frames, before);

        // Further host frames are ignored.
        assert_eq!(driver.activate(&params(), &mut lc, &mut host), FrameOutcome::Ignored);
    }

    #[test]
    fn test_cancel_before_activation() {
        let mut driver = AnimationDriver::new();
        let mut host = ScriptedHost::default();
        let mut lc = live_lifecycle();
        driver.start(&mut host);
        driver.token().cancel();
        host.calls.clear();

        assert_eq!(driver.activate(&params(), &mut lc, &mut host), FrameOutcome::Cancelled);
        assert!(host.calls.is_empty());
        assert!(driver.is_stopped());
    }

    #[test]
    fn test_cancel_during_frame_stops_at_reschedule() {
        let mut driver = AnimationDriver::new();
        let mut host = ScriptedHost {
            cancel_on_render: Some(driver.token()),
            ..Default::default()
        };
        let mut lc = live_lifecycle();
        driver.start(&mut host);
        host.calls.clear();

        assert_eq!(driver.activate(&params(), &mut lc, &mut host), FrameOutcome::Cancelled);
        assert_eq!(host.calls, vec!["camera", "render"]);
        assert!(driver.is_stopped());
    }

    #[test]
    fn test_cancelled_driver_cannot_start() {
        let mut driver = AnimationDriver::new();
        let mut host = ScriptedHost::default();
        driver.stop();
        assert!(!driver.start(&mut host));
        assert_eq!(host.pending_frames, 0);
    }
}
