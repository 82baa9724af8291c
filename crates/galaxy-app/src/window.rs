//! Window creation and event handling via winit.
//!
//! [`AppState`] implements winit's [`ApplicationHandler`]. Each redraw feeds
//! the panel and orbit controls from the collected input, then hands the frame
//! to the [`AnimationDriver`], which rotates the live cloud, updates the
//! camera, renders, and requests the next redraw.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use galaxy_config::Config;
use galaxy_core::{
    AnimationDriver, FrameHost, FrameOutcome, FrameScheduler, FrameStats, GalaxyError,
    ParameterSet, PointCloudLifecycle, RenderFailure, Rgb,
};
use galaxy_render::{
    Camera, FrameEncoder, GpuPointBackend, RenderContext, RenderContextError, RenderPassBuilder,
    SurfaceResizeEvent, SurfaceWrapper, init_render_context_blocking,
};
use glam::Vec3;
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::error::{EventLoopError, OsError};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::input::{KeyboardState, PointerState};
use crate::orbit::OrbitControls;
use crate::panel::{PanelEvent, ParameterPanel};

/// Errors that end the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] OsError),
    #[error("GPU initialization failed: {0}")]
    Render(#[from] RenderContextError),
    #[error("rendering stopped: {0}")]
    Galaxy(#[from] GalaxyError),
}

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// Everything that only exists while a window is open.
struct Viewer {
    lifecycle: PointCloudLifecycle<GpuPointBackend>,
    camera: Camera,
    orbit: OrbitControls,
    surface: SurfaceWrapper,
    gpu: RenderContext,
    window: Arc<Window>,
}

/// Borrowed view of a [`Viewer`] handed to the driver for one frame.
struct FrameContext<'a> {
    window: &'a Window,
    gpu: &'a RenderContext,
    surface: &'a SurfaceWrapper,
    camera: &'a mut Camera,
    orbit: &'a mut OrbitControls,
    clear_color: Rgb,
}

impl FrameScheduler for FrameContext<'_> {
    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}

impl FrameHost<GpuPointBackend> for FrameContext<'_> {
    fn update_camera(&mut self) {
        self.orbit.update(self.camera);
    }

    fn render(
        &mut self,
        lifecycle: &PointCloudLifecycle<GpuPointBackend>,
    ) -> Result<(), RenderFailure> {
        let texture = self.gpu.get_current_texture()?;
        let backend = lifecycle.backend();
        if let Some(handle) = lifecycle.live() {
            backend.prepare(
                handle,
                self.camera,
                self.surface.render_size(),
                self.surface.pixel_ratio() as f32,
            );
        }

        let mut frame = FrameEncoder::new(&self.gpu.device, self.gpu.queue.clone(), texture);
        let builder = RenderPassBuilder::new()
            .clear_rgb(self.clear_color)
            .label("galaxy-pass");
        if let Some(mut pass) = frame.begin_render_pass(&builder)
            && let Some(handle) = lifecycle.live()
        {
            backend.draw(&mut pass, handle);
        }
        frame.submit();
        Ok(())
    }
}

/// Schedules the first frame before any [`FrameContext`] exists.
struct RedrawRequest<'a>(&'a Window);

impl FrameScheduler for RedrawRequest<'_> {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

/// Frame rate over one logging interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate {
    pub fps: f64,
    pub rendered: u64,
    pub skipped: u64,
}

/// Turns the driver's lifetime counters into periodic rate samples.
#[derive(Debug)]
pub struct FrameRateLog {
    interval: Duration,
    started: Instant,
    baseline: FrameStats,
}

impl FrameRateLog {
    /// A non-positive interval disables sampling.
    pub fn new(interval_secs: f64, now: Instant) -> Self {
        let interval = if interval_secs.is_finite() && interval_secs > 0.0 {
            Duration::from_secs_f64(interval_secs)
        } else {
            Duration::ZERO
        };
        Self {
            interval,
            started: now,
            baseline: FrameStats::default(),
        }
    }

    /// Returns a sample once per interval.
    pub fn sample(&mut self, now: Instant, stats: FrameStats) -> Option<FrameRate> {
        if self.interval.is_zero() {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed < self.interval {
            return None;
        }
        let rendered = stats.rendered.saturating_sub(self.baseline.rendered);
        let skipped = stats.skipped.saturating_sub(self.baseline.skipped);
        self.started = now;
        self.baseline = stats;
        Some(FrameRate {
            fps: rendered as f64 / elapsed.as_secs_f64(),
            rendered,
            skipped,
        })
    }
}

/// Application state driven by the winit event loop.
pub struct AppState {
    config: Config,
    config_dir: PathBuf,
    params: ParameterSet,
    seed: u64,
    viewer: Option<Viewer>,
    driver: AnimationDriver,
    keyboard: KeyboardState,
    pointer: PointerState,
    panel: ParameterPanel,
    frame_rate: FrameRateLog,
    title: String,
    fatal: Option<AppError>,
}

impl AppState {
    /// Draws a random seed when the config does not pin one.
    pub fn new(config: Config, config_dir: PathBuf) -> Self {
        let seed = match config.galaxy.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                info!("No seed configured, using {seed} (pass --seed {seed} to reproduce)");
                seed
            }
        };
        Self {
            params: config.galaxy.parameters.clone(),
            frame_rate: FrameRateLog::new(f64::from(config.debug.stats_interval_secs), Instant::now()),
            title: config.window.title.clone(),
            config,
            config_dir,
            seed,
            viewer: None,
            driver: AnimationDriver::new(),
            keyboard: KeyboardState::new(),
            pointer: PointerState::new(),
            panel: ParameterPanel::new(),
            fatal: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    fn open_viewer(&mut self, event_loop: &ActiveEventLoop) -> Result<Viewer, AppError> {
        let window = Arc::new(event_loop.create_window(window_attributes_from_config(&self.config))?);

        let inner = window.inner_size();
        let surface = SurfaceWrapper::new(
            inner.width,
            inner.height,
            window.scale_factor(),
            self.config.render.max_pixel_ratio,
        );
        let render_size = surface.render_size();
        info!(
            "Window {}x{} (scale {:.2}), rendering at {}x{}",
            inner.width,
            inner.height,
            window.scale_factor(),
            render_size.width,
            render_size.height
        );

        let gpu = init_render_context_blocking(
            window.clone(),
            render_size.width,
            render_size.height,
            self.config.window.vsync,
        )?;
        let backend = GpuPointBackend::new(gpu.device.clone(), gpu.queue.clone(), gpu.surface_format);

        let camera_config = &self.config.camera;
        let camera = Camera::perspective(
            camera_config.fov_degrees,
            surface.physical_size().aspect_ratio(),
            camera_config.near,
            camera_config.far,
            Vec3::from(camera_config.position),
            Vec3::ZERO,
        );
        let orbit = OrbitControls::new(&camera, Vec3::ZERO, camera_config);

        Ok(Viewer {
            lifecycle: PointCloudLifecycle::new(backend, self.seed),
            camera,
            orbit,
            surface,
            gpu,
            window,
        })
    }

    /// Apply panel requests and camera input collected since the last frame.
    fn process_input(&mut self) {
        for event in self.panel.update(&self.keyboard, &mut self.params) {
            self.handle_panel_event(event);
        }

        if let Some(viewer) = self.viewer.as_mut() {
            let height = viewer.surface.physical_size().height as f32;
            viewer.orbit.rotate_by_drag(self.pointer.drag(), height);
            viewer.orbit.zoom(self.pointer.scroll());
        }

        self.keyboard.clear_transients();
        self.pointer.clear_transients();
        self.refresh_title();
    }

    fn handle_panel_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::FinishChange { field } => match self.regenerate() {
                Some(Ok(_)) => self.panel.accept(),
                Some(Err(e)) => {
                    warn!("Rejected {field} = {}: {e}", self.params.describe(field));
                    self.panel.reject(&mut self.params, &e);
                }
                None => {}
            },
            PanelEvent::Reroll => {
                if let Some(Err(e)) = self.regenerate() {
                    warn!("Reroll failed: {e}");
                    self.panel.report(e.to_string());
                }
            }
            PanelEvent::SaveParameters => {
                if let Err(e) = self.config.save_parameters(&self.params, &self.config_dir) {
                    error!("Failed to save parameters: {e}");
                    self.panel.report(e.to_string());
                }
            }
            PanelEvent::ReloadConfig => self.reload_config(),
        }
    }

    fn regenerate(&mut self) -> Option<Result<(), GalaxyError>> {
        let viewer = self.viewer.as_mut()?;
        Some(viewer.lifecycle.regenerate(&self.params).map(|_| ()))
    }

    /// Pick up edits made to `config.ron` while running, regenerating once if
    /// the parameters or seed changed.
    fn reload_config(&mut self) {
        let mut new_config = match self.config.reload(&self.config_dir) {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!("Config unchanged");
                return;
            }
            Err(e) => {
                warn!("Config reload failed: {e}");
                self.panel.report(e.to_string());
                return;
            }
        };
        for clamp in new_config.clamp_parameters() {
            warn!("{clamp}");
        }

        let mut changed = new_config.galaxy.parameters != self.params;
        if let Some(seed) = new_config.galaxy.seed
            && new_config.galaxy.seed != self.config.galaxy.seed
        {
            self.seed = seed;
            if let Some(viewer) = self.viewer.as_mut() {
                viewer.lifecycle.reseed(seed);
            }
            changed = true;
        }
        self.params = new_config.galaxy.parameters.clone();
        self.config = new_config;

        if changed && let Some(Err(e)) = self.regenerate() {
            warn!("Reloaded parameters rejected: {e}");
            self.panel.report(e.to_string());
        }
    }

    fn refresh_title(&mut self) {
        let title = format!(
            "{} | {}",
            self.config.window.title,
            self.panel.status_line(&self.params)
        );
        if title != self.title
            && let Some(viewer) = &self.viewer
        {
            viewer.window.set_title(&title);
            self.title = title;
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.process_input();

        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        let Viewer {
            lifecycle,
            camera,
            orbit,
            surface,
            gpu,
            window,
        } = viewer;
        let mut host = FrameContext {
            window: &**window,
            gpu: &*gpu,
            surface: &*surface,
            camera,
            orbit,
            clear_color: self.config.render.clear_color,
        };

        match self.driver.activate(&self.params, lifecycle, &mut host) {
            FrameOutcome::Failed(e) => {
                self.fatal = Some(e.into());
                self.shutdown(event_loop);
                return;
            }
            FrameOutcome::Rendered
            | FrameOutcome::Skipped(_)
            | FrameOutcome::Ignored
            | FrameOutcome::Cancelled => {}
        }

        if let Some(rate) = self.frame_rate.sample(Instant::now(), self.driver.stats()) {
            debug!(
                "{:.1} fps ({} rendered, {} skipped)",
                rate.fps, rate.rendered, rate.skipped
            );
        }
    }

    fn apply_resize(&mut self, resize: SurfaceResizeEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        viewer.gpu.resize(resize.render.width, resize.render.height);
        viewer
            .camera
            .set_aspect_ratio(resize.physical.width as f32, resize.physical.height as f32);
        info!(
            "Resized to {}x{}, rendering at {}x{} (pixel ratio {:.2})",
            resize.physical.width,
            resize.physical.height,
            resize.render.width,
            resize.render.height,
            resize.pixel_ratio
        );
    }

    /// Stop the driver, then release the live cloud and the GPU.
    fn teardown(&mut self) {
        self.driver.stop();
        if let Some(mut viewer) = self.viewer.take() {
            viewer.lifecycle.clear();
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.teardown();
        event_loop.exit();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() || self.driver.is_stopped() {
            return;
        }

        let mut viewer = match self.open_viewer(event_loop) {
            Ok(viewer) => viewer,
            Err(e) => {
                error!("{e}");
                self.fatal = Some(e);
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = viewer.lifecycle.regenerate(&self.params) {
            warn!("Initial parameters rejected, starting empty: {e}");
            self.panel.report(e.to_string());
        }
        self.driver.start(&mut RedrawRequest(&viewer.window));
        self.viewer = Some(viewer);
        self.refresh_title();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                let resize = self
                    .viewer
                    .as_mut()
                    .and_then(|v| v.surface.handle_resize(size.width, size.height));
                if let Some(resize) = resize {
                    self.apply_resize(resize);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let resize = self.viewer.as_mut().map(|v| {
                    let inner = v.window.inner_size();
                    v.surface
                        .handle_scale_factor_changed(scale_factor, inner.width, inner.height)
                });
                if let Some(resize) = resize {
                    self.apply_resize(resize);
                }
            }
            WindowEvent::Focused(false) => self.keyboard.reset(),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.keyboard.set_modifiers(modifiers.state());
            }
            WindowEvent::KeyboardInput { event, .. } => self.keyboard.process_event(&event),
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => self.pointer.on_cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => self.pointer.on_button(button, state),
            WindowEvent::MouseWheel { delta, .. } => self.pointer.on_scroll(delta),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

/// Creates an event loop and runs the viewer until the window closes.
///
/// # Errors
///
/// Returns the error that stopped the viewer: event loop, window, or GPU
/// creation failure, or loss of the rendering surface.
#[instrument(skip_all)]
pub fn run(config: Config, config_dir: PathBuf) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::new(config, config_dir);
    event_loop.run_app(&mut app)?;
    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
