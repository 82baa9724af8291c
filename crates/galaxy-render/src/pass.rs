//! Per-frame command encoding.
//!
//! [`RenderPassBuilder`] configures a color-only pass; [`FrameEncoder`] owns
//! the command encoder and surface texture for one frame and presents it.

use std::sync::Arc;

use galaxy_core::{Rgb, srgb_to_linear};

/// Builder for a color-only render pass.
#[derive(Debug)]
pub struct RenderPassBuilder {
    clear_color: wgpu::Color,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPassBuilder {
    /// A pass that clears to opaque black.
    pub fn new() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            label: None,
        }
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Clear to an sRGB color, converted to the linear value the surface expects.
    pub fn clear_rgb(self, color: Rgb) -> Self {
        let linear = |c: f32| f64::from(srgb_to_linear(c));
        self.clear_color(wgpu::Color {
            r: linear(color.r),
            g: linear(color.g),
            b: linear(color.b),
            a: 1.0,
        })
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    fn create_render_pass<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        color_view: &'encoder wgpu::TextureView,
    ) -> wgpu::RenderPass<'encoder> {
        let color_attachment = wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(self.clear_color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        };

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// Command encoder and surface texture for one frame.
pub struct FrameEncoder {
    encoder: Option<wgpu::CommandEncoder>,
    queue: Arc<wgpu::Queue>,
    surface_texture: Option<wgpu::SurfaceTexture>,
    surface_view: wgpu::TextureView,
}

impl FrameEncoder {
    pub fn new(
        device: &wgpu::Device,
        queue: Arc<wgpu::Queue>,
        surface_texture: wgpu::SurfaceTexture,
    ) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame-encoder"),
        });

        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            encoder: Some(encoder),
            queue,
            surface_texture: Some(surface_texture),
            surface_view,
        }
    }

    /// Begin a render pass targeting the surface. `None` once submitted.
    pub fn begin_render_pass<'a>(
        &'a mut self,
        builder: &'a RenderPassBuilder,
    ) -> Option<wgpu::RenderPass<'a>> {
        let encoder = self.encoder.as_mut()?;
        Some(builder.create_render_pass(encoder, &self.surface_view))
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Submit the command buffer and present the surface texture.
    pub fn submit(mut self) {
        self.finish();
    }

    fn finish(&mut self) -> bool {
        match (self.encoder.take(), self.surface_texture.take()) {
            (Some(encoder), Some(surface_texture)) => {
                self.queue.submit([encoder.finish()]);
                surface_texture.present();
                true
            }
            _ => false,
        }
    }
}

impl Drop for FrameEncoder {
    fn drop(&mut self) {
        if self.finish() {
            log::warn!("FrameEncoder dropped without explicit submit() - auto-submitting");
        }
    }
}
