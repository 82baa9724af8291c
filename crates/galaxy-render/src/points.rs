//! Point-sprite rendering: each point is an instanced camera-facing quad whose
//! pixel footprint follows the point material (size, distance attenuation).
//!
//! [`GpuPointBackend`] is the wgpu implementation of the core's
//! [`SceneBackend`].

use std::collections::BTreeSet;
use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use galaxy_core::{
    PointBlending, PointCloudBuffers, PointCloudHandle, PointCloudId, PointStyle, SceneBackend,
};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::surface::PhysicalSize;

/// Smallest on-screen footprint of a point, in physical pixels.
pub const MIN_POINT_PIXELS: f32 = 1.0;

/// Vertices per point quad (two triangles).
const QUAD_VERTICES: u32 = 6;

/// Per-instance data: one entry per point.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    /// Linear-light color in `[0, 1]`.
    pub color: [f32; 3],
}

impl PointInstance {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    /// Zip flat position and color buffers into instances.
    pub fn interleave(buffers: &PointCloudBuffers) -> Vec<PointInstance> {
        buffers
            .positions
            .chunks_exact(3)
            .zip(buffers.colors.chunks_exact(3))
            .map(|(p, c)| PointInstance {
                position: [p[0], p[1], p[2]],
                color: [c[0], c[1], c[2]],
            })
            .collect()
    }
}

/// Uniform block shared by every point of one cloud.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// Render target size in physical pixels.
    pub viewport: [f32; 2],
    pub size: f32,
    pub pixel_ratio: f32,
    /// 1.0 when size shrinks with distance, 0.0 otherwise.
    pub attenuation: f32,
    pub min_pixels: f32,
    pub _padding: [f32; 2],
}

impl PointUniform {
    pub fn new(
        camera: &Camera,
        rotation_y: f32,
        style: &PointStyle,
        viewport: PhysicalSize,
        pixel_ratio: f32,
    ) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            model: Mat4::from_rotation_y(rotation_y).to_cols_array_2d(),
            viewport: [viewport.width.max(1) as f32, viewport.height.max(1) as f32],
            size: style.size,
            pixel_ratio,
            attenuation: if style.size_attenuation { 1.0 } else { 0.0 },
            min_pixels: MIN_POINT_PIXELS,
            _padding: [0.0; 2],
        }
    }
}

/// Render pipelines for each blending mode, sharing one bind group layout.
pub struct PointPipelines {
    pub additive: wgpu::RenderPipeline,
    pub normal: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl PointPipelines {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("point-shader"),
            source: wgpu::ShaderSource::Wgsl(POINT_SHADER_SOURCE.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("point-bind-group-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<PointUniform>() as u64),
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("point-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let additive_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };

        let additive = create_pipeline(
            device,
            &layout,
            &shader,
            surface_format,
            additive_blend,
            "point-pipeline-additive",
        );
        let normal = create_pipeline(
            device,
            &layout,
            &shader,
            surface_format,
            wgpu::BlendState::ALPHA_BLENDING,
            "point-pipeline-normal",
        );

        Self {
            additive,
            normal,
            bind_group_layout,
        }
    }

    pub fn for_blending(&self, blending: PointBlending) -> &wgpu::RenderPipeline {
        match blending {
            PointBlending::Additive => &self.additive,
            PointBlending::Normal => &self.normal,
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    label: &'static str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[PointInstance::LAYOUT],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        // Points never write depth; no depth attachment.
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

/// Uploaded instance buffer for one cloud.
pub struct GpuPointGeometry {
    buffer: wgpu::Buffer,
    point_count: u32,
}

impl GpuPointGeometry {
    pub fn point_count(&self) -> u32 {
        self.point_count
    }
}

/// Uniform buffer and bind group for one cloud's material.
pub struct GpuPointMaterial {
    style: PointStyle,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuPointMaterial {
    pub fn style(&self) -> &PointStyle {
        &self.style
    }
}

/// wgpu-backed scene holding point clouds.
pub struct GpuPointBackend {
    device: wgpu::Device,
    queue: Arc<wgpu::Queue>,
    pipelines: PointPipelines,
    scene: BTreeSet<PointCloudId>,
    live_geometries: usize,
    live_materials: usize,
}

impl GpuPointBackend {
    pub fn new(
        device: wgpu::Device,
        queue: Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let pipelines = PointPipelines::new(&device, surface_format);
        Self {
            device,
            queue,
            pipelines,
            scene: BTreeSet::new(),
            live_geometries: 0,
            live_materials: 0,
        }
    }

    /// Whether `id` is currently attached to the scene.
    pub fn contains(&self, id: PointCloudId) -> bool {
        self.scene.contains(&id)
    }

    /// Number of clouds attached to the scene.
    pub fn scene_len(&self) -> usize {
        self.scene.len()
    }

    /// Geometries and materials created but not yet disposed.
    pub fn live_resources(&self) -> (usize, usize) {
        (self.live_geometries, self.live_materials)
    }

    /// Upload this frame's uniforms for `handle`.
    pub fn prepare(
        &self,
        handle: &PointCloudHandle<Self>,
        camera: &Camera,
        viewport: PhysicalSize,
        pixel_ratio: f32,
    ) {
        let material = handle.material();
        let uniform = PointUniform::new(
            camera,
            handle.rotation_y,
            &material.style,
            viewport,
            pixel_ratio,
        );
        self.queue
            .write_buffer(&material.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Record the draw for `handle` if it is attached to the scene.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, handle: &PointCloudHandle<Self>) {
        if !self.contains(handle.id()) {
            return;
        }
        let geometry = handle.geometry();
        let material = handle.material();
        pass.set_pipeline(self.pipelines.for_blending(material.style.blending));
        pass.set_bind_group(0, &material.bind_group, &[]);
        pass.set_vertex_buffer(0, geometry.buffer.slice(..));
        pass.draw(0..QUAD_VERTICES, 0..geometry.point_count);
    }
}

impl SceneBackend for GpuPointBackend {
    type Geometry = GpuPointGeometry;
    type Material = GpuPointMaterial;

    fn create_geometry(&mut self, buffers: PointCloudBuffers) -> GpuPointGeometry {
        let instances = PointInstance::interleave(&buffers);
        drop(buffers);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("point-instances"),
                contents: bytemuck::cast_slice(&instances),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.live_geometries += 1;
        log::debug!(
            "Uploaded {} points ({} KiB)",
            instances.len(),
            std::mem::size_of_val(instances.as_slice()) / 1024
        );
        GpuPointGeometry {
            buffer,
            point_count: instances.len() as u32,
        }
    }

    fn create_material(&mut self, style: &PointStyle) -> GpuPointMaterial {
        let uniform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("point-uniforms"),
            size: std::mem::size_of::<PointUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("point-bind-group"),
            layout: &self.pipelines.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        self.live_materials += 1;
        GpuPointMaterial {
            style: *style,
            uniform_buffer,
            bind_group,
        }
    }

    fn add_to_scene(
        &mut self,
        id: PointCloudId,
        _geometry: &GpuPointGeometry,
        _material: &GpuPointMaterial,
    ) {
        self.scene.insert(id);
    }

    fn remove_from_scene(&mut self, id: PointCloudId) {
        self.scene.remove(&id);
    }

    fn dispose_geometry(&mut self, geometry: GpuPointGeometry) {
        geometry.buffer.destroy();
        self.live_geometries = self.live_geometries.saturating_sub(1);
    }

    fn dispose_material(&mut self, material: GpuPointMaterial) {
        material.uniform_buffer.destroy();
        self.live_materials = self.live_materials.saturating_sub(1);
    }
}

/// WGSL for instanced point quads.
pub const POINT_SHADER_SOURCE: &str = r#"
struct PointUniform {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    viewport: vec2<f32>,
    size: f32,
    pixel_ratio: f32,
    attenuation: f32,
    min_pixels: f32,
    _padding: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> u: PointUniform;

struct InstanceInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, instance: InstanceInput) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );

    var clip = u.view_proj * u.model * vec4<f32>(instance.position, 1.0);

    // Diameter in physical pixels.
    var pixels = u.size * u.pixel_ratio;
    if (u.attenuation > 0.5) {
        pixels = u.size * 0.5 * u.viewport.y / max(clip.w, 1e-4);
    }
    pixels = max(pixels, u.min_pixels);

    let offset = corners[vertex_index] * pixels / u.viewport;
    clip = vec4<f32>(clip.xy + offset * clip.w, clip.z, clip.w);

    var out: VertexOutput;
    out.clip_position = clip;
    out.color = instance.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;
