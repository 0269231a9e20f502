//! Accelerated wgpu rendering backend.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::{Backend, FrameParams, ParticleRenderer, RenderError};
use crate::core::Context;
use crate::particles::{Particle, ParticleInstance};

/// Per-frame uniform data.
/// Layout matches `FieldUniform` in `shaders/particles.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct FieldUniform {
    /// Surface resolution in backing-store pixels.
    resolution: [f32; 2],
    /// Pointer position in backing-store pixels.
    mouse: [f32; 2],
    /// Simulation time in seconds.
    time: f32,
    /// Glow toggle (0 or 1).
    glow: f32,
    /// Padding to 32 bytes.
    _padding: [f32; 2],
}

/// The accelerated backend: one instanced triangle-strip draw call for the
/// whole population, four attribute streams packed into one instance buffer.
pub struct GpuRenderer {
    context: Context,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instance_count: u32,
}

impl GpuRenderer {
    /// Build the point-sprite pipeline on the given context.
    ///
    /// Shader and pipeline creation run inside a validation error scope;
    /// a captured error is returned so the caller can fall back to the
    /// software backend instead of crashing on a poisoned device.
    pub async fn new(context: Context) -> Result<Self, wgpu::Error> {
        let device = &context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Field Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/particles.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Field Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Field Uniform Buffer"),
            contents: bytemuck::cast_slice(&[FieldUniform::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Field Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Field Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        // Premultiplied alpha over the page content behind the surface.
        let blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Field Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ParticleInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2, // position
                        1 => Float32x3, // color
                        2 => Float32,   // size
                        3 => Float32,   // alpha
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: context.surface_format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let instance_buffer = Self::create_instance_buffer(device, 1);

        if let Some(error) = device.pop_error_scope().await {
            log::warn!("particle pipeline failed validation: {error}");
            return Err(error);
        }

        Ok(Self {
            context,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            instance_buffer,
            instance_capacity: 1,
            instance_count: 0,
        })
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Instance Buffer"),
            size: (capacity * std::mem::size_of::<ParticleInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

impl ParticleRenderer for GpuRenderer {
    fn upload(&mut self, particles: &[Particle]) {
        let instances: Vec<ParticleInstance> =
            particles.iter().map(ParticleInstance::from).collect();

        // Grow-only: bursts push the count above the steady population for
        // a couple of seconds, so keep the larger buffer around.
        if instances.len() > self.instance_capacity {
            let capacity = instances.len().next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(&self.context.device, capacity);
            self.instance_capacity = capacity;
        }

        if !instances.is_empty() {
            self.context
                .queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        self.instance_count = instances.len() as u32;
    }

    fn render(&mut self, params: &FrameParams) -> Result<(), RenderError> {
        let uniform = FieldUniform {
            resolution: [self.context.width as f32, self.context.height as f32],
            mouse: params.mouse,
            time: params.time,
            glow: if params.glow { 1.0 } else { 0.0 },
            _padding: [0.0; 2],
        };
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));

        let output = match self.context.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                // Skip this frame; the reconfigured surface serves the next one.
                self.context.reconfigure();
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.context.create_command_encoder();
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particle Field Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if self.instance_count > 0 {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
                render_pass.draw(0..4, 0..self.instance_count);
            }
        }

        self.context.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    fn backend(&self) -> Backend {
        Backend::Gpu
    }
}
