use crate::buffer_util::{self, SizedBuffer};
use crate::error::DriftError;
use crate::geometry::{self, Vertex};
use crate::shader_utils::{self, ParticleShaders};
use crate::sim_config::DomainInput;
use crate::wind::Velocity;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Column-major 4x4 matrix as laid out in the storage buffers.
pub type Matrix = [f32; 16];

/// Byte sizes of every buffer the pipelines use. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSizes {
    pub vertex: wgpu::BufferAddress,
    pub index: wgpu::BufferAddress,
    pub model: wgpu::BufferAddress,
    pub mvp: wgpu::BufferAddress,
    pub velocity: wgpu::BufferAddress,
    pub projection: wgpu::BufferAddress,
    pub domain_input: wgpu::BufferAddress,
}

impl BufferSizes {
    pub fn for_capacity(capacity: u32, vertex_count: u32, index_count: u32) -> Self {
        BufferSizes {
            vertex: buffer_util::array_size::<Vertex>(vertex_count),
            index: buffer_util::array_size::<u16>(index_count),
            model: buffer_util::array_size::<Matrix>(capacity),
            mvp: buffer_util::array_size::<Matrix>(capacity),
            velocity: buffer_util::array_size::<Velocity>(capacity),
            projection: buffer_util::array_size::<Matrix>(1),
            domain_input: buffer_util::array_size::<DomainInput>(1),
        }
    }
}

pub struct ParticleBuffers {
    pub capacity: u32,
    pub vertex: SizedBuffer,
    pub index: SizedBuffer,
    pub index_count: u32,
    pub model: SizedBuffer,
    pub mvp: SizedBuffer,
    pub velocity: SizedBuffer,
    pub projection: SizedBuffer,
    pub domain_input: SizedBuffer,
}

impl ParticleBuffers {
    pub fn new(device: &wgpu::Device, capacity: u32) -> Self {
        let (vertex_data, index_data) = geometry::create_box();
        let vertex = buffer_util::make_init_buffer(
            device,
            "Box vertex buffer",
            &vertex_data,
            wgpu::BufferUsages::VERTEX,
        );
        let index = buffer_util::make_init_buffer(
            device,
            "Box index buffer",
            &index_data,
            wgpu::BufferUsages::INDEX,
        );

        let model = buffer_util::make_storage_buffer(
            device,
            buffer_util::array_size::<Matrix>(capacity),
            "Model matrix storage",
        );
        let mvp = buffer_util::make_storage_buffer(
            device,
            buffer_util::array_size::<Matrix>(capacity),
            "MVP matrix storage",
        );
        let velocity = buffer_util::make_storage_buffer(
            device,
            buffer_util::array_size::<Velocity>(capacity),
            "Velocity storage",
        );
        let domain_input = buffer_util::make_storage_buffer(
            device,
            buffer_util::array_size::<DomainInput>(1),
            "Domain input storage",
        );
        let projection = buffer_util::make_uniform_buffer::<Matrix>(
            device,
            "Projection uniform buffer",
            &[0.0; 16],
        );
        log::info!(
            "Allocated particle buffers for {} particles ({} bytes of storage)",
            capacity,
            model.size + mvp.size + velocity.size
        );

        ParticleBuffers {
            capacity,
            vertex,
            index,
            index_count: index_data.len() as u32,
            model,
            mvp,
            velocity,
            projection,
            domain_input,
        }
    }

    pub fn sizes(&self) -> BufferSizes {
        BufferSizes {
            vertex: self.vertex.size,
            index: self.index.size,
            model: self.model.size,
            mvp: self.mvp.size,
            velocity: self.velocity.size,
            projection: self.projection.size,
            domain_input: self.domain_input.size,
        }
    }

    pub fn write_projection(&self, queue: &wgpu::Queue, projection: &Matrix) {
        queue.write_buffer(&self.projection.buffer, 0, bytemuck::cast_slice(projection));
    }

    pub fn write_domain_input(&self, queue: &wgpu::Queue, input: &DomainInput) {
        queue.write_buffer(&self.domain_input.buffer, 0, bytemuck::bytes_of(input));
    }

    /// Rewrites only the leading count field of the domain input.
    pub fn write_active_count(&self, queue: &wgpu::Queue, active_count: u32) {
        queue.write_buffer(
            &self.domain_input.buffer,
            0,
            &DomainInput::count_bytes(active_count),
        );
    }
}

pub struct DepthTarget {
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl DepthTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        DepthTarget {
            texture,
            view,
            width,
            height,
        }
    }
}

fn buffer_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    ty: wgpu::BufferBindingType,
    buffer: &SizedBuffer,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(buffer.size),
        },
        count: None,
    }
}

const READ_ONLY: wgpu::BufferBindingType = wgpu::BufferBindingType::Storage { read_only: true };
const READ_WRITE: wgpu::BufferBindingType = wgpu::BufferBindingType::Storage { read_only: false };

/// Compute and render pipelines plus every GPU resource they share.
pub struct ParticlePipelines {
    pub buffers: ParticleBuffers,
    pub depth: DepthTarget,
    pub color_format: wgpu::TextureFormat,
    pub render_pipeline: wgpu::RenderPipeline,
    pub render_bind_group: wgpu::BindGroup,
    pub compute_pipeline: wgpu::ComputePipeline,
    pub compute_bind_group: wgpu::BindGroup,
}

impl ParticlePipelines {
    /// Builds everything at once. Validation failures surface here as
    /// `DriftError::Pipeline` rather than later at submission.
    pub fn init(
        device: &wgpu::Device,
        shaders: &dyn ParticleShaders,
        color_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        capacity: u32,
    ) -> Result<Self, DriftError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipelines = ParticlePipelines::build(
            device,
            shaders,
            color_format,
            width,
            height,
            capacity,
        );
        if let Some(error) = futures::executor::block_on(device.pop_error_scope()) {
            log::error!("Pipeline validation failed: {}", error);
            return Err(DriftError::Pipeline(error.to_string()));
        }
        Ok(pipelines)
    }

    fn build(
        device: &wgpu::Device,
        shaders: &dyn ParticleShaders,
        color_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        capacity: u32,
    ) -> Self {
        let buffers = ParticleBuffers::new(device, capacity);
        let depth = DepthTarget::new(device, width, height);

        // Render stage: reads the mvp matrices by instance index.
        let render_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle render layout"),
            entries: &[buffer_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                READ_ONLY,
                &buffers.mvp,
            )],
        });
        let render_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Group for render pass"),
            layout: &render_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffers.mvp.buffer.as_entire_binding(),
            }],
        });

        let render_module =
            shader_utils::create_module(device, "Particle render shader", shaders.render_source());
        let vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: geometry::VERTEX_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position.
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                // Normal.
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: geometry::NORMAL_OFFSET,
                    shader_location: 1,
                },
                // Texture coordinate.
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: geometry::UV_OFFSET,
                    shader_location: 2,
                },
            ],
        }];
        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Particle render pipeline layout"),
                bind_group_layouts: &[&render_bgl],
                push_constant_ranges: &[],
            });
        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle render pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &render_module,
                entry_point: shaders.vertex_entry_point(),
                buffers: &vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &render_module,
                entry_point: shaders.fragment_entry_point(),
                targets: &[color_format.into()],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        // Compute stage. The binding order is the contract with the kernel.
        let compute_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle compute layout"),
            entries: &[
                // Active count and domain bounds
                buffer_entry(
                    0,
                    wgpu::ShaderStages::COMPUTE,
                    READ_ONLY,
                    &buffers.domain_input,
                ),
                // Velocities
                buffer_entry(1, wgpu::ShaderStages::COMPUTE, READ_ONLY, &buffers.velocity),
                // Model matrices
                buffer_entry(2, wgpu::ShaderStages::COMPUTE, READ_WRITE, &buffers.model),
                // View-projection
                buffer_entry(
                    3,
                    wgpu::ShaderStages::COMPUTE,
                    wgpu::BufferBindingType::Uniform,
                    &buffers.projection,
                ),
                // MVP matrices
                buffer_entry(4, wgpu::ShaderStages::COMPUTE, READ_WRITE, &buffers.mvp),
            ],
        });
        let compute_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Group for compute pass"),
            layout: &compute_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.domain_input.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.velocity.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffers.model.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: buffers.projection.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: buffers.mvp.buffer.as_entire_binding(),
                },
            ],
        });

        let compute_module = shader_utils::create_module(
            device,
            "Particle compute shader",
            shaders.compute_source(),
        );
        let compute_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Particle compute pipeline layout"),
                bind_group_layouts: &[&compute_bgl],
                push_constant_ranges: &[],
            });
        let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Particle compute pipeline"),
            layout: Some(&compute_pipeline_layout),
            module: &compute_module,
            entry_point: shaders.compute_entry_point(),
        });

        ParticlePipelines {
            buffers,
            depth,
            color_format,
            render_pipeline,
            render_bind_group,
            compute_pipeline,
            compute_bind_group,
        }
    }

    /// Releases the old depth target and allocates one at the new size.
    /// Particle buffers are left alone.
    pub fn recreate_depth_target(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let old = std::mem::replace(&mut self.depth, DepthTarget::new(device, width, height));
        old.texture.destroy();
    }
}
