use anyhow::Result;

use crate::data::viewport::Viewport;
use crate::render::shader::ShaderModulePackage;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    tex_coord: [f32; 2],
}

// Counter-clockwise from the bottom-left corner.
const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, -1.0],
        tex_coord: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
        tex_coord: [1.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
        tex_coord: [1.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, 1.0],
        tex_coord: [0.0, 1.0],
    },
];

// Triangle fan over the four corners.
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Draws a single textured quad filling the current viewport.
pub struct QuadRenderer {
    device: std::rc::Rc<wgpu::Device>,
    gpu_pipeline: wgpu::RenderPipeline,
    gpu_vertex_buffer: wgpu::Buffer,
    gpu_index_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl QuadRenderer {
    pub fn from_device(
        device: std::rc::Rc<wgpu::Device>,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        tera: &tera::Tera,
    ) -> Result<Self> {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("QUAD_BIND_GROUP_LAYOUT"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("QUAD_RENDER_PIPELINE_LAYOUT"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let shader_module_package = ShaderModulePackage::from_templates(
            "quad/quad.vert",
            "quad/quad.frag",
            "QUAD",
            &device,
            tera,
        )?;

        let gpu_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("QUAD_RENDER_PIPELINE"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module_package.vertex_shader_module,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x2,
                        },
                        wgpu::VertexAttribute {
                            offset: (2 * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32x2,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module_package.fragment_shader_module,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent::REPLACE,
                        alpha: wgpu::BlendComponent::REPLACE,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let gpu_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("QUAD_VERTEX_BUFFER"),
            size: std::mem::size_of_val(&QUAD_VERTICES) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let gpu_index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("QUAD_INDEX_BUFFER"),
            size: std::mem::size_of_val(&QUAD_INDICES) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        queue.write_buffer(&gpu_vertex_buffer, 0, bytemuck::cast_slice(&QUAD_VERTICES));
        queue.write_buffer(&gpu_index_buffer, 0, bytemuck::cast_slice(&QUAD_INDICES));
        queue.submit([]);

        Ok(Self {
            device,
            gpu_pipeline,
            gpu_vertex_buffer,
            gpu_index_buffer,
            bind_group_layout,
        })
    }

    pub fn create_bind_group(
        &self,
        texture_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        name: &str,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{name}_BIND_GROUP")),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    pub fn render_quad(
        &self,
        bind_group: &wgpu::BindGroup,
        viewport: Viewport,
        render_pass: &mut wgpu::RenderPass,
    ) {
        render_pass.set_viewport(
            viewport.x as f32,
            viewport.y as f32,
            viewport.width as f32,
            viewport.height as f32,
            0.0,
            1.0,
        );
        render_pass.set_pipeline(&self.gpu_pipeline);
        render_pass.set_vertex_buffer(0, self.gpu_vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.gpu_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
    }
}
