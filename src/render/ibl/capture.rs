use anyhow::Result;
use cgmath::{Matrix4, Point3, Vector3};

use crate::data::projection::{FLIP_Y_MATRIX, OPENGL_TO_WGPU_MATRIX};
use crate::render::geometry::{CubeGeometry, CubeVertex};
use crate::render::pipeline::{create_render_pipeline, BlendMode};
use crate::render::shader::{ShaderModulePackage, ShaderTemplateContext};

pub const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const CAPTURE_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Array layer order of a cube texture.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn layer(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "POSITIVE_X",
            CubeFace::NegativeX => "NEGATIVE_X",
            CubeFace::PositiveY => "POSITIVE_Y",
            CubeFace::NegativeY => "NEGATIVE_Y",
            CubeFace::PositiveZ => "POSITIVE_Z",
            CubeFace::NegativeZ => "NEGATIVE_Z",
        }
    }

    pub fn direction(self) -> Vector3<f32> {
        match self {
            CubeFace::PositiveX => Vector3::unit_x(),
            CubeFace::NegativeX => -Vector3::unit_x(),
            CubeFace::PositiveY => Vector3::unit_y(),
            CubeFace::NegativeY => -Vector3::unit_y(),
            CubeFace::PositiveZ => Vector3::unit_z(),
            CubeFace::NegativeZ => -Vector3::unit_z(),
        }
    }

    pub fn up(self) -> Vector3<f32> {
        match self {
            CubeFace::PositiveY => Vector3::unit_z(),
            CubeFace::NegativeY => -Vector3::unit_z(),
            _ => -Vector3::unit_y(),
        }
    }
}

/// The shared capture projection and one view matrix per cube face.
#[derive(Clone, Copy, Debug)]
pub struct CaptureTransforms {
    pub projection: Matrix4<f32>,
    pub views: [Matrix4<f32>; 6],
}

impl Default for CaptureTransforms {
    fn default() -> Self {
        let projection = FLIP_Y_MATRIX
            * OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(cgmath::Deg(90.0), 1.0, 0.1, 10.0);

        let views = CubeFace::ALL.map(|face| {
            let eye = Point3::new(0.0, 0.0, 0.0);
            Matrix4::look_at_rh(eye, eye + face.direction(), face.up())
        });

        Self { projection, views }
    }
}

impl CaptureTransforms {
    pub fn uniform(&self, face: CubeFace, roughness: f32) -> CaptureUniform {
        CaptureUniform {
            projection: self.projection.into(),
            view: self.views[face as usize].into(),
            roughness,
            _padding: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CaptureUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub roughness: f32,
    _padding: [f32; 3],
}

/// Scratch depth attachment shared by every capture pass. It follows the
/// extent of the pass being recorded.
pub struct CaptureTarget {
    gpu_depth_texture: wgpu::Texture,
    gpu_depth_texture_view: wgpu::TextureView,
    extent: u32,
}

impl CaptureTarget {
    pub fn new(device: &wgpu::Device, extent: u32) -> Self {
        let (gpu_depth_texture, gpu_depth_texture_view) =
            CaptureTarget::create_depth_texture(device, extent);

        Self {
            gpu_depth_texture,
            gpu_depth_texture_view,
            extent,
        }
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    pub fn resize(&mut self, device: &wgpu::Device, extent: u32) {
        if self.extent == extent {
            return;
        }

        log::debug!("Resizing capture target from {} to {extent}", self.extent);

        let (gpu_depth_texture, gpu_depth_texture_view) =
            CaptureTarget::create_depth_texture(device, extent);

        self.gpu_depth_texture.destroy();
        self.gpu_depth_texture = gpu_depth_texture;
        self.gpu_depth_texture_view = gpu_depth_texture_view;
        self.extent = extent;
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.gpu_depth_texture_view
    }

    fn create_depth_texture(device: &wgpu::Device, extent: u32) -> (wgpu::Texture, wgpu::TextureView) {
        let gpu_depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("CAPTURE_DEPTH_TEXTURE"),
            size: wgpu::Extent3d {
                width: extent,
                height: extent,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CAPTURE_DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let gpu_depth_texture_view =
            gpu_depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        (gpu_depth_texture, gpu_depth_texture_view)
    }
}

/// A single face and mip level of a cube texture, viewed as a 2D target.
pub fn create_face_view(
    gpu_texture: &wgpu::Texture,
    face: CubeFace,
    mip_level: u32,
    name: &str,
) -> wgpu::TextureView {
    gpu_texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(&format!("{name}_{}_MIP_{mip_level}_TEXTURE_VIEW", face.name())),
        format: Some(gpu_texture.format()),
        dimension: Some(wgpu::TextureViewDimension::D2),
        aspect: wgpu::TextureAspect::All,
        base_mip_level: mip_level,
        mip_level_count: Some(1),
        base_array_layer: face.layer(),
        array_layer_count: Some(1),
    })
}

/// Renders the inside of the unit cube into one cube face, sampling a source
/// texture through a stage specific fragment shader.
pub struct CaptureRenderer {
    name: String,
    device: std::rc::Rc<wgpu::Device>,
    queue: std::rc::Rc<wgpu::Queue>,
    gpu_pipeline: wgpu::RenderPipeline,
    source_bind_group_layout: wgpu::BindGroupLayout,
    gpu_capture_uniform_buffer: wgpu::Buffer,
    gpu_capture_bind_group: wgpu::BindGroup,
}

impl CaptureRenderer {
    pub fn from_device(
        name: &str,
        fragment_template_name: &str,
        source_view_dimension: wgpu::TextureViewDimension,
        device: std::rc::Rc<wgpu::Device>,
        queue: std::rc::Rc<wgpu::Queue>,
        tera: &tera::Tera,
        shader_template_context: &ShaderTemplateContext,
    ) -> Result<Self> {
        let capture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{name}_CAPTURE_BIND_GROUP_LAYOUT")),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let source_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{name}_SOURCE_BIND_GROUP_LAYOUT")),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: source_view_dimension,
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

        let shader_module_package = ShaderModulePackage::from_templates(
            "ibl/cubemap.vert",
            fragment_template_name,
            name,
            &device,
            tera,
            shader_template_context,
        )?;

        let gpu_pipeline = create_render_pipeline(
            name,
            &device,
            &[&capture_bind_group_layout, &source_bind_group_layout],
            &shader_module_package,
            &[CubeVertex::layout()],
            CAPTURE_FORMAT,
            BlendMode::Replace,
            wgpu::PrimitiveTopology::TriangleList,
            None,
            Some(wgpu::DepthStencilState {
                format: CAPTURE_DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
        )?;

        let gpu_capture_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{name}_CAPTURE_UNIFORM_BUFFER")),
            size: std::mem::size_of::<CaptureUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let gpu_capture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{name}_CAPTURE_BIND_GROUP")),
            layout: &capture_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: gpu_capture_uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            name: String::from(name),
            device,
            queue,
            gpu_pipeline,
            source_bind_group_layout,
            gpu_capture_uniform_buffer,
            gpu_capture_bind_group,
        })
    }

    pub fn create_source_bind_group(
        &self,
        source_view: &wgpu::TextureView,
        source_sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}_SOURCE_BIND_GROUP", self.name)),
            layout: &self.source_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(source_sampler),
                },
            ],
        })
    }

    /// Records and submits one face capture. The uniform write is submitted
    /// together with the pass so later captures cannot overwrite it first.
    #[allow(clippy::too_many_arguments)]
    pub fn capture_face(
        &self,
        capture_uniform: CaptureUniform,
        source_bind_group: &wgpu::BindGroup,
        target_texture: &wgpu::Texture,
        face: CubeFace,
        mip_level: u32,
        capture_target: &CaptureTarget,
        cube: &CubeGeometry,
    ) {
        self.queue.write_buffer(
            &self.gpu_capture_uniform_buffer,
            0,
            bytemuck::cast_slice(&[capture_uniform]),
        );

        let target_view = create_face_view(target_texture, face, mip_level, &self.name);
        let extent = capture_target.extent() as f32;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&format!("{}_{}_COMMAND_ENCODER", self.name, face.name())),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&format!("{}_{}_RENDER_PASS", self.name, face.name())),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: capture_target.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_viewport(0.0, 0.0, extent, extent, 0.0, 1.0);
            render_pass.set_pipeline(&self.gpu_pipeline);
            render_pass.set_bind_group(0, &self.gpu_capture_bind_group, &[]);
            render_pass.set_bind_group(1, source_bind_group, &[]);
            cube.draw(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
