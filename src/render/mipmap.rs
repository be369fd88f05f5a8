use std::collections::HashMap;

use anyhow::Result;

use crate::error::Error;
use crate::render::pipeline::{create_render_pipeline, BlendMode};
use crate::render::shader::{ShaderModulePackage, ShaderTemplateContext};

/// Formats the generator keeps a downsample pipeline for.
pub const MIPMAP_FORMATS: [wgpu::TextureFormat; 3] = [
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba8UnormSrgb,
    wgpu::TextureFormat::Rgba8Unorm,
];

/// Fills mip levels 1.. of every array layer by repeatedly blitting the
/// previous level with linear filtering.
pub struct MipmapGenerator {
    device: std::rc::Rc<wgpu::Device>,
    queue: std::rc::Rc<wgpu::Queue>,
    bind_group_layout: wgpu::BindGroupLayout,
    gpu_sampler: wgpu::Sampler,
    gpu_pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

impl MipmapGenerator {
    pub fn from_device(
        device: std::rc::Rc<wgpu::Device>,
        queue: std::rc::Rc<wgpu::Queue>,
        tera: &tera::Tera,
        shader_template_context: &ShaderTemplateContext,
    ) -> Result<Self> {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("MIPMAP_BIND_GROUP_LAYOUT"),
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

        let shader_module_package = ShaderModulePackage::from_templates(
            "mipmap/downsample.vert",
            "mipmap/downsample.frag",
            "MIPMAP",
            &device,
            tera,
            shader_template_context,
        )?;

        let mut gpu_pipelines = HashMap::new();

        for format in MIPMAP_FORMATS {
            let gpu_pipeline = create_render_pipeline(
                &format!("MIPMAP_{format:?}"),
                &device,
                &[&bind_group_layout],
                &shader_module_package,
                &[],
                format,
                BlendMode::Replace,
                wgpu::PrimitiveTopology::TriangleList,
                None,
                None,
            )?;

            gpu_pipelines.insert(format, gpu_pipeline);
        }

        let gpu_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("MIPMAP_SAMPLER"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            device,
            queue,
            bind_group_layout,
            gpu_sampler,
            gpu_pipelines,
        })
    }

    pub fn generate_mipmaps(&self, gpu_texture: &wgpu::Texture, name: &str) -> Result<()> {
        let gpu_pipeline = match self.gpu_pipelines.get(&gpu_texture.format()) {
            Some(gpu_pipeline) => gpu_pipeline,
            None => {
                return Err(Error::invalid_configuration(format!(
                    "Mipmaps cannot be generated for {name} with format {:?}",
                    gpu_texture.format()
                ))
                .into())
            }
        };

        let mip_level_count = gpu_texture.mip_level_count();
        if mip_level_count < 2 {
            return Ok(());
        }

        log::debug!("Generating {mip_level_count} mip levels for {name}");

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&format!("{name}_MIPMAP_COMMAND_ENCODER")),
            });

        for layer in 0..gpu_texture.depth_or_array_layers() {
            for mip_level in 1..mip_level_count {
                let source_view = MipmapGenerator::create_level_view(gpu_texture, layer, mip_level - 1);
                let target_view = MipmapGenerator::create_level_view(gpu_texture, layer, mip_level);

                let gpu_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{name}_MIPMAP_BIND_GROUP")),
                    layout: &self.bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&source_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.gpu_sampler),
                        },
                    ],
                });

                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(&format!("{name}_MIPMAP_RENDER_PASS")),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

                render_pass.set_pipeline(gpu_pipeline);
                render_pass.set_bind_group(0, &gpu_bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        Ok(())
    }

    fn create_level_view(gpu_texture: &wgpu::Texture, layer: u32, mip_level: u32) -> wgpu::TextureView {
        gpu_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("MIPMAP_LEVEL_TEXTURE_VIEW"),
            format: Some(gpu_texture.format()),
            dimension: Some(wgpu::TextureViewDimension::D2),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: mip_level,
            mip_level_count: Some(1),
            base_array_layer: layer,
            array_layer_count: Some(1),
        })
    }
}
