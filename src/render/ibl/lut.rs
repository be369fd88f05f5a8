use anyhow::Result;

use crate::render::geometry::{QuadGeometry, QuadVertex};
use crate::render::pipeline::{create_render_pipeline, BlendMode};
use crate::render::shader::{ShaderModulePackage, ShaderTemplateContext};

pub const BRDF_LUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;

/// Split sum scale (red) and bias (green) indexed by (NdotV, roughness).
pub struct BrdfLut {
    pub gpu_texture: wgpu::Texture,
    pub gpu_texture_view: wgpu::TextureView,
}

pub struct BrdfLutRenderer {
    device: std::rc::Rc<wgpu::Device>,
    queue: std::rc::Rc<wgpu::Queue>,
    gpu_pipeline: wgpu::RenderPipeline,
}

impl BrdfLutRenderer {
    pub fn from_device(
        device: std::rc::Rc<wgpu::Device>,
        queue: std::rc::Rc<wgpu::Queue>,
        tera: &tera::Tera,
        shader_template_context: &ShaderTemplateContext,
    ) -> Result<Self> {
        let shader_module_package = ShaderModulePackage::from_templates(
            "ibl/brdf.vert",
            "ibl/brdf.frag",
            "BRDF_LUT",
            &device,
            tera,
            shader_template_context,
        )?;

        // Additive over a cleared target.
        let gpu_pipeline = create_render_pipeline(
            "BRDF_LUT",
            &device,
            &[],
            &shader_module_package,
            &[QuadVertex::layout()],
            BRDF_LUT_FORMAT,
            BlendMode::Additive,
            wgpu::PrimitiveTopology::TriangleStrip,
            None,
            None,
        )?;

        Ok(Self {
            device,
            queue,
            gpu_pipeline,
        })
    }

    pub fn render_lut(&self, name: &str, size: u32, quad: &QuadGeometry) -> BrdfLut {
        let gpu_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{name}_TEXTURE")),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: BRDF_LUT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let gpu_texture_view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&format!("{name}_COMMAND_ENCODER")),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&format!("{name}_RENDER_PASS")),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &gpu_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_viewport(0.0, 0.0, size as f32, size as f32, 0.0, 1.0);
            render_pass.set_pipeline(&self.gpu_pipeline);
            quad.draw(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        BrdfLut {
            gpu_texture,
            gpu_texture_view,
        }
    }
}
