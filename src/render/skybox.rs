use anyhow::Result;

use crate::render::geometry::{CubeGeometry, CubeVertex};
use crate::render::pipeline::{create_render_pipeline, BlendMode};
use crate::render::shader::{ShaderModulePackage, ShaderTemplateContext};

/// Draws the environment cube behind everything else.
///
/// The vertex shader pins every fragment to the far plane, so with a
/// `LessEqual` test and depth writes off the sky only fills pixels no model
/// has covered.
pub struct SkyboxRenderer {
    gpu_pipeline: wgpu::RenderPipeline,
}

impl SkyboxRenderer {
    pub fn from_device(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        view_environment_bind_group_layout: &wgpu::BindGroupLayout,
        tera: &tera::Tera,
        shader_template_context: &ShaderTemplateContext,
    ) -> Result<Self> {
        let shader_module_package = ShaderModulePackage::from_templates(
            "skybox/skybox.vert",
            "skybox/skybox.frag",
            "SKYBOX",
            device,
            tera,
            shader_template_context,
        )?;

        let gpu_pipeline = create_render_pipeline(
            "SKYBOX",
            device,
            &[view_environment_bind_group_layout],
            &shader_module_package,
            &[CubeVertex::layout()],
            format,
            BlendMode::Replace,
            wgpu::PrimitiveTopology::TriangleList,
            None,
            Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
        )?;

        Ok(Self { gpu_pipeline })
    }

    pub fn render_skybox(
        &self,
        view_environment_bind_group: &wgpu::BindGroup,
        cube: &CubeGeometry,
        render_pass: &mut wgpu::RenderPass,
    ) {
        render_pass.set_pipeline(&self.gpu_pipeline);
        render_pass.set_bind_group(0, view_environment_bind_group, &[]);
        cube.draw(render_pass);
    }
}
