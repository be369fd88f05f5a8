use anyhow::Result;

use crate::error::{Error, ErrorKind};
use crate::render::binding::BindingTable;
use crate::settings::IblSettings;

pub struct ShaderModulePackage {
    pub vertex_shader_module: wgpu::ShaderModule,
    pub fragment_shader_module: wgpu::ShaderModule,
}

impl ShaderModulePackage {
    pub fn from_templates(
        vertex_template_name: &str,
        fragment_template_name: &str,
        name: &str,
        device: &wgpu::Device,
        tera: &tera::Tera,
        shader_template_context: &ShaderTemplateContext,
    ) -> Result<Self> {
        let template_context = tera::Context::from_serialize(shader_template_context)?;

        log::debug!("Creating shader module package {name}");

        let vertex_shader_module = ShaderModulePackage::create_shader_module(
            vertex_template_name,
            &format!("{name}_VERTEX_SHADER_MODULE"),
            device,
            tera,
            &template_context,
        )?;

        let fragment_shader_module = ShaderModulePackage::create_shader_module(
            fragment_template_name,
            &format!("{name}_FRAGMENT_SHADER_MODULE"),
            device,
            tera,
            &template_context,
        )?;

        Ok(ShaderModulePackage {
            vertex_shader_module,
            fragment_shader_module,
        })
    }

    fn create_shader_module(
        template_name: &str,
        label: &str,
        device: &wgpu::Device,
        tera: &tera::Tera,
        template_context: &tera::Context,
    ) -> Result<wgpu::ShaderModule> {
        let shader_source = ShaderModulePackage::render_shader(template_name, tera, template_context)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => Err(Error::new(
                ErrorKind::ShaderCompileFailure,
                format!("Failed to compile shader {template_name}: {error}"),
            )
            .into()),
            None => Ok(shader_module),
        }
    }

    fn render_shader(
        template_name: &str,
        tera: &tera::Tera,
        template_context: &tera::Context,
    ) -> Result<String> {
        match tera.render(template_name, template_context) {
            Ok(shader_source) => Ok(shader_source),
            Err(error) => Err(Error::new(
                ErrorKind::ShaderCompileFailure,
                format!("Failed to render shader template {template_name}: {error:?}"),
            )
            .into()),
        }
    }
}

/// Values substituted into every shader template.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ShaderTemplateContext {
    pub bindings: BindingTable,
    pub ibl: IblShaderConstants,
}

impl ShaderTemplateContext {
    pub fn from_ibl_settings(settings: &IblSettings) -> Self {
        Self {
            bindings: BindingTable::default(),
            ibl: IblShaderConstants::from_settings(settings),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct IblShaderConstants {
    pub irradiance_sample_delta: f32,
    pub prefilter_sample_count: u32,
    pub environment_size: f32,
    /// Highest prefiltered mip level, reached at roughness 1.
    pub max_reflection_lod: f32,
}

impl IblShaderConstants {
    pub fn from_settings(settings: &IblSettings) -> Self {
        Self {
            irradiance_sample_delta: settings.irradiance_sample_delta,
            prefilter_sample_count: settings.prefilter_sample_count,
            environment_size: settings.environment_size as f32,
            max_reflection_lod: (settings.prefilter_mip_levels - 1) as f32,
        }
    }
}

/// Loads the shader templates shipped with the crate.
pub fn load_shader_templates() -> Result<tera::Tera> {
    let pattern = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/**/*");

    match tera::Tera::new(pattern) {
        Ok(tera) => Ok(tera),
        Err(error) => Err(Error::new(
            ErrorKind::ShaderCompileFailure,
            format!("Failed to load shader templates from {pattern}: {error:?}"),
        )
        .into()),
    }
}
