use anyhow::Result;

use crate::error::{Error, ErrorKind};
use crate::render::shader::ShaderModulePackage;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlendMode {
    Replace,
    /// Source alpha over destination, used for scene geometry.
    Alpha,
    /// Plain sum of source and destination.
    Additive,
}

impl BlendMode {
    pub fn blend_state(self) -> wgpu::BlendState {
        match self {
            BlendMode::Replace => wgpu::BlendState::REPLACE,
            BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
            BlendMode::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

/// Builds a render pipeline with `vs_main`/`fs_main` entry points, reporting
/// a validation failure as a link error of the named pipeline.
#[allow(clippy::too_many_arguments)]
pub fn create_render_pipeline(
    name: &str,
    device: &wgpu::Device,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    shader_module_package: &ShaderModulePackage,
    vertex_buffer_layouts: &[wgpu::VertexBufferLayout],
    format: wgpu::TextureFormat,
    blend_mode: BlendMode,
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    depth_stencil: Option<wgpu::DepthStencilState>,
) -> Result<wgpu::RenderPipeline> {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{name}_RENDER_PIPELINE_LAYOUT")),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let gpu_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{name}_RENDER_PIPELINE")),
        layout: Some(&render_pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader_module_package.vertex_shader_module,
            entry_point: "vs_main",
            buffers: vertex_buffer_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader_module_package.fragment_shader_module,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend_mode.blend_state()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(Error::new(
            ErrorKind::ShaderLinkFailure,
            format!("Failed to link render pipeline {name}: {error}"),
        )
        .into()),
        None => Ok(gpu_pipeline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additive_blend_sums_both_operands() {
        let state = BlendMode::Additive.blend_state();

        for component in [state.color, state.alpha] {
            assert_eq!(component.src_factor, wgpu::BlendFactor::One);
            assert_eq!(component.dst_factor, wgpu::BlendFactor::One);
            assert_eq!(component.operation, wgpu::BlendOperation::Add);
        }
    }

    #[test]
    fn scene_blending_uses_source_alpha() {
        let state = BlendMode::Alpha.blend_state();

        assert_eq!(state.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }
}
