use anyhow::Result;

use crate::error::{Error, ErrorKind};
use crate::render::camera::CameraView;
use crate::render::light::Light;
use crate::render::material::{GpuMaterial, MaterialTexturePaths, MaterialTextures, ShadingModel};
use crate::render::mesh::{Mesh, MeshData};
use crate::render::model::Model;
use crate::render::state::RenderSystemState;
use crate::resource::ibl::IblEnvironmentLoader;
use crate::settings::IblSettings;

pub mod binding;
pub mod camera;
pub mod cubemap;
pub mod geometry;
#[cfg(test)]
pub mod headless;
pub mod ibl;
pub mod light;
pub mod material;
pub mod mesh;
pub mod mipmap;
pub mod model;
pub mod pipeline;
pub mod shader;
pub mod skybox;
pub mod state;
pub mod texture;
pub mod view;

pub struct RenderSystem {
    state: RenderSystemState,
    models: Vec<Model>,
}

impl RenderSystem {
    pub async fn from_window(
        window: std::sync::Arc<winit::window::Window>,
        ibl_settings: IblSettings,
    ) -> Result<Self> {
        let state = RenderSystemState::from_window(window, ibl_settings).await?;

        Ok(Self {
            state,
            models: Vec::new(),
        })
    }

    pub fn sync_view_dimensions(&mut self) {
        self.set_view_dimensions(self.state.view_dimensions);
    }

    pub fn set_view_dimensions(&mut self, view_dimensions: winit::dpi::PhysicalSize<u32>) {
        if view_dimensions.width == 0 || view_dimensions.height == 0 {
            return;
        }

        self.state.set_view_dimensions(view_dimensions);
    }

    pub fn set_camera_view(&mut self, camera_view: CameraView) {
        self.state.view_environment.set_camera_view(camera_view);
    }

    pub fn light(&self) -> Light {
        self.state.view_environment.light()
    }

    pub fn set_light(&mut self, light: Light) {
        self.state.view_environment.set_light(light);
    }

    pub fn models_mut(&mut self) -> &mut [Model] {
        &mut self.models
    }

    pub fn render(&mut self) -> Result<()> {
        let output = self.state.surface.get_current_texture()?;

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.state
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("RENDER_SYSTEM_COMMAND_ENCODER"),
                });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("RENDER_SYSTEM_RENDER_PASS"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.state.depth_texture.gpu_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.state.view_environment.bind_group(), &[]);

            for model in self.models.iter() {
                let shading_model = model.material().material().shading_model();
                let gpu_pipeline = match self.state.scene_pipelines.get(&shading_model) {
                    Some(gpu_pipeline) => gpu_pipeline,
                    None => {
                        return Err(Error::new(
                            ErrorKind::InvalidConfiguration,
                            format!("No scene pipeline for shading model {shading_model:?}"),
                        )
                        .into())
                    }
                };

                render_pass.set_pipeline(gpu_pipeline);
                model.draw(&mut render_pass);
            }

            self.state.skybox_renderer.render_skybox(
                self.state.view_environment.bind_group(),
                &self.state.geometry.cube,
                &mut render_pass,
            );
        }

        self.state.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Uploads `meshes` as one model shaded with `shading_model`. Missing or
    /// unreadable material maps are replaced by neutral fallbacks.
    pub fn load_model(
        &mut self,
        name: &str,
        meshes: &[MeshData],
        shading_model: ShadingModel,
        texture_paths: &MaterialTexturePaths,
    ) -> &mut Model {
        log::info!("Loading model {name} with {} meshes", meshes.len());

        let meshes = meshes
            .iter()
            .map(|mesh_data| Mesh::from_data(&self.state.device, &self.state.queue, mesh_data))
            .collect();

        let textures = MaterialTextures::load(
            texture_paths,
            shading_model,
            &self.state.device,
            &self.state.queue,
            &self.state.mipmap_generator,
        );

        let material = GpuMaterial::from_device(
            &self.state.device,
            &self.state.queue,
            name,
            shading_model.default_material(),
            textures,
            &self.state.material_bind_group_layout,
        );

        self.models.push(Model::from_device(
            &self.state.device,
            self.state.queue.clone(),
            name,
            meshes,
            material,
            &self.state.model_bind_group_layout,
        ));

        let last = self.models.len() - 1;
        &mut self.models[last]
    }

    /// Precomputes the lighting maps from the loader's panorama. On failure
    /// the error is returned and the view keeps rendering unlit.
    pub fn load_ibl_environment(
        &mut self,
        ibl_environment_loader: &impl IblEnvironmentLoader,
    ) -> Result<()> {
        self.state.view_environment.load_ibl_environment(
            ibl_environment_loader,
            &self.state.ibl_precomputer,
            &self.state.geometry,
            &self.state.mipmap_generator,
        )
    }
}
