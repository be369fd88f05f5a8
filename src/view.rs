use anyhow::Result;
use cgmath::Vector3;

use crate::args::{Args, Shading};
use crate::camera::FreeFlyCameraController;
use crate::overlay::FrameStats;
use crate::render::material::{MaterialTexturePaths, ShadingModel};
use crate::render::RenderSystem;
use crate::resource::ibl::file::FileSystemIblEnvironmentLoader;
use crate::resource::obj::load_obj;
use crate::settings::Settings;

pub struct ViewSystem {
    pub window: std::sync::Arc<winit::window::Window>,
    pub render_system: RenderSystem,
    pub camera_controller: FreeFlyCameraController,
    frame_stats: FrameStats,
    title: String,
}

impl ViewSystem {
    pub async fn from_window(
        window: winit::window::Window,
        title: String,
        settings: &Settings,
    ) -> Result<Self> {
        let window = std::sync::Arc::new(window);

        let mut render_system = RenderSystem::from_window(window.clone(), settings.ibl).await?;

        let camera_controller = FreeFlyCameraController::new(&settings.camera);
        render_system.set_camera_view(camera_controller.camera_view());

        Ok(Self {
            window,
            render_system,
            camera_controller,
            frame_stats: FrameStats::default(),
            title,
        })
    }

    /// Loads the environment and the mesh named in `args`. Failures are
    /// logged and leave the view with an unlit sky or no mesh.
    pub fn load_assets(&mut self, args: &Args) {
        log::info!("Loading environment {}", args.environment.display());

        let ibl_environment_loader = FileSystemIblEnvironmentLoader {
            path: args.environment.clone(),
        };
        if let Err(error) = self
            .render_system
            .load_ibl_environment(&ibl_environment_loader)
        {
            log::error!("Continuing without an environment: {error:#}");
        }

        let meshes = match load_obj(&args.model) {
            Ok(meshes) => meshes,
            Err(error) => {
                log::error!("Continuing without a model: {error:#}");
                return;
            }
        };

        let shading_model = match args.shading {
            Shading::Pbr => ShadingModel::Pbr,
            Shading::BlinnPhong => ShadingModel::BlinnPhong,
        };
        let texture_paths = MaterialTexturePaths {
            albedo: args.albedo.clone(),
            metallic: args.metallic.clone(),
            roughness: args.roughness.clone(),
            normal: args.normal.clone(),
        };

        let name = args
            .model
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("MODEL"));

        self.render_system
            .load_model(&name, &meshes, shading_model, &texture_paths);
    }

    /// Pushes the runtime tunables into the scene. IBL resolutions only take
    /// effect at startup.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.camera_controller.apply_settings(&settings.camera);

        let mut light = self.render_system.light();
        light.set_colour(Vector3::from(settings.light.colour));
        light.set_intensity(settings.light.intensity);
        self.render_system.set_light(light);

        let transform = settings.scene.model_transform();
        for model in self.render_system.models_mut() {
            model.set_transform(transform);
        }
    }

    /// Puts the point light where the camera stands.
    pub fn move_light_to_camera(&mut self) {
        let position = self.camera_controller.camera_view().position;

        let mut light = self.render_system.light();
        log::debug!(
            "Moving the light from {:?} to {position:?}",
            light.position()
        );
        light.set_position(Vector3::new(position.x, position.y, position.z));
        self.render_system.set_light(light);
    }

    pub fn update_view(&mut self, delta_time: std::time::Duration) -> Result<()> {
        let camera_view = self.camera_controller.update(delta_time);
        self.render_system.set_camera_view(camera_view);

        if let Some(summary) = self.frame_stats.record_frame(delta_time) {
            self.window.set_title(&summary.title(&self.title));
        }

        self.render_system.render()?;

        Ok(())
    }
}
