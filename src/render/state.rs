use std::collections::HashMap;

use anyhow::Result;

use crate::error::{Error, ErrorKind};
use crate::render::geometry::GeometryPrimitives;
use crate::render::ibl::{IblEnvironment, IblPrecomputer};
use crate::render::material::{create_material_bind_group_layout, ShadingModel};
use crate::render::mesh::Vertex;
use crate::render::mipmap::MipmapGenerator;
use crate::render::model::create_model_bind_group_layout;
use crate::render::pipeline::{create_render_pipeline, BlendMode};
use crate::render::shader::{load_shader_templates, ShaderModulePackage, ShaderTemplateContext};
use crate::render::skybox::SkyboxRenderer;
use crate::render::texture::DepthTexture2DPackage;
use crate::render::view::{create_view_environment_bind_group_layout, ViewEnvironment};
use crate::settings::IblSettings;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct RenderSystemState {
    #[allow(dead_code)]
    pub instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    #[allow(dead_code)]
    pub adapter: wgpu::Adapter,
    pub device: std::rc::Rc<wgpu::Device>,
    pub queue: std::rc::Rc<wgpu::Queue>,
    pub model_bind_group_layout: wgpu::BindGroupLayout,
    pub material_bind_group_layout: wgpu::BindGroupLayout,
    pub depth_texture: DepthTexture2DPackage,
    pub geometry: GeometryPrimitives,
    pub mipmap_generator: MipmapGenerator,
    pub ibl_precomputer: IblPrecomputer,
    pub skybox_renderer: SkyboxRenderer,
    pub scene_pipelines: HashMap<ShadingModel, wgpu::RenderPipeline>,
    pub view_environment: ViewEnvironment,
    pub view_dimensions: winit::dpi::PhysicalSize<u32>,
}

impl RenderSystemState {
    pub async fn from_window(
        window: std::sync::Arc<winit::window::Window>,
        ibl_settings: IblSettings,
    ) -> Result<Self> {
        let view_dimensions = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window).map_err(|error| {
            Error::new(
                ErrorKind::InitializationFailure,
                format!("Failed to create surface: {error}"),
            )
        })?;

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Some(adapter) => adapter,
            None => {
                return Err(Error::new(
                    ErrorKind::InitializationFailure,
                    String::from("Failed to retrieve adapter."),
                )
                .into())
            }
        };

        log::info!("Using adapter {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|error| {
                Error::new(
                    ErrorKind::InitializationFailure,
                    format!("Failed to request device: {error}"),
                )
            })?;

        device.on_uncaptured_error(Box::new(|error| {
            log::error!("Uncaptured device error: {error}");
        }));

        let device = std::rc::Rc::new(device);
        let queue = std::rc::Rc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);

        let surface_format = match surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
        {
            Some(surface_format) => *surface_format,
            None => {
                return Err(Error::new(
                    ErrorKind::InitializationFailure,
                    String::from("The surface does not support any texture format."),
                )
                .into())
            }
        };

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: view_dimensions.width.max(1),
            height: view_dimensions.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        let view_environment_bind_group_layout =
            std::rc::Rc::new(create_view_environment_bind_group_layout(&device));
        let model_bind_group_layout = create_model_bind_group_layout(&device);
        let material_bind_group_layout = create_material_bind_group_layout(&device);

        let depth_texture = RenderSystemState::create_depth_texture(
            &device,
            wgpu::Extent3d {
                width: surface_config.width,
                height: surface_config.height,
                depth_or_array_layers: 1,
            },
        );

        let tera = load_shader_templates()?;
        let shader_template_context = ShaderTemplateContext::from_ibl_settings(&ibl_settings);

        let geometry = GeometryPrimitives::from_device(&device, &queue);

        let mipmap_generator = MipmapGenerator::from_device(
            device.clone(),
            queue.clone(),
            &tera,
            &shader_template_context,
        )?;

        let ibl_precomputer = IblPrecomputer::from_device(
            device.clone(),
            queue.clone(),
            &tera,
            ibl_settings,
            &geometry,
        )?;

        let skybox_renderer = SkyboxRenderer::from_device(
            &device,
            surface_format,
            &view_environment_bind_group_layout,
            &tera,
            &shader_template_context,
        )?;

        let mut scene_pipelines = HashMap::new();
        for shading_model in [ShadingModel::Pbr, ShadingModel::BlinnPhong] {
            let gpu_pipeline = RenderSystemState::create_scene_pipeline(
                shading_model,
                &device,
                surface_format,
                &[
                    view_environment_bind_group_layout.as_ref(),
                    &model_bind_group_layout,
                    &material_bind_group_layout,
                ],
                &tera,
                &shader_template_context,
            )?;
            scene_pipelines.insert(shading_model, gpu_pipeline);
        }

        let ibl_environment = IblEnvironment::unlit(
            ibl_precomputer.brdf_lut(),
            &device,
            &queue,
        )?;

        let view_environment = ViewEnvironment::from_device(
            device.clone(),
            queue.clone(),
            surface_config.width as f32 / surface_config.height as f32,
            ibl_environment,
            view_environment_bind_group_layout,
        );

        Ok(Self {
            instance,
            surface,
            surface_config,
            adapter,
            device,
            queue,
            model_bind_group_layout,
            material_bind_group_layout,
            depth_texture,
            geometry,
            mipmap_generator,
            ibl_precomputer,
            skybox_renderer,
            scene_pipelines,
            view_environment,
            view_dimensions,
        })
    }

    pub fn set_view_dimensions(&mut self, view_dimensions: winit::dpi::PhysicalSize<u32>) {
        self.view_dimensions = view_dimensions;
        self.surface_config.width = view_dimensions.width;
        self.surface_config.height = view_dimensions.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_texture = RenderSystemState::create_depth_texture(
            &self.device,
            wgpu::Extent3d {
                width: view_dimensions.width.max(1),
                height: view_dimensions.height.max(1),
                depth_or_array_layers: 1,
            },
        );
        self.view_environment
            .set_aspect_ratio(view_dimensions.width as f32 / view_dimensions.height as f32);
    }

    fn create_scene_pipeline(
        shading_model: ShadingModel,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        tera: &tera::Tera,
        shader_template_context: &ShaderTemplateContext,
    ) -> Result<wgpu::RenderPipeline> {
        let name = format!("SCENE_{shading_model:?}").to_uppercase();

        let shader_module_package = ShaderModulePackage::from_templates(
            "scene/core.vert",
            shading_model.fragment_template(),
            &name,
            device,
            tera,
            shader_template_context,
        )?;

        create_render_pipeline(
            &name,
            device,
            bind_group_layouts,
            &shader_module_package,
            &[Vertex::layout()],
            format,
            BlendMode::Alpha,
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::Face::Back),
            Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
        )
    }

    fn create_depth_texture(device: &wgpu::Device, size: wgpu::Extent3d) -> DepthTexture2DPackage {
        let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("DEPTH_TEXTURE"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let gpu_texture_view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());

        DepthTexture2DPackage {
            gpu_texture,
            gpu_texture_view,
        }
    }
}
