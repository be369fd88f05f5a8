use anyhow::Result;

use crate::render::binding::{SamplerSlot, SamplingUnit, UniformSlot};
use crate::render::camera::{Camera, CameraUniform, CameraView};
use crate::render::geometry::GeometryPrimitives;
use crate::render::ibl::{IblEnvironment, IblPrecomputer};
use crate::render::light::{Light, LightUniform};
use crate::render::mipmap::MipmapGenerator;
use crate::resource::ibl::IblEnvironmentLoader;

/// Group 0 of every scene and skybox pipeline: camera, light and the four
/// image based lighting maps.
pub fn create_view_environment_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let uniform_entry = |slot: UniformSlot| wgpu::BindGroupLayoutEntry {
        binding: slot.binding(),
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };

    let texture_entry =
        |unit: SamplingUnit, view_dimension: wgpu::TextureViewDimension| wgpu::BindGroupLayoutEntry {
            binding: unit.binding(),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        };

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("VIEW_ENVIRONMENT_BIND_GROUP_LAYOUT"),
        entries: &[
            uniform_entry(UniformSlot::Camera),
            uniform_entry(UniformSlot::Light),
            texture_entry(SamplingUnit::BrdfLut, wgpu::TextureViewDimension::D2),
            texture_entry(SamplingUnit::Prefilter, wgpu::TextureViewDimension::Cube),
            texture_entry(SamplingUnit::Environment, wgpu::TextureViewDimension::Cube),
            texture_entry(SamplingUnit::Irradiance, wgpu::TextureViewDimension::Cube),
            wgpu::BindGroupLayoutEntry {
                binding: SamplerSlot::Environment.binding(),
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// Per frame state shared by every draw: camera, light and lighting maps.
pub struct ViewEnvironment {
    aspect_ratio: f32,
    camera: Camera,
    camera_view: CameraView,
    light: Light,
    ibl_environment: IblEnvironment,
    gpu_camera_uniform_buffer: wgpu::Buffer,
    gpu_light_uniform_buffer: wgpu::Buffer,
    gpu_environment_sampler: wgpu::Sampler,
    view_environment_bind_group_layout: std::rc::Rc<wgpu::BindGroupLayout>,
    gpu_view_environment_bind_group: wgpu::BindGroup,
    device: std::rc::Rc<wgpu::Device>,
    queue: std::rc::Rc<wgpu::Queue>,
}

impl ViewEnvironment {
    pub fn from_device(
        device: std::rc::Rc<wgpu::Device>,
        queue: std::rc::Rc<wgpu::Queue>,
        aspect_ratio: f32,
        ibl_environment: IblEnvironment,
        view_environment_bind_group_layout: std::rc::Rc<wgpu::BindGroupLayout>,
    ) -> Self {
        let gpu_camera_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("CAMERA_UNIFORM_BUFFER"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let gpu_light_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("LIGHT_UNIFORM_BUFFER"),
            size: std::mem::size_of::<LightUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let gpu_environment_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ENVIRONMENT_SAMPLER"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let gpu_view_environment_bind_group = ViewEnvironment::create_view_environment_bind_group(
            &device,
            &view_environment_bind_group_layout,
            &gpu_camera_uniform_buffer,
            &gpu_light_uniform_buffer,
            &gpu_environment_sampler,
            &ibl_environment,
        );

        let object = Self {
            aspect_ratio,
            camera: Camera::default(),
            camera_view: CameraView::default(),
            light: Light::default(),
            ibl_environment,
            gpu_camera_uniform_buffer,
            gpu_light_uniform_buffer,
            gpu_environment_sampler,
            view_environment_bind_group_layout,
            gpu_view_environment_bind_group,
            device,
            queue,
        };

        object.update_camera_uniform_buffer();
        object.light.send_uniforms(&object.queue, &object.gpu_light_uniform_buffer);
        object
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.gpu_view_environment_bind_group
    }

    pub fn camera_view(&self) -> CameraView {
        self.camera_view
    }

    pub fn light(&self) -> Light {
        self.light
    }

    pub fn ibl_environment(&self) -> &IblEnvironment {
        &self.ibl_environment
    }

    pub fn set_camera_view(&mut self, camera_view: CameraView) {
        self.camera_view = camera_view;
        self.update_camera_uniform_buffer();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if self.aspect_ratio == aspect_ratio {
            return;
        }

        self.aspect_ratio = aspect_ratio;
        self.update_camera_uniform_buffer();
    }

    pub fn set_light(&mut self, light: Light) {
        self.light = light;
        self.light
            .send_uniforms(&self.queue, &self.gpu_light_uniform_buffer);
    }

    pub fn set_ibl_environment(&mut self, ibl_environment: IblEnvironment) {
        self.ibl_environment = ibl_environment;
        self.gpu_view_environment_bind_group = ViewEnvironment::create_view_environment_bind_group(
            &self.device,
            &self.view_environment_bind_group_layout,
            &self.gpu_camera_uniform_buffer,
            &self.gpu_light_uniform_buffer,
            &self.gpu_environment_sampler,
            &self.ibl_environment,
        );
    }

    /// Precomputes the lighting maps from the loader's panorama.
    ///
    /// When the panorama cannot be loaded or processed the error is returned
    /// and the maps are replaced by a black environment around the LUT
    /// already bound, so the scene still renders.
    pub fn load_ibl_environment(
        &mut self,
        ibl_environment_loader: &impl IblEnvironmentLoader,
        ibl_precomputer: &IblPrecomputer,
        geometry: &GeometryPrimitives,
        mipmap_generator: &MipmapGenerator,
    ) -> Result<()> {
        let result = ibl_environment_loader
            .load_equirectangular_image()
            .and_then(|equirectangular_image| {
                ibl_precomputer.precompute(&equirectangular_image, geometry, mipmap_generator)
            });

        match result {
            Ok(ibl_environment) => {
                self.set_ibl_environment(ibl_environment);
                Ok(())
            }
            Err(error) => {
                let ibl_environment = IblEnvironment::unlit(
                    self.ibl_environment.brdf_lut.clone(),
                    &self.device,
                    &self.queue,
                )?;
                self.set_ibl_environment(ibl_environment);

                Err(error)
            }
        }
    }

    fn update_camera_uniform_buffer(&self) {
        self.queue.write_buffer(
            &self.gpu_camera_uniform_buffer,
            0,
            bytemuck::cast_slice(&[CameraUniform::new(
                &self.camera_view,
                self.camera.create_projection(self.aspect_ratio),
            )]),
        );
    }

    fn create_view_environment_bind_group(
        device: &wgpu::Device,
        view_environment_bind_group_layout: &wgpu::BindGroupLayout,
        gpu_camera_uniform_buffer: &wgpu::Buffer,
        gpu_light_uniform_buffer: &wgpu::Buffer,
        gpu_environment_sampler: &wgpu::Sampler,
        ibl_environment: &IblEnvironment,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("VIEW_ENVIRONMENT_BIND_GROUP"),
            layout: view_environment_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: UniformSlot::Camera.binding(),
                    resource: gpu_camera_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: UniformSlot::Light.binding(),
                    resource: gpu_light_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: SamplingUnit::BrdfLut.binding(),
                    resource: wgpu::BindingResource::TextureView(
                        &ibl_environment.brdf_lut.gpu_texture_view,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: SamplingUnit::Prefilter.binding(),
                    resource: wgpu::BindingResource::TextureView(
                        &ibl_environment.prefiltered.gpu_texture_view,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: SamplingUnit::Environment.binding(),
                    resource: wgpu::BindingResource::TextureView(
                        &ibl_environment.environment.gpu_texture_view,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: SamplingUnit::Irradiance.binding(),
                    resource: wgpu::BindingResource::TextureView(
                        &ibl_environment.irradiance.gpu_texture_view,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: SamplerSlot::Environment.binding(),
                    resource: wgpu::BindingResource::Sampler(gpu_environment_sampler),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::render::headless::HeadlessGpu;
    use crate::render::ibl::capture::CubeFace;
    use crate::render::ibl::lut::BrdfLut;
    use crate::resource::ibl::file::FileSystemIblEnvironmentLoader;

    fn lit_view_environment(gpu: &HeadlessGpu, ibl_precomputer: &IblPrecomputer) -> ViewEnvironment {
        let mut view_environment = ViewEnvironment::from_device(
            gpu.device.clone(),
            gpu.queue.clone(),
            1.0,
            IblEnvironment::unlit(ibl_precomputer.brdf_lut(), &gpu.device, &gpu.queue).unwrap(),
            Rc::new(create_view_environment_bind_group_layout(&gpu.device)),
        );

        let panorama = image::Rgba32FImage::from_pixel(16, 8, image::Rgba([1.0, 1.0, 1.0, 1.0]));
        view_environment.set_ibl_environment(
            ibl_precomputer
                .precompute(&panorama, &gpu.geometry, &gpu.mipmap_generator)
                .unwrap(),
        );

        view_environment
    }

    fn assert_unlit_with_lut(
        gpu: &HeadlessGpu,
        view_environment: &ViewEnvironment,
        lut: &Rc<BrdfLut>,
    ) {
        let ibl_environment = view_environment.ibl_environment();

        assert!(Rc::ptr_eq(&ibl_environment.brdf_lut, lut));
        for cube_map in [
            &ibl_environment.environment,
            &ibl_environment.irradiance,
            &ibl_environment.prefiltered,
        ] {
            assert_eq!(cube_map.gpu_texture.width(), 1);
            for face in CubeFace::ALL {
                let texel = &gpu.read_texels(&cube_map.gpu_texture, face.layer(), 0, 4)[0][0];
                assert_eq!(&texel[..3], &[0.0, 0.0, 0.0]);
            }
        }
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn missing_panorama_leaves_an_unlit_environment_with_the_lut() {
        let gpu = HeadlessGpu::new();
        let ibl_precomputer = gpu.ibl_precomputer();
        let mut view_environment = lit_view_environment(&gpu, &ibl_precomputer);
        let lut = view_environment.ibl_environment().brdf_lut.clone();

        let loader = FileSystemIblEnvironmentLoader {
            path: std::path::PathBuf::from("does/not/exist.hdr"),
        };
        let error = view_environment
            .load_ibl_environment(&loader, &ibl_precomputer, &gpu.geometry, &gpu.mipmap_generator)
            .unwrap_err();

        assert_eq!(Error::kind_of(&error), Some(ErrorKind::ResourceLoadFailure));
        assert_unlit_with_lut(&gpu, &view_environment, &lut);
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn undecodable_panorama_leaves_an_unlit_environment_with_the_lut() {
        let gpu = HeadlessGpu::new();
        let ibl_precomputer = gpu.ibl_precomputer();
        let mut view_environment = lit_view_environment(&gpu, &ibl_precomputer);
        let lut = view_environment.ibl_environment().brdf_lut.clone();

        let path = std::env::temp_dir().join("ibl_viewer_undecodable_panorama.hdr");
        std::fs::write(&path, b"#?RADIANCE\nnot really\n").unwrap();
        let loader = FileSystemIblEnvironmentLoader { path: path.clone() };

        let error = view_environment
            .load_ibl_environment(&loader, &ibl_precomputer, &gpu.geometry, &gpu.mipmap_generator)
            .unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(Error::kind_of(&error), Some(ErrorKind::ResourceLoadFailure));
        assert_unlit_with_lut(&gpu, &view_environment, &lut);
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn loaded_panorama_replaces_the_unlit_environment() {
        let gpu = HeadlessGpu::new();
        let ibl_precomputer = gpu.ibl_precomputer();
        let mut view_environment = ViewEnvironment::from_device(
            gpu.device.clone(),
            gpu.queue.clone(),
            1.0,
            IblEnvironment::unlit(ibl_precomputer.brdf_lut(), &gpu.device, &gpu.queue).unwrap(),
            Rc::new(create_view_environment_bind_group_layout(&gpu.device)),
        );

        struct FlatPanorama;
        impl IblEnvironmentLoader for FlatPanorama {
            fn load_equirectangular_image(&self) -> Result<image::Rgba32FImage> {
                Ok(image::Rgba32FImage::from_pixel(16, 8, image::Rgba([1.0, 1.0, 1.0, 1.0])))
            }
        }

        view_environment
            .load_ibl_environment(&FlatPanorama, &ibl_precomputer, &gpu.geometry, &gpu.mipmap_generator)
            .unwrap();

        let ibl_environment = view_environment.ibl_environment();
        assert_eq!(ibl_environment.environment.gpu_texture.width(), gpu.settings.environment_size);
        assert!(Rc::ptr_eq(&ibl_environment.brdf_lut, &ibl_precomputer.brdf_lut()));
    }
}
