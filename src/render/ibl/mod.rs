use std::rc::Rc;

use anyhow::Result;

use crate::error::{Error, ErrorKind};
use crate::render::cubemap::CubeMap;
use crate::render::geometry::GeometryPrimitives;
use crate::render::ibl::capture::{CaptureRenderer, CaptureTarget, CaptureTransforms};
use crate::render::ibl::equirectangular::EquirectangularSource;
use crate::render::ibl::lut::{BrdfLut, BrdfLutRenderer};
use crate::render::ibl::plan::{build_capture_plan, CaptureStage, IblPass};
use crate::render::mipmap::MipmapGenerator;
use crate::render::shader::ShaderTemplateContext;
use crate::settings::IblSettings;

pub mod capture;
pub mod equirectangular;
pub mod lut;
pub mod plan;
#[cfg(test)]
pub mod sampling;

const ENVIRONMENT_NAME: &str = "IBL_ENVIRONMENT_CUBEMAP";
const IRRADIANCE_NAME: &str = "IBL_IRRADIANCE_CUBEMAP";
const PREFILTERED_NAME: &str = "IBL_PREFILTERED_CUBEMAP";
const BRDF_LUT_NAME: &str = "IBL_BRDF_LUT";

/// The four lighting resources sampled by the scene and skybox shaders.
pub struct IblEnvironment {
    pub environment: CubeMap,
    pub irradiance: CubeMap,
    pub prefiltered: CubeMap,
    pub brdf_lut: Rc<BrdfLut>,
}

impl IblEnvironment {
    /// Black environment around an already integrated LUT.
    pub fn unlit(brdf_lut: Rc<BrdfLut>, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Self> {
        let black = [0.0, 0.0, 0.0, 1.0];

        Ok(Self {
            environment: CubeMap::create_solid_cubemap(ENVIRONMENT_NAME, black, device, queue)?,
            irradiance: CubeMap::create_solid_cubemap(IRRADIANCE_NAME, black, device, queue)?,
            prefiltered: CubeMap::create_solid_cubemap(PREFILTERED_NAME, black, device, queue)?,
            brdf_lut,
        })
    }
}

/// Turns an equirectangular HDR image into an [`IblEnvironment`] through a
/// fixed sequence of offscreen render passes.
pub struct IblPrecomputer {
    device: std::rc::Rc<wgpu::Device>,
    queue: std::rc::Rc<wgpu::Queue>,
    settings: IblSettings,
    capture_transforms: CaptureTransforms,
    equirectangular_renderer: CaptureRenderer,
    irradiance_renderer: CaptureRenderer,
    prefilter_renderer: CaptureRenderer,
    brdf_lut: Rc<BrdfLut>,
}

impl IblPrecomputer {
    /// Builds the capture pipelines and integrates the BRDF LUT, which only
    /// depends on the settings and is shared by every environment.
    pub fn from_device(
        device: Rc<wgpu::Device>,
        queue: Rc<wgpu::Queue>,
        tera: &tera::Tera,
        settings: IblSettings,
        geometry: &GeometryPrimitives,
    ) -> Result<Self> {
        settings.validate(device.limits().max_texture_dimension_2d)?;

        let shader_template_context = ShaderTemplateContext::from_ibl_settings(&settings);

        let equirectangular_renderer = CaptureRenderer::from_device(
            "EQUIRECTANGULAR_TO_CUBEMAP",
            "ibl/equirectangular.frag",
            wgpu::TextureViewDimension::D2,
            device.clone(),
            queue.clone(),
            tera,
            &shader_template_context,
        )?;

        let irradiance_renderer = CaptureRenderer::from_device(
            "IRRADIANCE_CONVOLUTION",
            "ibl/irradiance.frag",
            wgpu::TextureViewDimension::Cube,
            device.clone(),
            queue.clone(),
            tera,
            &shader_template_context,
        )?;

        let prefilter_renderer = CaptureRenderer::from_device(
            "SPECULAR_PREFILTER",
            "ibl/prefilter.frag",
            wgpu::TextureViewDimension::Cube,
            device.clone(),
            queue.clone(),
            tera,
            &shader_template_context,
        )?;

        let brdf_lut_renderer =
            BrdfLutRenderer::from_device(device.clone(), queue.clone(), tera, &shader_template_context)?;
        let brdf_lut = Rc::new(brdf_lut_renderer.render_lut(
            BRDF_LUT_NAME,
            settings.brdf_lut_size,
            &geometry.quad,
        ));

        Ok(Self {
            device,
            queue,
            settings,
            capture_transforms: CaptureTransforms::default(),
            equirectangular_renderer,
            irradiance_renderer,
            prefilter_renderer,
            brdf_lut,
        })
    }

    pub fn brdf_lut(&self) -> Rc<BrdfLut> {
        self.brdf_lut.clone()
    }

    pub fn precompute(
        &self,
        source_image: &image::Rgba32FImage,
        geometry: &GeometryPrimitives,
        mipmap_generator: &MipmapGenerator,
    ) -> Result<IblEnvironment> {
        let (width, height) = source_image.dimensions();
        log::info!("Precomputing IBL environment from a {width}x{height} panorama");

        let mut capture_target = CaptureTarget::new(&self.device, self.settings.environment_size);
        let source = EquirectangularSource::from_image(source_image, &self.device, &self.queue);

        let environment = CubeMap::from_texture(
            CubeMap::create_render_target(
                ENVIRONMENT_NAME,
                self.settings.environment_size,
                self.settings.environment_mip_levels(),
                &self.device,
            ),
            ENVIRONMENT_NAME,
            &self.device,
        )?;
        let irradiance_texture = CubeMap::create_render_target(
            IRRADIANCE_NAME,
            self.settings.irradiance_size,
            1,
            &self.device,
        );
        let prefiltered_texture = CubeMap::create_render_target(
            PREFILTERED_NAME,
            self.settings.prefilter_size,
            self.settings.prefilter_mip_levels,
            &self.device,
        );

        let equirectangular_bind_group = self
            .equirectangular_renderer
            .create_source_bind_group(&source.gpu_texture_view, &source.gpu_sampler);
        let irradiance_bind_group = self
            .irradiance_renderer
            .create_source_bind_group(&environment.gpu_texture_view, &environment.gpu_sampler);
        let prefilter_bind_group = self
            .prefilter_renderer
            .create_source_bind_group(&environment.gpu_texture_view, &environment.gpu_sampler);

        let mut brdf_lut = None;

        for pass in build_capture_plan(&self.settings) {
            log::debug!("Running IBL pass {pass:?}");

            match pass {
                IblPass::Capture {
                    stage,
                    face,
                    mip_level,
                    extent,
                    roughness,
                } => {
                    let (renderer, source_bind_group, target_texture) = match stage {
                        CaptureStage::EquirectangularToCube => (
                            &self.equirectangular_renderer,
                            &equirectangular_bind_group,
                            &environment.gpu_texture,
                        ),
                        CaptureStage::Irradiance => (
                            &self.irradiance_renderer,
                            &irradiance_bind_group,
                            &irradiance_texture,
                        ),
                        CaptureStage::Prefilter => (
                            &self.prefilter_renderer,
                            &prefilter_bind_group,
                            &prefiltered_texture,
                        ),
                    };

                    capture_target.resize(&self.device, extent);

                    renderer.capture_face(
                        self.capture_transforms.uniform(face, roughness),
                        source_bind_group,
                        target_texture,
                        face,
                        mip_level,
                        &capture_target,
                        &geometry.cube,
                    );
                }
                IblPass::GenerateEnvironmentMipmaps { mip_level_count } => {
                    log::debug!("Generating {mip_level_count} environment mip levels");
                    mipmap_generator.generate_mipmaps(&environment.gpu_texture, ENVIRONMENT_NAME)?;
                }
                IblPass::IntegrateBrdf { extent } => {
                    log::debug!("Reusing the {extent}x{extent} BRDF LUT");
                    brdf_lut = Some(self.brdf_lut.clone());
                }
            }
        }

        source.gpu_texture.destroy();

        let brdf_lut = match brdf_lut {
            Some(brdf_lut) => brdf_lut,
            None => {
                return Err(Error::new(
                    ErrorKind::InitializationFailure,
                    String::from("The IBL capture plan did not integrate a BRDF LUT"),
                )
                .into())
            }
        };

        log::info!("IBL environment precomputed");

        Ok(IblEnvironment {
            environment,
            irradiance: CubeMap::from_texture(irradiance_texture, IRRADIANCE_NAME, &self.device)?,
            prefiltered: CubeMap::from_texture(prefiltered_texture, PREFILTERED_NAME, &self.device)?,
            brdf_lut,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use cgmath::{InnerSpace, SquareMatrix, Vector4};

    use super::*;
    use crate::render::headless::HeadlessGpu;
    use crate::render::ibl::capture::CubeFace;
    use crate::render::ibl::sampling::{equirectangular_uv, sample_equirectangular};

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn flat_environment_gives_flat_irradiance_and_mirror_lut() {
        let gpu = HeadlessGpu::new();
        let precomputer = gpu.ibl_precomputer();

        let colour = [0.5, 0.25, 0.125];
        let panorama = image::Rgba32FImage::from_pixel(
            16,
            8,
            image::Rgba([colour[0], colour[1], colour[2], 1.0]),
        );

        let environment = precomputer
            .precompute(&panorama, &gpu.geometry, &gpu.mipmap_generator)
            .unwrap();

        for face in CubeFace::ALL {
            for row in gpu.read_texels(&environment.irradiance.gpu_texture, face.layer(), 0, 4) {
                for texel in row {
                    for channel in 0..3 {
                        assert_abs_diff_eq!(
                            texel[channel],
                            colour[channel],
                            epsilon = 0.05 * colour[channel] + 0.01
                        );
                    }
                }
            }
        }

        let lut = gpu.read_texels(&environment.brdf_lut.gpu_texture, 0, 0, 2);
        // Last column is NdotV close to 1, first row is roughness close to 0.
        let mirror = &lut[0][lut.len() - 1];
        assert_abs_diff_eq!(mirror[0], 1.0, epsilon = 0.02);
        assert_abs_diff_eq!(mirror[1], 0.0, epsilon = 0.02);
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn every_environment_shares_the_integrated_lut() {
        let gpu = HeadlessGpu::new();
        let precomputer = gpu.ibl_precomputer();
        let panorama = image::Rgba32FImage::from_pixel(16, 8, image::Rgba([1.0, 1.0, 1.0, 1.0]));

        let first = precomputer
            .precompute(&panorama, &gpu.geometry, &gpu.mipmap_generator)
            .unwrap();
        let second = precomputer
            .precompute(&panorama, &gpu.geometry, &gpu.mipmap_generator)
            .unwrap();
        let unlit = IblEnvironment::unlit(precomputer.brdf_lut(), &gpu.device, &gpu.queue).unwrap();

        assert!(Rc::ptr_eq(&first.brdf_lut, &precomputer.brdf_lut()));
        assert!(Rc::ptr_eq(&first.brdf_lut, &second.brdf_lut));
        assert!(Rc::ptr_eq(&first.brdf_lut, &unlit.brdf_lut));
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn environment_faces_reproduce_the_panorama() {
        let gpu = HeadlessGpu::new();
        let precomputer = gpu.ibl_precomputer();

        let panorama = image::Rgba32FImage::from_fn(16, 8, |x, _| {
            image::Rgba([(x / 4) as f32, 0.0, 0.0, 1.0])
        });

        let environment = precomputer
            .precompute(&panorama, &gpu.geometry, &gpu.mipmap_generator)
            .unwrap();

        let transforms = CaptureTransforms::default();
        let extent = gpu.settings.environment_size;

        for face in CubeFace::ALL {
            let inverse = (transforms.projection * transforms.views[face as usize])
                .invert()
                .unwrap();
            let texels = gpu.read_texels(&environment.environment.gpu_texture, face.layer(), 0, 4);

            for (row, row_texels) in texels.iter().enumerate() {
                for (column, texel) in row_texels.iter().enumerate() {
                    let s = (column as f32 + 0.5) / extent as f32;
                    let t = (row as f32 + 0.5) / extent as f32;
                    let world = inverse * Vector4::new(2.0 * s - 1.0, 1.0 - 2.0 * t, 0.5, 1.0);
                    let direction = (world.truncate() / world.w).normalize();

                    // Bilinear filtering blends across quarter boundaries.
                    let quarter_position = equirectangular_uv(direction).x * 4.0;
                    if (quarter_position - quarter_position.round()).abs() < 0.2 {
                        continue;
                    }

                    let expected = sample_equirectangular(&panorama, direction);
                    assert_abs_diff_eq!(texel[0], expected[0], epsilon = 0.01);
                }
            }
        }
    }
}
