use crate::render::ibl::capture::CubeFace;
use crate::settings::IblSettings;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaptureStage {
    EquirectangularToCube,
    Irradiance,
    Prefilter,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IblPass {
    /// Render one face of one mip level of a cube stage's target.
    Capture {
        stage: CaptureStage,
        face: CubeFace,
        mip_level: u32,
        extent: u32,
        roughness: f32,
    },
    /// Downsample the environment cube into its remaining mip levels.
    GenerateEnvironmentMipmaps { mip_level_count: u32 },
    IntegrateBrdf { extent: u32 },
}

/// Roughness assigned to prefiltered mip `mip_level` out of `mip_level_count`.
pub fn mip_roughness(mip_level: u32, mip_level_count: u32) -> f32 {
    mip_level as f32 / (mip_level_count - 1) as f32
}

/// Edge length of mip `mip_level` of a `base` sized texture.
pub fn mip_extent(base: u32, mip_level: u32) -> u32 {
    (base >> mip_level).max(1)
}

/// Every pass of the precomputation, in submission order. Each stage only
/// reads what earlier passes have written.
pub fn build_capture_plan(settings: &IblSettings) -> Vec<IblPass> {
    let mut plan = Vec::new();

    for face in CubeFace::ALL {
        plan.push(IblPass::Capture {
            stage: CaptureStage::EquirectangularToCube,
            face,
            mip_level: 0,
            extent: settings.environment_size,
            roughness: 0.0,
        });
    }

    plan.push(IblPass::GenerateEnvironmentMipmaps {
        mip_level_count: settings.environment_mip_levels(),
    });

    for face in CubeFace::ALL {
        plan.push(IblPass::Capture {
            stage: CaptureStage::Irradiance,
            face,
            mip_level: 0,
            extent: settings.irradiance_size,
            roughness: 0.0,
        });
    }

    for mip_level in 0..settings.prefilter_mip_levels {
        let extent = mip_extent(settings.prefilter_size, mip_level);
        let roughness = mip_roughness(mip_level, settings.prefilter_mip_levels);

        for face in CubeFace::ALL {
            plan.push(IblPass::Capture {
                stage: CaptureStage::Prefilter,
                face,
                mip_level,
                extent,
                roughness,
            });
        }
    }

    plan.push(IblPass::IntegrateBrdf {
        extent: settings.brdf_lut_size,
    });

    plan
}
