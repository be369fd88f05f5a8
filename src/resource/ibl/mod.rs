use anyhow::Result;

pub mod file;

/// Source of the equirectangular panorama the lighting environment is
/// computed from.
pub trait IblEnvironmentLoader {
    fn load_equirectangular_image(&self) -> Result<image::Rgba32FImage>;
}
