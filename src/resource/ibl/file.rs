use anyhow::Result;

use crate::resource::ibl::IblEnvironmentLoader;
use crate::resource::image::load_hdr_image;

pub struct FileSystemIblEnvironmentLoader {
    pub path: std::path::PathBuf,
}

impl IblEnvironmentLoader for FileSystemIblEnvironmentLoader {
    fn load_equirectangular_image(&self) -> Result<image::Rgba32FImage> {
        load_hdr_image(&self.path)
    }
}
