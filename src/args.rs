use std::path::PathBuf;

/// Lighting model applied to the loaded mesh.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Shading {
    #[default]
    Pbr,
    BlinnPhong,
}

pub struct Args {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub model: PathBuf,
    pub environment: PathBuf,
    pub albedo: Option<PathBuf>,
    pub metallic: Option<PathBuf>,
    pub roughness: Option<PathBuf>,
    pub normal: Option<PathBuf>,
    pub settings: Option<PathBuf>,
    pub shading: Shading,
}
