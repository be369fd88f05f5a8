use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Renders a mesh lit by an HDR environment panorama
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Window title
    #[arg(long, default_value = "IBL Viewer")]
    pub title: String,

    /// Initial window width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Whether the window can be resized
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub resizable: bool,

    /// Path to the .obj mesh to display
    #[arg(long, default_value = "assets/model.obj")]
    pub model: PathBuf,

    /// Path to the equirectangular .hdr panorama the lighting is computed from
    #[arg(long, default_value = "assets/environment.hdr")]
    pub environment: PathBuf,

    /// Albedo map, or the diffuse map with Blinn-Phong shading. Missing maps
    /// fall back to neutral values
    #[arg(long)]
    pub albedo: Option<PathBuf>,

    /// Metallic map, or the specular map with Blinn-Phong shading
    #[arg(long)]
    pub metallic: Option<PathBuf>,

    /// Roughness map
    #[arg(long)]
    pub roughness: Option<PathBuf>,

    /// Tangent space normal map
    #[arg(long)]
    pub normal: Option<PathBuf>,

    /// JSON file with scene, light, camera and IBL settings, reloaded with F5
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Shading model of the mesh
    #[arg(long, value_enum, default_value_t = Shading::Pbr)]
    pub shading: Shading,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Shading {
    Pbr,
    BlinnPhong,
}

impl From<Shading> for ibl_viewer::args::Shading {
    fn from(value: Shading) -> Self {
        match value {
            Shading::Pbr => ibl_viewer::args::Shading::Pbr,
            Shading::BlinnPhong => ibl_viewer::args::Shading::BlinnPhong,
        }
    }
}

impl From<Cli> for ibl_viewer::args::Args {
    fn from(value: Cli) -> Self {
        ibl_viewer::args::Args {
            title: value.title,
            width: value.width,
            height: value.height,
            resizable: value.resizable,
            model: value.model,
            environment: value.environment,
            albedo: value.albedo,
            metallic: value.metallic,
            roughness: value.roughness,
            normal: value.normal,
            settings: value.settings,
            shading: value.shading.into(),
        }
    }
}
