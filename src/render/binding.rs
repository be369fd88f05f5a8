//! Binding indices shared between bind group layouts and shader templates.
//!
//! Every shader receives [`BindingTable`] through its template context, so a
//! texture bound at a [`SamplingUnit`] on the Rust side is always read from the
//! same binding in WGSL.

/// Texture slots. Material textures occupy units 0 to 3, the image based
/// lighting maps occupy units 5 to 8.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SamplingUnit {
    Albedo,
    Metallic,
    Roughness,
    Normal,
    BrdfLut,
    Prefilter,
    Environment,
    Irradiance,
}

impl SamplingUnit {
    pub const ALL: [SamplingUnit; 8] = [
        SamplingUnit::Albedo,
        SamplingUnit::Metallic,
        SamplingUnit::Roughness,
        SamplingUnit::Normal,
        SamplingUnit::BrdfLut,
        SamplingUnit::Prefilter,
        SamplingUnit::Environment,
        SamplingUnit::Irradiance,
    ];

    /// Blinn-Phong reads its diffuse map from the albedo unit.
    pub const DIFFUSE: SamplingUnit = SamplingUnit::Albedo;
    /// Blinn-Phong reads its specular map from the metallic unit.
    pub const SPECULAR: SamplingUnit = SamplingUnit::Metallic;

    pub const fn binding(self) -> u32 {
        match self {
            SamplingUnit::Albedo => 0,
            SamplingUnit::Metallic => 1,
            SamplingUnit::Roughness => 2,
            SamplingUnit::Normal => 3,
            SamplingUnit::BrdfLut => 5,
            SamplingUnit::Prefilter => 6,
            SamplingUnit::Environment => 7,
            SamplingUnit::Irradiance => 8,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UniformSlot {
    Camera,
    Light,
    Model,
    Material,
}

impl UniformSlot {
    pub const ALL: [UniformSlot; 4] = [
        UniformSlot::Camera,
        UniformSlot::Light,
        UniformSlot::Model,
        UniformSlot::Material,
    ];

    pub const fn binding(self) -> u32 {
        match self {
            UniformSlot::Camera => 10,
            UniformSlot::Light => 11,
            UniformSlot::Model => 12,
            UniformSlot::Material => 13,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SamplerSlot {
    Material,
    Environment,
}

impl SamplerSlot {
    pub const ALL: [SamplerSlot; 2] = [SamplerSlot::Material, SamplerSlot::Environment];

    pub const fn binding(self) -> u32 {
        match self {
            SamplerSlot::Material => 14,
            SamplerSlot::Environment => 15,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub struct BindingTable {
    pub albedo: u32,
    pub metallic: u32,
    pub roughness: u32,
    pub normal: u32,
    pub diffuse: u32,
    pub specular: u32,
    pub brdf_lut: u32,
    pub prefilter: u32,
    pub environment: u32,
    pub irradiance: u32,
    pub camera: u32,
    pub light: u32,
    pub model: u32,
    pub material: u32,
    pub material_sampler: u32,
    pub environment_sampler: u32,
}

impl Default for BindingTable {
    fn default() -> Self {
        Self {
            albedo: SamplingUnit::Albedo.binding(),
            metallic: SamplingUnit::Metallic.binding(),
            roughness: SamplingUnit::Roughness.binding(),
            normal: SamplingUnit::Normal.binding(),
            diffuse: SamplingUnit::DIFFUSE.binding(),
            specular: SamplingUnit::SPECULAR.binding(),
            brdf_lut: SamplingUnit::BrdfLut.binding(),
            prefilter: SamplingUnit::Prefilter.binding(),
            environment: SamplingUnit::Environment.binding(),
            irradiance: SamplingUnit::Irradiance.binding(),
            camera: UniformSlot::Camera.binding(),
            light: UniformSlot::Light.binding(),
            model: UniformSlot::Model.binding(),
            material: UniformSlot::Material.binding(),
            material_sampler: SamplerSlot::Material.binding(),
            environment_sampler: SamplerSlot::Environment.binding(),
        }
    }
}
