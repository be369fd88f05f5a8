use cgmath::Vector3;

use crate::render::binding::{SamplerSlot, SamplingUnit, UniformSlot};
use crate::render::mipmap::MipmapGenerator;
use crate::render::texture::{Texture2D, TextureKind};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadingModel {
    BlinnPhong,
    Pbr,
}

impl ShadingModel {
    pub fn fragment_template(self) -> &'static str {
        match self {
            ShadingModel::BlinnPhong => "scene/blinn_phong.frag",
            ShadingModel::Pbr => "scene/pbr.frag",
        }
    }

    pub fn id(self) -> u32 {
        match self {
            ShadingModel::BlinnPhong => 0,
            ShadingModel::Pbr => 1,
        }
    }

    pub fn default_material(self) -> Material {
        match self {
            ShadingModel::BlinnPhong => Material::BlinnPhong {
                ambient: Vector3::new(0.1, 0.1, 0.1),
                diffuse: Vector3::new(1.0, 1.0, 1.0),
                specular: Vector3::new(0.5, 0.5, 0.5),
                shininess: 32.0,
            },
            ShadingModel::Pbr => Material::Pbr {
                ambient: Vector3::new(0.03, 0.03, 0.03),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Material {
    BlinnPhong {
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
        shininess: f32,
    },
    /// Surface parameters come from the albedo, metallic, roughness and
    /// normal maps. `ambient` is the floor of the image based ambient term.
    Pbr { ambient: Vector3<f32> },
}

impl Material {
    pub fn shading_model(&self) -> ShadingModel {
        match self {
            Material::BlinnPhong { .. } => ShadingModel::BlinnPhong,
            Material::Pbr { .. } => ShadingModel::Pbr,
        }
    }

    pub fn uniform(&self) -> MaterialUniform {
        let shading_model = self.shading_model().id();

        match *self {
            Material::BlinnPhong {
                ambient,
                diffuse,
                specular,
                shininess,
            } => MaterialUniform {
                ambient: ambient.into(),
                shading_model,
                diffuse: diffuse.into(),
                shininess,
                specular: specular.into(),
                _padding: 0.0,
            },
            Material::Pbr { ambient } => MaterialUniform {
                ambient: ambient.into(),
                shading_model,
                diffuse: [0.0; 3],
                shininess: 0.0,
                specular: [0.0; 3],
                _padding: 0.0,
            },
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub ambient: [f32; 3],
    pub shading_model: u32,
    pub diffuse: [f32; 3],
    pub shininess: f32,
    pub specular: [f32; 3],
    _padding: f32,
}

/// Material maps by sampling unit. Blinn-Phong reads its diffuse map from
/// the albedo unit and its specular map from the metallic unit.
#[derive(Clone, Debug, Default)]
pub struct MaterialTexturePaths {
    pub albedo: Option<std::path::PathBuf>,
    pub metallic: Option<std::path::PathBuf>,
    pub roughness: Option<std::path::PathBuf>,
    pub normal: Option<std::path::PathBuf>,
}

impl MaterialTexturePaths {
    fn get(&self, sampling_unit: SamplingUnit) -> Option<&std::path::Path> {
        let path = match sampling_unit {
            SamplingUnit::Albedo => &self.albedo,
            SamplingUnit::Metallic => &self.metallic,
            SamplingUnit::Roughness => &self.roughness,
            SamplingUnit::Normal => &self.normal,
            _ => &None,
        };

        path.as_deref()
    }
}

pub const MATERIAL_SAMPLING_UNITS: [SamplingUnit; 4] = [
    SamplingUnit::Albedo,
    SamplingUnit::Metallic,
    SamplingUnit::Roughness,
    SamplingUnit::Normal,
];

pub fn texture_kind(sampling_unit: SamplingUnit) -> TextureKind {
    match sampling_unit {
        SamplingUnit::Albedo => TextureKind::Color,
        _ => TextureKind::Data,
    }
}

/// Texel bound when a map is missing. PBR surfaces default to dielectric;
/// Blinn-Phong keeps a white specular map at the metallic unit.
pub fn fallback_texel(shading_model: ShadingModel, sampling_unit: SamplingUnit) -> [u8; 4] {
    match (shading_model, sampling_unit) {
        (_, SamplingUnit::Normal) => [128, 128, 255, 255],
        (ShadingModel::Pbr, SamplingUnit::Metallic) => [0, 0, 0, 255],
        _ => [255, 255, 255, 255],
    }
}

pub struct MaterialTextures {
    textures: Vec<(SamplingUnit, Texture2D)>,
}

impl MaterialTextures {
    /// Loads every map in `paths`, substituting a solid texture for each one
    /// that is absent or fails to load.
    pub fn load(
        paths: &MaterialTexturePaths,
        shading_model: ShadingModel,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mipmap_generator: &MipmapGenerator,
    ) -> Self {
        let textures = MATERIAL_SAMPLING_UNITS
            .iter()
            .map(|&sampling_unit| {
                let kind = texture_kind(sampling_unit);
                let loaded = paths.get(sampling_unit).map(|path| {
                    Texture2D::from_path(path, kind, device, queue, mipmap_generator)
                });

                let texture = match loaded {
                    Some(Ok(texture)) => texture,
                    Some(Err(error)) => {
                        log::warn!("Using a fallback {sampling_unit:?} map: {error}");
                        MaterialTextures::fallback(shading_model, sampling_unit, device, queue)
                    }
                    None => MaterialTextures::fallback(shading_model, sampling_unit, device, queue),
                };

                (sampling_unit, texture)
            })
            .collect();

        Self { textures }
    }

    fn fallback(
        shading_model: ShadingModel,
        sampling_unit: SamplingUnit,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Texture2D {
        Texture2D::solid(
            &format!("FALLBACK_{sampling_unit:?}"),
            fallback_texel(shading_model, sampling_unit),
            texture_kind(sampling_unit),
            device,
            queue,
        )
    }
}

pub fn create_material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries = MATERIAL_SAMPLING_UNITS
        .iter()
        .map(|sampling_unit| wgpu::BindGroupLayoutEntry {
            binding: sampling_unit.binding(),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        })
        .collect::<Vec<_>>();

    entries.push(wgpu::BindGroupLayoutEntry {
        binding: SamplerSlot::Material.binding(),
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });

    entries.push(wgpu::BindGroupLayoutEntry {
        binding: UniformSlot::Material.binding(),
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    });

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("MATERIAL_BIND_GROUP_LAYOUT"),
        entries: &entries,
    })
}

/// A material with its maps and uniform buffer bound at their fixed slots.
pub struct GpuMaterial {
    material: Material,
    #[allow(dead_code)]
    textures: MaterialTextures,
    #[allow(dead_code)]
    gpu_sampler: wgpu::Sampler,
    gpu_material_uniform_buffer: wgpu::Buffer,
    pub gpu_bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    pub fn from_device(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        material: Material,
        textures: MaterialTextures,
        material_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let gpu_material_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{name}_MATERIAL_UNIFORM_BUFFER")),
            size: std::mem::size_of::<MaterialUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let gpu_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{name}_MATERIAL_SAMPLER")),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mut entries = textures
            .textures
            .iter()
            .map(|(sampling_unit, texture)| wgpu::BindGroupEntry {
                binding: sampling_unit.binding(),
                resource: wgpu::BindingResource::TextureView(&texture.gpu_texture_view),
            })
            .collect::<Vec<_>>();

        entries.push(wgpu::BindGroupEntry {
            binding: SamplerSlot::Material.binding(),
            resource: wgpu::BindingResource::Sampler(&gpu_sampler),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: UniformSlot::Material.binding(),
            resource: gpu_material_uniform_buffer.as_entire_binding(),
        });

        let gpu_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{name}_MATERIAL_BIND_GROUP")),
            layout: material_bind_group_layout,
            entries: &entries,
        });

        let object = Self {
            material,
            textures,
            gpu_sampler,
            gpu_material_uniform_buffer,
            gpu_bind_group,
        };
        object.send_uniforms(queue);

        object
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    fn send_uniforms(&self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.gpu_material_uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.material.uniform()]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layout_matches_wgsl() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
        assert_eq!(std::mem::offset_of!(MaterialUniform, diffuse), 16);
        assert_eq!(std::mem::offset_of!(MaterialUniform, specular), 32);
    }

    #[test]
    fn pbr_default_ambient_is_three_percent() {
        let uniform = ShadingModel::Pbr.default_material().uniform();

        assert_eq!(uniform.ambient, [0.03; 3]);
        assert_eq!(uniform.shading_model, ShadingModel::Pbr.id());
    }

    #[test]
    fn each_shading_model_has_its_own_fragment_shader() {
        assert_ne!(
            ShadingModel::Pbr.fragment_template(),
            ShadingModel::BlinnPhong.fragment_template()
        );
        assert_eq!(
            ShadingModel::BlinnPhong.default_material().shading_model(),
            ShadingModel::BlinnPhong
        );
    }

    #[test]
    fn only_albedo_is_colour_data() {
        assert_eq!(texture_kind(SamplingUnit::Albedo), TextureKind::Color);
        assert_eq!(texture_kind(SamplingUnit::DIFFUSE), TextureKind::Color);
        assert_eq!(texture_kind(SamplingUnit::Normal), TextureKind::Data);
        assert_eq!(texture_kind(SamplingUnit::Roughness), TextureKind::Data);
    }

    #[test]
    fn fallbacks_are_neutral() {
        for shading_model in [ShadingModel::Pbr, ShadingModel::BlinnPhong] {
            assert_eq!(fallback_texel(shading_model, SamplingUnit::Albedo), [255; 4]);
            assert_eq!(
                fallback_texel(shading_model, SamplingUnit::Normal),
                [128, 128, 255, 255]
            );
        }
    }

    #[test]
    fn missing_metallic_map_is_dielectric() {
        assert_eq!(
            fallback_texel(ShadingModel::Pbr, SamplingUnit::Metallic),
            [0, 0, 0, 255]
        );
    }

    #[test]
    fn missing_specular_map_keeps_full_highlights() {
        assert_eq!(
            fallback_texel(ShadingModel::BlinnPhong, SamplingUnit::SPECULAR),
            [255; 4]
        );
    }

    #[test]
    fn shading_model_names_match_the_command_line() {
        let shading_model: ShadingModel = serde_json::from_str("\"blinn-phong\"").unwrap();

        assert_eq!(shading_model, ShadingModel::BlinnPhong);
    }
}
