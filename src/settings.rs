use anyhow::Result;

use crate::data::transform::ModelTransform;
use crate::error::Error;

pub const MAX_LIGHT_INTENSITY: f32 = 50.0;
pub const MAX_MOVE_SPEED: f32 = 30.0;
pub const MAX_SENSITIVITY: f32 = 50.0;
/// The irradiance shader loops (2π/δ)·(π/2/δ) times per texel.
pub const MIN_IRRADIANCE_SAMPLE_DELTA: f32 = 0.01;
pub const MAX_IRRADIANCE_SAMPLE_DELTA: f32 = 0.5;
pub const MAX_PREFILTER_SAMPLE_COUNT: u32 = 4096;

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Settings {
    pub scene: SceneSettings,
    pub light: LightSettings,
    pub camera: CameraSettings,
    pub ibl: IblSettings,
}

impl Settings {
    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|error| {
            Error::resource_load(format!(
                "Failed to read settings file {}: {error}",
                path.display()
            ))
        })?;

        let settings: Settings = serde_json::from_str(&contents).map_err(|error| {
            Error::resource_load(format!(
                "Failed to parse settings file {}: {error}",
                path.display()
            ))
        })?;

        settings.finish()
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(contents)
            .map_err(|error| Error::resource_load(format!("Failed to parse settings: {error}")))?;

        settings.finish()
    }

    fn finish(mut self) -> Result<Self> {
        self.clamp();
        self.ibl
            .validate(wgpu::Limits::default().max_texture_dimension_2d)?;

        Ok(self)
    }

    fn clamp(&mut self) {
        self.light.intensity = self.light.intensity.clamp(0.0, MAX_LIGHT_INTENSITY);
        self.camera.move_speed = self.camera.move_speed.clamp(0.0, MAX_MOVE_SPEED);
        self.camera.sensitivity = self.camera.sensitivity.clamp(0.0, MAX_SENSITIVITY);
        if self.ibl.irradiance_sample_delta.is_finite() {
            self.ibl.irradiance_sample_delta = self
                .ibl
                .irradiance_sample_delta
                .clamp(MIN_IRRADIANCE_SAMPLE_DELTA, MAX_IRRADIANCE_SAMPLE_DELTA);
        }
        self.ibl.prefilter_sample_count = self
            .ibl
            .prefilter_sample_count
            .clamp(1, MAX_PREFILTER_SAMPLE_COUNT);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SceneSettings {
    pub scale: [f32; 3],
    pub translation: [f32; 3],
    /// Euler angles in degrees.
    pub rotation: [f32; 3],
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            scale: [1.0; 3],
            translation: [0.0; 3],
            rotation: [0.0; 3],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct LightSettings {
    pub colour: [f32; 3],
    pub intensity: f32,
}

impl SceneSettings {
    /// Places the model at `translation` and rotates it in place there.
    pub fn model_transform(&self) -> ModelTransform {
        let mut transform = ModelTransform {
            rotation: self.rotation.into(),
            scale: self.scale.into(),
            ..Default::default()
        };
        transform.move_to(self.translation.into());

        transform
    }
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            colour: [1.0; 3],
            intensity: 5.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CameraSettings {
    pub move_speed: f32,
    pub sensitivity: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            sensitivity: 25.0,
        }
    }
}

/// Resolutions and sample counts of the image based lighting precomputation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct IblSettings {
    pub environment_size: u32,
    pub irradiance_size: u32,
    pub prefilter_size: u32,
    pub prefilter_mip_levels: u32,
    pub brdf_lut_size: u32,
    pub irradiance_sample_delta: f32,
    pub prefilter_sample_count: u32,
}

impl Default for IblSettings {
    fn default() -> Self {
        Self {
            environment_size: 512,
            irradiance_size: 32,
            prefilter_size: 128,
            prefilter_mip_levels: 5,
            brdf_lut_size: 512,
            irradiance_sample_delta: 0.025,
            prefilter_sample_count: 1024,
        }
    }
}

impl IblSettings {
    /// Checks the settings can be realised on a device whose textures are at
    /// most `max_texture_dimension` texels wide.
    pub fn validate(&self, max_texture_dimension: u32) -> Result<()> {
        let sizes = [
            ("environment_size", self.environment_size),
            ("irradiance_size", self.irradiance_size),
            ("prefilter_size", self.prefilter_size),
            ("brdf_lut_size", self.brdf_lut_size),
        ];

        for (name, size) in sizes {
            if size == 0 || size > max_texture_dimension {
                return Err(Error::invalid_configuration(format!(
                    "IBL setting {name} must be within 1..={max_texture_dimension}: {size}"
                ))
                .into());
            }
        }

        let max_mip_levels = full_mip_chain_length(self.prefilter_size);

        if self.prefilter_mip_levels < 2 || self.prefilter_mip_levels > max_mip_levels {
            return Err(Error::invalid_configuration(format!(
                "IBL setting prefilter_mip_levels must be within 2..={max_mip_levels} for a base size of {}: {}",
                self.prefilter_size, self.prefilter_mip_levels,
            ))
            .into());
        }

        let delta_range = MIN_IRRADIANCE_SAMPLE_DELTA..=MAX_IRRADIANCE_SAMPLE_DELTA;
        if !delta_range.contains(&self.irradiance_sample_delta) {
            return Err(Error::invalid_configuration(format!(
                "IBL setting irradiance_sample_delta must be within {MIN_IRRADIANCE_SAMPLE_DELTA}..={MAX_IRRADIANCE_SAMPLE_DELTA}: {}",
                self.irradiance_sample_delta
            ))
            .into());
        }

        if self.prefilter_sample_count == 0 || self.prefilter_sample_count > MAX_PREFILTER_SAMPLE_COUNT {
            return Err(Error::invalid_configuration(format!(
                "IBL setting prefilter_sample_count must be within 1..={MAX_PREFILTER_SAMPLE_COUNT}: {}",
                self.prefilter_sample_count
            ))
            .into());
        }

        Ok(())
    }

    pub fn environment_mip_levels(&self) -> u32 {
        full_mip_chain_length(self.environment_size)
    }
}

/// Number of levels from `size` down to 1x1.
pub fn full_mip_chain_length(size: u32) -> u32 {
    u32::BITS - size.max(1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = Settings::from_json("{}").unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.ibl.environment_size, 512);
        assert_eq!(settings.ibl.irradiance_size, 32);
        assert_eq!(settings.ibl.prefilter_size, 128);
        assert_eq!(settings.ibl.prefilter_mip_levels, 5);
        assert_eq!(settings.ibl.brdf_lut_size, 512);
        assert_eq!(settings.camera.move_speed, 3.0);
        assert_eq!(settings.camera.sensitivity, 25.0);
        assert_eq!(settings.light.intensity, 5.0);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let settings =
            Settings::from_json(r#"{ "scene": { "scale": [0.05, 0.05, 0.05] } }"#).unwrap();

        assert_eq!(settings.scene.scale, [0.05; 3]);
        assert_eq!(settings.scene.rotation, [0.0; 3]);
        assert_eq!(settings.light, LightSettings::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let settings = Settings::from_json(
            r#"{ "light": { "intensity": 80.0 }, "camera": { "move_speed": -1.0, "sensitivity": 51.0 } }"#,
        )
        .unwrap();

        assert_eq!(settings.light.intensity, MAX_LIGHT_INTENSITY);
        assert_eq!(settings.camera.move_speed, 0.0);
        assert_eq!(settings.camera.sensitivity, MAX_SENSITIVITY);
    }

    #[test]
    fn single_prefilter_level_is_rejected() {
        let error = Settings::from_json(r#"{ "ibl": { "prefilter_mip_levels": 1 } }"#).unwrap_err();

        assert_eq!(
            Error::kind_of(&error),
            Some(ErrorKind::InvalidConfiguration)
        );
    }

    #[test]
    fn prefilter_levels_beyond_chain_are_rejected() {
        let error = Settings::from_json(
            r#"{ "ibl": { "prefilter_size": 16, "prefilter_mip_levels": 6 } }"#,
        )
        .unwrap_err();

        assert_eq!(
            Error::kind_of(&error),
            Some(ErrorKind::InvalidConfiguration)
        );
    }

    #[test]
    fn sample_budget_is_clamped() {
        let settings = Settings::from_json(
            r#"{ "ibl": { "irradiance_sample_delta": 0.0001, "prefilter_sample_count": 1000000 } }"#,
        )
        .unwrap();

        assert_eq!(settings.ibl.irradiance_sample_delta, MIN_IRRADIANCE_SAMPLE_DELTA);
        assert_eq!(settings.ibl.prefilter_sample_count, MAX_PREFILTER_SAMPLE_COUNT);

        let settings =
            Settings::from_json(r#"{ "ibl": { "irradiance_sample_delta": -1.0 } }"#).unwrap();
        assert_eq!(settings.ibl.irradiance_sample_delta, MIN_IRRADIANCE_SAMPLE_DELTA);
    }

    #[test]
    fn sizes_beyond_the_texture_limit_are_rejected() {
        let error = Settings::from_json(r#"{ "ibl": { "environment_size": 65536 } }"#).unwrap_err();

        assert_eq!(
            Error::kind_of(&error),
            Some(ErrorKind::InvalidConfiguration)
        );
    }

    #[test]
    fn validation_uses_the_device_texture_limit() {
        let settings = IblSettings {
            brdf_lut_size: 1024,
            ..Default::default()
        };

        assert!(settings.validate(2048).is_ok());
        assert!(settings.validate(512).is_err());
    }

    #[test]
    fn unclamped_sample_delta_is_rejected() {
        let settings = IblSettings {
            irradiance_sample_delta: 0.001,
            ..Default::default()
        };

        assert!(settings.validate(8192).is_err());
    }

    #[test]
    fn scene_transform_rotates_the_model_in_place() {
        use cgmath::{Matrix4, Point3, Transform, Vector3};

        let scene = SceneSettings {
            scale: [2.0; 3],
            translation: [5.0, 0.0, 0.0],
            rotation: [0.0, 90.0, 0.0],
        };
        let transform = scene.model_transform();

        assert_eq!(transform.origin, Vector3::new(5.0, 0.0, 0.0));
        assert_eq!(transform.scale, Vector3::new(2.0, 2.0, 2.0));

        let matrix = Matrix4::from(transform);
        let centre = matrix.transform_point(Point3::new(0.0, 0.0, 0.0));
        approx::assert_abs_diff_eq!(centre, Point3::new(5.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn missing_file_is_a_load_failure() {
        let error = Settings::from_path(std::path::Path::new("does/not/exist.json")).unwrap_err();

        assert_eq!(
            Error::kind_of(&error),
            Some(ErrorKind::ResourceLoadFailure)
        );
    }

    #[test]
    fn mip_chain_length() {
        assert_eq!(full_mip_chain_length(1), 1);
        assert_eq!(full_mip_chain_length(128), 8);
        assert_eq!(full_mip_chain_length(512), 10);
        assert_eq!(full_mip_chain_length(300), 9);
    }
}
