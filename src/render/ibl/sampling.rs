//! CPU versions of the sampling math run by the IBL shaders, used to check
//! the shader conventions without a GPU.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Vector2, Vector3};

use crate::render::ibl::capture::CubeFace;

/// Texture coordinates of `direction` in an equirectangular image whose
/// first row is the zenith.
pub fn equirectangular_uv(direction: Vector3<f32>) -> Vector2<f32> {
    let direction = direction.normalize();

    Vector2::new(
        direction.z.atan2(direction.x) / (2.0 * PI) + 0.5,
        0.5 - direction.y.clamp(-1.0, 1.0).asin() / PI,
    )
}

/// Nearest texel lookup with horizontal wrapping.
pub fn sample_equirectangular(image: &image::Rgba32FImage, direction: Vector3<f32>) -> [f32; 3] {
    let (width, height) = image.dimensions();
    let uv = equirectangular_uv(direction);

    let x = ((uv.x * width as f32).floor() as i64).rem_euclid(width as i64) as u32;
    let y = ((uv.y * height as f32).floor() as i64).clamp(0, height as i64 - 1) as u32;

    let pixel = image.get_pixel(x, y);
    [pixel[0], pixel[1], pixel[2]]
}

/// Face and (s, t) a cube texture lookup in `direction` resolves to. `t` grows
/// with the row index.
pub fn cube_face_coordinates(direction: Vector3<f32>) -> (CubeFace, f32, f32) {
    let Vector3 { x, y, z } = direction;
    let (ax, ay, az) = (x.abs(), y.abs(), z.abs());

    let (face, sc, tc, major) = if ax >= ay && ax >= az {
        if x > 0.0 {
            (CubeFace::PositiveX, -z, -y, ax)
        } else {
            (CubeFace::NegativeX, z, -y, ax)
        }
    } else if ay >= az {
        if y > 0.0 {
            (CubeFace::PositiveY, x, z, ay)
        } else {
            (CubeFace::NegativeY, x, -z, ay)
        }
    } else if z > 0.0 {
        (CubeFace::PositiveZ, x, -y, az)
    } else {
        (CubeFace::NegativeZ, -x, -y, az)
    };

    (face, 0.5 * (sc / major + 1.0), 0.5 * (tc / major + 1.0))
}

pub fn radical_inverse_vdc(mut bits: u32) -> f32 {
    bits = bits.rotate_left(16);
    bits = ((bits & 0x5555_5555) << 1) | ((bits & 0xAAAA_AAAA) >> 1);
    bits = ((bits & 0x3333_3333) << 2) | ((bits & 0xCCCC_CCCC) >> 2);
    bits = ((bits & 0x0F0F_0F0F) << 4) | ((bits & 0xF0F0_F0F0) >> 4);
    bits = ((bits & 0x00FF_00FF) << 8) | ((bits & 0xFF00_FF00) >> 8);
    bits as f32 * 2.328_306_4e-10
}

pub fn hammersley(index: u32, count: u32) -> Vector2<f32> {
    Vector2::new(index as f32 / count as f32, radical_inverse_vdc(index))
}

/// GGX half vector around `normal` for the low discrepancy point `xi`.
pub fn importance_sample_ggx(xi: Vector2<f32>, normal: Vector3<f32>, roughness: f32) -> Vector3<f32> {
    let a = roughness * roughness;

    let phi = 2.0 * PI * xi.x;
    let cos_theta = ((1.0 - xi.y) / (1.0 + (a * a - 1.0) * xi.y)).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    let half_vector = Vector3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta);

    let up = if normal.z.abs() < 0.999 {
        Vector3::unit_z()
    } else {
        Vector3::unit_x()
    };
    let tangent = up.cross(normal).normalize();
    let bitangent = normal.cross(tangent);

    (tangent * half_vector.x + bitangent * half_vector.y + normal * half_vector.z).normalize()
}

/// Schlick-GGX with the image based lighting remapping `k = a^2 / 2`.
pub fn geometry_schlick_ggx(n_dot_v: f32, roughness: f32) -> f32 {
    let k = (roughness * roughness) / 2.0;
    n_dot_v / (n_dot_v * (1.0 - k) + k)
}

pub fn geometry_smith(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    geometry_schlick_ggx(n_dot_v, roughness) * geometry_schlick_ggx(n_dot_l, roughness)
}

/// Split sum scale and bias for one (NdotV, roughness) pair.
pub fn integrate_brdf(n_dot_v: f32, roughness: f32, sample_count: u32) -> Vector2<f32> {
    let view = Vector3::new((1.0 - n_dot_v * n_dot_v).sqrt(), 0.0, n_dot_v);
    let normal = Vector3::unit_z();

    let mut scale = 0.0;
    let mut bias = 0.0;

    for index in 0..sample_count {
        let xi = hammersley(index, sample_count);
        let half_vector = importance_sample_ggx(xi, normal, roughness);
        let light = (half_vector * 2.0 * view.dot(half_vector) - view).normalize();

        let n_dot_l = light.z.max(0.0);
        let n_dot_h = half_vector.z.max(0.0);
        let v_dot_h = view.dot(half_vector).max(0.0);

        if n_dot_l > 0.0 {
            let geometry = geometry_smith(n_dot_v, n_dot_l, roughness);
            let geometry_visibility = (geometry * v_dot_h) / (n_dot_h * n_dot_v);
            let fresnel = (1.0 - v_dot_h).powi(5);

            scale += (1.0 - fresnel) * geometry_visibility;
            bias += fresnel * geometry_visibility;
        }
    }

    Vector2::new(scale, bias) / sample_count as f32
}

/// (NdotV, roughness) stored at texel (`column`, `row`) of a `size` square LUT.
pub fn brdf_lut_coordinates(column: u32, row: u32, size: u32) -> (f32, f32) {
    (
        (column as f32 + 0.5) / size as f32,
        (row as f32 + 0.5) / size as f32,
    )
}

/// Cosine weighted hemisphere integral of `environment` around `normal`,
/// stepping both spherical angles by `sample_delta`.
pub fn convolve_irradiance(
    normal: Vector3<f32>,
    sample_delta: f32,
    environment: impl Fn(Vector3<f32>) -> [f32; 3],
) -> [f32; 3] {
    let normal = normal.normalize();
    let mut up = if normal.y.abs() < 0.999 {
        Vector3::unit_y()
    } else {
        Vector3::unit_z()
    };
    let right = up.cross(normal).normalize();
    up = normal.cross(right).normalize();

    let mut irradiance = [0.0_f32; 3];
    let mut sample_count = 0.0_f32;

    let mut phi = 0.0_f32;
    while phi < 2.0 * PI {
        let mut theta = 0.0_f32;
        while theta < 0.5 * PI {
            let tangent_sample = Vector3::new(
                theta.sin() * phi.cos(),
                theta.sin() * phi.sin(),
                theta.cos(),
            );
            let sample_direction =
                right * tangent_sample.x + up * tangent_sample.y + normal * tangent_sample.z;

            let radiance = environment(sample_direction);
            let weight = theta.cos() * theta.sin();
            for channel in 0..3 {
                irradiance[channel] += radiance[channel] * weight;
            }

            sample_count += 1.0;
            theta += sample_delta;
        }
        phi += sample_delta;
    }

    irradiance.map(|channel| PI * channel / sample_count)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn equirectangular_uv_of_cardinal_directions() {
        assert_abs_diff_eq!(
            equirectangular_uv(Vector3::unit_x()),
            Vector2::new(0.5, 0.5),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            equirectangular_uv(Vector3::unit_z()),
            Vector2::new(0.75, 0.5),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            equirectangular_uv(-Vector3::unit_z()),
            Vector2::new(0.25, 0.5),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(equirectangular_uv(Vector3::unit_y()).y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(equirectangular_uv(-Vector3::unit_y()).y, 1.0, epsilon = 1e-6);
    }

    fn quadrant_image() -> image::Rgba32FImage {
        // 16x8 with one colour per horizontal quarter.
        image::Rgba32FImage::from_fn(16, 8, |x, _| {
            let quarter = (x / 4) as f32;
            image::Rgba([quarter, 1.0 - quarter / 4.0, 0.5, 1.0])
        })
    }

    #[test]
    fn cardinal_and_ordinal_directions_sample_expected_quarters() {
        let image = quadrant_image();

        let expected_quarter = |direction: Vector3<f32>| -> f32 {
            let u = equirectangular_uv(direction).x.rem_euclid(1.0);
            (u * 4.0).floor()
        };

        let directions = [
            Vector3::new(1.0, 0.0, 0.3),
            Vector3::new(-1.0, 0.0, -0.3),
            Vector3::new(0.3, 0.0, 1.0),
            Vector3::new(-0.3, 0.0, -1.0),
            Vector3::new(1.0, 0.2, 1.0),
            Vector3::new(-1.0, -0.2, 1.0),
            Vector3::new(-1.0, 0.2, -1.0),
            Vector3::new(1.0, -0.2, -1.0),
        ];

        for direction in directions {
            let sample = sample_equirectangular(&image, direction);
            assert_eq!(sample[0], expected_quarter(direction), "{direction:?}");
        }
    }

    #[test]
    fn cube_face_coordinates_of_face_centres() {
        for face in CubeFace::ALL {
            let (sampled_face, s, t) = cube_face_coordinates(face.direction());

            assert_eq!(sampled_face, face);
            assert_abs_diff_eq!(s, 0.5, epsilon = 1e-6);
            assert_abs_diff_eq!(t, 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn hammersley_sequence() {
        assert_eq!(hammersley(0, 4), Vector2::new(0.0, 0.0));
        assert_abs_diff_eq!(hammersley(1, 4), Vector2::new(0.25, 0.5), epsilon = 1e-6);
        assert_abs_diff_eq!(hammersley(2, 4), Vector2::new(0.5, 0.25), epsilon = 1e-6);
        assert_abs_diff_eq!(hammersley(3, 4), Vector2::new(0.75, 0.75), epsilon = 1e-6);
    }

    #[test]
    fn smooth_surfaces_sample_along_the_normal() {
        let normal = Vector3::new(0.0, 1.0, 0.0);
        let half_vector = importance_sample_ggx(Vector2::new(0.3, 0.7), normal, 0.0);

        assert_abs_diff_eq!(half_vector, normal, epsilon = 1e-5);
    }

    #[test]
    fn brdf_at_normal_incidence_and_zero_roughness_is_mirror() {
        let value = integrate_brdf(1.0, 0.0, 1024);

        assert_abs_diff_eq!(value.x, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(value.y, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn brdf_terms_stay_in_unit_range() {
        for (n_dot_v, roughness) in [(0.1, 0.2), (0.5, 0.5), (0.9, 1.0)] {
            let value = integrate_brdf(n_dot_v, roughness, 256);

            assert!(value.x >= 0.0 && value.y >= 0.0);
            assert!(value.x + value.y <= 1.05);
        }
    }

    #[test]
    fn flat_environment_gives_flat_irradiance() {
        let colour = [0.5, 0.25, 0.125];

        for direction in [
            Vector3::unit_x(),
            Vector3::unit_y(),
            -Vector3::unit_y(),
            Vector3::new(0.3, -0.5, 0.8),
        ] {
            let irradiance = convolve_irradiance(direction, 0.025, |_| colour);

            for channel in 0..3 {
                assert_abs_diff_eq!(irradiance[channel], colour[channel], epsilon = 0.02);
            }
        }
    }

    #[test]
    fn lut_row_index_is_roughness() {
        let (n_dot_v, roughness) = brdf_lut_coordinates(511, 0, 512);

        assert!(n_dot_v > 0.99);
        assert!(roughness < 0.01);
    }
}
