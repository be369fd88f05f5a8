use anyhow::Result;

use crate::error::Error;

/// Reads a Radiance HDR panorama as linear RGBA floats. Rows are kept in file
/// order, so row 0 is the zenith.
pub fn load_hdr_image(path: &std::path::Path) -> Result<image::Rgba32FImage> {
    let bytes = read_file(path)?;

    decode_hdr_image(&bytes)
        .map_err(|error| Error::resource_load(format!("{}: {error}", path.display())).into())
}

pub fn decode_hdr_image(bytes: &[u8]) -> Result<image::Rgba32FImage> {
    match image::load_from_memory_with_format(bytes, image::ImageFormat::Hdr) {
        Ok(image) => Ok(image.to_rgba32f()),
        Err(error) => {
            Err(Error::resource_load(format!("Failed to decode HDR image: {error}")).into())
        }
    }
}

/// Reads a PNG or JPEG texture as 8 bit RGBA.
pub fn load_rgba_image(path: &std::path::Path) -> Result<image::RgbaImage> {
    let bytes = read_file(path)?;

    decode_rgba_image(&bytes)
        .map_err(|error| Error::resource_load(format!("{}: {error}", path.display())).into())
}

pub fn decode_rgba_image(bytes: &[u8]) -> Result<image::RgbaImage> {
    match image::load_from_memory(bytes) {
        Ok(image) => Ok(image.to_rgba8()),
        Err(error) => Err(Error::resource_load(format!("Failed to decode image: {error}")).into()),
    }
}

fn read_file(path: &std::path::Path) -> Result<Vec<u8>> {
    log::info!("Loading image {}", path.display());

    std::fs::read(path).map_err(|error| {
        Error::resource_load(format!("Failed to read {}: {error}", path.display())).into()
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::error::ErrorKind;

    fn encode(image: image::DynamicImage, format: image::ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    #[test]
    fn hdr_pixels_keep_their_rows() {
        let source = image::Rgb32FImage::from_fn(4, 2, |_, y| {
            if y == 0 {
                image::Rgb([2.0, 1.0, 0.5])
            } else {
                image::Rgb([0.25, 0.125, 4.0])
            }
        });

        let decoded = decode_hdr_image(&encode(
            image::DynamicImage::ImageRgb32F(source),
            image::ImageFormat::Hdr,
        ))
        .unwrap();

        assert_eq!(decoded.dimensions(), (4, 2));

        let top = decoded.get_pixel(3, 0);
        assert_abs_diff_eq!(top[0], 2.0, epsilon = 1e-2);
        assert_abs_diff_eq!(top[1], 1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(top[2], 0.5, epsilon = 1e-2);
        assert_eq!(top[3], 1.0);

        let bottom = decoded.get_pixel(0, 1);
        assert_abs_diff_eq!(bottom[2], 4.0, epsilon = 1e-2);
    }

    #[test]
    fn png_decodes_to_rgba8() {
        let source = image::RgbImage::from_pixel(3, 3, image::Rgb([10, 20, 30]));

        let decoded = decode_rgba_image(&encode(
            image::DynamicImage::ImageRgb8(source),
            image::ImageFormat::Png,
        ))
        .unwrap();

        assert_eq!(decoded.get_pixel(1, 1), &image::Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn garbage_is_a_load_failure() {
        let error = decode_hdr_image(b"not an image").unwrap_err();

        assert_eq!(Error::kind_of(&error), Some(ErrorKind::ResourceLoadFailure));
    }

    #[test]
    fn missing_file_is_a_load_failure() {
        let error = load_hdr_image(std::path::Path::new("does/not/exist.hdr")).unwrap_err();

        assert_eq!(Error::kind_of(&error), Some(ErrorKind::ResourceLoadFailure));
        assert!(error.to_string().contains("exist.hdr"));
    }

    #[test]
    fn bundled_panorama_decodes() {
        let path = std::path::Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/environment.hdr"));
        let panorama = load_hdr_image(path).unwrap();

        assert_eq!(panorama.dimensions(), (64, 32));
        let brightest = panorama.pixels().map(|pixel| pixel[0]).fold(0.0, f32::max);
        assert!(brightest > 10.0);
    }
}
