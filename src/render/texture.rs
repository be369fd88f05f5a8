use anyhow::Result;

use crate::render::mipmap::MipmapGenerator;
use crate::resource::image::load_rgba_image;
use crate::settings::full_mip_chain_length;

/// How the texels of a material texture are interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextureKind {
    /// sRGB encoded colour, linearized by the sampler.
    Color,
    /// Linear values such as metalness, roughness or normals.
    Data,
}

impl TextureKind {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            TextureKind::Color => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureKind::Data => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

pub struct Texture2D {
    #[allow(dead_code)]
    pub gpu_texture: wgpu::Texture,
    pub gpu_texture_view: wgpu::TextureView,
}

impl Texture2D {
    pub fn from_path(
        path: &std::path::Path,
        kind: TextureKind,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mipmap_generator: &MipmapGenerator,
    ) -> Result<Self> {
        let image = load_rgba_image(path)?;
        let name = path.display().to_string();

        Texture2D::from_image(&image, &name, kind, device, queue, mipmap_generator)
    }

    /// Uploads `image` and fills its whole mip chain.
    pub fn from_image(
        image: &image::RgbaImage,
        name: &str,
        kind: TextureKind,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mipmap_generator: &MipmapGenerator,
    ) -> Result<Self> {
        let (width, height) = image.dimensions();
        let texture = Texture2D::upload(
            image,
            name,
            kind,
            full_mip_chain_length(width.max(height)),
            device,
            queue,
        );

        mipmap_generator.generate_mipmaps(&texture.gpu_texture, name)?;

        Ok(texture)
    }

    /// A single texel texture, used in place of a material map that failed to load.
    pub fn solid(
        name: &str,
        texel: [u8; 4],
        kind: TextureKind,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Self {
        let image = image::RgbaImage::from_pixel(1, 1, image::Rgba(texel));

        Texture2D::upload(&image, name, kind, 1, device, queue)
    }

    fn upload(
        image: &image::RgbaImage,
        name: &str,
        kind: TextureKind,
        mip_level_count: u32,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Self {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{name}_TEXTURE")),
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: kind.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let gpu_texture_view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            gpu_texture,
            gpu_texture_view,
        }
    }
}

pub struct DepthTexture2DPackage {
    #[allow(dead_code)]
    pub gpu_texture: wgpu::Texture,
    pub gpu_texture_view: wgpu::TextureView,
}
