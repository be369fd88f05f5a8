//! Offscreen device and readback helpers for tests that need a GPU adapter.

use std::rc::Rc;

use crate::render::geometry::GeometryPrimitives;
use crate::render::ibl::IblPrecomputer;
use crate::render::mipmap::MipmapGenerator;
use crate::render::shader::{load_shader_templates, ShaderTemplateContext};
use crate::settings::IblSettings;

pub struct HeadlessGpu {
    pub device: Rc<wgpu::Device>,
    pub queue: Rc<wgpu::Queue>,
    pub tera: tera::Tera,
    pub settings: IblSettings,
    pub geometry: GeometryPrimitives,
    pub mipmap_generator: MipmapGenerator,
}

impl HeadlessGpu {
    /// Panics when the machine has no usable adapter, so callers are
    /// `#[ignore]`d by default.
    pub fn new() -> Self {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .expect("no GPU adapter available");
        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None))
                .expect("failed to request a device");

        let device = Rc::new(device);
        let queue = Rc::new(queue);
        let tera = load_shader_templates().unwrap();
        let settings = IblSettings {
            environment_size: 32,
            irradiance_size: 8,
            prefilter_size: 16,
            prefilter_mip_levels: 3,
            brdf_lut_size: 32,
            irradiance_sample_delta: 0.1,
            prefilter_sample_count: 64,
        };
        let shader_template_context = ShaderTemplateContext::from_ibl_settings(&settings);

        Self {
            geometry: GeometryPrimitives::from_device(&device, &queue),
            mipmap_generator: MipmapGenerator::from_device(
                device.clone(),
                queue.clone(),
                &tera,
                &shader_template_context,
            )
            .unwrap(),
            device,
            queue,
            tera,
            settings,
        }
    }

    pub fn ibl_precomputer(&self) -> IblPrecomputer {
        IblPrecomputer::from_device(
            self.device.clone(),
            self.queue.clone(),
            &self.tera,
            self.settings,
            &self.geometry,
        )
        .unwrap()
    }

    /// Reads one layer and mip level of a half float texture back as rows of
    /// texels.
    pub fn read_texels(
        &self,
        gpu_texture: &wgpu::Texture,
        layer: u32,
        mip_level: u32,
        channels: u32,
    ) -> Vec<Vec<Vec<f32>>> {
        let extent = (gpu_texture.width() >> mip_level).max(1);
        let bytes_per_texel = channels * 2;
        let unpadded_bytes_per_row = extent * bytes_per_texel;
        let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(alignment) * alignment;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("READBACK_BUFFER"),
            size: (padded_bytes_per_row * extent) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: gpu_texture,
                mip_level,
                origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(extent),
                },
            },
            wgpu::Extent3d {
                width: extent,
                height: extent,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        slice.map_async(wgpu::MapMode::Read, |_| ());
        self.device.poll(wgpu::Maintain::Wait);

        let data = slice.get_mapped_range();
        let texels = (0..extent)
            .map(|row| {
                let row_start = (row * padded_bytes_per_row) as usize;
                (0..extent)
                    .map(|column| {
                        (0..channels)
                            .map(|channel| {
                                let offset = row_start
                                    + ((column * bytes_per_texel) + channel * 2) as usize;
                                half::f16::from_bits(u16::from_le_bytes([
                                    data[offset],
                                    data[offset + 1],
                                ]))
                                .to_f32()
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();

        drop(data);
        buffer.unmap();

        texels
    }
}
