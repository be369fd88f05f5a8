use cgmath::{Matrix, Matrix4, SquareMatrix};

use crate::data::transform::ModelTransform;
use crate::render::binding::UniformSlot;
use crate::render::material::GpuMaterial;
use crate::render::mesh::Mesh;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
}

impl From<ModelTransform> for ModelUniform {
    fn from(value: ModelTransform) -> Self {
        let model = Matrix4::from(value);
        // Singular transforms (a zero scale) leave normals untouched.
        let normal_matrix = model
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);

        Self {
            model: model.into(),
            normal_matrix: normal_matrix.into(),
        }
    }
}

pub fn create_model_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("MODEL_BIND_GROUP_LAYOUT"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: UniformSlot::Model.binding(),
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Meshes sharing one material and one transform.
pub struct Model {
    transform: ModelTransform,
    meshes: Vec<Mesh>,
    material: GpuMaterial,
    gpu_model_uniform_buffer: wgpu::Buffer,
    gpu_model_bind_group: wgpu::BindGroup,
    queue: std::rc::Rc<wgpu::Queue>,
}

impl Model {
    pub fn from_device(
        device: &wgpu::Device,
        queue: std::rc::Rc<wgpu::Queue>,
        name: &str,
        meshes: Vec<Mesh>,
        material: GpuMaterial,
        model_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let gpu_model_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{name}_MODEL_UNIFORM_BUFFER")),
            size: std::mem::size_of::<ModelUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let gpu_model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{name}_MODEL_BIND_GROUP")),
            layout: model_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: UniformSlot::Model.binding(),
                resource: gpu_model_uniform_buffer.as_entire_binding(),
            }],
        });

        let object = Self {
            transform: ModelTransform::default(),
            meshes,
            material,
            gpu_model_uniform_buffer,
            gpu_model_bind_group,
            queue,
        };
        object.update_uniform_buffer();

        object
    }

    pub fn material(&self) -> &GpuMaterial {
        &self.material
    }

    pub fn set_transform(&mut self, transform: ModelTransform) {
        if self.transform == transform {
            return;
        }

        self.transform = transform;
        self.update_uniform_buffer();
    }

    /// Issues one draw per mesh. The pipeline for the material's shading
    /// model and the view environment at group 0 must already be bound.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_bind_group(1, &self.gpu_model_bind_group, &[]);
        render_pass.set_bind_group(2, &self.material.gpu_bind_group, &[]);

        for mesh in self.meshes.iter() {
            mesh.draw(render_pass);
        }
    }

    fn update_uniform_buffer(&self) {
        self.queue.write_buffer(
            &self.gpu_model_uniform_buffer,
            0,
            bytemuck::cast_slice(&[ModelUniform::from(self.transform)]),
        );
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use cgmath::{InnerSpace, Vector3, Vector4};

    use super::*;

    #[test]
    fn uniform_holds_two_matrices() {
        assert_eq!(std::mem::size_of::<ModelUniform>(), 128);
    }

    #[test]
    fn normals_stay_perpendicular_under_nonuniform_scale() {
        let transform = ModelTransform {
            scale: Vector3::new(4.0, 1.0, 1.0),
            ..Default::default()
        };
        let uniform = ModelUniform::from(transform);
        let model = Matrix4::from(uniform.model);
        let normal_matrix = Matrix4::from(uniform.normal_matrix);

        // A surface along the diagonal x = y keeps its normal perpendicular.
        let tangent = (model * Vector4::new(1.0, 1.0, 0.0, 0.0)).truncate();
        let normal = (normal_matrix * Vector4::new(1.0, -1.0, 0.0, 0.0)).truncate();

        assert_abs_diff_eq!(tangent.dot(normal), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn zero_scale_falls_back_to_identity_normals() {
        let transform = ModelTransform {
            scale: Vector3::new(0.0, 1.0, 1.0),
            ..Default::default()
        };
        let uniform = ModelUniform::from(transform);

        assert_eq!(Matrix4::from(uniform.normal_matrix), Matrix4::identity());
    }
}
