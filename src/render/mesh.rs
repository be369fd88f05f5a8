#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub colour: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x3,
        4 => Float32x3,
        5 => Float32x3,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// CPU side geometry of one sub-mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Option<Vec<u32>>,
}

struct IndexBuffer {
    gpu_buffer: wgpu::Buffer,
    count: u32,
}

pub struct Mesh {
    pub name: String,
    gpu_vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    index_buffer: Option<IndexBuffer>,
}

impl Mesh {
    pub fn from_data(device: &wgpu::Device, queue: &wgpu::Queue, mesh_data: &MeshData) -> Self {
        let name = &mesh_data.name;

        let gpu_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{name}_VERTEX_BUFFER")),
            size: std::mem::size_of_val(mesh_data.vertices.as_slice()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(
            &gpu_vertex_buffer,
            0,
            bytemuck::cast_slice(&mesh_data.vertices),
        );

        let index_buffer = mesh_data.indices.as_ref().map(|indices| {
            let gpu_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{name}_INDEX_BUFFER")),
                size: std::mem::size_of_val(indices.as_slice()) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(&gpu_buffer, 0, bytemuck::cast_slice(indices));

            IndexBuffer {
                gpu_buffer,
                count: indices.len() as u32,
            }
        });

        Self {
            name: name.clone(),
            gpu_vertex_buffer,
            vertex_count: mesh_data.vertices.len() as u32,
            index_buffer,
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_vertex_buffer(0, self.gpu_vertex_buffer.slice(..));

        match &self.index_buffer {
            Some(index_buffer) => {
                render_pass.set_index_buffer(
                    index_buffer.gpu_buffer.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                render_pass.draw_indexed(0..index_buffer.count, 0, 0..1);
            }
            None => {
                render_pass.draw(0..self.vertex_count, 0..1);
            }
        }
    }
}
