//! Unit cube and full-screen quad used by the offscreen capture passes and the skybox.

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl CubeVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

// (outward normal, u axis, v axis) with u x v == normal, so faces wind
// counter-clockwise seen from outside.
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

const FACE_CORNERS: [[f32; 2]; 6] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [1.0, 1.0],
    [1.0, 1.0],
    [0.0, 1.0],
    [0.0, 0.0],
];

/// The 36 vertices of the cube spanning -1..1 on every axis.
pub fn cube_vertices() -> Vec<CubeVertex> {
    let mut vertices = Vec::with_capacity(36);

    for (normal, u_axis, v_axis) in CUBE_FACES {
        for [s, t] in FACE_CORNERS {
            let (a, b) = (2.0 * s - 1.0, 2.0 * t - 1.0);
            let position = std::array::from_fn(|axis| normal[axis] + a * u_axis[axis] + b * v_axis[axis]);

            vertices.push(CubeVertex {
                position,
                normal,
                tex_coord: [s, t],
            });
        }
    }

    vertices
}

/// Triangle strip covering clip space, texture coordinates with v up.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, 1.0, 0.0],
        tex_coord: [0.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, -1.0, 0.0],
        tex_coord: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0, 0.0],
        tex_coord: [1.0, 1.0],
    },
    QuadVertex {
        position: [1.0, -1.0, 0.0],
        tex_coord: [1.0, 0.0],
    },
];

pub struct CubeGeometry {
    gpu_vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl CubeGeometry {
    pub fn from_device(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let vertices = cube_vertices();

        let gpu_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("CUBE_GEOMETRY_VERTEX_BUFFER"),
            size: std::mem::size_of_val(vertices.as_slice()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        queue.write_buffer(&gpu_vertex_buffer, 0, bytemuck::cast_slice(&vertices));

        Self {
            gpu_vertex_buffer,
            vertex_count: vertices.len() as u32,
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_vertex_buffer(0, self.gpu_vertex_buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

pub struct QuadGeometry {
    gpu_vertex_buffer: wgpu::Buffer,
}

impl QuadGeometry {
    pub fn from_device(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let gpu_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("QUAD_GEOMETRY_VERTEX_BUFFER"),
            size: std::mem::size_of_val(&QUAD_VERTICES) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        queue.write_buffer(&gpu_vertex_buffer, 0, bytemuck::cast_slice(&QUAD_VERTICES));

        Self { gpu_vertex_buffer }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_vertex_buffer(0, self.gpu_vertex_buffer.slice(..));
        render_pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
    }
}

/// Geometry shared by every offscreen pass, created once at startup.
pub struct GeometryPrimitives {
    pub cube: CubeGeometry,
    pub quad: QuadGeometry,
}

impl GeometryPrimitives {
    pub fn from_device(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            cube: CubeGeometry::from_device(device, queue),
            quad: QuadGeometry::from_device(device, queue),
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    #[test]
    fn cube_has_36_vertices_on_its_surface() {
        let vertices = cube_vertices();

        assert_eq!(vertices.len(), 36);

        for vertex in vertices {
            let max_component = vertex
                .position
                .iter()
                .fold(0.0_f32, |max, component| max.max(component.abs()));
            assert_eq!(max_component, 1.0);
        }
    }

    #[test]
    fn cube_triangles_wind_counter_clockwise_from_outside() {
        let vertices = cube_vertices();

        for triangle in vertices.chunks(3) {
            let a = Vector3::from(triangle[0].position);
            let b = Vector3::from(triangle[1].position);
            let c = Vector3::from(triangle[2].position);
            let face_normal = (b - a).cross(c - a).normalize();

            assert!(face_normal.dot(Vector3::from(triangle[0].normal)) > 0.999);
        }
    }

    #[test]
    fn quad_strip_covers_clip_space() {
        let min_x = QUAD_VERTICES.iter().map(|v| v.position[0]).fold(f32::MAX, f32::min);
        let max_y = QUAD_VERTICES.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);

        assert_eq!(min_x, -1.0);
        assert_eq!(max_y, 1.0);
        assert_eq!(QUAD_VERTICES[0].tex_coord, [0.0, 1.0]);
    }

    #[test]
    fn vertex_strides_match_layouts() {
        assert_eq!(CubeVertex::layout().array_stride, 32);
        assert_eq!(QuadVertex::layout().array_stride, 20);
    }
}
