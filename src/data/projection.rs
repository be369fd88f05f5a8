#[derive(Copy, Clone, Debug)]
pub struct PerspectiveProjection {
    pub aspect_ratio: f32,
    pub fovy: cgmath::Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl From<PerspectiveProjection> for cgmath::Matrix4<f32> {
    fn from(value: PerspectiveProjection) -> Self {
        OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(value.fovy, value.aspect_ratio, value.znear, value.zfar)
    }
}

/// Remaps OpenGL clip depth (-1..1) to wgpu clip depth (0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Mirrors clip space vertically. Rendering through it makes row 0 of a
/// render target hold what OpenGL would have written to its bottom row.
#[rustfmt::skip]
pub const FLIP_Y_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, -1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
);
