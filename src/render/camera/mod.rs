use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3};

use crate::data::projection::PerspectiveProjection;

/// Lens of the viewer. The aspect ratio follows the surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub fovy: cgmath::Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fovy: Deg(90.0).into(),
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

impl Camera {
    pub fn create_projection(&self, aspect_ratio: f32) -> PerspectiveProjection {
        PerspectiveProjection {
            aspect_ratio,
            fovy: self.fovy,
            znear: self.znear,
            zfar: self.zfar,
        }
    }
}

/// Where the camera is and where it looks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraView {
    pub position: Point3<f32>,
    pub front: Vector3<f32>,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 1.0, 4.0),
            front: -Vector3::unit_z(),
        }
    }
}

impl CameraView {
    pub fn create_view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.front.normalize(), Vector3::unit_y())
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub position: [f32; 3],
    _padding: u32,
}

impl CameraUniform {
    pub fn new(view: &CameraView, projection: PerspectiveProjection) -> Self {
        Self {
            view: view.create_view_matrix().into(),
            projection: Matrix4::from(projection).into(),
            position: view.position.into(),
            _padding: 0,
        }
    }
}
