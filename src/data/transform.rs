use cgmath::{Deg, Matrix4, Vector3, Zero};

/// Placement of a model in the world.
///
/// Rotation pivots around `origin`, so a model moved away from the world
/// origin still rotates in place. `rotation` holds Euler angles in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModelTransform {
    pub origin: Vector3<f32>,
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            origin: Vector3::zero(),
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: Vector3 {
                x: 1.0,
                y: 1.0,
                z: 1.0,
            },
        }
    }
}

impl ModelTransform {
    /// Moves the model and its pivot together.
    pub fn move_to(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.origin = position;
    }
}

impl From<ModelTransform> for Matrix4<f32> {
    fn from(value: ModelTransform) -> Self {
        Matrix4::from_translation(value.origin)
            * Matrix4::from_angle_z(Deg(value.rotation.z))
            * Matrix4::from_angle_y(Deg(value.rotation.y))
            * Matrix4::from_angle_x(Deg(value.rotation.x))
            * Matrix4::from_translation(value.position - value.origin)
            * Matrix4::from_nonuniform_scale(value.scale.x, value.scale.y, value.scale.z)
    }
}
