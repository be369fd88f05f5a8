use cgmath::Vector3;

/// Light sources the scene shaders understand. There is one today.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Point(PointLight),
}

impl Light {
    pub fn uniform(&self) -> LightUniform {
        match self {
            Light::Point(point_light) => point_light.uniform(),
        }
    }

    pub fn send_uniforms(&self, queue: &wgpu::Queue, gpu_light_uniform_buffer: &wgpu::Buffer) {
        queue.write_buffer(
            gpu_light_uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.uniform()]),
        );
    }

    pub fn position(&self) -> Vector3<f32> {
        match self {
            Light::Point(point_light) => point_light.position,
        }
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        match self {
            Light::Point(point_light) => point_light.position = position,
        }
    }

    pub fn set_colour(&mut self, colour: Vector3<f32>) {
        match self {
            Light::Point(point_light) => point_light.colour = colour,
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        match self {
            Light::Point(point_light) => point_light.intensity = intensity,
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Light::Point(PointLight::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub intensity: f32,
    pub colour: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vector3::new(2.5, 2.5, 0.0),
            intensity: 5.0,
            colour: Vector3::new(1.0, 1.0, 1.0),
            constant: 1.0,
            linear: 0.045,
            quadratic: 0.0075,
        }
    }
}

impl PointLight {
    fn uniform(&self) -> LightUniform {
        LightUniform {
            position: self.position.into(),
            intensity: self.intensity,
            colour: self.colour.into(),
            constant: self.constant,
            linear: self.linear,
            quadratic: self.quadratic,
            _padding: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    pub intensity: f32,
    pub colour: [f32; 3],
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    _padding: [f32; 2],
}
