use cgmath::{Angle, Deg, InnerSpace, Point3, Vector3};
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

use crate::render::camera::CameraView;
use crate::settings::CameraSettings;

const MAX_PITCH: f32 = 85.0;
const MAX_YAW: f32 = 360.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct MovementKeys {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

/// First person camera: WASD to move, Space and left Shift to rise and sink,
/// left mouse drag to look around.
pub struct FreeFlyCameraController {
    position: Point3<f32>,
    yaw: Deg<f32>,
    pitch: Deg<f32>,
    move_speed: f32,
    sensitivity: f32,
    movement_keys: MovementKeys,
    is_left_mouse_pressed: bool,
    mouse_offset_x: f32,
    mouse_offset_y: f32,
}

impl FreeFlyCameraController {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            position: Point3::new(0.0, 1.0, 4.0),
            yaw: Deg(-90.0),
            pitch: Deg(0.0),
            move_speed: settings.move_speed,
            sensitivity: settings.sensitivity,
            movement_keys: MovementKeys::default(),
            is_left_mouse_pressed: false,
            mouse_offset_x: 0.0,
            mouse_offset_y: 0.0,
        }
    }

    pub fn apply_settings(&mut self, settings: &CameraSettings) {
        self.move_speed = settings.move_speed;
        self.sensitivity = settings.sensitivity;
    }

    /// Returns whether `key_code` drives the camera.
    pub fn handle_keyboard_input(&mut self, key_code: KeyCode, state: ElementState) -> bool {
        let pressed = state == ElementState::Pressed;

        let key = match key_code {
            KeyCode::KeyW => &mut self.movement_keys.forward,
            KeyCode::KeyS => &mut self.movement_keys.backward,
            KeyCode::KeyA => &mut self.movement_keys.left,
            KeyCode::KeyD => &mut self.movement_keys.right,
            KeyCode::Space => &mut self.movement_keys.up,
            KeyCode::ShiftLeft => &mut self.movement_keys.down,
            _ => return false,
        };
        *key = pressed;

        true
    }

    pub fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.is_left_mouse_pressed = state == ElementState::Pressed;
        }
    }

    /// Accumulates raw mouse motion. Screen y grows downwards.
    pub fn handle_mouse_movement(&mut self, delta_x: f32, delta_y: f32) {
        if !self.is_left_mouse_pressed {
            return;
        }

        self.mouse_offset_x += delta_x;
        self.mouse_offset_y -= delta_y;
    }

    /// Applies the input gathered since the last update.
    pub fn update(&mut self, delta_time: std::time::Duration) -> CameraView {
        let delta_time = delta_time.as_secs_f32();

        self.apply_mouse_offset(delta_time);
        self.apply_movement(delta_time);

        self.camera_view()
    }

    pub fn camera_view(&self) -> CameraView {
        CameraView {
            position: self.position,
            front: self.front(),
        }
    }

    pub fn front(&self) -> Vector3<f32> {
        Vector3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    fn apply_mouse_offset(&mut self, delta_time: f32) {
        self.yaw += Deg(self.mouse_offset_x * self.sensitivity * delta_time);
        self.pitch += Deg(self.mouse_offset_y * self.sensitivity * delta_time);
        self.mouse_offset_x = 0.0;
        self.mouse_offset_y = 0.0;

        self.pitch = Deg(self.pitch.0.clamp(-MAX_PITCH, MAX_PITCH));
        if self.yaw.0 > MAX_YAW || self.yaw.0 < -MAX_YAW {
            self.yaw = Deg(0.0);
        }
    }

    fn apply_movement(&mut self, delta_time: f32) {
        let front = self.front();
        let up = Vector3::unit_y();
        let right = front.cross(up).normalize();
        let step = self.move_speed * delta_time;

        let keys = self.movement_keys;
        let axis = |positive: bool, negative: bool| (positive as i8 - negative as i8) as f32;

        self.position += front * axis(keys.forward, keys.backward) * step;
        self.position += right * axis(keys.right, keys.left) * step;
        self.position += up * axis(keys.up, keys.down) * step;
    }
}
