use std::any::Any;

use cgmath::{InnerSpace, Vector3, Zero};
use winit::{event::MouseButton, keyboard::KeyCode};

use super::traits::{Behaviour, BehaviourContext};

const MAX_PITCH_DEGREES: f32 = 89.0;

/// Free-fly camera for a Z-up world
///
/// Holding the right mouse button turns the view with the mouse. W/S/A/D move
/// along the view, Space and left Ctrl move along world Z, and Shift boosts.
pub struct CameraControlBehaviour {
    pub move_speed: f32,
    pub boost_multiplier: f32,
    /// Degrees of rotation per pixel of mouse motion
    pub mouse_sensitivity: f32,
    yaw: f32,
    pitch: f32,
}

impl Default for CameraControlBehaviour {
    fn default() -> Self {
        Self::new(4.0, 3.0, 0.2)
    }
}

impl CameraControlBehaviour {
    pub fn new(move_speed: f32, boost_multiplier: f32, mouse_sensitivity: f32) -> Self {
        Self {
            move_speed,
            boost_multiplier,
            mouse_sensitivity,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Heading about world Z, in degrees
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    fn look_direction(&self) -> Vector3<f32> {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vector3::new(
            pitch.cos() * yaw.cos(),
            pitch.cos() * yaw.sin(),
            pitch.sin(),
        )
    }
}

impl Behaviour for CameraControlBehaviour {
    fn on_load(&mut self, ctx: &mut BehaviourContext) {
        if let Some(transform) = ctx.transform() {
            let forward = transform.forward();
            self.yaw = forward.y.atan2(forward.x).to_degrees();
            self.pitch = forward
                .z
                .clamp(-1.0, 1.0)
                .asin()
                .to_degrees()
                .clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
        }
    }

    fn update(&mut self, ctx: &mut BehaviourContext) {
        let input = ctx.input;
        let dt = ctx.delta_time;

        let mut turned = false;
        if input.is_button_held(MouseButton::Right) {
            let (dx, dy) = input.mouse_delta();
            if dx != 0.0 || dy != 0.0 {
                self.yaw -= dx as f32 * self.mouse_sensitivity;
                self.pitch = (self.pitch - dy as f32 * self.mouse_sensitivity)
                    .clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
                turned = true;
            }
        }
        let look = self.look_direction();

        let Some(transform) = ctx.transform_mut() else {
            return;
        };
        if turned {
            let position = transform.local_position();
            transform.look_at(position + look, Vector3::unit_z());
        }

        let forward = transform.forward();
        let right = transform.right();
        let bindings = [
            (KeyCode::KeyW, forward),
            (KeyCode::KeyS, -forward),
            (KeyCode::KeyA, -right),
            (KeyCode::KeyD, right),
            (KeyCode::Space, Vector3::unit_z()),
            (KeyCode::ControlLeft, -Vector3::unit_z()),
        ];
        let direction = bindings
            .iter()
            .filter(|(key, _)| input.is_key_held(*key))
            .fold(Vector3::zero(), |acc, (_, axis)| acc + axis);
        if direction.magnitude2() <= f32::EPSILON {
            return;
        }

        let mut speed = self.move_speed;
        if input.is_key_held(KeyCode::ShiftLeft) || input.is_key_held(KeyCode::ShiftRight) {
            speed *= self.boost_multiplier;
        }
        let position = transform.local_position();
        transform.set_local_position(position + direction.normalize() * speed * dt);
        log::trace!("Camera moved to {:?}", transform.local_position());
    }

    fn name(&self) -> &str {
        "CameraControl"
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
