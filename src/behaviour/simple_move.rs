use std::any::Any;

use cgmath::{Vector3, Zero};
use winit::keyboard::KeyCode;

use super::traits::{Behaviour, BehaviourContext};

const DEFAULT_SPEED: f32 = 1.5;

/// Nudges the entity along the parent axes with the keyboard
///
/// I/K move along +Y/-Y, J/L along -X/+X and U/O along +Z/-Z.
pub struct SimpleMoveBehaviour {
    pub speed: f32,
}

impl Default for SimpleMoveBehaviour {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
        }
    }
}

impl SimpleMoveBehaviour {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }
}

impl Behaviour for SimpleMoveBehaviour {
    fn update(&mut self, ctx: &mut BehaviourContext) {
        let bindings = [
            (KeyCode::KeyI, Vector3::unit_y()),
            (KeyCode::KeyK, -Vector3::unit_y()),
            (KeyCode::KeyJ, -Vector3::unit_x()),
            (KeyCode::KeyL, Vector3::unit_x()),
            (KeyCode::KeyU, Vector3::unit_z()),
            (KeyCode::KeyO, -Vector3::unit_z()),
        ];
        let direction = bindings
            .iter()
            .filter(|(key, _)| ctx.input.is_key_held(*key))
            .fold(Vector3::zero(), |acc, (_, axis)| acc + axis);
        if direction.is_zero() {
            return;
        }

        let step = direction * (self.speed * ctx.delta_time);
        if let Some(transform) = ctx.transform_mut() {
            let position = transform.local_position();
            transform.set_local_position(position + step);
        }
    }

    fn name(&self) -> &str {
        "SimpleMove"
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{gfx::scene::GameScene, input::InputState};
    use approx::assert_relative_eq;

    #[test]
    fn test_held_keys_move_entity() {
        let mut scene = GameScene::new("test");
        let ground = scene.create_entity("ground");
        scene.bind(ground, SimpleMoveBehaviour::new(2.0));

        let mut input = InputState::new();
        input.set_key(KeyCode::KeyI, true);
        input.set_key(KeyCode::KeyL, true);
        scene.update_behaviours(0.5, &input);

        assert_relative_eq!(
            scene.transform(ground).unwrap().local_position(),
            Vector3::new(1.0, 1.0, 0.0)
        );
    }

    #[test]
    fn test_disabled_binding_ignores_keys() {
        let mut scene = GameScene::new("test");
        let ground = scene.create_entity("ground");
        scene.bind_disabled(ground, SimpleMoveBehaviour::default());

        let mut input = InputState::new();
        input.set_key(KeyCode::KeyU, true);
        scene.update_behaviours(0.5, &input);
        assert_eq!(
            scene.transform(ground).unwrap().local_position(),
            Vector3::new(0.0, 0.0, 0.0)
        );
    }
}
