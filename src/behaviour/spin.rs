use std::any::Any;

use cgmath::Vector2;

use super::traits::{Behaviour, BehaviourContext};

/// Spins the entity about its Z axis by a fixed step each frame
///
/// The X and Y Euler angles stay at `base_euler`. The step is per frame, not
/// per second, so the spin rate follows the frame rate.
pub struct SpinBehaviour {
    pub base_euler: Vector2<f32>,
    pub degrees_per_frame: i32,
    counter: i32,
}

impl SpinBehaviour {
    pub fn new(base_euler: Vector2<f32>, degrees_per_frame: i32) -> Self {
        Self {
            base_euler,
            degrees_per_frame,
            counter: 0,
        }
    }

    pub fn angle(&self) -> i32 {
        self.counter % 360
    }
}

impl Behaviour for SpinBehaviour {
    fn update(&mut self, ctx: &mut BehaviourContext) {
        let z = (self.counter % 360) as f32;
        if let Some(transform) = ctx.transform_mut() {
            transform.set_local_rotation_euler([self.base_euler.x, self.base_euler.y, z]);
        }
        self.counter = self.counter.wrapping_add(self.degrees_per_frame) % 360;
    }

    fn name(&self) -> &str {
        "Spin"
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gfx::scene::{quat_from_euler_degrees, GameScene},
        input::InputState,
    };
    use approx::assert_relative_eq;
    use cgmath::Vector3;

    #[test]
    fn test_rotation_uses_counter_before_increment() {
        let mut scene = GameScene::new("test");
        let chicken = scene.create_entity("chicken_object_4");
        scene.bind(chicken, SpinBehaviour::new(Vector2::new(90.0, 0.0), 1));
        let input = InputState::new();

        scene.update_behaviours(0.016, &input);
        assert_relative_eq!(
            scene.transform(chicken).unwrap().local_rotation(),
            quat_from_euler_degrees(Vector3::new(90.0, 0.0, 0.0)),
            epsilon = 1e-6
        );

        scene.update_behaviours(0.016, &input);
        assert_relative_eq!(
            scene.transform(chicken).unwrap().local_rotation(),
            quat_from_euler_degrees(Vector3::new(90.0, 0.0, 1.0)),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_angle_wraps_at_360() {
        let mut scene = GameScene::new("test");
        let chicken = scene.create_entity("chicken");
        scene.bind(chicken, SpinBehaviour::new(Vector2::new(0.0, 0.0), 1));
        let input = InputState::new();
        for _ in 0..361 {
            scene.update_behaviours(0.016, &input);
        }
        assert_eq!(scene.behaviour_mut::<SpinBehaviour>(chicken).unwrap().angle(), 1);
    }
}
