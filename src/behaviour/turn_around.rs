use std::any::Any;

use cgmath::Vector3;

use super::traits::{Behaviour, BehaviourContext};

/// Faces the entity one way past `max_y` and the other way past `min_y`
pub struct TurnAroundBehaviour {
    pub min_y: f32,
    pub max_y: f32,
    /// Euler degrees applied once `y >= max_y`
    pub at_max: Vector3<f32>,
    /// Euler degrees applied once `y <= min_y`
    pub at_min: Vector3<f32>,
}

impl TurnAroundBehaviour {
    pub fn new(min_y: f32, max_y: f32, at_max: Vector3<f32>, at_min: Vector3<f32>) -> Self {
        Self {
            min_y,
            max_y,
            at_max,
            at_min,
        }
    }
}

impl Behaviour for TurnAroundBehaviour {
    fn update(&mut self, ctx: &mut BehaviourContext) {
        let Some(transform) = ctx.transform_mut() else {
            return;
        };
        let y = transform.local_position().y;
        if y >= self.max_y {
            transform.set_local_rotation_euler(self.at_max);
        }
        if y <= self.min_y {
            transform.set_local_rotation_euler(self.at_min);
        }
    }

    fn name(&self) -> &str {
        "TurnAround"
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

    fn turn() -> TurnAroundBehaviour {
        TurnAroundBehaviour::new(
            -3.9,
            9.9,
            Vector3::new(90.0, 0.0, 0.0),
            Vector3::new(90.0, 0.0, 180.0),
        )
    }

    #[test]
    fn test_flips_at_both_ends() {
        let mut scene = GameScene::new("test");
        let chicken = scene.create_entity("chicken");
        scene.bind(chicken, turn());
        let input = InputState::new();

        scene.transform_mut(chicken).unwrap().set_local_position([6.0, 10.0, 0.0]);
        scene.update_behaviours(0.016, &input);
        assert_relative_eq!(
            scene.transform(chicken).unwrap().local_rotation(),
            quat_from_euler_degrees(Vector3::new(90.0, 0.0, 0.0)),
            epsilon = 1e-6
        );

        scene.transform_mut(chicken).unwrap().set_local_position([6.0, -4.0, 0.0]);
        scene.update_behaviours(0.016, &input);
        assert_relative_eq!(
            scene.transform(chicken).unwrap().local_rotation(),
            quat_from_euler_degrees(Vector3::new(90.0, 0.0, 180.0)),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_leaves_rotation_between_limits() {
        let mut scene = GameScene::new("test");
        let chicken = scene.create_entity("chicken");
        scene
            .transform_mut(chicken)
            .unwrap()
            .set_local_position([6.0, 3.0, 0.0])
            .set_local_rotation_euler([10.0, 20.0, 30.0]);
        scene.bind(chicken, turn());
        scene.update_behaviours(0.016, &InputState::new());
        assert_relative_eq!(
            scene.transform(chicken).unwrap().local_rotation(),
            quat_from_euler_degrees(Vector3::new(10.0, 20.0, 30.0)),
            epsilon = 1e-6
        );
    }
}
