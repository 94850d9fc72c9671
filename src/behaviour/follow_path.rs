use std::any::Any;

use cgmath::{InnerSpace, Vector3};

use super::traits::{Behaviour, BehaviourContext};

/// Walks the entity through a closed list of points at constant speed
///
/// Movement never passes a point: a step that would reach it snaps to it and
/// the next frame heads for the following point, wrapping to the first.
pub struct FollowPathBehaviour {
    points: Vec<Vector3<f32>>,
    speed: f32,
    next_point: usize,
}

impl FollowPathBehaviour {
    pub fn new(points: Vec<Vector3<f32>>, speed: f32) -> Self {
        Self {
            points,
            speed,
            next_point: 0,
        }
    }

    pub fn points(&self) -> &[Vector3<f32>] {
        &self.points
    }

    pub fn set_points(&mut self, points: Vec<Vector3<f32>>) {
        self.points = points;
        self.next_point = 0;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Index of the point currently being approached
    pub fn next_point(&self) -> usize {
        self.next_point
    }
}

impl Behaviour for FollowPathBehaviour {
    fn update(&mut self, ctx: &mut BehaviourContext) {
        let Some(&target) = self.points.get(self.next_point) else {
            return;
        };
        let step = self.speed * ctx.delta_time;
        let Some(transform) = ctx.transform_mut() else {
            return;
        };

        let position = transform.local_position();
        let to_target = target - position;
        let distance = to_target.magnitude();
        if distance <= step {
            transform.set_local_position(target);
            self.next_point = (self.next_point + 1) % self.points.len();
        } else {
            transform.set_local_position(position + to_target * (step / distance));
        }
    }

    fn name(&self) -> &str {
        "FollowPath"
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
