//! Local transform component with cached world matrix

use cgmath::{
    Deg, InnerSpace, Matrix, Matrix3, Matrix4, One, Quaternion, Rotation, Rotation3, SquareMatrix,
    Vector3,
};

use super::scene::EntityId;

/// Builds a rotation from Euler angles in degrees, applied X first, then Y, then Z
pub fn quat_from_euler_degrees(euler: Vector3<f32>) -> Quaternion<f32> {
    Quaternion::from_angle_z(Deg(euler.z))
        * Quaternion::from_angle_y(Deg(euler.y))
        * Quaternion::from_angle_x(Deg(euler.x))
}

/// Position, rotation and scale of an entity relative to its parent
///
/// Every entity gets one on creation. The world matrix is only refreshed by
/// [`GameScene::update_world_matrices`](super::GameScene::update_world_matrices),
/// so reads between a local edit and the next update see last frame's value.
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vector3<f32>,
    rotation: Quaternion<f32>,
    scale: Vector3<f32>,
    parent: Option<EntityId>,
    world: Matrix4<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            parent: None,
            world: Matrix4::identity(),
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn set_local_position(&mut self, position: impl Into<Vector3<f32>>) -> &mut Self {
        self.position = position.into();
        self
    }

    pub fn local_rotation(&self) -> Quaternion<f32> {
        self.rotation
    }

    pub fn set_local_rotation(&mut self, rotation: Quaternion<f32>) -> &mut Self {
        self.rotation = rotation.normalize();
        self
    }

    /// Sets the rotation from Euler angles in degrees
    pub fn set_local_rotation_euler(&mut self, degrees: impl Into<Vector3<f32>>) -> &mut Self {
        self.rotation = quat_from_euler_degrees(degrees.into());
        self
    }

    pub fn local_scale(&self) -> Vector3<f32> {
        self.scale
    }

    pub fn set_local_scale(&mut self, scale: impl Into<Vector3<f32>>) -> &mut Self {
        self.scale = scale.into();
        self
    }

    pub fn set_uniform_scale(&mut self, scale: f32) -> &mut Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: Option<EntityId>) -> &mut Self {
        self.parent = parent;
        self
    }

    /// Local forward axis (-Z) in parent space
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation.rotate_vector(-Vector3::unit_z())
    }

    pub fn right(&self) -> Vector3<f32> {
        self.rotation.rotate_vector(Vector3::unit_x())
    }

    pub fn up(&self) -> Vector3<f32> {
        self.rotation.rotate_vector(Vector3::unit_y())
    }

    /// Rotates so the local -Z axis points at `target` with local +Y towards `up`
    ///
    /// Leaves the rotation untouched when the target coincides with the
    /// position or lies along `up`.
    pub fn look_at(&mut self, target: impl Into<Vector3<f32>>, up: Vector3<f32>) -> &mut Self {
        let to_target = target.into() - self.position;
        if to_target.magnitude2() <= f32::EPSILON {
            return self;
        }
        let forward = to_target.normalize();
        let right = forward.cross(up);
        if right.magnitude2() <= f32::EPSILON {
            log::warn!("look_at target is parallel to the up vector, rotation unchanged");
            return self;
        }
        let right = right.normalize();
        let true_up = right.cross(forward);
        let basis = Matrix3::from_cols(right, true_up, -forward);
        self.rotation = Quaternion::from(basis).normalize();
        self
    }

    /// T * R * S
    pub fn local_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn update_world_matrix(&mut self, parent_world: Option<&Matrix4<f32>>) {
        let local = self.local_matrix();
        self.world = match parent_world {
            Some(parent) => parent * local,
            None => local,
        };
    }

    pub fn world_matrix(&self) -> Matrix4<f32> {
        self.world
    }

    /// Inverse-transpose of the world matrix's upper 3x3
    pub fn normal_matrix(&self) -> Matrix3<f32> {
        let w = &self.world;
        let upper = Matrix3::from_cols(w.x.truncate(), w.y.truncate(), w.z.truncate());
        upper
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix3::identity)
    }
}
