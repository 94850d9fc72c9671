use cgmath::{Deg, Matrix4, SquareMatrix};

use super::camera_utils::OPENGL_TO_WGPU_MATRIX;
use crate::gfx::scene::Transform;

/// Projection settings attached to a camera entity
///
/// Position and orientation come from the entity's [`Transform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Full height of the orthographic view volume in world units
    pub ortho_height: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    orthographic: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            ortho_height: 3.0,
            aspect: 1.0,
            near: 0.01,
            far: 1000.0,
            orthographic: false,
        }
    }
}

impl Camera {
    pub fn new(fov_degrees: f32, ortho_height: f32, near: f32, far: f32) -> Self {
        Self {
            fov_degrees,
            ortho_height,
            near,
            far,
            ..Self::default()
        }
    }

    pub fn is_orthographic(&self) -> bool {
        self.orthographic
    }

    pub fn set_orthographic(&mut self, orthographic: bool) {
        self.orthographic = orthographic;
    }

    pub fn toggle_ortho(&mut self) {
        self.orthographic = !self.orthographic;
        log::info!(
            "Camera projection: {}",
            if self.orthographic {
                "orthographic"
            } else {
                "perspective"
            }
        );
    }

    /// Updates the aspect ratio; a zero-height window keeps the old value
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Projection in wgpu clip space (depth 0..1)
    pub fn projection(&self) -> Matrix4<f32> {
        let gl = if self.orthographic {
            let half_height = self.ortho_height / 2.0;
            let half_width = half_height * self.aspect;
            cgmath::ortho(
                -half_width,
                half_width,
                -half_height,
                half_height,
                self.near,
                self.far,
            )
        } else {
            cgmath::perspective(Deg(self.fov_degrees), self.aspect, self.near, self.far)
        };
        OPENGL_TO_WGPU_MATRIX * gl
    }
}

/// View matrix for a camera placed by `transform`
pub fn view_matrix(transform: &Transform) -> Matrix4<f32> {
    transform
        .local_matrix()
        .invert()
        .unwrap_or_else(Matrix4::identity)
}
