use cgmath::{Matrix4, SquareMatrix, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Per-frame camera data shared by every shader (bind group 0)
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct FrameUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub camera_position: [f32; 4],
}

impl Default for FrameUniform {
    fn default() -> Self {
        let identity = convert_matrix4_to_array(Matrix4::identity());
        Self {
            view: identity,
            projection: identity,
            view_proj: identity,
            camera_position: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl FrameUniform {
    pub fn new(view: Matrix4<f32>, projection: Matrix4<f32>, camera_position: Vector3<f32>) -> Self {
        Self {
            view: convert_matrix4_to_array(view),
            projection: convert_matrix4_to_array(projection),
            view_proj: convert_matrix4_to_array(projection * view),
            camera_position: camera_position.extend(1.0).into(),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}
