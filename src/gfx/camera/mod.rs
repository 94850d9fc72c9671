pub mod camera_utils;
pub mod scene_camera;

// Re-export main types
pub use camera_utils::{FrameUniform, OPENGL_TO_WGPU_MATRIX};
pub use scene_camera::{view_matrix, Camera};
