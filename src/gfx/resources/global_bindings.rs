//! Uniform bindings shared by every pipeline
//!
//! Bind group 0 carries per-frame camera data and bind group 3 per-object
//! matrices. Both layouts are identical for every shader so they are created
//! once by the render engine.

use cgmath::{Matrix3, Matrix4, SquareMatrix};

use crate::{
    gfx::camera::camera_utils::{convert_matrix4_to_array, FrameUniform},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Type alias for the per-frame uniform buffer
pub type FrameUBO = UniformBuffer<FrameUniform>;

/// Manages the bind group layout and bind group for per-frame uniforms
pub struct FrameBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    ubo: FrameUBO,
    bind_group: wgpu::BindGroup,
}

impl FrameBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Frame Bind Group Layout");
        let ubo = FrameUBO::new(device);
        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Frame Bind Group");

        FrameBindings {
            bind_group_layout,
            ubo,
            bind_group,
        }
    }

    /// Uploads camera data; called once per frame and again on shader change
    pub fn update(&mut self, queue: &wgpu::Queue, frame: FrameUniform) {
        self.ubo.update_content(queue, frame);
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Model and normal matrix for one entity (bind group 3)
///
/// The normal matrix is padded to 4x4; shaders read its upper 3x3.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl Default for ObjectUniform {
    fn default() -> Self {
        let identity = convert_matrix4_to_array(Matrix4::identity());
        Self {
            model: identity,
            normal: identity,
        }
    }
}

impl ObjectUniform {
    pub fn new(model: Matrix4<f32>, normal: Matrix3<f32>) -> Self {
        Self {
            model: convert_matrix4_to_array(model),
            normal: convert_matrix4_to_array(Matrix4::from(normal)),
        }
    }
}

pub type ObjectUBO = UniformBuffer<ObjectUniform>;

/// Per-entity uniform buffer and its bind group
pub struct ObjectBinding {
    ubo: ObjectUBO,
    bind_group: wgpu::BindGroup,
}

impl ObjectBinding {
    pub fn new(device: &wgpu::Device, layout: &BindGroupLayoutWithDesc) -> Self {
        let ubo = ObjectUBO::new(device);
        let bind_group = BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .create(device, "Object Bind Group");
        Self { ubo, bind_group }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, content: ObjectUniform) {
        self.ubo.update_content(queue, content);
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

pub fn object_bind_group_layout(device: &wgpu::Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_vertex(binding_types::uniform())
        .create(device, "Object Bind Group Layout")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Matrix, Vector3};

    #[test]
    fn test_object_uniform_pads_normal_matrix() {
        let model = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0))
            * Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let normal = Matrix3::new(0.5, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0).transpose();
        let uniform = ObjectUniform::new(model, normal);
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.normal[0], [0.5, 0.0, 0.0, 0.0]);
        assert_eq!(uniform.normal[3], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 128);
    }
}
