// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Shaders, materials, textures and meshes live in [`Resources`] and are
//! referenced by generational keys. CPU data is kept until first use, when
//! the render engine uploads it.

pub mod global_bindings;
pub mod material;
pub mod shader;
pub mod texture_resource;

use slotmap::{new_key_type, SlotMap};

use crate::gfx::geometry::Mesh;
use crate::gfx::rendering::render_queue::RenderKey;
use crate::gfx::scene::Renderer;

// Re-export main types
pub use global_bindings::{FrameBindings, ObjectBinding, ObjectUniform};
pub use material::{MaterialValue, ShaderMaterial};
pub use shader::{
    PipelineSettings, Shader, ShaderError, TextureKind, TextureSlot, UniformBlock, UniformLayout,
    UniformType, UniformValue,
};
pub use texture_resource::{Texture, TextureResource, TextureSource};

new_key_type! {
    pub struct ShaderId;
    pub struct MaterialId;
    pub struct TextureId;
    pub struct MeshId;
}

/// Owner of every shader, material, texture and mesh in the scene
#[derive(Default)]
pub struct Resources {
    shaders: SlotMap<ShaderId, Shader>,
    materials: SlotMap<MaterialId, ShaderMaterial>,
    textures: SlotMap<TextureId, Texture>,
    meshes: SlotMap<MeshId, Mesh>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shader(&mut self, shader: Shader) -> ShaderId {
        log::debug!("Registered shader '{}'", shader.name());
        self.shaders.insert(shader)
    }

    pub fn shader(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.get(id)
    }

    pub fn shader_mut(&mut self, id: ShaderId) -> Option<&mut Shader> {
        self.shaders.get_mut(id)
    }

    pub fn shaders(&self) -> impl Iterator<Item = (ShaderId, &Shader)> {
        self.shaders.iter()
    }

    /// Creates a material for `shader` with that shader's material layout
    pub fn add_material(&mut self, shader: ShaderId) -> Result<MaterialId, ShaderError> {
        let material = {
            let source = self.shaders.get(shader).ok_or(ShaderError::UnknownShader)?;
            ShaderMaterial::new(shader, source)
        };
        Ok(self.materials.insert(material))
    }

    pub fn material(&self, id: MaterialId) -> Option<&ShaderMaterial> {
        self.materials.get(id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut ShaderMaterial> {
        self.materials.get_mut(id)
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &ShaderMaterial)> {
        self.materials.iter()
    }

    /// Sets a material value, also checking texture dimensionality
    pub fn set_material(
        &mut self,
        id: MaterialId,
        name: &str,
        value: impl Into<MaterialValue>,
    ) -> Result<(), ShaderError> {
        let value = value.into();
        let material = self.materials.get_mut(id).ok_or(ShaderError::UnknownShader)?;
        if let MaterialValue::Texture(texture_id) = value {
            let expected = material.slots()[material.slot_index(name)?].kind;
            let actual = self.textures.get(texture_id).map(Texture::kind);
            if actual != Some(expected) {
                return Err(ShaderError::TextureKindMismatch {
                    name: name.to_string(),
                    expected,
                });
            }
        }
        material.set(name, value)
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.insert(texture)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.insert(mesh)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    /// Sort key of a renderer, or `None` if its material is gone
    pub fn render_key(&self, renderer: &Renderer) -> Option<RenderKey> {
        let material = self.materials.get(renderer.material)?;
        Some(RenderKey {
            layer: material.render_layer(),
            shader: material.shader(),
            material: renderer.material,
        })
    }

    /// Creates GPU buffers and textures for everything not yet uploaded
    pub fn upload_pending(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        for mesh in self.meshes.values_mut() {
            mesh.upload(device);
        }
        for texture in self.textures.values_mut() {
            texture.upload(device, queue);
        }
    }
}
