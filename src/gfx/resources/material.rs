//! Materials: per-draw uniform values and textures for one shader

use cgmath::{Matrix3, Matrix4, Vector3, Vector4};

use super::shader::{Shader, ShaderError, TextureSlot, UniformBlock, UniformValue};
use super::{ShaderId, TextureId};

/// Anything a material slot can be set to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialValue {
    Uniform(UniformValue),
    Texture(TextureId),
}

macro_rules! material_value_from_uniform {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for MaterialValue {
                fn from(value: $ty) -> Self {
                    MaterialValue::Uniform(value.into())
                }
            }
        )*
    };
}

material_value_from_uniform!(
    f32,
    i32,
    Vector3<f32>,
    [f32; 3],
    Vector4<f32>,
    [f32; 4],
    Matrix3<f32>,
    Matrix4<f32>,
    UniformValue,
);

impl From<TextureId> for MaterialValue {
    fn from(id: TextureId) -> Self {
        MaterialValue::Texture(id)
    }
}

/// Material bound to a single shader
///
/// The uniform layout and texture slots are copied from the shader when the
/// material is created. Unset texture slots are filled with the white
/// fallback texture at draw time.
#[derive(Debug, Clone)]
pub struct ShaderMaterial {
    shader: ShaderId,
    render_layer: i32,
    block: UniformBlock,
    slots: Vec<TextureSlot>,
    textures: Vec<Option<TextureId>>,
    texture_generation: u64,
}

impl ShaderMaterial {
    pub fn new(shader_id: ShaderId, shader: &Shader) -> Self {
        let slots = shader.texture_slots().to_vec();
        Self {
            shader: shader_id,
            render_layer: 0,
            block: UniformBlock::new(
                &format!("{} material", shader.name()),
                shader.material_layout().clone(),
            ),
            textures: vec![None; slots.len()],
            slots,
            texture_generation: 0,
        }
    }

    pub fn shader(&self) -> ShaderId {
        self.shader
    }

    /// Lower layers draw first
    pub fn render_layer(&self) -> i32 {
        self.render_layer
    }

    pub fn set_render_layer(&mut self, layer: i32) -> &mut Self {
        self.render_layer = layer;
        self
    }

    /// Sets a uniform or texture slot by name
    pub fn set(&mut self, name: &str, value: impl Into<MaterialValue>) -> Result<(), ShaderError> {
        match value.into() {
            MaterialValue::Uniform(value) => self.block.set(name, value),
            MaterialValue::Texture(id) => {
                let index = self.slot_index(name)?;
                self.textures[index] = Some(id);
                self.texture_generation += 1;
                Ok(())
            }
        }
    }

    pub fn slot_index(&self, name: &str) -> Result<usize, ShaderError> {
        self.slots
            .iter()
            .position(|slot| slot.name == name)
            .ok_or_else(|| ShaderError::UnknownTexture {
                owner: self.block.label().to_string(),
                name: name.to_string(),
            })
    }

    pub fn slots(&self) -> &[TextureSlot] {
        &self.slots
    }

    pub fn texture(&self, name: &str) -> Option<TextureId> {
        self.slot_index(name).ok().and_then(|i| self.textures[i])
    }

    /// Textures in slot order
    pub fn textures(&self) -> &[Option<TextureId>] {
        &self.textures
    }

    /// Bumped whenever a texture changes so GPU bind groups can be rebuilt
    pub fn texture_generation(&self) -> u64 {
        self.texture_generation
    }

    pub fn block(&self) -> &UniformBlock {
        &self.block
    }

    pub fn block_mut(&mut self) -> &mut UniformBlock {
        &mut self.block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::shader::{TextureKind, UniformLayout, UniformType};
    use slotmap::KeyData;

    fn textured_shader() -> Shader {
        Shader::new("scene", "")
            .with_material_uniforms(UniformLayout::new().with("u_Shininess", UniformType::Float))
            .with_texture("s_Diffuse", TextureKind::D2)
    }

    #[test]
    fn test_set_routes_uniforms_and_textures() {
        let shader = textured_shader();
        let mut material = ShaderMaterial::new(ShaderId::from(KeyData::from_ffi(1)), &shader);
        let texture = TextureId::from(KeyData::from_ffi(7));

        material.set("u_Shininess", 8.0f32).unwrap();
        material.set("s_Diffuse", texture).unwrap();

        assert_eq!(
            material.block().get("u_Shininess"),
            Some(UniformValue::Float(8.0))
        );
        assert_eq!(material.texture("s_Diffuse"), Some(texture));
        assert_eq!(material.texture_generation(), 1);
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        let shader = textured_shader();
        let mut material = ShaderMaterial::new(ShaderId::from(KeyData::from_ffi(1)), &shader);

        assert!(matches!(
            material.set("u_Gloss", 1.0f32),
            Err(ShaderError::UnknownUniform { .. })
        ));
        assert!(matches!(
            material.set("s_Normal", TextureId::from(KeyData::from_ffi(2))),
            Err(ShaderError::UnknownTexture { .. })
        ));
        assert!(matches!(
            material.set("u_Shininess", 8i32),
            Err(ShaderError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_default_layer_is_zero() {
        let shader = textured_shader();
        let mut material = ShaderMaterial::new(ShaderId::from(KeyData::from_ffi(1)), &shader);
        assert_eq!(material.render_layer(), 0);
        material.set_render_layer(100);
        assert_eq!(material.render_layer(), 100);
    }
}
