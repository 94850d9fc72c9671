//! Runtime-described uniform blocks and shader programs
//!
//! Uniform blocks are laid out with the WGSL rules for the uniform address
//! space, so a WGSL struct declaring the same fields in the same order reads
//! the bytes produced here without any manual padding.

use cgmath::{Matrix3, Matrix4, Vector3, Vector4};
use thiserror::Error;

/// Errors raised while writing uniforms or textures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShaderError {
    #[error("unknown uniform '{name}' in block '{block}'")]
    UnknownUniform { block: String, name: String },
    #[error("uniform '{name}' is declared as {expected:?} but was given {found:?}")]
    TypeMismatch {
        name: String,
        expected: UniformType,
        found: UniformType,
    },
    #[error("unknown texture slot '{name}' in '{owner}'")]
    UnknownTexture { owner: String, name: String },
    #[error("texture slot '{name}' expects a {expected:?} texture")]
    TextureKindMismatch { name: String, expected: TextureKind },
    #[error("no shader registered for this material")]
    UnknownShader,
}

/// Scalar, vector and matrix types a uniform block can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Int,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
}

impl UniformType {
    /// Alignment in the WGSL uniform address space
    pub fn align(self) -> usize {
        match self {
            UniformType::Float | UniformType::Int => 4,
            UniformType::Vec3 | UniformType::Vec4 | UniformType::Mat3 | UniformType::Mat4 => 16,
        }
    }

    pub fn size(self) -> usize {
        match self {
            UniformType::Float | UniformType::Int => 4,
            UniformType::Vec3 => 12,
            UniformType::Vec4 => 16,
            // Three vec3 columns, each padded to 16 bytes
            UniformType::Mat3 => 48,
            UniformType::Mat4 => 64,
        }
    }
}

/// A typed value for one uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Mat3(Matrix3<f32>),
    Mat4(Matrix4<f32>),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Mat3(_) => UniformType::Mat3,
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }

    fn write(&self, dst: &mut [u8]) {
        match self {
            UniformValue::Float(v) => dst[..4].copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Int(v) => dst[..4].copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec3(v) => {
                let v: [f32; 3] = (*v).into();
                dst[..12].copy_from_slice(bytemuck::bytes_of(&v));
            }
            UniformValue::Vec4(v) => {
                let v: [f32; 4] = (*v).into();
                dst[..16].copy_from_slice(bytemuck::bytes_of(&v));
            }
            UniformValue::Mat3(m) => {
                let columns: [[f32; 3]; 3] = (*m).into();
                for (i, column) in columns.iter().enumerate() {
                    dst[i * 16..i * 16 + 12].copy_from_slice(bytemuck::bytes_of(column));
                }
            }
            UniformValue::Mat4(m) => {
                let columns: [[f32; 4]; 4] = (*m).into();
                dst[..64].copy_from_slice(bytemuck::bytes_of(&columns));
            }
        }
    }

    fn read(ty: UniformType, src: &[u8]) -> Self {
        let f = |offset: usize| bytemuck::pod_read_unaligned::<f32>(&src[offset..offset + 4]);
        let vec3 = |offset: usize| Vector3::new(f(offset), f(offset + 4), f(offset + 8));
        match ty {
            UniformType::Float => UniformValue::Float(f(0)),
            UniformType::Int => UniformValue::Int(bytemuck::pod_read_unaligned(&src[..4])),
            UniformType::Vec3 => UniformValue::Vec3(vec3(0)),
            UniformType::Vec4 => UniformValue::Vec4(Vector4::new(f(0), f(4), f(8), f(12))),
            UniformType::Mat3 => UniformValue::Mat3(Matrix3::from_cols(vec3(0), vec3(16), vec3(32))),
            UniformType::Mat4 => {
                let col = |c: usize| Vector4::new(f(c * 16), f(c * 16 + 4), f(c * 16 + 8), f(c * 16 + 12));
                UniformValue::Mat4(Matrix4::from_cols(col(0), col(1), col(2), col(3)))
            }
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(v: Vector3<f32>) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v.into())
    }
}

impl From<Vector4<f32>> for UniformValue {
    fn from(v: Vector4<f32>) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v.into())
    }
}

impl From<Matrix3<f32>> for UniformValue {
    fn from(m: Matrix3<f32>) -> Self {
        UniformValue::Mat3(m)
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(m: Matrix4<f32>) -> Self {
        UniformValue::Mat4(m)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformField {
    pub name: String,
    pub ty: UniformType,
    pub offset: usize,
}

/// Ordered, named uniform fields with their byte offsets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    end: usize,
}

impl UniformLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field; duplicate names are ignored with a warning
    pub fn with(mut self, name: &str, ty: UniformType) -> Self {
        if self.field(name).is_some() {
            log::warn!("Uniform '{}' declared twice, keeping the first", name);
            return self;
        }
        let offset = self.end.next_multiple_of(ty.align());
        self.fields.push(UniformField {
            name: name.to_string(),
            ty,
            offset,
        });
        self.end = offset + ty.size();
        self
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Buffer size in bytes, rounded up to 16 as uniform structs require
    pub fn size(&self) -> usize {
        self.end.next_multiple_of(16)
    }
}

/// Byte storage for a [`UniformLayout`] with change tracking
#[derive(Debug, Clone)]
pub struct UniformBlock {
    label: String,
    layout: UniformLayout,
    data: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    /// Creates a zero-filled block
    pub fn new(label: &str, layout: UniformLayout) -> Self {
        let data = vec![0; layout.size()];
        Self {
            label: label.to_string(),
            layout,
            data,
            dirty: true,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    /// Writes a value after checking the name and type against the layout
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<(), ShaderError> {
        let value = value.into();
        let field = self
            .layout
            .field(name)
            .ok_or_else(|| ShaderError::UnknownUniform {
                block: self.label.clone(),
                name: name.to_string(),
            })?;
        if field.ty != value.ty() {
            return Err(ShaderError::TypeMismatch {
                name: name.to_string(),
                expected: field.ty,
                found: value.ty(),
            });
        }
        let range = field.offset..field.offset + field.ty.size();
        value.write(&mut self.data[range]);
        self.dirty = true;
        log::trace!("{}: {} = {:?}", self.label, name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        let field = self.layout.field(name)?;
        Some(UniformValue::read(
            field.ty,
            &self.data[field.offset..field.offset + field.ty.size()],
        ))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Call after the bytes have been uploaded
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Forces the next upload, e.g. after the GPU buffer was recreated
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// Texture dimensionality a slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    D2,
    Cube,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSlot {
    pub name: String,
    pub kind: TextureKind,
}

/// Fixed-function state baked into a shader's pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub cull_mode: Option<wgpu::Face>,
    pub depth_compare: wgpu::CompareFunction,
    pub depth_write: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            cull_mode: None,
            depth_compare: wgpu::CompareFunction::LessEqual,
            depth_write: true,
        }
    }
}

/// A WGSL program plus the uniform interface it expects
///
/// Bind groups follow a fixed convention:
/// - group 0: per-frame camera data
/// - group 1: this shader's own uniform block (may be empty)
/// - group 2: material uniforms followed by one texture and sampler per slot
/// - group 3: per-object model and normal matrices
pub struct Shader {
    name: String,
    source: String,
    block: UniformBlock,
    material_layout: UniformLayout,
    texture_slots: Vec<TextureSlot>,
    settings: PipelineSettings,
}

impl Shader {
    pub fn new(name: &str, source: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            source: source.into(),
            block: UniformBlock::new(name, UniformLayout::new()),
            material_layout: UniformLayout::new(),
            texture_slots: Vec::new(),
            settings: PipelineSettings::default(),
        }
    }

    /// Declares the shader-level uniforms (bind group 1)
    pub fn with_uniforms(mut self, layout: UniformLayout) -> Self {
        self.block = UniformBlock::new(&self.name, layout);
        self
    }

    /// Declares the per-material uniforms (start of bind group 2)
    pub fn with_material_uniforms(mut self, layout: UniformLayout) -> Self {
        self.material_layout = layout;
        self
    }

    pub fn with_texture(mut self, name: &str, kind: TextureKind) -> Self {
        self.texture_slots.push(TextureSlot {
            name: name.to_string(),
            kind,
        });
        self
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn block(&self) -> &UniformBlock {
        &self.block
    }

    pub fn block_mut(&mut self) -> &mut UniformBlock {
        &mut self.block
    }

    pub fn material_layout(&self) -> &UniformLayout {
        &self.material_layout
    }

    pub fn texture_slots(&self) -> &[TextureSlot] {
        &self.texture_slots
    }

    /// Writes a shader-level uniform
    pub fn set_uniform(
        &mut self,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), ShaderError> {
        self.block.set(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{Deg, SquareMatrix};

    fn light_layout() -> UniformLayout {
        UniformLayout::new()
            .with("u_LightPos", UniformType::Vec3)
            .with("u_LightCol", UniformType::Vec3)
            .with("u_AmbientStrength", UniformType::Float)
            .with("u_EnvironmentRotation", UniformType::Mat3)
            .with("u_Condition", UniformType::Int)
    }

    #[test]
    fn test_offsets_follow_wgsl_rules() {
        let layout = light_layout();
        let offsets: Vec<usize> = layout.fields().iter().map(|f| f.offset).collect();
        // A scalar may sit in the padding after a vec3
        assert_eq!(offsets, vec![0, 16, 28, 32, 80]);
        assert_eq!(layout.size(), 96);
        assert_eq!(UniformLayout::new().size(), 0);
    }

    #[test]
    fn test_set_then_get_round_trips_each_type() {
        let mut block = UniformBlock::new("scene", light_layout());
        let rotation = Matrix3::from_angle_x(Deg(90.0f32));
        block.set("u_LightPos", [0.0f32, 0.0, 2.0]).unwrap();
        block.set("u_AmbientStrength", 0.38f32).unwrap();
        block.set("u_EnvironmentRotation", rotation).unwrap();
        block.set("u_Condition", 4).unwrap();

        assert_eq!(
            block.get("u_LightPos"),
            Some(UniformValue::Vec3(Vector3::new(0.0, 0.0, 2.0)))
        );
        assert_eq!(block.get("u_AmbientStrength"), Some(UniformValue::Float(0.38)));
        assert_eq!(block.get("u_Condition"), Some(UniformValue::Int(4)));
        match block.get("u_EnvironmentRotation") {
            Some(UniformValue::Mat3(m)) => assert_relative_eq!(m, rotation),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mat3_columns_are_padded() {
        let mut block = UniformBlock::new(
            "sky",
            UniformLayout::new().with("u_EnvironmentRotation", UniformType::Mat3),
        );
        block
            .set("u_EnvironmentRotation", Matrix3::<f32>::identity())
            .unwrap();
        let floats: Vec<f32> = block
            .bytes()
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<f32>)
            .collect();
        assert_eq!(
            floats,
            vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_set_rejects_unknown_name_and_wrong_type() {
        let mut block = UniformBlock::new("scene", light_layout());
        assert_eq!(
            block.set("u_Missing", 1.0f32),
            Err(ShaderError::UnknownUniform {
                block: "scene".to_string(),
                name: "u_Missing".to_string(),
            })
        );
        assert_eq!(
            block.set("u_Condition", 1.0f32),
            Err(ShaderError::TypeMismatch {
                name: "u_Condition".to_string(),
                expected: UniformType::Int,
                found: UniformType::Float,
            })
        );
    }

    #[test]
    fn test_dirty_flag_tracks_uploads() {
        let mut block = UniformBlock::new("scene", light_layout());
        assert!(block.is_dirty());
        block.mark_clean();
        assert!(!block.is_dirty());
        block.set("u_Condition", 2).unwrap();
        assert!(block.is_dirty());
    }

    #[test]
    fn test_duplicate_field_is_ignored() {
        let layout = UniformLayout::new()
            .with("u_Shininess", UniformType::Float)
            .with("u_Shininess", UniformType::Vec4);
        assert_eq!(layout.fields().len(), 1);
        assert_eq!(layout.size(), 16);
    }
}
