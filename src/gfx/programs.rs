//! The two shader programs used by the demo and their uniform interfaces

use crate::config::LightingConfig;

use super::resources::{
    PipelineSettings, Shader, ShaderError, TextureKind, UniformLayout, UniformType,
};

pub const LIGHT_POS: &str = "u_LightPos";
pub const LIGHT_COL: &str = "u_LightCol";
pub const AMBIENT_COL: &str = "u_AmbientCol";
pub const AMBIENT_STRENGTH: &str = "u_AmbientStrength";
pub const AMBIENT_LIGHT_STRENGTH: &str = "u_AmbientLightStrength";
pub const SPECULAR_LIGHT_STRENGTH: &str = "u_SpecularLightStrength";
pub const ATTENUATION_CONSTANT: &str = "u_LightAttenuationConstant";
pub const ATTENUATION_LINEAR: &str = "u_LightAttenuationLinear";
pub const ATTENUATION_QUADRATIC: &str = "u_LightAttenuationQuadratic";
pub const CONDITION: &str = "u_Condition";

pub const SHININESS: &str = "u_Shininess";
pub const DIFFUSE: &str = "s_Diffuse";

pub const ENVIRONMENT_ROTATION: &str = "u_EnvironmentRotation";
pub const ENVIRONMENT: &str = "s_Environment";

/// Field order must match `struct Lighting` in scene.wgsl
pub fn lighting_layout() -> UniformLayout {
    UniformLayout::new()
        .with(LIGHT_POS, UniformType::Vec3)
        .with(LIGHT_COL, UniformType::Vec3)
        .with(AMBIENT_COL, UniformType::Vec3)
        .with(AMBIENT_STRENGTH, UniformType::Float)
        .with(AMBIENT_LIGHT_STRENGTH, UniformType::Float)
        .with(SPECULAR_LIGHT_STRENGTH, UniformType::Float)
        .with(ATTENUATION_CONSTANT, UniformType::Float)
        .with(ATTENUATION_LINEAR, UniformType::Float)
        .with(ATTENUATION_QUADRATIC, UniformType::Float)
        .with(CONDITION, UniformType::Int)
}

/// Lit, textured shader with the light's position and falloff preset
///
/// Colours and strengths start at zero; the lighting mode fills them in.
/// Faces are not culled, so single-sided geometry such as the ground plane
/// stays visible from below.
pub fn scene_shader(lighting: &LightingConfig) -> Result<Shader, ShaderError> {
    let mut shader = Shader::new("scene", include_str!("shaders/scene.wgsl"))
        .with_uniforms(lighting_layout())
        .with_material_uniforms(UniformLayout::new().with(SHININESS, UniformType::Float))
        .with_texture(DIFFUSE, TextureKind::D2);
    shader.set_uniform(LIGHT_POS, lighting.light_position)?;
    shader.set_uniform(ATTENUATION_CONSTANT, lighting.attenuation_constant)?;
    shader.set_uniform(ATTENUATION_LINEAR, lighting.attenuation_linear)?;
    shader.set_uniform(ATTENUATION_QUADRATIC, lighting.attenuation_quadratic)?;
    shader.set_uniform(CONDITION, 0i32)?;
    Ok(shader)
}

/// Cube-mapped sky drawn at the far plane without writing depth
pub fn skybox_shader() -> Shader {
    Shader::new("skybox", include_str!("shaders/skybox.wgsl"))
        .with_material_uniforms(UniformLayout::new().with(ENVIRONMENT_ROTATION, UniformType::Mat3))
        .with_texture(ENVIRONMENT, TextureKind::Cube)
        .with_settings(PipelineSettings {
            cull_mode: Some(wgpu::Face::Back),
            depth_compare: wgpu::CompareFunction::LessEqual,
            depth_write: false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::UniformValue;
    use cgmath::Vector3;

    #[test]
    fn test_lighting_layout_matches_wgsl_offsets() {
        let layout = lighting_layout();
        let offset = |name| layout.field(name).unwrap().offset;
        assert_eq!(offset(LIGHT_POS), 0);
        assert_eq!(offset(LIGHT_COL), 16);
        assert_eq!(offset(AMBIENT_COL), 32);
        // Scalars pack into the tail of the preceding vec3
        assert_eq!(offset(AMBIENT_STRENGTH), 44);
        assert_eq!(offset(CONDITION), 68);
        assert_eq!(layout.size(), 80);
    }

    #[test]
    fn test_scene_shader_presets_light() {
        let shader = scene_shader(&LightingConfig::default()).unwrap();
        assert_eq!(
            shader.block().get(LIGHT_POS),
            Some(UniformValue::Vec3(Vector3::new(0.0, 0.0, 2.0)))
        );
        assert_eq!(
            shader.block().get(ATTENUATION_LINEAR),
            Some(UniformValue::Float(0.09))
        );
        assert_eq!(shader.block().get(LIGHT_COL), Some(UniformValue::Vec3(Vector3::new(0.0, 0.0, 0.0))));
        assert_eq!(shader.block().get(CONDITION), Some(UniformValue::Int(0)));
    }

    #[test]
    fn test_scene_shader_draws_both_faces() {
        let shader = scene_shader(&LightingConfig::default()).unwrap();
        assert_eq!(shader.settings().cull_mode, None);
        assert_eq!(shader.settings().depth_compare, wgpu::CompareFunction::LessEqual);
        assert!(shader.settings().depth_write);
        assert_eq!(skybox_shader().settings().cull_mode, Some(wgpu::Face::Back));
    }

    #[test]
    fn test_skybox_has_no_shader_block() {
        let shader = skybox_shader();
        assert!(shader.block().layout().is_empty());
        assert_eq!(shader.material_layout().size(), 48);
        assert!(!shader.settings().depth_write);
    }
}
