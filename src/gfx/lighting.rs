//! Lighting model toggles
//!
//! Each mode writes `u_Condition` plus the light colours and strengths it
//! needs into the scene shader. Values written by an earlier mode are left in
//! place, so switching from full lighting to "Diffuse Only" keeps the ambient
//! settings around for when they are next used.

use super::programs::{
    AMBIENT_COL, AMBIENT_LIGHT_STRENGTH, AMBIENT_STRENGTH, CONDITION, LIGHT_COL,
    SPECULAR_LIGHT_STRENGTH,
};
use super::resources::{Shader, ShaderError};

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const AMBIENT_STRENGTH_VALUE: f32 = 0.38;
const AMBIENT_LIGHT_STRENGTH_VALUE: f32 = 0.05;
const SPECULAR_STRENGTH_VALUE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightingMode {
    #[default]
    NoLighting,
    AmbientOnly,
    DiffuseOnly,
    SpecularOnly,
    Full,
    Toon,
}

impl LightingMode {
    pub const ALL: [LightingMode; 6] = [
        LightingMode::NoLighting,
        LightingMode::AmbientOnly,
        LightingMode::DiffuseOnly,
        LightingMode::SpecularOnly,
        LightingMode::Full,
        LightingMode::Toon,
    ];

    /// Mode for a `u_Condition` value; out-of-range values fall back to no lighting
    pub fn from_condition(condition: i32) -> Self {
        usize::try_from(condition)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }

    pub fn condition(self) -> i32 {
        self as i32
    }

    /// Text on the mode's button
    pub fn button_label(self) -> &'static str {
        match self {
            LightingMode::NoLighting => "No Lighting",
            LightingMode::AmbientOnly => "Ambient Only",
            LightingMode::DiffuseOnly => "Diffuse Only",
            LightingMode::SpecularOnly => "Specular Only",
            LightingMode::Full => "Ambient + Specular + Diffuse",
            LightingMode::Toon => "Ambient + Specular + Diffuse + Toon-Shading",
        }
    }

    /// Text shown after "Toggle Mode:"
    pub fn display_name(self) -> &'static str {
        match self {
            LightingMode::NoLighting => "No Lighting",
            LightingMode::AmbientOnly => "Ambient Only",
            LightingMode::DiffuseOnly => "Diffuse Only",
            LightingMode::SpecularOnly => "Specular Only",
            LightingMode::Full => "Ambient + Diffuse + Specular",
            LightingMode::Toon => "Ambient + Diffuse + Specular + Toon Shading",
        }
    }

    /// Writes this mode's uniforms into the scene shader
    pub fn apply(self, shader: &mut Shader) -> Result<(), ShaderError> {
        match self {
            LightingMode::NoLighting => {}
            LightingMode::AmbientOnly => {
                shader.set_uniform(AMBIENT_COL, WHITE)?;
                shader.set_uniform(AMBIENT_STRENGTH, AMBIENT_STRENGTH_VALUE)?;
                shader.set_uniform(AMBIENT_LIGHT_STRENGTH, AMBIENT_LIGHT_STRENGTH_VALUE)?;
                shader.set_uniform(LIGHT_COL, WHITE)?;
            }
            LightingMode::DiffuseOnly => {
                shader.set_uniform(LIGHT_COL, WHITE)?;
            }
            LightingMode::SpecularOnly => {
                shader.set_uniform(LIGHT_COL, WHITE)?;
                shader.set_uniform(SPECULAR_LIGHT_STRENGTH, SPECULAR_STRENGTH_VALUE)?;
            }
            LightingMode::Full | LightingMode::Toon => {
                shader.set_uniform(LIGHT_COL, WHITE)?;
                shader.set_uniform(AMBIENT_LIGHT_STRENGTH, AMBIENT_LIGHT_STRENGTH_VALUE)?;
                shader.set_uniform(AMBIENT_COL, WHITE)?;
                shader.set_uniform(AMBIENT_STRENGTH, AMBIENT_STRENGTH_VALUE)?;
                shader.set_uniform(SPECULAR_LIGHT_STRENGTH, SPECULAR_STRENGTH_VALUE)?;
            }
        }
        shader.set_uniform(CONDITION, self.condition())?;
        log::info!("Lighting mode: {}", self.display_name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LightingConfig;
    use crate::gfx::programs::scene_shader;
    use crate::gfx::resources::UniformValue;

    fn float(shader: &Shader, name: &str) -> f32 {
        match shader.block().get(name) {
            Some(UniformValue::Float(v)) => v,
            other => panic!("{} was {:?}", name, other),
        }
    }

    #[test]
    fn test_condition_round_trips_through_index() {
        for (i, mode) in LightingMode::ALL.iter().enumerate() {
            assert_eq!(mode.condition(), i as i32);
            assert_eq!(LightingMode::from_condition(i as i32), *mode);
        }
        assert_eq!(LightingMode::from_condition(9), LightingMode::NoLighting);
        assert_eq!(LightingMode::from_condition(-1), LightingMode::NoLighting);
    }

    #[test]
    fn test_specular_only_leaves_ambient_untouched() {
        let mut shader = scene_shader(&LightingConfig::default()).unwrap();
        LightingMode::SpecularOnly.apply(&mut shader).unwrap();
        assert_eq!(float(&shader, SPECULAR_LIGHT_STRENGTH), 1.0);
        assert_eq!(float(&shader, AMBIENT_STRENGTH), 0.0);
        assert_eq!(shader.block().get(CONDITION), Some(UniformValue::Int(3)));
    }

    #[test]
    fn test_values_persist_across_modes() {
        let mut shader = scene_shader(&LightingConfig::default()).unwrap();
        LightingMode::Full.apply(&mut shader).unwrap();
        LightingMode::DiffuseOnly.apply(&mut shader).unwrap();
        assert_eq!(float(&shader, AMBIENT_STRENGTH), 0.38);
        assert_eq!(float(&shader, AMBIENT_LIGHT_STRENGTH), 0.05);
        assert_eq!(shader.block().get(CONDITION), Some(UniformValue::Int(2)));
    }

    #[test]
    fn test_toon_sets_full_lighting_terms() {
        let mut shader = scene_shader(&LightingConfig::default()).unwrap();
        LightingMode::Toon.apply(&mut shader).unwrap();
        assert_eq!(
            shader.block().get(LIGHT_COL),
            Some(UniformValue::Vec3(WHITE.into()))
        );
        assert_eq!(float(&shader, SPECULAR_LIGHT_STRENGTH), 1.0);
        assert_eq!(shader.block().get(CONDITION), Some(UniformValue::Int(5)));
    }
}
