//! Draw ordering and state-change elimination
//!
//! Renderables are sorted by [`RenderKey`] so that everything sharing a
//! shader, and within it a material, is drawn together. The resulting command
//! list binds each shader and applies each material only when it changes.

use crate::gfx::resources::{MaterialId, MeshId, ShaderId};
use crate::gfx::scene::EntityId;

/// Sort key: render layer, then shader, then material
///
/// Field order matters; the derived `Ord` compares lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderKey {
    pub layer: i32,
    pub shader: ShaderId,
    pub material: MaterialId,
}

/// One renderable submitted for the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawItem {
    pub key: RenderKey,
    pub entity: EntityId,
    pub mesh: MeshId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    /// Set the pipeline and upload frame and shader uniforms
    BindShader(ShaderId),
    ApplyMaterial(MaterialId),
    Draw { entity: EntityId, mesh: MeshId },
}

/// Sorts `items` by key (stable) and emits the minimal bind sequence
///
/// A material is re-applied after a shader change even if the id is the
/// same, since binding a new pipeline invalidates material state.
pub fn build_draw_list(mut items: Vec<DrawItem>) -> Vec<DrawCommand> {
    items.sort_by_key(|item| item.key);

    let mut commands = Vec::with_capacity(items.len() + 8);
    let mut bound_shader: Option<ShaderId> = None;
    let mut bound_material: Option<MaterialId> = None;

    for item in items {
        if bound_shader != Some(item.key.shader) {
            commands.push(DrawCommand::BindShader(item.key.shader));
            bound_shader = Some(item.key.shader);
            bound_material = None;
        }
        if bound_material != Some(item.key.material) {
            commands.push(DrawCommand::ApplyMaterial(item.key.material));
            bound_material = Some(item.key.material);
        }
        commands.push(DrawCommand::Draw {
            entity: item.entity,
            mesh: item.mesh,
        });
    }
    commands
}

/// Counts of each command kind, logged every frame at trace level
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrawStats {
    pub shader_binds: usize,
    pub material_binds: usize,
    pub draws: usize,
}

impl DrawStats {
    pub fn from_commands(commands: &[DrawCommand]) -> Self {
        commands.iter().fold(Self::default(), |mut stats, command| {
            match command {
                DrawCommand::BindShader(_) => stats.shader_binds += 1,
                DrawCommand::ApplyMaterial(_) => stats.material_binds += 1,
                DrawCommand::Draw { .. } => stats.draws += 1,
            }
            stats
        })
    }
}
