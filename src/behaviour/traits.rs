//! Core behaviour trait
//!
//! Behaviours are small per-entity scripts. The scene calls them once per
//! frame through the entity's [`BehaviourBinding`](super::BehaviourBinding).

use std::any::Any;

use crate::{
    gfx::scene::{EntityId, GameScene, Transform},
    input::InputState,
};

/// Everything a behaviour may touch during one update
pub struct BehaviourContext<'a> {
    /// Entity the running behaviour is bound to
    pub entity: EntityId,
    /// The whole scene; the entity's own binding is detached while it runs
    pub scene: &'a mut GameScene,
    pub input: &'a InputState,
    /// Seconds since the previous frame, already clamped
    pub delta_time: f32,
}

impl BehaviourContext<'_> {
    /// Transform of the entity the behaviour is bound to
    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        self.scene.transform_mut(self.entity)
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.scene.transform(self.entity)
    }
}

/// Per-entity script driven by the frame loop
///
/// Implementors only need [`update`](Behaviour::update), [`name`](Behaviour::name)
/// and [`as_any_mut`](Behaviour::as_any_mut); the latter lets callers reach
/// the concrete type after binding.
pub trait Behaviour {
    /// Called once before the first enabled update
    fn on_load(&mut self, _ctx: &mut BehaviourContext) {}

    /// Called every frame while enabled
    fn update(&mut self, ctx: &mut BehaviourContext);

    /// Name for logs and UI
    fn name(&self) -> &str;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
