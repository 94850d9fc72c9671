use cgmath::Matrix4;
use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::{
    behaviour::{Behaviour, BehaviourBinding, BehaviourContext},
    gfx::{
        camera::Camera,
        resources::{MaterialId, MeshId},
    },
    input::InputState,
};

use super::transform::Transform;

new_key_type! {
    /// Generational handle to an entity; stale handles never alias new entities
    pub struct EntityId;
}

/// Parent chains deeper than this are treated as cycles
const MAX_HIERARCHY_DEPTH: usize = 64;

/// Display name attached to every entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
}

/// Marks an entity as drawable with a mesh and a material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer {
    pub mesh: MeshId,
    pub material: MaterialId,
}

impl Renderer {
    pub fn new(mesh: MeshId, material: MaterialId) -> Self {
        Self { mesh, material }
    }
}

/// Entity registry with one component map per component type
pub struct GameScene {
    name: String,
    entities: SlotMap<EntityId, ()>,
    tags: SecondaryMap<EntityId, Tag>,
    transforms: SecondaryMap<EntityId, Transform>,
    renderers: SecondaryMap<EntityId, Renderer>,
    behaviours: SecondaryMap<EntityId, BehaviourBinding>,
    cameras: SecondaryMap<EntityId, Camera>,
    main_camera: Option<EntityId>,
    pending_destroy: Vec<EntityId>,
}

impl GameScene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: SlotMap::with_key(),
            tags: SecondaryMap::new(),
            transforms: SecondaryMap::new(),
            renderers: SecondaryMap::new(),
            behaviours: SecondaryMap::new(),
            cameras: SecondaryMap::new(),
            main_camera: None,
            pending_destroy: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates an entity with a [`Tag`] and a default [`Transform`]
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        let id = self.entities.insert(());
        let name = name.into();
        log::debug!("Scene '{}': created entity '{}'", self.name, name);
        self.tags.insert(id, Tag { name });
        self.transforms.insert(id, Transform::default());
        id
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys()
    }

    pub fn tag(&self, entity: EntityId) -> Option<&Tag> {
        self.tags.get(entity)
    }

    /// First entity whose tag matches `name`
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.tags
            .iter()
            .find(|(_, tag)| tag.name == name)
            .map(|(id, _)| id)
    }

    pub fn transform(&self, entity: EntityId) -> Option<&Transform> {
        self.transforms.get(entity)
    }

    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        self.transforms.get_mut(entity)
    }

    pub fn set_renderer(&mut self, entity: EntityId, renderer: Renderer) {
        if self.contains(entity) {
            self.renderers.insert(entity, renderer);
        } else {
            log::warn!("set_renderer on a destroyed entity ignored");
        }
    }

    pub fn renderer(&self, entity: EntityId) -> Option<&Renderer> {
        self.renderers.get(entity)
    }

    pub fn renderer_mut(&mut self, entity: EntityId) -> Option<&mut Renderer> {
        self.renderers.get_mut(entity)
    }

    /// Attaches a camera; the first camera added becomes the main camera
    pub fn set_camera(&mut self, entity: EntityId, camera: Camera) {
        if !self.contains(entity) {
            log::warn!("set_camera on a destroyed entity ignored");
            return;
        }
        self.cameras.insert(entity, camera);
        if self.main_camera.is_none() {
            self.main_camera = Some(entity);
        }
    }

    pub fn camera(&self, entity: EntityId) -> Option<&Camera> {
        self.cameras.get(entity)
    }

    pub fn camera_mut(&mut self, entity: EntityId) -> Option<&mut Camera> {
        self.cameras.get_mut(entity)
    }

    pub fn main_camera(&self) -> Option<EntityId> {
        self.main_camera.filter(|id| self.cameras.contains_key(*id))
    }

    pub fn set_main_camera(&mut self, entity: EntityId) {
        if self.cameras.contains_key(entity) {
            self.main_camera = Some(entity);
        }
    }

    /// Binds an enabled behaviour after any already bound to the entity
    pub fn bind<B: Behaviour + 'static>(&mut self, entity: EntityId, behaviour: B) {
        self.bind_boxed(entity, Box::new(behaviour), true);
    }

    /// Binds a behaviour that stays idle until enabled
    pub fn bind_disabled<B: Behaviour + 'static>(&mut self, entity: EntityId, behaviour: B) {
        self.bind_boxed(entity, Box::new(behaviour), false);
    }

    pub fn bind_boxed(&mut self, entity: EntityId, behaviour: Box<dyn Behaviour>, enabled: bool) {
        if !self.contains(entity) {
            log::warn!(
                "Behaviour '{}' bound to a destroyed entity ignored",
                behaviour.name()
            );
            return;
        }
        match self.behaviours.get_mut(entity) {
            Some(binding) => binding.push(behaviour, enabled),
            None => {
                let mut binding = BehaviourBinding::new();
                binding.push(behaviour, enabled);
                self.behaviours.insert(entity, binding);
            }
        }
    }

    pub fn behaviours(&self, entity: EntityId) -> Option<&BehaviourBinding> {
        self.behaviours.get(entity)
    }

    /// First behaviour of type `T` bound to `entity`
    pub fn behaviour_mut<T: Behaviour + 'static>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.behaviours.get_mut(entity)?.find_mut::<T>()
    }

    /// Enables or disables every behaviour of type `T`; returns how many changed
    pub fn set_behaviours_enabled<T: Behaviour + 'static>(&mut self, enabled: bool) -> usize {
        self.behaviours
            .values_mut()
            .map(|binding| binding.set_enabled::<T>(enabled))
            .sum()
    }

    /// Runs every enabled behaviour once, in entity then bind order
    ///
    /// Each binding is taken out of the scene while it runs so behaviours get
    /// full mutable access to the scene through their context.
    pub fn update_behaviours(&mut self, delta_time: f32, input: &InputState) {
        let ids: Vec<EntityId> = self.behaviours.keys().collect();
        for id in ids {
            let Some(mut binding) = self.behaviours.remove(id) else {
                continue;
            };
            {
                let mut ctx = BehaviourContext {
                    entity: id,
                    scene: self,
                    input,
                    delta_time,
                };
                binding.update(&mut ctx);
            }
            if !self.contains(id) {
                continue;
            }
            // Behaviours bound during the update land after the existing ones
            if let Some(added) = self.behaviours.remove(id) {
                binding.append(added);
            }
            self.behaviours.insert(id, binding);
        }
    }

    /// Entities with both a renderer and a transform
    pub fn renderables(&self) -> impl Iterator<Item = (EntityId, &Renderer, &Transform)> + '_ {
        self.renderers
            .iter()
            .filter_map(|(id, renderer)| self.transforms.get(id).map(|t| (id, renderer, t)))
    }

    /// Refreshes world matrices, resolving parents before their children
    pub fn update_world_matrices(&mut self) {
        let ids: Vec<EntityId> = self.transforms.keys().collect();
        let mut resolved = SecondaryMap::with_capacity(ids.len());
        for id in ids {
            self.resolve_world(id, &mut resolved, 0);
        }
    }

    fn resolve_world(
        &mut self,
        id: EntityId,
        resolved: &mut SecondaryMap<EntityId, Matrix4<f32>>,
        depth: usize,
    ) -> Option<Matrix4<f32>> {
        if let Some(world) = resolved.get(id) {
            return Some(*world);
        }
        let parent = self.transforms.get(id)?.parent();
        let parent_world = match parent {
            Some(parent) if depth < MAX_HIERARCHY_DEPTH => {
                self.resolve_world(parent, resolved, depth + 1)
            }
            Some(_) => {
                log::warn!("Transform hierarchy too deep or cyclic, parent ignored");
                None
            }
            None => None,
        };
        let transform = self.transforms.get_mut(id)?;
        transform.update_world_matrix(parent_world.as_ref());
        let world = transform.world_matrix();
        resolved.insert(id, world);
        Some(world)
    }

    /// Removes the entity and all of its components immediately
    ///
    /// Children keep their local transform and lose the parent link.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if self.entities.remove(entity).is_none() {
            return false;
        }
        if let Some(tag) = self.tags.remove(entity) {
            log::debug!("Scene '{}': destroyed entity '{}'", self.name, tag.name);
        }
        self.transforms.remove(entity);
        self.renderers.remove(entity);
        self.behaviours.remove(entity);
        self.cameras.remove(entity);
        if self.main_camera == Some(entity) {
            self.main_camera = self.cameras.keys().next();
        }
        for transform in self.transforms.values_mut() {
            if transform.parent() == Some(entity) {
                transform.set_parent(None);
            }
        }
        true
    }

    /// Queues the entity for destruction at the next [`poll`](Self::poll)
    pub fn request_destroy(&mut self, entity: EntityId) {
        if !self.pending_destroy.contains(&entity) {
            self.pending_destroy.push(entity);
        }
    }

    /// Applies deferred destruction; returns the number of entities removed
    pub fn poll(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_destroy);
        pending
            .into_iter()
            .filter(|id| self.destroy_entity(*id))
            .count()
    }
}
