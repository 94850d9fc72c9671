use super::traits::{Behaviour, BehaviourContext};

struct BoundBehaviour {
    behaviour: Box<dyn Behaviour>,
    enabled: bool,
    loaded: bool,
}

/// Ordered list of behaviours attached to one entity
#[derive(Default)]
pub struct BehaviourBinding {
    entries: Vec<BoundBehaviour>,
}

impl BehaviourBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, behaviour: Box<dyn Behaviour>, enabled: bool) {
        log::debug!(
            "Bound behaviour '{}' ({})",
            behaviour.name(),
            if enabled { "enabled" } else { "disabled" }
        );
        self.entries.push(BoundBehaviour {
            behaviour,
            enabled,
            loaded: false,
        });
    }

    /// Moves every behaviour of `other` to the end of this binding
    pub fn append(&mut self, mut other: BehaviourBinding) {
        self.entries.append(&mut other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names and enabled flags in bind order
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.behaviour.name(), entry.enabled))
    }

    pub fn find_mut<T: Behaviour + 'static>(&mut self) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find_map(|entry| entry.behaviour.as_any_mut().downcast_mut::<T>())
    }

    /// Sets the enabled flag of every `T`; returns how many actually changed
    pub fn set_enabled<T: Behaviour + 'static>(&mut self, enabled: bool) -> usize {
        let mut changed = 0;
        for entry in &mut self.entries {
            if entry.enabled != enabled && entry.behaviour.as_any_mut().is::<T>() {
                entry.enabled = enabled;
                changed += 1;
            }
        }
        changed
    }

    /// Runs enabled behaviours in bind order, loading each on first use
    pub fn update(&mut self, ctx: &mut BehaviourContext) {
        for entry in self.entries.iter_mut().filter(|entry| entry.enabled) {
            if !entry.loaded {
                entry.behaviour.on_load(ctx);
                entry.loaded = true;
            }
            entry.behaviour.update(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{gfx::scene::GameScene, input::InputState};
    use std::any::Any;

    #[derive(Default)]
    struct Recorder {
        loads: u32,
        updates: u32,
    }

    impl Behaviour for Recorder {
        fn on_load(&mut self, _ctx: &mut BehaviourContext) {
            self.loads += 1;
        }

        fn update(&mut self, _ctx: &mut BehaviourContext) {
            self.updates += 1;
        }

        fn name(&self) -> &str {
            "Recorder"
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Pushes the entity up by one unit on every update
    struct Lift;

    impl Behaviour for Lift {
        fn update(&mut self, ctx: &mut BehaviourContext) {
            if let Some(t) = ctx.transform_mut() {
                let p = t.local_position();
                t.set_local_position([p.x, p.y, p.z + 1.0]);
            }
        }

        fn name(&self) -> &str {
            "Lift"
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn run(binding: &mut BehaviourBinding, scene: &mut GameScene, frames: u32) {
        let entity = scene.create_entity("host");
        let input = InputState::new();
        for _ in 0..frames {
            let mut ctx = BehaviourContext {
                entity,
                scene: &mut *scene,
                input: &input,
                delta_time: 0.016,
            };
            binding.update(&mut ctx);
        }
    }

    #[test]
    fn test_on_load_runs_once_before_first_update() {
        let mut binding = BehaviourBinding::new();
        binding.push(Box::new(Recorder::default()), true);
        let mut scene = GameScene::new("test");
        run(&mut binding, &mut scene, 3);

        let recorder = binding.find_mut::<Recorder>().unwrap();
        assert_eq!(recorder.loads, 1);
        assert_eq!(recorder.updates, 3);
    }

    #[test]
    fn test_disabled_behaviour_is_skipped_and_not_loaded() {
        let mut binding = BehaviourBinding::new();
        binding.push(Box::new(Recorder::default()), false);
        let mut scene = GameScene::new("test");
        run(&mut binding, &mut scene, 2);

        let recorder = binding.find_mut::<Recorder>().unwrap();
        assert_eq!(recorder.loads, 0);
        assert_eq!(recorder.updates, 0);
    }

    #[test]
    fn test_set_enabled_only_touches_matching_type() {
        let mut binding = BehaviourBinding::new();
        binding.push(Box::new(Recorder::default()), false);
        binding.push(Box::new(Lift), false);
        assert_eq!(binding.set_enabled::<Lift>(true), 1);
        assert_eq!(binding.set_enabled::<Lift>(true), 0);

        let flags: Vec<(&str, bool)> = binding.iter().collect();
        assert_eq!(flags, vec![("Recorder", false), ("Lift", true)]);
    }

    #[test]
    fn test_behaviours_run_in_bind_order() {
        let mut binding = BehaviourBinding::new();
        binding.push(Box::new(Lift), true);
        binding.push(Box::new(Lift), true);
        let mut scene = GameScene::new("test");
        run(&mut binding, &mut scene, 1);

        let host = scene.find_by_name("host").unwrap();
        assert_eq!(scene.transform(host).unwrap().local_position().z, 2.0);
    }
}
