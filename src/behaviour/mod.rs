//! # Behaviours
//!
//! Per-entity scripts run once per frame by
//! [`GameScene::update_behaviours`](crate::gfx::scene::GameScene::update_behaviours).
//!
//! An entity holds at most one [`BehaviourBinding`], which keeps its
//! behaviours in bind order together with an enabled flag each.
//!
//! ```
//! use cgmath::Vector3;
//! use lighting_demo::behaviour::FollowPathBehaviour;
//! use lighting_demo::gfx::scene::GameScene;
//! use lighting_demo::input::InputState;
//!
//! let mut scene = GameScene::new("demo");
//! let chicken = scene.create_entity("chicken");
//! scene.bind(
//!     chicken,
//!     FollowPathBehaviour::new(vec![Vector3::new(0.0, 10.0, 0.0)], 4.0),
//! );
//! scene.update_behaviours(0.5, &InputState::new());
//! assert_eq!(scene.transform(chicken).unwrap().local_position().y, 2.0);
//! ```

pub mod binding;
pub mod camera_control;
pub mod follow_path;
pub mod simple_move;
pub mod spin;
pub mod traits;
pub mod turn_around;

pub use binding::BehaviourBinding;
pub use camera_control::CameraControlBehaviour;
pub use follow_path::FollowPathBehaviour;
pub use simple_move::SimpleMoveBehaviour;
pub use spin::SpinBehaviour;
pub use traits::{Behaviour, BehaviourContext};
pub use turn_around::TurnAroundBehaviour;
