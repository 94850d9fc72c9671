//! # Scene Registry
//!
//! Entities are generational [`slotmap`] keys. Each component type lives in its
//! own [`slotmap::SecondaryMap`], so an entity has a component exactly when its
//! key is present in that map.
//!
//! ## Key Components
//!
//! - [`GameScene`] - Entity registry, behaviour dispatch and transform updates
//! - [`Transform`] - Local position, rotation, scale and cached world matrix
//! - [`Tag`] - Entity name, attached on creation
//! - [`Renderer`] - Mesh and material pair; entities with one are drawn
//!
//! ## Usage
//!
//! ```
//! use lighting_demo::gfx::scene::GameScene;
//!
//! let mut scene = GameScene::new("demo");
//! let chicken = scene.create_entity("chicken");
//! scene
//!     .transform_mut(chicken)
//!     .unwrap()
//!     .set_local_position([0.0, -9.0, 0.0])
//!     .set_local_rotation_euler([90.0, 0.0, 180.0]);
//! scene.update_world_matrices();
//! assert_eq!(scene.find_by_name("chicken"), Some(chicken));
//! ```

pub mod scene;
pub mod transform;

// Re-export main types
pub use scene::{EntityId, GameScene, Renderer, Tag};
pub use transform::{quat_from_euler_degrees, Transform};
