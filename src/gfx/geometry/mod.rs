//! # Procedural Geometry Generation
//!
//! Vertex format, mesh building and the primitive shapes used by the demo.
//!
//! ## Usage
//!
//! ```rust
//! use cgmath::{Vector2, Vector3};
//! use lighting_demo::gfx::geometry::{add_ico_sphere, add_plane, invert_faces, MeshBuilder};
//!
//! // Ground quad
//! let mut ground = MeshBuilder::new();
//! add_plane(
//!     &mut ground,
//!     Vector3::new(0.0, 0.0, 0.0),
//!     Vector3::unit_z(),
//!     Vector3::unit_x(),
//!     Vector2::new(25.0, 25.0),
//!     [1.0; 4],
//! );
//!
//! // Skybox shell seen from inside
//! let mut sky = MeshBuilder::new();
//! add_ico_sphere(&mut sky, Vector3::new(0.0, 0.0, 0.0), 1.0, 2, [1.0; 4]);
//! invert_faces(&mut sky);
//! let mesh = sky.bake();
//! assert_eq!(mesh.index_count(), 320 * 3);
//! ```

pub mod mesh;
pub mod primitives;
pub mod vertex;

pub use mesh::{calculate_smooth_normals, DrawMesh, Mesh, MeshBuilder};
pub use primitives::*;
pub use vertex::VertexPosNormTexCol;
