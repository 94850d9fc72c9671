//! # Graphics Module
//!
//! Everything between the scene description and pixels on screen.
//!
//! ## Architecture Overview
//!
//! - **Scene** ([`scene`]) - Entities, transforms, renderers and behaviours
//! - **Camera** ([`camera`]) - Perspective/orthographic projection and frame uniforms
//! - **Geometry** ([`geometry`]) - Vertex format, mesh builder and primitive shapes
//! - **Resources** ([`resources`]) - Shaders, materials, textures and meshes
//! - **Rendering** ([`rendering`]) - Draw ordering, pipelines and the wgpu frame
//! - **Lighting** ([`lighting`]) - The selectable lighting models
//!
//! ## Usage
//!
//! ```
//! use lighting_demo::config::LightingConfig;
//! use lighting_demo::gfx::{lighting::LightingMode, programs};
//!
//! let mut shader = programs::scene_shader(&LightingConfig::default()).unwrap();
//! LightingMode::Toon.apply(&mut shader).unwrap();
//! ```

pub mod camera;
pub mod geometry;
pub mod lighting;
pub mod programs;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use rendering::render_engine::RenderEngine;
