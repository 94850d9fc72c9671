// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Draw ordering, per-shader pipelines and frame rendering.

pub mod pipeline_manager;
pub mod render_engine;
pub mod render_queue;

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::{RenderEngine, RenderError};
pub use render_queue::{build_draw_list, DrawCommand, DrawItem, DrawStats, RenderKey};
