//! # User Interface Module
//!
//! Dear ImGui overlay drawn on top of the scene.
//!
//! ## Key Components
//!
//! - [`UiManager`] - ImGui context, winit platform glue and wgpu renderer
//! - [`LightingPanel`] - Mode buttons, FPS plot and the scenery move toggle
//!
//! ## Input Handling
//!
//! Window events reach the UI first. While ImGui wants the keyboard, key
//! watchers such as the orthographic toggle are not polled.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::LightingPanel;
