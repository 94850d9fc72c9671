// src/lib.rs
//! Lighting Toggles
//!
//! A small 3D scene rendered with wgpu and winit whose lighting model can be
//! switched at runtime from an ImGui overlay.

pub mod app;
pub mod assets;
pub mod behaviour;
pub mod config;
pub mod demo;
pub mod gfx;
pub mod input;
pub mod performance;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::{AppError, LightingApp};
pub use config::AppConfig;
