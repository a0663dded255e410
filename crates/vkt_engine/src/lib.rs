//! # vkt_engine
//!
//! A small Vulkan renderer built around a robust swap chain lifecycle.
//!
//! ## Features
//!
//! - **Presentation engine**: swap chain with depth attachments, render pass,
//!   framebuffers and per-frame synchronization, rebuilt incrementally from
//!   the previous generation on resize
//! - **Frame orchestration**: begin/end frame protocol with frames in flight,
//!   per-image fence tracking and transparent recreation on stale surfaces
//! - **Forward rendering**: a push-constant pipeline drawing game objects
//! - **Configuration**: TOML or RON config files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use vkt_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     vkt_engine::foundation::logging::init();
//!     let config = EngineConfig::default();
//!
//!     let mut window = Window::new(&config.window)?;
//!     let context = Rc::new(VulkanContext::new(&window, "demo", false)?);
//!     let mut renderer = Renderer::new(Rc::clone(&context), &mut window, config.renderer.clone())?;
//!
//!     while !window.should_close() {
//!         window.poll_events();
//!         if let Some(command_buffer) = renderer.begin_frame(&mut window)? {
//!             renderer.begin_swapchain_render_pass(command_buffer);
//!             renderer.end_swapchain_render_pass(command_buffer);
//!             renderer.end_frame(&mut window)?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::{Config, EngineConfig, RendererConfig, ShaderConfig, WindowConfig},
        foundation::math::{Mat4, Vec3},
        input::KeyboardMovementController,
        render::{
            vulkan::{KeyInput, WindowSurface},
            Camera, Model, ModelData, Renderer, SimpleRenderSystem, VulkanContext, Window,
        },
        scene::{GameObject, TransformComponent, World},
    };
}
