//! # Rendering
//!
//! - **vulkan**: device, presentation engine and frame orchestration
//! - **model**: vertex layout, OBJ loading and GPU meshes
//! - **camera**: projection and view matrices in Vulkan clip conventions
//! - **simple_render_system**: one pipeline drawing game objects with push constants

pub mod camera;
pub mod model;
pub mod simple_render_system;
pub mod vulkan;

pub use camera::Camera;
pub use model::{Model, ModelData, ModelError, Vertex};
pub use simple_render_system::{SimplePushConstantData, SimpleRenderSystem};
pub use vulkan::{Renderer, VulkanContext, VulkanError, VulkanResult, Window};
