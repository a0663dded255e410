//! Vulkan rendering backend
//!
//! Layered bottom-up:
//!
//! - [`VulkanContext`] owns the instance, surface, logical device and command
//!   pool and implements [`RenderDevice`].
//! - [`Swapchain`] is the presentation engine. It owns one generation of
//!   presentable images with their views, depth attachments, render pass,
//!   framebuffers and per-frame sync objects.
//! - [`Renderer`] is the frame orchestrator. It owns the swap chain and the
//!   per-frame command buffers and runs the begin/end frame protocol,
//!   including swap chain recreation.
//!
//! The swap chain and renderer only talk to the device and the window
//! through [`RenderDevice`] and [`WindowSurface`].

pub mod buffer;
pub mod context;
pub mod device;
pub mod error;
pub mod pipeline;
pub mod renderer;
pub mod swapchain;
pub mod sync;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

pub use buffer::Buffer;
pub use context::{LogicalDevice, PhysicalDeviceInfo, VulkanContext, VulkanInstance};
pub use device::{DepthAttachment, FrameSubmission, RenderDevice, SurfaceSupport, SwapchainDesc};
pub use error::{VulkanError, VulkanResult};
pub use pipeline::{Pipeline, PipelineConfig, ShaderModule};
pub use renderer::Renderer;
pub use swapchain::{AcquireOutcome, Swapchain, SwapchainStatus};
pub use sync::{FrameIndex, FrameSync, ImageFences, ImageIndex};
pub use window::{KeyInput, Window, WindowError, WindowResult, WindowSurface};
