//! Device abstraction consumed by the swap chain and the frame orchestrator
//!
//! [`RenderDevice`] is the narrow surface the presentation engine needs from
//! the graphics device: object creation for the chain, fences and
//! semaphores, acquire/submit/present and the handful of commands recorded
//! by the renderer itself. [`VulkanContext`](super::VulkanContext) implements
//! it on top of `ash`.

use ash::prelude::VkResult;
use ash::vk;

use super::VulkanResult;

/// Surface capabilities, formats and present modes for the bound surface
#[derive(Debug, Clone)]
pub struct SurfaceSupport {
    /// Image count, extent and transform limits
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported color formats
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported presentation modes
    pub present_modes: Vec<vk::PresentModeKHR>,
}

/// Parameters chosen for a new swap chain
#[derive(Debug, Clone, Copy)]
pub struct SwapchainDesc {
    /// Minimum number of presentable images requested
    pub min_image_count: u32,
    /// Color format and color space
    pub format: vk::SurfaceFormatKHR,
    /// Image extent in pixels
    pub extent: vk::Extent2D,
    /// Presentation mode
    pub present_mode: vk::PresentModeKHR,
    /// Surface transform to apply
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

/// Depth image with its backing memory and view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthAttachment {
    /// Depth image handle
    pub image: vk::Image,
    /// Device memory bound to the image
    pub memory: vk::DeviceMemory,
    /// View used as the framebuffer attachment
    pub view: vk::ImageView,
}

/// One graphics queue submission for a frame
#[derive(Debug, Clone, Copy)]
pub struct FrameSubmission {
    /// Recorded primary command buffer
    pub command_buffer: vk::CommandBuffer,
    /// Waited on at color attachment output
    pub wait_semaphore: vk::Semaphore,
    /// Signaled when the commands complete
    pub signal_semaphore: vk::Semaphore,
    /// Signaled on the host side when the commands complete
    pub fence: vk::Fence,
}

/// Graphics device operations required by the presentation engine
///
/// Methods mirror the Vulkan calls they wrap. `acquire_next_image` and
/// `queue_present` return the raw [`VkResult`] so callers can tell
/// `ERROR_OUT_OF_DATE_KHR` apart from fatal failures; the `bool` in their
/// success value is the suboptimal flag.
pub trait RenderDevice {
    /// Query the current surface capabilities, formats and present modes
    fn surface_support(&self) -> VulkanResult<SurfaceSupport>;

    /// Pick a depth format usable as an optimal-tiling depth attachment
    fn find_depth_format(&self) -> VulkanResult<vk::Format>;

    /// Create a swap chain, retiring `old_swapchain` if it is not null
    fn create_swapchain(
        &self,
        desc: &SwapchainDesc,
        old_swapchain: vk::SwapchainKHR,
    ) -> VulkanResult<vk::SwapchainKHR>;

    /// Presentable images owned by `swapchain`
    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VulkanResult<Vec<vk::Image>>;

    /// Destroy a swap chain and, with it, its images
    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);

    /// Create a 2D color view for a presentable image
    fn create_color_view(&self, image: vk::Image, format: vk::Format) -> VulkanResult<vk::ImageView>;

    /// Destroy an image view
    fn destroy_image_view(&self, view: vk::ImageView);

    /// Create a depth image, allocate and bind its memory and create a view
    fn create_depth_attachment(
        &self,
        extent: vk::Extent2D,
        format: vk::Format,
    ) -> VulkanResult<DepthAttachment>;

    /// Destroy a depth attachment created by [`Self::create_depth_attachment`]
    fn destroy_depth_attachment(&self, attachment: &DepthAttachment);

    /// Create the single-subpass color + depth render pass
    fn create_render_pass(
        &self,
        color_format: vk::Format,
        depth_format: vk::Format,
    ) -> VulkanResult<vk::RenderPass>;

    /// Destroy a render pass
    fn destroy_render_pass(&self, render_pass: vk::RenderPass);

    /// Create a framebuffer over `attachments`
    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<vk::Framebuffer>;

    /// Destroy a framebuffer
    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);

    /// Create a binary semaphore
    fn create_semaphore(&self) -> VulkanResult<vk::Semaphore>;

    /// Destroy a semaphore
    fn destroy_semaphore(&self, semaphore: vk::Semaphore);

    /// Create a fence, optionally already signaled
    fn create_fence(&self, signaled: bool) -> VulkanResult<vk::Fence>;

    /// Destroy a fence
    fn destroy_fence(&self, fence: vk::Fence);

    /// Block until `fence` is signaled or `timeout` nanoseconds pass
    fn wait_for_fence(&self, fence: vk::Fence, timeout: u64) -> VulkanResult<()>;

    /// Return `fence` to the unsignaled state
    fn reset_fence(&self, fence: vk::Fence) -> VulkanResult<()>;

    /// Request the next presentable image, signaling `semaphore` once it is ready
    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout: u64,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)>;

    /// Submit a frame's command buffer to the graphics queue
    fn queue_submit(&self, submission: &FrameSubmission) -> VulkanResult<()>;

    /// Queue `image_index` for presentation once `wait_semaphore` signals
    fn queue_present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> VkResult<bool>;

    /// Block until the device has no outstanding work
    fn wait_idle(&self) -> VulkanResult<()>;

    /// Allocate primary command buffers from the device's command pool
    fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>>;

    /// Return command buffers to the command pool
    fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]);

    /// Begin recording into a command buffer
    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()>;

    /// Finish recording into a command buffer
    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()>;

    /// Record `vkCmdBeginRenderPass` covering the whole framebuffer
    fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_values: &[vk::ClearValue],
    );

    /// Record a dynamic viewport
    fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: vk::Viewport);

    /// Record a dynamic scissor rectangle
    fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: vk::Rect2D);

    /// Record `vkCmdEndRenderPass`
    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer);
}
