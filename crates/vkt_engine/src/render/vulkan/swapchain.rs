//! Vulkan swap chain: the presentation engine
//!
//! A [`Swapchain`] owns one generation of presentable images together with
//! everything that depends on their extent and format: color views, depth
//! attachments, the render pass, one framebuffer per image and the per-frame
//! synchronization objects. When the surface changes a new generation is
//! built from the old one (which the caller keeps alive until the new chain
//! exists) and the old one is dropped.

use ash::vk;
use std::rc::Rc;

use crate::core::{PresentModePreference, RendererConfig};

use super::{
    DepthAttachment, FrameIndex, FrameSubmission, FrameSync, ImageFences, ImageIndex,
    RenderDevice, SwapchainDesc, VulkanError, VulkanResult,
};

/// Result of asking the presentation engine for the next image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Image is ready to be rendered to
    Acquired(ImageIndex),
    /// Image is usable this frame, but the chain should be rebuilt afterwards
    Suboptimal(ImageIndex),
    /// The chain no longer matches the surface; no image was acquired
    OutOfDate,
}

impl AcquireOutcome {
    /// The acquired image, if any
    pub const fn image_index(self) -> Option<ImageIndex> {
        match self {
            Self::Acquired(index) | Self::Suboptimal(index) => Some(index),
            Self::OutOfDate => None,
        }
    }
}

/// Result of submitting and presenting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainStatus {
    /// Presented, chain still matches the surface
    Optimal,
    /// Presented, but the chain should be rebuilt
    Suboptimal,
    /// The chain no longer matches the surface
    OutOfDate,
}

impl SwapchainStatus {
    /// Whether the caller should rebuild the chain
    pub const fn needs_recreation(self) -> bool {
        !matches!(self, Self::Optimal)
    }
}

/// One generation of presentable images and their dependent resources
pub struct Swapchain<D: RenderDevice> {
    device: Rc<D>,
    handle: vk::SwapchainKHR,
    image_format: vk::Format,
    depth_format: vk::Format,
    extent: vk::Extent2D,
    present_mode: vk::PresentModeKHR,

    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    depth_attachments: Vec<DepthAttachment>,
    framebuffers: Vec<vk::Framebuffer>,
    render_pass: vk::RenderPass,

    frames: Vec<FrameSync>,
    image_fences: ImageFences,
}

impl<D: RenderDevice> Swapchain<D> {
    /// Build a chain for `window_extent`
    ///
    /// When `previous` is given its handle is passed as the retiring chain so
    /// the presentation engine can hand over in-flight images smoothly. The
    /// previous chain is only borrowed: its owner releases it after this
    /// returns.
    pub fn new(
        device: Rc<D>,
        window_extent: vk::Extent2D,
        previous: Option<&Self>,
        config: &RendererConfig,
    ) -> VulkanResult<Self> {
        let support = device.surface_support()?;
        let format = choose_surface_format(&support.formats)?;
        let present_mode = choose_present_mode(&support.present_modes, config.present_mode);
        let extent = choose_extent(&support.capabilities, window_extent);
        let depth_format = device.find_depth_format()?;

        let desc = SwapchainDesc {
            min_image_count: choose_image_count(&support.capabilities),
            format,
            extent,
            present_mode,
            pre_transform: support.capabilities.current_transform,
        };
        let old_swapchain = previous.map_or_else(vk::SwapchainKHR::null, Self::handle);
        let handle = device.create_swapchain(&desc, old_swapchain)?;

        // From here on Drop releases whatever has been created so far.
        let mut chain = Self {
            device,
            handle,
            image_format: format.format,
            depth_format,
            extent,
            present_mode,
            images: Vec::new(),
            image_views: Vec::new(),
            depth_attachments: Vec::new(),
            framebuffers: Vec::new(),
            render_pass: vk::RenderPass::null(),
            frames: Vec::new(),
            image_fences: ImageFences::default(),
        };

        chain.images = chain.device.swapchain_images(handle)?;
        chain.create_image_views()?;
        chain.create_render_pass()?;
        chain.create_depth_resources()?;
        chain.create_framebuffers()?;
        chain.create_sync_objects(config.max_frames_in_flight)?;

        log::info!(
            "Swap chain created: {}x{}, {:?}, {:?}, {} images, {} frames in flight",
            extent.width,
            extent.height,
            chain.image_format,
            present_mode,
            chain.images.len(),
            chain.frames.len(),
        );

        Ok(chain)
    }

    fn create_image_views(&mut self) -> VulkanResult<()> {
        for &image in &self.images {
            let view = self.device.create_color_view(image, self.image_format)?;
            self.image_views.push(view);
        }
        Ok(())
    }

    fn create_render_pass(&mut self) -> VulkanResult<()> {
        self.render_pass = self
            .device
            .create_render_pass(self.image_format, self.depth_format)?;
        Ok(())
    }

    fn create_depth_resources(&mut self) -> VulkanResult<()> {
        for _ in 0..self.images.len() {
            let depth = self
                .device
                .create_depth_attachment(self.extent, self.depth_format)?;
            self.depth_attachments.push(depth);
        }
        Ok(())
    }

    fn create_framebuffers(&mut self) -> VulkanResult<()> {
        for (view, depth) in self.image_views.iter().zip(&self.depth_attachments) {
            let framebuffer =
                self.device
                    .create_framebuffer(self.render_pass, &[*view, depth.view], self.extent)?;
            self.framebuffers.push(framebuffer);
        }
        Ok(())
    }

    fn create_sync_objects(&mut self, max_frames_in_flight: usize) -> VulkanResult<()> {
        let frames_in_flight = max_frames_in_flight.min(self.images.len()).max(1);
        for _ in 0..frames_in_flight {
            let frame = FrameSync::new(self.device.as_ref())?;
            self.frames.push(frame);
        }
        self.image_fences = ImageFences::new(self.images.len());
        Ok(())
    }

    /// Wait for `frame`'s previous submission, then acquire the next image
    ///
    /// Blocks on the slot's fence without a timeout. The slot's
    /// image-available semaphore is signaled once the returned image may be
    /// written.
    pub fn acquire_next_image(&self, frame: FrameIndex) -> VulkanResult<AcquireOutcome> {
        let sync = self.frames[frame.get()];
        self.device.wait_for_fence(sync.in_flight, u64::MAX)?;

        match self
            .device
            .acquire_next_image(self.handle, u64::MAX, sync.image_available)
        {
            Ok((index, false)) => Ok(AcquireOutcome::Acquired(ImageIndex(index))),
            Ok((index, true)) => Ok(AcquireOutcome::Suboptimal(ImageIndex(index))),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
            Err(e) => Err(VulkanError::Api(e)),
        }
    }

    /// Submit `command_buffer` for `frame` and present `image`
    ///
    /// If another in-flight frame still owns `image`, its fence is waited on
    /// first so at most one submission is ever outstanding per image.
    pub fn submit_command_buffers(
        &mut self,
        frame: FrameIndex,
        command_buffer: vk::CommandBuffer,
        image: ImageIndex,
    ) -> VulkanResult<SwapchainStatus> {
        let sync = self.frames[frame.get()];

        if let Some(previous) = self.image_fences.owner(image) {
            self.device.wait_for_fence(previous, u64::MAX)?;
        }
        self.image_fences.claim(image, sync.in_flight);

        self.device.reset_fence(sync.in_flight)?;
        self.device.queue_submit(&FrameSubmission {
            command_buffer,
            wait_semaphore: sync.image_available,
            signal_semaphore: sync.render_finished,
            fence: sync.in_flight,
        })?;

        match self
            .device
            .queue_present(self.handle, image.0, sync.render_finished)
        {
            Ok(false) => Ok(SwapchainStatus::Optimal),
            Ok(true) => Ok(SwapchainStatus::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(SwapchainStatus::OutOfDate),
            Err(e) => Err(VulkanError::Api(e)),
        }
    }

    /// Whether `other` uses the same color and depth formats
    ///
    /// Render passes and pipelines built against this chain stay valid for
    /// `other` only when this holds.
    pub fn compare_swap_formats(&self, other: &Self) -> bool {
        self.image_format == other.image_format && self.depth_format == other.depth_format
    }

    /// Raw swap chain handle
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    /// Render pass targeting this chain's framebuffers
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Framebuffer for a presentable image
    pub fn framebuffer(&self, image: ImageIndex) -> vk::Framebuffer {
        self.framebuffers[image.get()]
    }

    /// Image extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Width over height of the image extent
    #[allow(clippy::cast_precision_loss)]
    pub fn extent_aspect_ratio(&self) -> f32 {
        self.extent.width as f32 / self.extent.height as f32
    }

    /// Color format of the presentable images
    pub fn image_format(&self) -> vk::Format {
        self.image_format
    }

    /// Format of the depth attachments
    pub fn depth_format(&self) -> vk::Format {
        self.depth_format
    }

    /// Presentation mode in use
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Number of presentable images
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Number of frame-in-flight slots
    pub fn frames_in_flight(&self) -> usize {
        self.frames.len()
    }
}

impl<D: RenderDevice> Drop for Swapchain<D> {
    fn drop(&mut self) {
        for framebuffer in self.framebuffers.drain(..) {
            self.device.destroy_framebuffer(framebuffer);
        }
        for view in self.image_views.drain(..) {
            self.device.destroy_image_view(view);
        }
        for depth in self.depth_attachments.drain(..) {
            self.device.destroy_depth_attachment(&depth);
        }

        // The presentable images belong to the swap chain itself.
        self.images.clear();
        if self.handle != vk::SwapchainKHR::null() {
            self.device.destroy_swapchain(self.handle);
        }

        if self.render_pass != vk::RenderPass::null() {
            self.device.destroy_render_pass(self.render_pass);
        }

        for frame in self.frames.drain(..) {
            frame.destroy(self.device.as_ref());
        }
    }
}

/// Prefer 8-bit BGRA sRGB, otherwise take whatever the surface lists first
pub fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
) -> VulkanResult<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|sf| {
            sf.format == vk::Format::B8G8R8A8_SRGB
                && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
        .ok_or(VulkanError::NoSurfaceFormat)
}

/// Use the preferred mode when offered, FIFO otherwise
pub fn choose_present_mode(
    present_modes: &[vk::PresentModeKHR],
    preference: PresentModePreference,
) -> vk::PresentModeKHR {
    let preferred = match preference {
        PresentModePreference::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentModePreference::Fifo => vk::PresentModeKHR::FIFO,
        PresentModePreference::Immediate => vk::PresentModeKHR::IMMEDIATE,
    };

    if present_modes.contains(&preferred) {
        preferred
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// The surface's current extent, or the window extent clamped to the
/// surface limits when the surface leaves the choice to the swap chain
///
/// A zero current extent, reported by some platforms mid-minimize, also
/// falls back to the window. The result is never zero in either dimension.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_extent: vk::Extent2D,
) -> vk::Extent2D {
    let current = capabilities.current_extent;
    if current.width != u32::MAX && current.width > 0 && current.height > 0 {
        return current;
    }

    vk::Extent2D {
        width: clamp_dimension(
            window_extent.width,
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: clamp_dimension(
            window_extent.height,
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

// Surfaces being minimized may report max < min, so no `clamp` here.
fn clamp_dimension(value: u32, min: u32, max: u32) -> u32 {
    value.min(max).max(min).max(1)
}

/// One more than the minimum, capped at the maximum when the surface has one
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        desired.min(capabilities.max_image_count)
    } else {
        desired
    }
}
