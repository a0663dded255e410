//! Frame orchestration
//!
//! [`Renderer`] drives the per-tick protocol on top of a [`Swapchain`]:
//!
//! ```text
//! begin_frame ─► begin_swapchain_render_pass ─► (draw) ─► end_swapchain_render_pass ─► end_frame
//! ```
//!
//! It owns one command buffer per frame-in-flight slot, the in-flight cursor
//! and the policy for rebuilding the swap chain. A stale or suboptimal chain,
//! a pending resize and a minimized window are all handled here and never
//! reach the caller as errors; `begin_frame` simply returns `None` for a tick
//! that cannot be rendered.
//!
//! Calling the protocol out of order is a bug in the caller and panics.

use ash::vk;
use std::rc::Rc;

use crate::core::RendererConfig;

use super::{
    AcquireOutcome, FrameIndex, ImageIndex, RenderDevice, Swapchain, VulkanError, VulkanResult,
    WindowSurface,
};

/// Where the current tick is in the frame protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Idle,
    Started { image: ImageIndex },
    RenderPassActive { image: ImageIndex },
    RenderPassEnded { image: ImageIndex },
}

impl FrameState {
    const fn image(self) -> Option<ImageIndex> {
        match self {
            Self::Idle => None,
            Self::Started { image }
            | Self::RenderPassActive { image }
            | Self::RenderPassEnded { image } => Some(image),
        }
    }
}

/// Frame orchestrator owning the swap chain and its command buffers
pub struct Renderer<D: RenderDevice> {
    device: Rc<D>,
    config: RendererConfig,
    command_buffers: Vec<vk::CommandBuffer>,
    current_frame: FrameIndex,
    state: FrameState,
    swapchain: Swapchain<D>,
}

impl<D: RenderDevice> Renderer<D> {
    /// Create the first swap chain and the per-frame command buffers
    ///
    /// Blocks while `window` reports a zero-sized drawable area.
    pub fn new<W: WindowSurface + ?Sized>(
        device: Rc<D>,
        window: &mut W,
        config: RendererConfig,
    ) -> VulkanResult<Self> {
        let extent = wait_for_drawable_extent(window);
        let swapchain = Swapchain::new(Rc::clone(&device), extent, None, &config)?;
        let command_buffers = allocate_command_buffers(device.as_ref(), swapchain.frames_in_flight())?;

        Ok(Self {
            device,
            config,
            command_buffers,
            current_frame: FrameIndex::default(),
            state: FrameState::Idle,
            swapchain,
        })
    }

    /// Start a frame and return the command buffer to record into
    ///
    /// Returns `Ok(None)` when the swap chain was out of date; it has been
    /// rebuilt and the caller should skip rendering this tick.
    ///
    /// # Panics
    ///
    /// If a frame is already in progress.
    pub fn begin_frame<W: WindowSurface + ?Sized>(
        &mut self,
        window: &mut W,
    ) -> VulkanResult<Option<vk::CommandBuffer>> {
        assert!(
            self.state == FrameState::Idle,
            "Can't call begin_frame while a frame is already in progress"
        );

        let image = match self.swapchain.acquire_next_image(self.current_frame)? {
            AcquireOutcome::Acquired(image) => image,
            AcquireOutcome::Suboptimal(image) => {
                log::trace!("Acquired image {} from a suboptimal swap chain", image.get());
                image
            }
            AcquireOutcome::OutOfDate => {
                log::debug!("Swap chain out of date on acquire, recreating");
                // The new chain already matches the window; a pending resize is covered.
                window.reset_resized_flag();
                self.recreate_swapchain(window)?;
                return Ok(None);
            }
        };

        let command_buffer = self.command_buffers[self.current_frame.get()];
        self.device.begin_command_buffer(command_buffer)?;
        self.state = FrameState::Started { image };

        Ok(Some(command_buffer))
    }

    /// Finish recording, submit and present the current frame
    ///
    /// Rebuilds the swap chain when presentation reports it stale or
    /// suboptimal, or when the window was resized since the last check. The
    /// in-flight cursor advances either way.
    ///
    /// # Panics
    ///
    /// If no frame is in progress or the swap chain render pass is still
    /// active.
    pub fn end_frame<W: WindowSurface + ?Sized>(&mut self, window: &mut W) -> VulkanResult<()> {
        let image = match self.state {
            FrameState::Started { image } | FrameState::RenderPassEnded { image } => image,
            FrameState::RenderPassActive { .. } => {
                panic!("Can't call end_frame while the swap chain render pass is active")
            }
            FrameState::Idle => panic!("Can't call end_frame while frame is not in progress"),
        };

        let command_buffer = self.command_buffers[self.current_frame.get()];
        self.state = FrameState::Idle;

        self.device.end_command_buffer(command_buffer)?;
        let status = self
            .swapchain
            .submit_command_buffers(self.current_frame, command_buffer, image)?;

        let resized = window.was_resized();
        if status.needs_recreation() || resized {
            log::debug!("Recreating swap chain after present (status {status:?}, resized {resized})");
            window.reset_resized_flag();
            self.recreate_swapchain(window)?;
        }

        self.current_frame = self.current_frame.next(self.swapchain.frames_in_flight());
        Ok(())
    }

    /// Begin the swap chain render pass on `command_buffer`
    ///
    /// Viewport and scissor are reset to the full current extent on every
    /// call since pipelines leave them dynamic.
    ///
    /// # Panics
    ///
    /// If no frame is in progress, the pass is already active, or
    /// `command_buffer` belongs to a different frame.
    pub fn begin_swapchain_render_pass(&mut self, command_buffer: vk::CommandBuffer) {
        let image = match self.state {
            FrameState::Started { image } | FrameState::RenderPassEnded { image } => image,
            FrameState::RenderPassActive { .. } => {
                panic!("Can't begin the swap chain render pass twice in one frame")
            }
            FrameState::Idle => {
                panic!("Can't call begin_swapchain_render_pass if frame is not in progress")
            }
        };
        assert_eq!(
            command_buffer,
            self.command_buffers[self.current_frame.get()],
            "Can't begin render pass on command buffer from a different frame"
        );

        let extent = self.swapchain.extent();
        let [r, g, b, a] = self.config.clear_color;
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [r, g, b, a],
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        self.device.cmd_begin_render_pass(
            command_buffer,
            self.swapchain.render_pass(),
            self.swapchain.framebuffer(image),
            extent,
            &clear_values,
        );
        self.device
            .cmd_set_viewport(command_buffer, full_viewport(extent));
        self.device.cmd_set_scissor(
            command_buffer,
            vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            },
        );

        self.state = FrameState::RenderPassActive { image };
    }

    /// End the swap chain render pass on `command_buffer`
    ///
    /// # Panics
    ///
    /// If the pass is not active or `command_buffer` belongs to a different
    /// frame.
    pub fn end_swapchain_render_pass(&mut self, command_buffer: vk::CommandBuffer) {
        let FrameState::RenderPassActive { image } = self.state else {
            panic!("Can't call end_swapchain_render_pass without an active render pass")
        };
        assert_eq!(
            command_buffer,
            self.command_buffers[self.current_frame.get()],
            "Can't end render pass on command buffer from a different frame"
        );

        self.device.cmd_end_render_pass(command_buffer);
        self.state = FrameState::RenderPassEnded { image };
    }

    /// Replace the swap chain with one sized to the window
    ///
    /// Blocks while the window is minimized, then waits for the device to go
    /// idle before building the new chain from the old one. The old chain is
    /// released only once its replacement exists. A replacement whose color
    /// or depth format differs is discarded and reported as
    /// [`VulkanError::SwapchainFormatChanged`].
    ///
    /// # Panics
    ///
    /// If called while a frame is in progress.
    pub fn recreate_swapchain<W: WindowSurface + ?Sized>(
        &mut self,
        window: &mut W,
    ) -> VulkanResult<()> {
        assert!(
            self.state == FrameState::Idle,
            "Can't recreate the swap chain while a frame is in progress"
        );

        let extent = wait_for_drawable_extent(window);
        self.device.wait_idle()?;

        let replacement = Swapchain::new(
            Rc::clone(&self.device),
            extent,
            Some(&self.swapchain),
            &self.config,
        )?;

        if !self.swapchain.compare_swap_formats(&replacement) {
            let error = VulkanError::SwapchainFormatChanged {
                old_color: self.swapchain.image_format(),
                old_depth: self.swapchain.depth_format(),
                new_color: replacement.image_format(),
                new_depth: replacement.depth_format(),
            };
            log::error!("{error}");
            drop(replacement);
            return Err(error);
        }

        let previous = std::mem::replace(&mut self.swapchain, replacement);
        drop(previous);

        let frames_in_flight = self.swapchain.frames_in_flight();
        if frames_in_flight != self.command_buffers.len() {
            log::debug!(
                "Reallocating command buffers: {} -> {}",
                self.command_buffers.len(),
                frames_in_flight
            );
            self.device.free_command_buffers(&self.command_buffers);
            self.command_buffers.clear();
            self.command_buffers = allocate_command_buffers(self.device.as_ref(), frames_in_flight)?;
        }
        self.current_frame = FrameIndex(self.current_frame.get() % frames_in_flight);

        Ok(())
    }

    /// Render pass pipelines must be built against
    pub fn swapchain_render_pass(&self) -> vk::RenderPass {
        self.swapchain.render_pass()
    }

    /// Whether `begin_frame` has been called without a matching `end_frame`
    pub fn is_frame_in_progress(&self) -> bool {
        self.state != FrameState::Idle
    }

    /// Command buffer of the frame in progress
    ///
    /// # Panics
    ///
    /// If no frame is in progress.
    pub fn current_command_buffer(&self) -> vk::CommandBuffer {
        assert!(
            self.is_frame_in_progress(),
            "Cannot get command buffer when frame not in progress"
        );
        self.command_buffers[self.current_frame.get()]
    }

    /// In-flight slot of the frame in progress
    ///
    /// # Panics
    ///
    /// If no frame is in progress.
    pub fn frame_index(&self) -> FrameIndex {
        assert!(
            self.is_frame_in_progress(),
            "Cannot get frame index when frame not in progress"
        );
        self.current_frame
    }

    /// Presentable image the frame in progress renders to
    ///
    /// # Panics
    ///
    /// If no frame is in progress.
    pub fn image_index(&self) -> ImageIndex {
        self.state
            .image()
            .unwrap_or_else(|| panic!("Cannot get image index when frame not in progress"))
    }

    /// Width over height of the swap chain extent
    pub fn aspect_ratio(&self) -> f32 {
        self.swapchain.extent_aspect_ratio()
    }

    /// Current swap chain extent
    pub fn swapchain_extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Number of frame-in-flight slots of the current chain
    pub fn frames_in_flight(&self) -> usize {
        self.swapchain.frames_in_flight()
    }

    /// The current swap chain
    pub fn swapchain(&self) -> &Swapchain<D> {
        &self.swapchain
    }
}

impl<D: RenderDevice> Drop for Renderer<D> {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            log::error!("Failed to wait for device idle during renderer teardown: {e}");
        }
        self.device.free_command_buffers(&self.command_buffers);
        self.command_buffers.clear();
    }
}

/// Current drawable extent, waiting for window events while it is zero
fn wait_for_drawable_extent<W: WindowSurface + ?Sized>(window: &mut W) -> vk::Extent2D {
    let mut extent = window.extent();
    if extent.width == 0 || extent.height == 0 {
        log::debug!("Window minimized, waiting for a drawable extent");
    }
    while extent.width == 0 || extent.height == 0 {
        window.wait_events();
        extent = window.extent();
    }
    extent
}

#[allow(clippy::cast_possible_truncation)]
fn allocate_command_buffers<D: RenderDevice + ?Sized>(
    device: &D,
    count: usize,
) -> VulkanResult<Vec<vk::CommandBuffer>> {
    device.allocate_command_buffers(count as u32)
}

#[allow(clippy::cast_precision_loss)]
fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}
