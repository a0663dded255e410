//! Recording device and scripted window for swap chain tests

use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};

use super::{
    DepthAttachment, FrameSubmission, RenderDevice, SurfaceSupport, SwapchainDesc, VulkanError,
    VulkanResult, WindowSurface,
};

/// Kind of object a raw handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Swapchain,
    Image,
    ImageView,
    DepthAttachment,
    RenderPass,
    Framebuffer,
    Semaphore,
    Fence,
    CommandBuffer,
}

/// Host-side state of a fence as the mock GPU sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceState {
    Signaled,
    Unsignaled,
    /// Submitted and not yet waited on
    Pending,
}

/// Every device call the presentation engine makes, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateSwapchain {
        handle: u64,
        old: u64,
        extent: (u32, u32),
        min_image_count: u32,
    },
    DestroySwapchain(u64),
    CreateRenderPass(u64),
    DestroyRenderPass(u64),
    CreateFramebuffer {
        handle: u64,
        render_pass: u64,
    },
    DestroyFramebuffer(u64),
    DestroyImageView(u64),
    DestroyDepthAttachment(u64),
    WaitForFence(u64),
    ResetFence(u64),
    Acquire {
        swapchain: u64,
        semaphore: u64,
    },
    Submit {
        command_buffer: u64,
        fence: u64,
    },
    Present {
        swapchain: u64,
        image: u32,
    },
    WaitIdle,
    AllocateCommandBuffers(u32),
    FreeCommandBuffers(Vec<u64>),
    BeginCommandBuffer(u64),
    EndCommandBuffer(u64),
    BeginRenderPass {
        render_pass: u64,
        framebuffer: u64,
        extent: (u32, u32),
    },
    SetViewport {
        width: f32,
        height: f32,
    },
    SetScissor((u32, u32)),
    EndRenderPass(u64),
}

struct MockState {
    next_handle: u64,
    live: BTreeMap<u64, ObjectKind>,
    fences: HashMap<u64, FenceState>,
    swapchain_images: HashMap<u64, Vec<vk::Image>>,
    next_image: HashMap<u64, u32>,
    acquire_script: VecDeque<VkResult<(u32, bool)>>,
    present_script: VecDeque<VkResult<bool>>,
    fail_on: Option<(ObjectKind, usize)>,
    created: HashMap<ObjectKind, usize>,
    calls: Vec<Call>,
}

/// Device double that hands out fake handles and logs each call
///
/// Fences follow the real host-side rules: submitting needs an unsignaled
/// fence, waiting on an unsignaled fence that was never submitted would
/// hang and panics instead, and resetting a fence still in use panics.
/// Acquire hands out images round robin unless a result was scripted.
pub struct MockDevice {
    pub support: RefCell<SurfaceSupport>,
    pub depth_format: Cell<vk::Format>,
    state: RefCell<MockState>,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    /// Surface with three images, a free-choice extent and sRGB BGRA
    pub fn new() -> Self {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
            ..Default::default()
        };

        Self {
            support: RefCell::new(SurfaceSupport {
                capabilities,
                formats: vec![vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                }],
                present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
            }),
            depth_format: Cell::new(vk::Format::D32_SFLOAT),
            state: RefCell::new(MockState {
                next_handle: 1,
                live: BTreeMap::new(),
                fences: HashMap::new(),
                swapchain_images: HashMap::new(),
                next_image: HashMap::new(),
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                fail_on: None,
                created: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Change the image counts the surface reports
    pub fn set_image_count_limits(&self, min: u32, max: u32) {
        let mut support = self.support.borrow_mut();
        support.capabilities.min_image_count = min;
        support.capabilities.max_image_count = max;
    }

    /// Make the surface offer only `format`
    pub fn set_surface_format(&self, format: vk::Format) {
        self.support.borrow_mut().formats = vec![vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
    }

    /// Queue a result for the next acquire
    pub fn script_acquire(&self, result: VkResult<(u32, bool)>) {
        self.state.borrow_mut().acquire_script.push_back(result);
    }

    /// Queue a result for the next present
    pub fn script_present(&self, result: VkResult<bool>) {
        self.state.borrow_mut().present_script.push_back(result);
    }

    /// Fail the `nth` (zero-based) creation of `kind` from now on
    pub fn fail_on_create(&self, kind: ObjectKind, nth: usize) {
        let mut state = self.state.borrow_mut();
        let already = state.created_of(kind);
        state.fail_on = Some((kind, already + nth));
    }

    /// All calls recorded so far
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Number of live objects of `kind`
    pub fn live_count(&self, kind: ObjectKind) -> usize {
        self.state
            .borrow()
            .live
            .values()
            .filter(|&&k| k == kind)
            .count()
    }

    /// Number of live objects of any kind
    pub fn live_total(&self) -> usize {
        self.state.borrow().live.len()
    }

    /// Current state of a fence
    pub fn fence_state(&self, fence: vk::Fence) -> Option<FenceState> {
        self.state.borrow().fences.get(&fence.as_raw()).copied()
    }

    fn create(&self, kind: ObjectKind) -> VulkanResult<u64> {
        let mut state = self.state.borrow_mut();
        let count = state.created_of(kind);
        if state.fail_on == Some((kind, count)) {
            state.fail_on = None;
            return Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
        }
        *state.created.entry(kind).or_default() += 1;

        let handle = state.next_handle;
        state.next_handle += 1;
        state.live.insert(handle, kind);
        Ok(handle)
    }

    fn destroy(&self, handle: u64, kind: ObjectKind) {
        let removed = self.state.borrow_mut().live.remove(&handle);
        assert_eq!(
            removed,
            Some(kind),
            "destroying {kind:?} {handle} that is not alive"
        );
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl MockState {
    fn created_of(&self, kind: ObjectKind) -> usize {
        self.created.get(&kind).copied().unwrap_or(0)
    }
}

impl RenderDevice for MockDevice {
    fn surface_support(&self) -> VulkanResult<SurfaceSupport> {
        Ok(self.support.borrow().clone())
    }

    fn find_depth_format(&self) -> VulkanResult<vk::Format> {
        Ok(self.depth_format.get())
    }

    fn create_swapchain(
        &self,
        desc: &SwapchainDesc,
        old_swapchain: vk::SwapchainKHR,
    ) -> VulkanResult<vk::SwapchainKHR> {
        let handle = self.create(ObjectKind::Swapchain)?;
        let mut images = Vec::new();
        for _ in 0..desc.min_image_count {
            images.push(vk::Image::from_raw(self.create(ObjectKind::Image)?));
        }
        self.state
            .borrow_mut()
            .swapchain_images
            .insert(handle, images);
        self.record(Call::CreateSwapchain {
            handle,
            old: old_swapchain.as_raw(),
            extent: (desc.extent.width, desc.extent.height),
            min_image_count: desc.min_image_count,
        });
        Ok(vk::SwapchainKHR::from_raw(handle))
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VulkanResult<Vec<vk::Image>> {
        Ok(self.state.borrow().swapchain_images[&swapchain.as_raw()].clone())
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        let raw = swapchain.as_raw();
        let images = self
            .state
            .borrow_mut()
            .swapchain_images
            .remove(&raw)
            .unwrap_or_default();
        for image in images {
            self.destroy(image.as_raw(), ObjectKind::Image);
        }
        self.destroy(raw, ObjectKind::Swapchain);
        self.record(Call::DestroySwapchain(raw));
    }

    fn create_color_view(&self, _image: vk::Image, _format: vk::Format) -> VulkanResult<vk::ImageView> {
        Ok(vk::ImageView::from_raw(self.create(ObjectKind::ImageView)?))
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        self.destroy(view.as_raw(), ObjectKind::ImageView);
        self.record(Call::DestroyImageView(view.as_raw()));
    }

    fn create_depth_attachment(
        &self,
        _extent: vk::Extent2D,
        _format: vk::Format,
    ) -> VulkanResult<DepthAttachment> {
        let handle = self.create(ObjectKind::DepthAttachment)?;
        Ok(DepthAttachment {
            image: vk::Image::from_raw(handle),
            memory: vk::DeviceMemory::from_raw(handle),
            view: vk::ImageView::from_raw(handle),
        })
    }

    fn destroy_depth_attachment(&self, attachment: &DepthAttachment) {
        let raw = attachment.image.as_raw();
        self.destroy(raw, ObjectKind::DepthAttachment);
        self.record(Call::DestroyDepthAttachment(raw));
    }

    fn create_render_pass(
        &self,
        _color_format: vk::Format,
        _depth_format: vk::Format,
    ) -> VulkanResult<vk::RenderPass> {
        let handle = self.create(ObjectKind::RenderPass)?;
        self.record(Call::CreateRenderPass(handle));
        Ok(vk::RenderPass::from_raw(handle))
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        self.destroy(render_pass.as_raw(), ObjectKind::RenderPass);
        self.record(Call::DestroyRenderPass(render_pass.as_raw()));
    }

    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        _extent: vk::Extent2D,
    ) -> VulkanResult<vk::Framebuffer> {
        assert_eq!(attachments.len(), 2, "framebuffers need color and depth");
        let handle = self.create(ObjectKind::Framebuffer)?;
        self.record(Call::CreateFramebuffer {
            handle,
            render_pass: render_pass.as_raw(),
        });
        Ok(vk::Framebuffer::from_raw(handle))
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.destroy(framebuffer.as_raw(), ObjectKind::Framebuffer);
        self.record(Call::DestroyFramebuffer(framebuffer.as_raw()));
    }

    fn create_semaphore(&self) -> VulkanResult<vk::Semaphore> {
        Ok(vk::Semaphore::from_raw(self.create(ObjectKind::Semaphore)?))
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.destroy(semaphore.as_raw(), ObjectKind::Semaphore);
    }

    fn create_fence(&self, signaled: bool) -> VulkanResult<vk::Fence> {
        let handle = self.create(ObjectKind::Fence)?;
        let state = if signaled {
            FenceState::Signaled
        } else {
            FenceState::Unsignaled
        };
        self.state.borrow_mut().fences.insert(handle, state);
        Ok(vk::Fence::from_raw(handle))
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        let raw = fence.as_raw();
        let state = self.state.borrow_mut().fences.remove(&raw);
        assert_ne!(state, Some(FenceState::Pending), "destroying fence {raw} still in use");
        self.destroy(raw, ObjectKind::Fence);
    }

    fn wait_for_fence(&self, fence: vk::Fence, _timeout: u64) -> VulkanResult<()> {
        let raw = fence.as_raw();
        self.record(Call::WaitForFence(raw));
        let mut state = self.state.borrow_mut();
        let fence_state = state
            .fences
            .get_mut(&raw)
            .unwrap_or_else(|| panic!("waiting on unknown fence {raw}"));
        match *fence_state {
            FenceState::Unsignaled => panic!("waiting on fence {raw} that nothing will signal"),
            FenceState::Pending | FenceState::Signaled => *fence_state = FenceState::Signaled,
        }
        Ok(())
    }

    fn reset_fence(&self, fence: vk::Fence) -> VulkanResult<()> {
        let raw = fence.as_raw();
        self.record(Call::ResetFence(raw));
        let mut state = self.state.borrow_mut();
        let fence_state = state
            .fences
            .get_mut(&raw)
            .unwrap_or_else(|| panic!("resetting unknown fence {raw}"));
        assert_ne!(*fence_state, FenceState::Pending, "resetting fence {raw} still in use");
        *fence_state = FenceState::Unsignaled;
        Ok(())
    }

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        _timeout: u64,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        let raw = swapchain.as_raw();
        self.record(Call::Acquire {
            swapchain: raw,
            semaphore: semaphore.as_raw(),
        });
        let mut state = self.state.borrow_mut();
        if let Some(result) = state.acquire_script.pop_front() {
            return result;
        }

        let image_count = state.swapchain_images[&raw].len() as u32;
        let next = state.next_image.entry(raw).or_insert(0);
        let image = *next;
        *next = (image + 1) % image_count;
        Ok((image, false))
    }

    fn queue_submit(&self, submission: &FrameSubmission) -> VulkanResult<()> {
        let fence = submission.fence.as_raw();
        self.record(Call::Submit {
            command_buffer: submission.command_buffer.as_raw(),
            fence,
        });
        let mut state = self.state.borrow_mut();
        let fence_state = state
            .fences
            .get_mut(&fence)
            .unwrap_or_else(|| panic!("submitting with unknown fence {fence}"));
        assert_eq!(
            *fence_state,
            FenceState::Unsignaled,
            "submitting with fence {fence} that is not reset"
        );
        *fence_state = FenceState::Pending;
        Ok(())
    }

    fn queue_present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        _wait_semaphore: vk::Semaphore,
    ) -> VkResult<bool> {
        self.record(Call::Present {
            swapchain: swapchain.as_raw(),
            image: image_index,
        });
        self.state
            .borrow_mut()
            .present_script
            .pop_front()
            .unwrap_or(Ok(false))
    }

    fn wait_idle(&self) -> VulkanResult<()> {
        self.record(Call::WaitIdle);
        for state in self.state.borrow_mut().fences.values_mut() {
            if *state == FenceState::Pending {
                *state = FenceState::Signaled;
            }
        }
        Ok(())
    }

    fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        self.record(Call::AllocateCommandBuffers(count));
        (0..count)
            .map(|_| {
                self.create(ObjectKind::CommandBuffer)
                    .map(vk::CommandBuffer::from_raw)
            })
            .collect()
    }

    fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
        self.record(Call::FreeCommandBuffers(
            command_buffers.iter().map(|cb| cb.as_raw()).collect(),
        ));
        for cb in command_buffers {
            self.destroy(cb.as_raw(), ObjectKind::CommandBuffer);
        }
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        self.record(Call::BeginCommandBuffer(command_buffer.as_raw()));
        Ok(())
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        self.record(Call::EndCommandBuffer(command_buffer.as_raw()));
        Ok(())
    }

    fn cmd_begin_render_pass(
        &self,
        _command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_values: &[vk::ClearValue],
    ) {
        assert_eq!(clear_values.len(), 2, "expected color and depth clear values");
        self.record(Call::BeginRenderPass {
            render_pass: render_pass.as_raw(),
            framebuffer: framebuffer.as_raw(),
            extent: (extent.width, extent.height),
        });
    }

    fn cmd_set_viewport(&self, _command_buffer: vk::CommandBuffer, viewport: vk::Viewport) {
        self.record(Call::SetViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }

    fn cmd_set_scissor(&self, _command_buffer: vk::CommandBuffer, scissor: vk::Rect2D) {
        self.record(Call::SetScissor((scissor.extent.width, scissor.extent.height)));
    }

    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        self.record(Call::EndRenderPass(command_buffer.as_raw()));
    }
}

/// Window whose drawable extent follows a script
///
/// `wait_events` moves to the next queued extent and counts how often it was
/// called.
pub struct MockWindow {
    extent: vk::Extent2D,
    pending: VecDeque<vk::Extent2D>,
    resized: bool,
    pub waits: usize,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: vk::Extent2D { width, height },
            pending: VecDeque::new(),
            resized: false,
            waits: 0,
        }
    }

    /// Report a framebuffer resize to `width` x `height`
    pub fn resize(&mut self, width: u32, height: u32) {
        self.extent = vk::Extent2D { width, height };
        self.resized = true;
    }

    /// Extents reported after each successive `wait_events`
    pub fn queue_extents(&mut self, extents: &[(u32, u32)]) {
        self.pending.extend(
            extents
                .iter()
                .map(|&(width, height)| vk::Extent2D { width, height }),
        );
    }
}

impl WindowSurface for MockWindow {
    fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    fn was_resized(&self) -> bool {
        self.resized
    }

    fn reset_resized_flag(&mut self) {
        self.resized = false;
    }

    fn wait_events(&mut self) {
        self.waits += 1;
        self.extent = self
            .pending
            .pop_front()
            .unwrap_or_else(|| panic!("window would wait forever at {:?}", self.extent));
    }
}
