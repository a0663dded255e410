//! Synchronization bookkeeping for frames in flight
//!
//! Two independent indices drive the frame loop and must never be mixed up:
//!
//! - [`FrameIndex`] selects a frame-in-flight slot. It cycles modulo the
//!   in-flight count and picks the command buffer, semaphores and fence used
//!   by the CPU while recording a frame.
//! - [`ImageIndex`] selects a presentable image. The presentation engine hands
//!   it out on acquire, in whatever order it likes.
//!
//! Because the two advance independently, a frame may be given an image that
//! an older, still-running frame is rendering to. [`ImageFences`] remembers
//! which in-flight fence last claimed each image so the newer frame can wait
//! for it before submitting.

use ash::vk;

use super::{RenderDevice, VulkanResult};

/// Index of a frame-in-flight slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameIndex(pub usize);

impl FrameIndex {
    /// Slot position as a plain index
    pub const fn get(self) -> usize {
        self.0
    }

    /// The slot used by the following frame, wrapping at `frames_in_flight`
    pub const fn next(self, frames_in_flight: usize) -> Self {
        Self((self.0 + 1) % frames_in_flight)
    }
}

/// Index of a presentable image within a swap chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ImageIndex(pub u32);

impl ImageIndex {
    /// Image position as a plain index
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

/// Synchronization objects owned by one frame-in-flight slot
#[derive(Debug, Clone, Copy)]
pub struct FrameSync {
    /// Signaled by the presentation engine once the acquired image is ready
    pub image_available: vk::Semaphore,
    /// Signaled by the graphics queue once the frame's commands finish
    pub render_finished: vk::Semaphore,
    /// Host-visible completion of the frame's submission
    pub in_flight: vk::Fence,
}

impl FrameSync {
    /// Create the slot's objects; the fence starts signaled so the first
    /// wait on an unused slot returns immediately
    pub fn new<D: RenderDevice + ?Sized>(device: &D) -> VulkanResult<Self> {
        let image_available = device.create_semaphore()?;
        let render_finished = match device.create_semaphore() {
            Ok(semaphore) => semaphore,
            Err(e) => {
                device.destroy_semaphore(image_available);
                return Err(e);
            }
        };
        let in_flight = match device.create_fence(true) {
            Ok(fence) => fence,
            Err(e) => {
                device.destroy_semaphore(render_finished);
                device.destroy_semaphore(image_available);
                return Err(e);
            }
        };

        Ok(Self {
            image_available,
            render_finished,
            in_flight,
        })
    }

    /// Release the slot's objects
    pub fn destroy<D: RenderDevice + ?Sized>(&self, device: &D) {
        device.destroy_semaphore(self.render_finished);
        device.destroy_semaphore(self.image_available);
        device.destroy_fence(self.in_flight);
    }
}

/// Tracks which in-flight fence last claimed each presentable image
#[derive(Debug, Clone, Default)]
pub struct ImageFences {
    owners: Vec<Option<vk::Fence>>,
}

impl ImageFences {
    /// One empty slot per presentable image
    pub fn new(image_count: usize) -> Self {
        Self {
            owners: vec![None; image_count],
        }
    }

    /// Fence of the frame that last submitted work against `image`
    pub fn owner(&self, image: ImageIndex) -> Option<vk::Fence> {
        self.owners[image.get()]
    }

    /// Record `fence` as the new owner of `image`, returning the previous one
    pub fn claim(&mut self, image: ImageIndex, fence: vk::Fence) -> Option<vk::Fence> {
        self.owners[image.get()].replace(fence)
    }

    /// Number of tracked images
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether no images are tracked
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
