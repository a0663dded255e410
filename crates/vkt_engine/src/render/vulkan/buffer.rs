//! Buffer management for vertex, index and staging data
//!
//! Memory management following RAII patterns with proper allocation and cleanup

use ash::{vk, Device};
use bytemuck::Pod;
use std::ffi::c_void;

use super::{VulkanContext, VulkanResult, VulkanError};

/// Round `instance_size` up to a multiple of `min_offset_alignment`
///
/// `min_offset_alignment` must be zero (no requirement) or a power of two,
/// which Vulkan guarantees for every alignment limit it reports.
pub const fn aligned_size(
    instance_size: vk::DeviceSize,
    min_offset_alignment: vk::DeviceSize,
) -> vk::DeviceSize {
    if min_offset_alignment > 0 {
        (instance_size + min_offset_alignment - 1) & !(min_offset_alignment - 1)
    } else {
        instance_size
    }
}

/// Buffer wrapper owning its memory
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    mapped: Option<*mut c_void>,
    instance_size: vk::DeviceSize,
    instance_count: u32,
    alignment_size: vk::DeviceSize,
    buffer_size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer holding `instance_count` elements of `instance_size` bytes
    pub fn new(
        context: &VulkanContext,
        instance_size: vk::DeviceSize,
        instance_count: u32,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
        min_offset_alignment: vk::DeviceSize,
    ) -> VulkanResult<Self> {
        let alignment_size = aligned_size(instance_size, min_offset_alignment);
        let buffer_size = alignment_size * vk::DeviceSize::from(instance_count);
        let (buffer, memory) = context.create_buffer(buffer_size, usage, properties)?;

        Ok(Self {
            device: context.raw_device(),
            buffer,
            memory,
            mapped: None,
            instance_size,
            instance_count,
            alignment_size,
            buffer_size,
        })
    }

    /// Map the whole buffer into host memory
    pub fn map(&mut self) -> VulkanResult<()> {
        if self.mapped.is_some() {
            return Ok(());
        }
        let ptr = unsafe {
            self.device
                .map_memory(
                    self.memory,
                    0,
                    vk::WHOLE_SIZE,
                    vk::MemoryMapFlags::empty(),
                )
                .map_err(VulkanError::Api)?
        };
        self.mapped = Some(ptr);
        Ok(())
    }

    /// Unmap the buffer if it is mapped
    pub fn unmap(&mut self) {
        if self.mapped.take().is_some() {
            unsafe { self.device.unmap_memory(self.memory) };
        }
    }

    /// Copy `data` to the start of the mapped buffer
    ///
    /// # Panics
    ///
    /// If the buffer is not mapped or `data` does not fit.
    pub fn write<T: Pod>(&mut self, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let Some(ptr) = self.mapped else {
            panic!("Cannot write to an unmapped buffer")
        };
        assert!(
            bytes.len() as vk::DeviceSize <= self.buffer_size,
            "Write of {} bytes exceeds buffer size {}",
            bytes.len(),
            self.buffer_size
        );

        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.cast::<u8>(), bytes.len());
        }
    }

    /// Map, write `data` and unmap again
    pub fn write_mapped<T: Pod>(&mut self, data: &[T]) -> VulkanResult<()> {
        self.map()?;
        self.write(data);
        self.unmap();
        Ok(())
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Total size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.buffer_size
    }

    /// Size of one element before alignment
    pub fn instance_size(&self) -> vk::DeviceSize {
        self.instance_size
    }

    /// Number of elements
    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    /// Stride between elements
    pub fn alignment_size(&self) -> vk::DeviceSize {
        self.alignment_size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.unmap();
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
