//! Vulkan backend error types

use ash::vk;
use std::path::PathBuf;
use thiserror::Error;

/// Vulkan-specific error types
///
/// Only fatal conditions live here. A stale or suboptimal swap chain is an
/// expected outcome of acquire/present and is reported through
/// [`AcquireOutcome`](super::AcquireOutcome) and
/// [`SwapchainStatus`](super::SwapchainStatus) instead.
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No suitable memory type found for allocation
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,

    /// The surface reported no usable color formats
    #[error("Surface reports no supported formats")]
    NoSurfaceFormat,

    /// None of the candidate depth formats supports optimal tiling
    #[error("No supported depth format")]
    NoDepthFormat,

    /// A recreated swap chain no longer matches the formats its render pass
    /// and pipelines were built for
    #[error("Swap chain image or depth format has changed ({old_color:?}/{old_depth:?} -> {new_color:?}/{new_depth:?})")]
    SwapchainFormatChanged {
        /// Color format of the previous chain
        old_color: vk::Format,
        /// Depth format of the previous chain
        old_depth: vk::Format,
        /// Color format of the replacement chain
        new_color: vk::Format,
        /// Depth format of the replacement chain
        new_depth: vk::Format,
    },

    /// SPIR-V shader could not be read
    #[error("Failed to load shader {path:?}: {source}")]
    ShaderLoad {
        /// Path of the shader file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;
