//! Vulkan context: instance, surface, devices and the command pool
//!
//! [`VulkanContext`] is the device provider the rest of the renderer builds
//! on. Besides the [`RenderDevice`] implementation used by the swap chain and
//! the frame orchestrator it offers the helpers buffers and models need:
//! memory-type lookup, buffer creation and one-shot command submission.

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::prelude::VkResult;
use ash::{vk, Device, Entry, Instance};
use std::collections::HashSet;
use std::ffi::{c_char, CStr, CString};

use super::{
    DepthAttachment, FrameSubmission, RenderDevice, SurfaceSupport, SwapchainDesc, VulkanError,
    VulkanResult, Window,
};

const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

fn c_string(value: &str) -> VulkanResult<CString> {
    CString::new(value)
        .map_err(|e| VulkanError::InitializationFailed(format!("Invalid name {value:?}: {e}")))
}

/// Vulkan instance with its optional debug messenger
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance
    pub instance: Instance,
    debug_utils: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Create an instance with the extensions GLFW needs for `window`
    ///
    /// With `enable_validation` the Khronos validation layer is enabled and
    /// its messages are forwarded to the `log` facade.
    pub fn new(window: &Window, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::InitializationFailed(format!("Failed to load Vulkan: {e}")))?;

        let app_name_cstr = c_string(app_name)?;
        let engine_name_cstr = c_string("vkt_engine")?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name_cstr)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let required_extensions = window.required_instance_extensions().map_err(|e| {
            VulkanError::InitializationFailed(format!("Failed to get required extensions: {e}"))
        })?;
        let extension_names = required_extensions
            .iter()
            .map(|ext| c_string(ext))
            .collect::<VulkanResult<Vec<_>>>()?;

        let mut extensions: Vec<*const c_char> =
            extension_names.iter().map(|ext| ext.as_ptr()).collect();
        if enable_validation {
            extensions.push(DebugUtils::name().as_ptr());
        }

        let layer_names = if enable_validation {
            vec![c_string(VALIDATION_LAYER)?]
        } else {
            Vec::new()
        };
        let layer_name_ptrs: Vec<*const c_char> =
            layer_names.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_name_ptrs);

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        let debug_utils = if enable_validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            match Self::setup_debug_messenger(&debug_utils) {
                Ok(messenger) => Some((debug_utils, messenger)),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        log::debug!("Vulkan instance created (validation: {enable_validation})");

        Ok(Self {
            entry,
            instance,
            debug_utils,
        })
    }

    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((debug_utils, messenger)) = &self.debug_utils {
                debug_utils.destroy_debug_utils_messenger(*messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {message_type:?} - {message}");
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {message_type:?} - {message}");
    } else {
        log::debug!("[Vulkan] {message_type:?} - {message}");
    }

    vk::FALSE
}

/// Selected physical device and its queue families
pub struct PhysicalDeviceInfo {
    /// Physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits)
    pub properties: vk::PhysicalDeviceProperties,
    /// Queue family used for graphics commands
    pub graphics_family: u32,
    /// Queue family used for presentation
    pub present_family: u32,
}

impl PhysicalDeviceInfo {
    /// Pick the first device with graphics and present queues and swap chain support
    pub fn select_suitable_device(
        instance: &Instance,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<Self> {
        let devices = unsafe {
            instance
                .enumerate_physical_devices()
                .map_err(VulkanError::Api)?
        };
        log::debug!("Found {} physical device(s)", devices.len());

        for device in devices {
            match Self::evaluate_device(instance, device, surface, surface_loader) {
                Ok(info) => {
                    log::info!("Selected GPU: {}", unsafe {
                        CStr::from_ptr(info.properties.device_name.as_ptr()).to_string_lossy()
                    });
                    return Ok(info);
                }
                Err(e) => log::debug!("Skipping physical device: {e}"),
            }
        }

        Err(VulkanError::InitializationFailed(
            "No suitable GPU found".to_string(),
        ))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn evaluate_device(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
    ) -> VulkanResult<Self> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(device) };

        let mut graphics_family = None;
        let mut present_family = None;

        for (index, family) in queue_families.iter().enumerate() {
            let index = index as u32;

            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && graphics_family.is_none() {
                graphics_family = Some(index);
            }

            let present_support = unsafe {
                surface_loader
                    .get_physical_device_surface_support(device, index, surface)
                    .map_err(VulkanError::Api)?
            };
            if present_support && present_family.is_none() {
                present_family = Some(index);
            }

            if graphics_family.is_some() && present_family.is_some() {
                break;
            }
        }

        let graphics_family = graphics_family.ok_or_else(|| {
            VulkanError::InitializationFailed("No graphics queue family found".to_string())
        })?;
        let present_family = present_family.ok_or_else(|| {
            VulkanError::InitializationFailed("No present queue family found".to_string())
        })?;

        let extensions = unsafe {
            instance
                .enumerate_device_extension_properties(device)
                .map_err(VulkanError::Api)?
        };
        let has_swapchain = extensions.iter().any(|available| {
            let name = unsafe { CStr::from_ptr(available.extension_name.as_ptr()) };
            name == SwapchainLoader::name()
        });
        if !has_swapchain {
            return Err(VulkanError::InitializationFailed(
                "Swap chain extension not supported".to_string(),
            ));
        }

        let formats = unsafe {
            surface_loader
                .get_physical_device_surface_formats(device, surface)
                .map_err(VulkanError::Api)?
        };
        let present_modes = unsafe {
            surface_loader
                .get_physical_device_surface_present_modes(device, surface)
                .map_err(VulkanError::Api)?
        };
        if formats.is_empty() || present_modes.is_empty() {
            return Err(VulkanError::InitializationFailed(
                "Surface has no formats or present modes".to_string(),
            ));
        }

        Ok(Self {
            device,
            properties,
            graphics_family,
            present_family,
        })
    }
}

/// Logical device with its queues and swap chain loader
pub struct LogicalDevice {
    /// Logical device
    pub device: Device,
    /// Graphics queue
    pub graphics_queue: vk::Queue,
    /// Present queue (may equal the graphics queue)
    pub present_queue: vk::Queue,
    /// `VK_KHR_swapchain` function table
    pub swapchain_loader: SwapchainLoader,
}

impl LogicalDevice {
    /// Create the device with one queue per distinct family
    pub fn new(instance: &Instance, physical_device: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let unique_families: HashSet<u32> = [
            physical_device.graphics_family,
            physical_device.present_family,
        ]
        .into_iter()
        .collect();

        let priorities = [1.0];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let required_extensions = [SwapchainLoader::name().as_ptr()];
        let device_features = vk::PhysicalDeviceFeatures::builder().build();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions)
            .enabled_features(&device_features);

        let device = unsafe {
            instance
                .create_device(physical_device.device, &create_info, None)
                .map_err(VulkanError::Api)?
        };

        let graphics_queue = unsafe { device.get_device_queue(physical_device.graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(physical_device.present_family, 0) };
        let swapchain_loader = SwapchainLoader::new(instance, &device);

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            swapchain_loader,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// Device provider: owns everything from the instance down to the command pool
///
/// Fields drop in declaration order after [`Drop::drop`] released the command
/// pool and the surface, so the logical device goes before the instance.
pub struct VulkanContext {
    command_pool: vk::CommandPool,
    device: LogicalDevice,
    physical_device: PhysicalDeviceInfo,
    surface: vk::SurfaceKHR,
    surface_loader: Surface,
    instance: VulkanInstance,
}

impl VulkanContext {
    /// Create the full device stack for `window`
    pub fn new(window: &Window, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let instance = VulkanInstance::new(window, app_name, enable_validation)?;

        let surface_loader = Surface::new(&instance.entry, &instance.instance);
        let surface = window
            .create_surface(instance.instance.handle())
            .map_err(|e| VulkanError::InitializationFailed(format!("Surface creation: {e}")))?;

        let physical_device = match PhysicalDeviceInfo::select_suitable_device(
            &instance.instance,
            surface,
            &surface_loader,
        ) {
            Ok(info) => info,
            Err(e) => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(e);
            }
        };

        let device = match LogicalDevice::new(&instance.instance, &physical_device) {
            Ok(device) => device,
            Err(e) => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(e);
            }
        };

        let pool_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(physical_device.graphics_family)
            .flags(
                vk::CommandPoolCreateFlags::TRANSIENT
                    | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            );
        let command_pool = match unsafe { device.device.create_command_pool(&pool_info, None) } {
            Ok(pool) => pool,
            Err(e) => {
                drop(device);
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(VulkanError::Api(e));
            }
        };

        Ok(Self {
            command_pool,
            device,
            physical_device,
            surface,
            surface_loader,
            instance,
        })
    }

    /// Logical device
    pub fn device(&self) -> &Device {
        &self.device.device
    }

    /// Clone of the logical device handle table, for RAII wrappers
    pub fn raw_device(&self) -> Device {
        self.device.device.clone()
    }

    /// Vulkan instance
    pub fn instance(&self) -> &Instance {
        &self.instance.instance
    }

    /// Selected physical device
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Graphics queue
    pub fn graphics_queue(&self) -> vk::Queue {
        self.device.graphics_queue
    }

    /// Command pool for graphics command buffers
    pub fn command_pool(&self) -> vk::CommandPool {
        self.command_pool
    }

    /// Index of a memory type allowed by `type_filter` with all of `properties`
    pub fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<u32> {
        let memory_properties = unsafe {
            self.instance
                .instance
                .get_physical_device_memory_properties(self.physical_device.device)
        };

        (0..memory_properties.memory_type_count)
            .find(|&i| {
                type_filter & (1 << i) != 0
                    && memory_properties.memory_types[i as usize]
                        .property_flags
                        .contains(properties)
            })
            .ok_or(VulkanError::NoSuitableMemoryType)
    }

    /// First of `candidates` supporting `features` with the given tiling
    pub fn find_supported_format(
        &self,
        candidates: &[vk::Format],
        tiling: vk::ImageTiling,
        features: vk::FormatFeatureFlags,
    ) -> Option<vk::Format> {
        candidates.iter().copied().find(|&format| {
            let props = unsafe {
                self.instance
                    .instance
                    .get_physical_device_format_properties(self.physical_device.device, format)
            };
            match tiling {
                vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
                vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
                _ => false,
            }
        })
    }

    /// Create a buffer and bind freshly allocated memory to it
    pub fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<(vk::Buffer, vk::DeviceMemory)> {
        let device = &self.device.device;
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device
                .create_buffer(&buffer_info, None)
                .map_err(VulkanError::Api)?
        };

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory = self
            .find_memory_type(requirements.memory_type_bits, properties)
            .and_then(|memory_type_index| {
                let alloc_info = vk::MemoryAllocateInfo::builder()
                    .allocation_size(requirements.size)
                    .memory_type_index(memory_type_index);
                unsafe {
                    device
                        .allocate_memory(&alloc_info, None)
                        .map_err(VulkanError::Api)
                }
            });
        let memory = match memory {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        if let Err(e) = unsafe { device.bind_buffer_memory(buffer, memory, 0) } {
            unsafe {
                device.destroy_buffer(buffer, None);
                device.free_memory(memory, None);
            }
            return Err(VulkanError::Api(e));
        }

        Ok((buffer, memory))
    }

    /// Allocate and begin a one-shot command buffer
    pub fn begin_single_time_commands(&self) -> VulkanResult<vk::CommandBuffer> {
        let device = &self.device.device;
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_pool(self.command_pool)
            .command_buffer_count(1);

        let command_buffer = unsafe {
            device
                .allocate_command_buffers(&alloc_info)
                .map_err(VulkanError::Api)?[0]
        };

        let begin_info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        if let Err(e) = unsafe { device.begin_command_buffer(command_buffer, &begin_info) } {
            unsafe { device.free_command_buffers(self.command_pool, &[command_buffer]) };
            return Err(VulkanError::Api(e));
        }

        Ok(command_buffer)
    }

    /// End, submit and wait for a one-shot command buffer, then free it
    pub fn end_single_time_commands(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        let device = &self.device.device;
        let command_buffers = [command_buffer];

        let result = unsafe {
            device.end_command_buffer(command_buffer).and_then(|()| {
                let submit_info = vk::SubmitInfo::builder()
                    .command_buffers(&command_buffers)
                    .build();
                device.queue_submit(self.device.graphics_queue, &[submit_info], vk::Fence::null())?;
                device.queue_wait_idle(self.device.graphics_queue)
            })
        };

        unsafe { device.free_command_buffers(self.command_pool, &command_buffers) };
        result.map_err(VulkanError::Api)
    }

    /// Copy `size` bytes from `src` to `dst` and wait for completion
    pub fn copy_buffer(
        &self,
        src: vk::Buffer,
        dst: vk::Buffer,
        size: vk::DeviceSize,
    ) -> VulkanResult<()> {
        let command_buffer = self.begin_single_time_commands()?;

        let region = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size,
        };
        unsafe {
            self.device
                .device
                .cmd_copy_buffer(command_buffer, src, dst, &[region]);
        }

        self.end_single_time_commands(command_buffer)
    }

    fn allocate_image_memory(
        &self,
        image: vk::Image,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<vk::DeviceMemory> {
        let device = &self.device.device;
        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory_type_index = self.find_memory_type(requirements.memory_type_bits, properties)?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        let memory = unsafe {
            device
                .allocate_memory(&alloc_info, None)
                .map_err(VulkanError::Api)?
        };

        if let Err(e) = unsafe { device.bind_image_memory(image, memory, 0) } {
            unsafe { device.free_memory(memory, None) };
            return Err(VulkanError::Api(e));
        }
        Ok(memory)
    }

    fn create_view(
        &self,
        image: vk::Image,
        format: vk::Format,
        aspect_mask: vk::ImageAspectFlags,
    ) -> VulkanResult<vk::ImageView> {
        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe {
            self.device
                .device
                .create_image_view(&view_info, None)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device.device_wait_idle();
            self.device
                .device
                .destroy_command_pool(self.command_pool, None);
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

impl RenderDevice for VulkanContext {
    fn surface_support(&self) -> VulkanResult<SurfaceSupport> {
        let physical_device = self.physical_device.device;
        unsafe {
            Ok(SurfaceSupport {
                capabilities: self
                    .surface_loader
                    .get_physical_device_surface_capabilities(physical_device, self.surface)
                    .map_err(VulkanError::Api)?,
                formats: self
                    .surface_loader
                    .get_physical_device_surface_formats(physical_device, self.surface)
                    .map_err(VulkanError::Api)?,
                present_modes: self
                    .surface_loader
                    .get_physical_device_surface_present_modes(physical_device, self.surface)
                    .map_err(VulkanError::Api)?,
            })
        }
    }

    fn find_depth_format(&self) -> VulkanResult<vk::Format> {
        self.find_supported_format(
            &DEPTH_FORMAT_CANDIDATES,
            vk::ImageTiling::OPTIMAL,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
        )
        .ok_or(VulkanError::NoDepthFormat)
    }

    fn create_swapchain(
        &self,
        desc: &SwapchainDesc,
        old_swapchain: vk::SwapchainKHR,
    ) -> VulkanResult<vk::SwapchainKHR> {
        let queue_family_indices = [
            self.physical_device.graphics_family,
            self.physical_device.present_family,
        ];

        let mut create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(self.surface)
            .min_image_count(desc.min_image_count)
            .image_format(desc.format.format)
            .image_color_space(desc.format.color_space)
            .image_extent(desc.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(desc.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(desc.present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        create_info = if queue_family_indices[0] == queue_family_indices[1] {
            create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        } else {
            create_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&queue_family_indices)
        };

        unsafe {
            self.device
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VulkanResult<Vec<vk::Image>> {
        unsafe {
            self.device
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(VulkanError::Api)
        }
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        unsafe {
            self.device
                .swapchain_loader
                .destroy_swapchain(swapchain, None);
        }
    }

    fn create_color_view(&self, image: vk::Image, format: vk::Format) -> VulkanResult<vk::ImageView> {
        self.create_view(image, format, vk::ImageAspectFlags::COLOR)
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe { self.device.device.destroy_image_view(view, None) };
    }

    fn create_depth_attachment(
        &self,
        extent: vk::Extent2D,
        format: vk::Format,
    ) -> VulkanResult<DepthAttachment> {
        let device = &self.device.device;
        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe {
            device
                .create_image(&image_info, None)
                .map_err(VulkanError::Api)?
        };

        let memory = match self.allocate_image_memory(image, vk::MemoryPropertyFlags::DEVICE_LOCAL) {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_image(image, None) };
                return Err(e);
            }
        };

        let view = match self.create_view(image, format, vk::ImageAspectFlags::DEPTH) {
            Ok(view) => view,
            Err(e) => {
                unsafe {
                    device.destroy_image(image, None);
                    device.free_memory(memory, None);
                }
                return Err(e);
            }
        };

        Ok(DepthAttachment {
            image,
            memory,
            view,
        })
    }

    fn destroy_depth_attachment(&self, attachment: &DepthAttachment) {
        unsafe {
            self.device.device.destroy_image_view(attachment.view, None);
            self.device.device.destroy_image(attachment.image, None);
            self.device.device.free_memory(attachment.memory, None);
        }
    }

    fn create_render_pass(
        &self,
        color_format: vk::Format,
        depth_format: vk::Format,
    ) -> VulkanResult<vk::RenderPass> {
        let color_attachment = vk::AttachmentDescription::builder()
            .format(color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
            .build();

        let depth_attachment = vk::AttachmentDescription::builder()
            .format(depth_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
            .build();

        let attachments = [color_attachment, depth_attachment];

        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };

        let subpasses = [vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)
            .depth_stencil_attachment(&depth_ref)
            .build()];

        let stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
        let dependencies = [vk::SubpassDependency::builder()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stages)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(stages)
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )
            .build()];

        let create_info = vk::RenderPassCreateInfo::builder()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        unsafe {
            self.device
                .device
                .create_render_pass(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        unsafe { self.device.device.destroy_render_pass(render_pass, None) };
    }

    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<vk::Framebuffer> {
        let create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        unsafe {
            self.device
                .device
                .create_framebuffer(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        unsafe { self.device.device.destroy_framebuffer(framebuffer, None) };
    }

    fn create_semaphore(&self) -> VulkanResult<vk::Semaphore> {
        let create_info = vk::SemaphoreCreateInfo::builder();
        unsafe {
            self.device
                .device
                .create_semaphore(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        unsafe { self.device.device.destroy_semaphore(semaphore, None) };
    }

    fn create_fence(&self, signaled: bool) -> VulkanResult<vk::Fence> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::builder().flags(flags);
        unsafe {
            self.device
                .device
                .create_fence(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        unsafe { self.device.device.destroy_fence(fence, None) };
    }

    fn wait_for_fence(&self, fence: vk::Fence, timeout: u64) -> VulkanResult<()> {
        unsafe {
            self.device
                .device
                .wait_for_fences(&[fence], true, timeout)
                .map_err(VulkanError::Api)
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> VulkanResult<()> {
        unsafe {
            self.device
                .device
                .reset_fences(&[fence])
                .map_err(VulkanError::Api)
        }
    }

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout: u64,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        unsafe {
            self.device.swapchain_loader.acquire_next_image(
                swapchain,
                timeout,
                semaphore,
                vk::Fence::null(),
            )
        }
    }

    fn queue_submit(&self, submission: &FrameSubmission) -> VulkanResult<()> {
        let wait_semaphores = [submission.wait_semaphore];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [submission.command_buffer];
        let signal_semaphores = [submission.signal_semaphore];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            self.device
                .device
                .queue_submit(self.device.graphics_queue, &[submit_info], submission.fence)
                .map_err(VulkanError::Api)
        }
    }

    fn queue_present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> VkResult<bool> {
        let wait_semaphores = [wait_semaphore];
        let swapchains = [swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            self.device
                .swapchain_loader
                .queue_present(self.device.present_queue, &present_info)
        }
    }

    fn wait_idle(&self) -> VulkanResult<()> {
        unsafe {
            self.device
                .device
                .device_wait_idle()
                .map_err(VulkanError::Api)
        }
    }

    fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_pool(self.command_pool)
            .command_buffer_count(count);

        unsafe {
            self.device
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(VulkanError::Api)
        }
    }

    fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
        if command_buffers.is_empty() {
            return;
        }
        unsafe {
            self.device
                .device
                .free_command_buffers(self.command_pool, command_buffers);
        }
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        let begin_info = vk::CommandBufferBeginInfo::builder();
        unsafe {
            self.device
                .device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)
        }
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        unsafe {
            self.device
                .device
                .end_command_buffer(command_buffer)
                .map_err(VulkanError::Api)
        }
    }

    fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_values: &[vk::ClearValue],
    ) {
        let begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(clear_values);

        unsafe {
            self.device.device.cmd_begin_render_pass(
                command_buffer,
                &begin_info,
                vk::SubpassContents::INLINE,
            );
        }
    }

    fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: vk::Viewport) {
        unsafe {
            self.device
                .device
                .cmd_set_viewport(command_buffer, 0, &[viewport]);
        }
    }

    fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: vk::Rect2D) {
        unsafe {
            self.device
                .device
                .cmd_set_scissor(command_buffer, 0, &[scissor]);
        }
    }

    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        unsafe { self.device.device.cmd_end_render_pass(command_buffer) };
    }
}
