//! Shader modules and graphics pipeline creation
//!
//! SPIR-V shader loading and graphics pipeline management following RAII patterns.
//! Viewport and scissor are always dynamic so a pipeline survives swap chain
//! resizes; the renderer sets both at the start of every render pass.

use ash::{vk, Device};
use std::ffi::CStr;
use std::fs::File;
use std::path::Path;

use crate::core::ShaderConfig;
use crate::render::model::Vertex;

use super::{VulkanError, VulkanResult};

const ENTRY_POINT: &CStr = c"main";

/// Shader module wrapper with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create shader module from SPIR-V words
    pub fn from_words(device: Device, code: &[u32]) -> VulkanResult<Self> {
        let create_info = vk::ShaderModuleCreateInfo::builder().code(code);

        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, module })
    }

    /// Load shader from SPIR-V file
    pub fn from_file(device: Device, path: impl AsRef<Path>) -> VulkanResult<Self> {
        let code = read_spirv(path.as_ref())?;
        Self::from_words(device, &code)
    }

    /// Get shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    fn stage_info(&self, stage: vk::ShaderStageFlags) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(self.module)
            .name(ENTRY_POINT)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Read a SPIR-V binary as 32-bit words
pub fn read_spirv(path: &Path) -> VulkanResult<Vec<u32>> {
    let shader_load = |source| VulkanError::ShaderLoad {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(shader_load)?;
    let code = ash::util::read_spv(&mut file).map_err(shader_load)?;
    log::debug!("Loaded shader {} ({} words)", path.display(), code.len());
    Ok(code)
}

/// Fixed-function state for a graphics pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Primitive topology
    pub topology: vk::PrimitiveTopology,
    /// Fill, line or point rasterization
    pub polygon_mode: vk::PolygonMode,
    /// Faces to cull
    pub cull_mode: vk::CullModeFlags,
    /// Winding considered front-facing
    pub front_face: vk::FrontFace,
    /// Enable the depth test
    pub depth_test: bool,
    /// Write passing fragments' depth
    pub depth_write: bool,
    /// Depth comparison
    pub depth_compare_op: vk::CompareOp,
    /// Enable alpha blending on the color attachment
    pub blend_enable: bool,
    /// State left to be set while recording
    pub dynamic_states: Vec<vk::DynamicState>,
    /// Render pass the pipeline is used with
    pub render_pass: vk::RenderPass,
    /// Subpass index within the render pass
    pub subpass: u32,
    /// Layout describing push constants and descriptor sets
    pub pipeline_layout: vk::PipelineLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::CLOCKWISE,
            depth_test: true,
            depth_write: true,
            depth_compare_op: vk::CompareOp::LESS,
            blend_enable: false,
            dynamic_states: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
            render_pass: vk::RenderPass::null(),
            subpass: 0,
            pipeline_layout: vk::PipelineLayout::null(),
        }
    }
}

/// Graphics pipeline wrapper with RAII cleanup
///
/// The pipeline layout in [`PipelineConfig`] stays owned by the caller.
pub struct Pipeline {
    device: Device,
    pipeline: vk::Pipeline,
}

impl Pipeline {
    /// Build a pipeline from the shaders named in `shaders`
    ///
    /// # Panics
    ///
    /// If `config` has no render pass or pipeline layout.
    pub fn new(device: Device, shaders: &ShaderConfig, config: &PipelineConfig) -> VulkanResult<Self> {
        assert!(
            config.render_pass != vk::RenderPass::null(),
            "Cannot create graphics pipeline: no render pass provided in config"
        );
        assert!(
            config.pipeline_layout != vk::PipelineLayout::null(),
            "Cannot create graphics pipeline: no pipeline layout provided in config"
        );

        let vertex_shader = ShaderModule::from_file(device.clone(), &shaders.vertex_shader_path)?;
        let fragment_shader =
            ShaderModule::from_file(device.clone(), &shaders.fragment_shader_path)?;

        let shader_stages = [
            vertex_shader.stage_info(vk::ShaderStageFlags::VERTEX),
            fragment_shader.stage_info(vk::ShaderStageFlags::FRAGMENT),
        ];

        let binding_descriptions = Vertex::binding_descriptions();
        let attribute_descriptions = Vertex::attribute_descriptions();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&binding_descriptions)
            .vertex_attribute_descriptions(&attribute_descriptions);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(config.topology)
            .primitive_restart_enable(false);

        // Counts only; the actual rectangles are dynamic.
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(config.polygon_mode)
            .line_width(1.0)
            .cull_mode(config.cull_mode)
            .front_face(config.front_face)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(config.depth_test)
            .depth_write_enable(config.depth_write)
            .depth_compare_op(config.depth_compare_op)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(config.blend_enable)
            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
            .alpha_blend_op(vk::BlendOp::ADD)
            .build()];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&config.dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(config.pipeline_layout)
            .render_pass(config.render_pass)
            .subpass(config.subpass);

        let pipelines = unsafe {
            device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info.build()], None)
                .map_err(|(_, err)| VulkanError::Api(err))?
        };
        let pipeline = pipelines
            .first()
            .copied()
            .ok_or_else(|| VulkanError::InitializationFailed("No pipeline returned".to_string()))?;

        log::debug!("Graphics pipeline created");

        Ok(Self { device, pipeline })
    }

    /// Bind for graphics work on `command_buffer`
    pub fn bind(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline,
            );
        }
    }

    /// Get pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
        }
    }
}
