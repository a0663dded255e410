//! Forward rendering of game objects with push constants
//!
//! Each object gets its clip-space transform and normal matrix pushed before
//! its draw call. There are no descriptor sets.

use ash::{vk, Device};
use std::mem;

use crate::core::ShaderConfig;
use crate::foundation::math::{mat3_to_mat4, to_cols_array_2d, Mat4};
use crate::scene::{GameObject, TransformComponent};

use super::camera::Camera;
use super::vulkan::{Pipeline, PipelineConfig, VulkanError, VulkanResult};

/// Stages that read the push constant block
pub const PUSH_CONSTANT_STAGES: vk::ShaderStageFlags = vk::ShaderStageFlags::from_raw(
    vk::ShaderStageFlags::VERTEX.as_raw() | vk::ShaderStageFlags::FRAGMENT.as_raw(),
);

/// Per-object data matching the shaders' push constant block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimplePushConstantData {
    /// `projection * view * model`
    pub transform: [[f32; 4]; 4],
    /// Inverse transpose of the model's linear part, padded to a mat4
    pub normal_matrix: [[f32; 4]; 4],
}

impl SimplePushConstantData {
    /// Push constants for an object seen through `projection_view`
    pub fn new(projection_view: &Mat4, transform: &TransformComponent) -> Self {
        Self {
            transform: to_cols_array_2d(&(projection_view * transform.mat4())),
            normal_matrix: to_cols_array_2d(&mat3_to_mat4(&transform.normal_matrix())),
        }
    }

    /// Size of the block in bytes
    pub const SIZE: u32 = mem::size_of::<Self>() as u32;

    /// Range covering the whole block for the stages that read it
    pub fn range() -> vk::PushConstantRange {
        vk::PushConstantRange {
            stage_flags: PUSH_CONSTANT_STAGES,
            offset: 0,
            size: Self::SIZE,
        }
    }
}

/// Draws game objects with a single pipeline
pub struct SimpleRenderSystem {
    device: Device,
    pipeline: Pipeline,
    pipeline_layout: vk::PipelineLayout,
}

impl SimpleRenderSystem {
    /// Create the pipeline layout and pipeline for `render_pass`
    pub fn new(device: Device, render_pass: vk::RenderPass, shaders: &ShaderConfig) -> VulkanResult<Self> {
        let push_constant_ranges = [SimplePushConstantData::range()];
        let layout_info = vk::PipelineLayoutCreateInfo::builder()
            .push_constant_ranges(&push_constant_ranges);
        let pipeline_layout = unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        let config = PipelineConfig {
            render_pass,
            pipeline_layout,
            ..PipelineConfig::default()
        };
        let pipeline = match Pipeline::new(device.clone(), shaders, &config) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                unsafe { device.destroy_pipeline_layout(pipeline_layout, None) };
                return Err(e);
            }
        };

        log::debug!("Simple render system ready");

        Ok(Self {
            device,
            pipeline,
            pipeline_layout,
        })
    }

    /// Record draws for every object that has a model
    pub fn render_game_objects<'a>(
        &self,
        command_buffer: vk::CommandBuffer,
        camera: &Camera,
        objects: impl IntoIterator<Item = &'a GameObject>,
    ) {
        self.pipeline.bind(command_buffer);

        let projection_view = camera.projection_view();
        for object in objects {
            let Some(model) = &object.model else {
                continue;
            };

            let push = SimplePushConstantData::new(&projection_view, &object.transform);
            unsafe {
                self.device.cmd_push_constants(
                    command_buffer,
                    self.pipeline_layout,
                    PUSH_CONSTANT_STAGES,
                    0,
                    bytemuck::bytes_of(&push),
                );
            }
            model.bind(command_buffer);
            model.draw(command_buffer);
        }
    }

    /// Layout holding the push constant range
    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }
}

impl Drop for SimpleRenderSystem {
    fn drop(&mut self) {
        // The pipeline field is dropped after this body runs; a layout may be
        // destroyed while pipelines created from it still exist.
        unsafe {
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_push_constant_block_is_two_mat4() {
        assert_eq!(SimplePushConstantData::SIZE, 128);

        let range = SimplePushConstantData::range();
        assert_eq!(range.offset, 0);
        assert_eq!(range.size, 128);
        assert!(range.stage_flags.contains(vk::ShaderStageFlags::VERTEX));
        assert!(range.stage_flags.contains(vk::ShaderStageFlags::FRAGMENT));
    }

    #[test]
    fn test_push_constants_are_column_major() {
        let transform = TransformComponent {
            translation: Vec3::new(1.0, 2.0, 3.0),
            ..TransformComponent::default()
        };

        let push = SimplePushConstantData::new(&Mat4::identity(), &transform);

        assert_eq!(push.transform[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(push.normal_matrix[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_transform_includes_projection_view() {
        let transform = TransformComponent {
            scale: Vec3::new(2.0, 2.0, 2.0),
            ..TransformComponent::default()
        };
        let projection_view = Mat4::new_translation(&Vec3::new(0.0, 0.0, 5.0));

        let push = SimplePushConstantData::new(&projection_view, &transform);

        assert_relative_eq!(push.transform[0][0], 2.0);
        assert_relative_eq!(push.transform[3][2], 5.0);
        assert_relative_eq!(push.normal_matrix[0][0], 0.5);
    }
}
