//! Vertex format, CPU-side model data and GPU models
//!
//! [`ModelData`] is plain data: it can be loaded from an OBJ file or built
//! in code (see [`ModelData::colored_cube`]). [`Model`] uploads it into
//! device-local buffers through a staging copy.

use ash::{vk, Device};
use bytemuck::{Pod, Zeroable};
use nalgebra::Vector3;
use std::collections::HashMap;
use std::mem::{offset_of, size_of};
use std::path::Path;
use thiserror::Error;

use super::vulkan::{Buffer, VulkanContext, VulkanError};

/// Model loading and upload errors
#[derive(Error, Debug)]
pub enum ModelError {
    /// The OBJ file could not be read or parsed
    #[error("Failed to load model {path}: {source}")]
    Load {
        /// File that failed to load
        path: String,
        /// Parser error
        source: tobj::LoadError,
    },

    /// A drawable model needs at least one triangle
    #[error("Model needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// GPU buffer creation or upload failed
    #[error(transparent)]
    Vulkan(#[from] VulkanError),
}

/// Interleaved vertex as laid out in the vertex buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Linear RGB color
    pub color: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
}

impl Vertex {
    /// Create a vertex with only position and color set
    pub const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self {
            position,
            color,
            normal: [0.0; 3],
            uv: [0.0; 2],
        }
    }

    /// Single interleaved binding at index 0
    #[allow(clippy::cast_possible_truncation)]
    pub const fn binding_descriptions() -> [vk::VertexInputBindingDescription; 1] {
        [vk::VertexInputBindingDescription {
            binding: 0,
            stride: size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }]
    }

    /// Position, color, normal and uv at locations 0 to 3
    #[allow(clippy::cast_possible_truncation)]
    pub const fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 4] {
        [
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Self, position) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Self, color) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 2,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Self, normal) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 3,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: offset_of!(Self, uv) as u32,
            },
        ]
    }

    /// Bit pattern used to detect identical vertices
    fn key(&self) -> [u32; 11] {
        let mut key = [0; 11];
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(self));
        for (slot, value) in key.iter_mut().zip(floats) {
            *slot = value.to_bits();
        }
        key
    }
}

/// Vertices and optional indices ready for upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelData {
    /// Unique vertices
    pub vertices: Vec<Vertex>,
    /// Triangle list indices into `vertices`; empty for non-indexed drawing
    pub indices: Vec<u32>,
}

impl ModelData {
    /// Load and triangulate an OBJ file, merging identical vertices
    ///
    /// Vertices without a color in the file are white.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let (models, _materials) =
            tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).map_err(|source| ModelError::Load {
                path: path.display().to_string(),
                source,
            })?;

        let mut data = Self::default();
        let mut unique: HashMap<[u32; 11], u32> = HashMap::new();

        for model in &models {
            let mesh = &model.mesh;
            for &index in &mesh.indices {
                let i = index as usize;
                let vertex = Vertex {
                    position: read3(&mesh.positions, i).unwrap_or_default(),
                    color: read3(&mesh.vertex_color, i).unwrap_or([1.0, 1.0, 1.0]),
                    normal: read3(&mesh.normals, i).unwrap_or_default(),
                    uv: read2(&mesh.texcoords, i).unwrap_or_default(),
                };
                data.push_unique(vertex, &mut unique);
            }
        }

        log::debug!(
            "Loaded {}: {} vertices, {} indices",
            path.display(),
            data.vertices.len(),
            data.indices.len()
        );
        Ok(data)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn push_unique(&mut self, vertex: Vertex, unique: &mut HashMap<[u32; 11], u32>) {
        let next = self.vertices.len() as u32;
        let index = *unique.entry(vertex.key()).or_insert_with(|| {
            self.vertices.push(vertex);
            next
        });
        self.indices.push(index);
    }

    /// Unit cube with one flat color per face, shifted by `offset`
    ///
    /// Non-indexed: 6 faces of 2 triangles each.
    pub fn colored_cube(offset: Vector3<f32>) -> Self {
        const FACES: [([f32; 3], [f32; 3], [[f32; 3]; 6]); 6] = [
            // left
            (
                [0.9, 0.9, 0.9],
                [-1.0, 0.0, 0.0],
                [
                    [-0.5, -0.5, -0.5],
                    [-0.5, 0.5, 0.5],
                    [-0.5, -0.5, 0.5],
                    [-0.5, -0.5, -0.5],
                    [-0.5, 0.5, -0.5],
                    [-0.5, 0.5, 0.5],
                ],
            ),
            // right
            (
                [0.8, 0.8, 0.1],
                [1.0, 0.0, 0.0],
                [
                    [0.5, -0.5, -0.5],
                    [0.5, 0.5, 0.5],
                    [0.5, -0.5, 0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, 0.5, -0.5],
                    [0.5, 0.5, 0.5],
                ],
            ),
            // top (y points down)
            (
                [0.9, 0.6, 0.1],
                [0.0, -1.0, 0.0],
                [
                    [-0.5, -0.5, -0.5],
                    [0.5, -0.5, 0.5],
                    [-0.5, -0.5, 0.5],
                    [-0.5, -0.5, -0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, -0.5, 0.5],
                ],
            ),
            // bottom
            (
                [0.8, 0.1, 0.1],
                [0.0, 1.0, 0.0],
                [
                    [-0.5, 0.5, -0.5],
                    [0.5, 0.5, 0.5],
                    [-0.5, 0.5, 0.5],
                    [-0.5, 0.5, -0.5],
                    [0.5, 0.5, -0.5],
                    [0.5, 0.5, 0.5],
                ],
            ),
            // nose
            (
                [0.1, 0.1, 0.8],
                [0.0, 0.0, 1.0],
                [
                    [-0.5, -0.5, 0.5],
                    [0.5, 0.5, 0.5],
                    [-0.5, 0.5, 0.5],
                    [-0.5, -0.5, 0.5],
                    [0.5, -0.5, 0.5],
                    [0.5, 0.5, 0.5],
                ],
            ),
            // tail
            (
                [0.1, 0.8, 0.1],
                [0.0, 0.0, -1.0],
                [
                    [-0.5, -0.5, -0.5],
                    [0.5, 0.5, -0.5],
                    [-0.5, 0.5, -0.5],
                    [-0.5, -0.5, -0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, 0.5, -0.5],
                ],
            ),
        ];

        let vertices = FACES
            .iter()
            .flat_map(|(color, normal, corners)| {
                corners.iter().map(move |corner| Vertex {
                    position: [
                        corner[0] + offset.x,
                        corner[1] + offset.y,
                        corner[2] + offset.z,
                    ],
                    color: *color,
                    normal: *normal,
                    uv: [0.0; 2],
                })
            })
            .collect();

        Self {
            vertices,
            indices: Vec::new(),
        }
    }
}

fn read3(values: &[f32], index: usize) -> Option<[f32; 3]> {
    values
        .get(3 * index..3 * index + 3)
        .map(|v| [v[0], v[1], v[2]])
}

fn read2(values: &[f32], index: usize) -> Option<[f32; 2]> {
    values.get(2 * index..2 * index + 2).map(|v| [v[0], v[1]])
}

/// Model living in device-local vertex (and optionally index) buffers
pub struct Model {
    device: Device,
    vertex_buffer: Buffer,
    vertex_count: u32,
    index_buffer: Option<Buffer>,
    index_count: u32,
}

impl Model {
    /// Upload `data` to the GPU
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(context: &VulkanContext, data: &ModelData) -> Result<Self, ModelError> {
        if data.vertices.len() < 3 {
            return Err(ModelError::TooFewVertices(data.vertices.len()));
        }

        let vertex_buffer = upload(
            context,
            &data.vertices,
            vk::BufferUsageFlags::VERTEX_BUFFER,
        )?;
        let index_buffer = if data.indices.is_empty() {
            None
        } else {
            Some(upload(
                context,
                &data.indices,
                vk::BufferUsageFlags::INDEX_BUFFER,
            )?)
        };

        Ok(Self {
            device: context.raw_device(),
            vertex_buffer,
            vertex_count: data.vertices.len() as u32,
            index_buffer,
            index_count: data.indices.len() as u32,
        })
    }

    /// Load an OBJ file and upload it
    pub fn from_file(context: &VulkanContext, path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let data = ModelData::load_obj(path)?;
        Self::new(context, &data)
    }

    /// Bind the vertex buffer and, when present, the index buffer
    pub fn bind(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device.cmd_bind_vertex_buffers(
                command_buffer,
                0,
                &[self.vertex_buffer.handle()],
                &[0],
            );
            if let Some(index_buffer) = &self.index_buffer {
                self.device.cmd_bind_index_buffer(
                    command_buffer,
                    index_buffer.handle(),
                    0,
                    vk::IndexType::UINT32,
                );
            }
        }
    }

    /// Draw the whole model, indexed when it has indices
    pub fn draw(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            if self.index_buffer.is_some() {
                self.device
                    .cmd_draw_indexed(command_buffer, self.index_count, 1, 0, 0, 0);
            } else {
                self.device.cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
            }
        }
    }

    /// Number of vertices in the vertex buffer
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// Copy `items` into a new device-local buffer through a staging buffer
#[allow(clippy::cast_possible_truncation)]
fn upload<T: Pod>(
    context: &VulkanContext,
    items: &[T],
    usage: vk::BufferUsageFlags,
) -> Result<Buffer, ModelError> {
    let instance_size = size_of::<T>() as vk::DeviceSize;
    let count = items.len() as u32;

    let mut staging = Buffer::new(
        context,
        instance_size,
        count,
        vk::BufferUsageFlags::TRANSFER_SRC,
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        0,
    )?;
    staging.write_mapped(items)?;

    let buffer = Buffer::new(
        context,
        instance_size,
        count,
        usage | vk::BufferUsageFlags::TRANSFER_DST,
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
        0,
    )?;
    context.copy_buffer(staging.handle(), buffer.handle(), staging.size())?;

    Ok(buffer)
}
