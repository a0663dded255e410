//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics. Matrices are column-major
//! as in GLSL, so they can be copied into push constants unchanged.

pub use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Column-major array layout of a 4x4 matrix, as GLSL expects it
pub fn to_cols_array_2d(m: &Mat4) -> [[f32; 4]; 4] {
    (*m).into()
}

/// Embed a 3x3 matrix in the upper-left of an identity 4x4 matrix
pub fn mat3_to_mat4(m: &Mat3) -> Mat4 {
    m.to_homogeneous()
}
