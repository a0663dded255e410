//! Game objects and their transforms

use std::fmt;
use std::rc::Rc;

use crate::foundation::math::{Mat3, Mat4, Vec3, Vec4};
use crate::render::Model;

/// Translation, scale and Tait-Bryan rotation of an object
///
/// Rotation angles are radians about X, Y and Z and are applied in Y, X, Z
/// order (yaw, then pitch, then roll in the object's frame).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponent {
    /// Position in world space
    pub translation: Vec3,
    /// Per-axis scale
    pub scale: Vec3,
    /// Rotation angles in radians
    pub rotation: Vec3,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotation: Vec3::zeros(),
        }
    }
}

impl TransformComponent {
    /// Identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Columns of the rotation `Ry * Rx * Rz`
    fn rotation_columns(&self) -> [Vec3; 3] {
        let (s3, c3) = self.rotation.z.sin_cos();
        let (s2, c2) = self.rotation.x.sin_cos();
        let (s1, c1) = self.rotation.y.sin_cos();

        [
            Vec3::new(c1 * c3 + s1 * s2 * s3, c2 * s3, c1 * s2 * s3 - c3 * s1),
            Vec3::new(c3 * s1 * s2 - c1 * s3, c2 * c3, c1 * c3 * s2 + s1 * s3),
            Vec3::new(c2 * s1, -s2, c1 * c2),
        ]
    }

    /// Model matrix: `translate * Ry * Rx * Rz * scale`
    pub fn mat4(&self) -> Mat4 {
        let [x, y, z] = self.rotation_columns();
        let t = self.translation;

        Mat4::from_columns(&[
            (x * self.scale.x).push(0.0),
            (y * self.scale.y).push(0.0),
            (z * self.scale.z).push(0.0),
            Vec4::new(t.x, t.y, t.z, 1.0),
        ])
    }

    /// Inverse transpose of the model matrix's linear part
    ///
    /// Rotation is orthonormal, so this is the rotation with each column
    /// divided by the matching scale factor instead of multiplied.
    pub fn normal_matrix(&self) -> Mat3 {
        let [x, y, z] = self.rotation_columns();
        let inv_scale = self.scale.map(|s| 1.0 / s);

        Mat3::from_columns(&[x * inv_scale.x, y * inv_scale.y, z * inv_scale.z])
    }
}

/// Identifier of a game object, unique within the world that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameObjectId(pub(crate) u32);

impl fmt::Display for GameObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something placed in the scene
pub struct GameObject {
    id: GameObjectId,
    /// Mesh to draw; objects without one (cameras, viewers) are not rendered
    pub model: Option<Rc<Model>>,
    /// Flat color
    pub color: Vec3,
    /// Placement in the world
    pub transform: TransformComponent,
}

impl GameObject {
    /// Create an empty object with `id`
    ///
    /// Outside the crate objects are only created through
    /// [`World`](super::World), which keeps ids unique.
    pub(crate) fn new(id: GameObjectId) -> Self {
        Self {
            id,
            model: None,
            color: Vec3::zeros(),
            transform: TransformComponent::default(),
        }
    }

    /// Object id
    pub fn id(&self) -> GameObjectId {
        self.id
    }
}

impl fmt::Debug for GameObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameObject")
            .field("id", &self.id)
            .field("has_model", &self.model.is_some())
            .field("color", &self.color)
            .field("transform", &self.transform)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Translation3, Vector3};
    use std::f32::consts::PI;

    const EPSILON: f32 = 1e-5;

    fn reference_model(transform: &TransformComponent) -> Mat4 {
        let r = Rotation3::from_axis_angle(&Vector3::y_axis(), transform.rotation.y)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), transform.rotation.x)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), transform.rotation.z);
        let t = Translation3::from(transform.translation);

        t.to_homogeneous()
            * r.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&transform.scale)
    }

    fn sample() -> TransformComponent {
        TransformComponent {
            translation: Vec3::new(1.0, -2.0, 3.5),
            scale: Vec3::new(0.5, 2.0, 1.5),
            rotation: Vec3::new(0.3, -1.1, 0.25 * PI),
        }
    }

    #[test]
    fn test_identity_transform() {
        let transform = TransformComponent::identity();

        assert_relative_eq!(transform.mat4(), Mat4::identity(), epsilon = EPSILON);
        assert_relative_eq!(transform.normal_matrix(), Mat3::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_mat4_matches_yxz_composition() {
        let transform = sample();

        assert_relative_eq!(transform.mat4(), reference_model(&transform), epsilon = EPSILON);
    }

    #[test]
    fn test_normal_matrix_is_inverse_transpose() {
        let transform = sample();
        let linear = transform.mat4().fixed_view::<3, 3>(0, 0).into_owned();
        let expected = linear.try_inverse().unwrap().transpose();

        assert_relative_eq!(transform.normal_matrix(), expected, epsilon = EPSILON);
    }

    #[test]
    fn test_translation_lands_in_last_column() {
        let transform = TransformComponent {
            translation: Vec3::new(4.0, 5.0, 6.0),
            ..TransformComponent::default()
        };
        let m = transform.mat4();

        assert_relative_eq!(m[(0, 3)], 4.0);
        assert_relative_eq!(m[(1, 3)], 5.0);
        assert_relative_eq!(m[(2, 3)], 6.0);
    }

    #[test]
    fn test_new_object_is_empty() {
        let object = GameObject::new(GameObjectId(7));

        assert_eq!(object.id(), GameObjectId(7));
        assert!(object.model.is_none());
        assert_eq!(object.transform, TransformComponent::default());
        assert_eq!(object.id().to_string(), "#7");
    }
}
