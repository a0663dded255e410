//! Camera projection and view matrices
//!
//! Conventions follow Vulkan clip space: X right, Y down, depth in `0..=1`.
//! The default up vector is therefore `(0, -1, 0)`.

use crate::foundation::math::{Mat4, Vec3};

/// Up vector matching Vulkan's downward Y axis
pub const DEFAULT_UP: Vec3 = Vec3::new(0.0, -1.0, 0.0);

/// Projection and view matrices
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Mat4::identity(),
            view: Mat4::identity(),
        }
    }
}

impl Camera {
    /// Create a camera with identity matrices
    pub fn new() -> Self {
        Self::default()
    }

    /// Orthographic projection of the given view box
    pub fn set_orthographic_projection(
        &mut self,
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) {
        let mut p = Mat4::identity();
        p[(0, 0)] = 2.0 / (right - left);
        p[(1, 1)] = 2.0 / (bottom - top);
        p[(2, 2)] = 1.0 / (far - near);
        p[(0, 3)] = -(right + left) / (right - left);
        p[(1, 3)] = -(bottom + top) / (bottom - top);
        p[(2, 3)] = -near / (far - near);
        self.projection = p;
    }

    /// Perspective projection with vertical field of view `fovy` in radians
    ///
    /// # Panics
    ///
    /// If `aspect` is zero or the field of view is degenerate.
    pub fn set_perspective_projection(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) {
        assert!(aspect.abs() > f32::EPSILON, "aspect ratio must be non-zero");
        let tan_half_fovy = (fovy / 2.0).tan();
        assert!(tan_half_fovy.abs() > f32::EPSILON, "degenerate field of view");

        let mut p = Mat4::zeros();
        p[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        p[(1, 1)] = 1.0 / tan_half_fovy;
        p[(2, 2)] = far / (far - near);
        p[(3, 2)] = 1.0;
        p[(2, 3)] = -(far * near) / (far - near);
        self.projection = p;
    }

    /// Look from `position` along `direction`
    pub fn set_view_direction(&mut self, position: Vec3, direction: Vec3, up: Vec3) {
        let w = direction.normalize();
        let u = w.cross(&up).normalize();
        let v = w.cross(&u);
        self.view = view_from_basis(position, u, v, w);
    }

    /// Look from `position` at `target`
    pub fn set_view_target(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.set_view_direction(position, target - position, up);
    }

    /// View from `position` with Tait-Bryan angles applied in Y, X, Z order
    pub fn set_view_yxz(&mut self, position: Vec3, rotation: Vec3) {
        let (s3, c3) = rotation.z.sin_cos();
        let (s2, c2) = rotation.x.sin_cos();
        let (s1, c1) = rotation.y.sin_cos();

        let u = Vec3::new(c1 * c3 + s1 * s2 * s3, c2 * s3, c1 * s2 * s3 - c3 * s1);
        let v = Vec3::new(c3 * s1 * s2 - c1 * s3, c2 * c3, c1 * c3 * s2 + s1 * s3);
        let w = Vec3::new(c2 * s1, -s2, c1 * c2);
        self.view = view_from_basis(position, u, v, w);
    }

    /// Projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// View matrix
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// `projection * view`
    pub fn projection_view(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Rows `u`, `v`, `w` rotate world into camera space, then translate by `-position`
fn view_from_basis(position: Vec3, u: Vec3, v: Vec3, w: Vec3) -> Mat4 {
    let mut view = Mat4::identity();
    for (row, axis) in [u, v, w].iter().enumerate() {
        view[(row, 0)] = axis.x;
        view[(row, 1)] = axis.y;
        view[(row, 2)] = axis.z;
        view[(row, 3)] = -axis.dot(&position);
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    fn project(m: &Mat4, p: Vec3) -> Vec3 {
        let clip = m * Vec4::new(p.x, p.y, p.z, 1.0);
        Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    #[test]
    fn test_orthographic_maps_box_to_clip_volume() {
        let mut camera = Camera::new();
        camera.set_orthographic_projection(-2.0, 2.0, -1.0, 1.0, 0.0, 10.0);

        let near_corner = project(camera.projection(), Vec3::new(-2.0, -1.0, 0.0));
        let far_corner = project(camera.projection(), Vec3::new(2.0, 1.0, 10.0));

        assert_relative_eq!(near_corner, Vec3::new(-1.0, -1.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(far_corner, Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_perspective_depth_range() {
        let mut camera = Camera::new();
        camera.set_perspective_projection(50f32.to_radians(), 1.5, 0.1, 100.0);

        let near = project(camera.projection(), Vec3::new(0.0, 0.0, 0.1));
        let far = project(camera.projection(), Vec3::new(0.0, 0.0, 100.0));

        assert_relative_eq!(near.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_perspective_edge_of_view() {
        let fovy = 90f32.to_radians();
        let mut camera = Camera::new();
        camera.set_perspective_projection(fovy, 2.0, 0.1, 10.0);

        // At 45 degrees up the point lands on the top edge; x is squeezed by the aspect.
        let edge = project(camera.projection(), Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(edge.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(edge.x, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_view_direction_moves_eye_to_origin() {
        let mut camera = Camera::new();
        let eye = Vec3::new(1.0, -2.0, 3.0);
        camera.set_view_direction(eye, Vec3::new(0.3, 0.1, 1.0), DEFAULT_UP);

        assert_relative_eq!(project(camera.view(), eye), Vec3::zeros(), epsilon = 1e-5);
    }

    #[test]
    fn test_view_target_looks_down_positive_z() {
        let mut camera = Camera::new();
        let eye = Vec3::new(0.0, 0.0, -5.0);
        camera.set_view_target(eye, Vec3::zeros(), DEFAULT_UP);

        let target = project(camera.view(), Vec3::zeros());
        assert_relative_eq!(target, Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-5);
    }

    #[test]
    fn test_view_yxz_matches_view_direction_without_rotation() {
        let eye = Vec3::new(0.5, 1.0, -2.5);
        let mut a = Camera::new();
        let mut b = Camera::new();
        a.set_view_yxz(eye, Vec3::zeros());
        b.set_view_direction(eye, Vec3::new(0.0, 0.0, 1.0), DEFAULT_UP);

        assert_relative_eq!(a.view(), b.view(), epsilon = 1e-6);
    }

    #[test]
    fn test_view_yxz_rotation_is_orthonormal() {
        let mut camera = Camera::new();
        camera.set_view_yxz(Vec3::zeros(), Vec3::new(0.4, 1.2, -0.3));

        let r = camera.view().fixed_view::<3, 3>(0, 0).into_owned();
        assert_relative_eq!(r * r.transpose(), crate::foundation::math::Mat3::identity(), epsilon = 1e-5);
    }
}
