// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector3f, Matrix4f };
use super::ray::Ray3f;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    matrix: Matrix4f,
    inv_matrix: Matrix4f
}

impl Default for Transform {
    fn default() -> Self {
        Self { matrix: Matrix4f::identity(),
               inv_matrix: Matrix4f::identity() }
    }
}

impl Transform {
    pub fn new(matrix: Matrix4f) -> Self {
        Self { matrix: matrix,
               inv_matrix: matrix.try_inverse().unwrap_or(Matrix4f::identity())}
    }

    pub fn translate(t: Vector3f) -> Self {
        Self::new(Matrix4f::new_translation(&t))
    }

    pub fn scale(s: Vector3f) -> Self {
        Self::new(Matrix4f::new_nonuniform_scaling(&s))
    }

    /// Rotation of `angle` radians around `axis`.
    pub fn rotate(axis: Vector3f, angle: Float) -> Self {
        let axis = nalgebra::Unit::new_normalize(axis);
        Self::new(nalgebra::Rotation3::from_axis_angle(&axis, angle).to_homogeneous())
    }

    /// `self` applied after `inner`.
    pub fn compose(&self, inner: &Transform) -> Self {
        Self::new(self.matrix * inner.matrix)
    }

    pub fn apply_point(&self, p: Vector3f) -> Vector3f {
        let h = self.matrix * p.push(1.0);
        Vector3f::new(h.x / h.w, h.y / h.w, h.z / h.w)
    }

    pub fn apply_vector(&self, v: Vector3f) -> Vector3f {
        (self.matrix * v.push(0.0)).xyz()
    }

    // Normal transformation is different from point transformation.
    // Before transformation, we have n^Tx = 0
    // After transformation, we have (Sn)^T(Mx) = 0
    // Then, we will get: S = (M^{-1})^T
    pub fn apply_normal(&self, n: Vector3f) -> Vector3f {
        (self.inv_matrix.transpose() * n.push(0.0)).xyz()
    }

    pub fn inv_apply_point(&self, p: Vector3f) -> Vector3f {
        let h = self.inv_matrix * p.push(1.0);
        Vector3f::new(h.x / h.w, h.y / h.w, h.z / h.w)
    }

    pub fn inv_apply_vector(&self, v: Vector3f) -> Vector3f {
        (self.inv_matrix * v.push(0.0)).xyz()
    }

    pub fn inv_apply_ray(&self, ray: &Ray3f) -> Ray3f {
        let new_p = self.inv_apply_point(ray.origin());
        let new_d = self.inv_apply_vector(ray.dir());

        Ray3f::new(new_p, new_d, Some(ray.min_t), Some(ray.max_t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_and_scale() {
        let t = Transform::translate(Vector3f::new(1.0, 2.0, 3.0))
            .compose(&Transform::scale(Vector3f::new(2.0, 2.0, 2.0)));
        let p = t.apply_point(Vector3f::new(1.0, 0.0, 0.0));
        assert!((p - Vector3f::new(3.0, 2.0, 3.0)).norm() < 1e-5);
        let v = t.apply_vector(Vector3f::new(1.0, 0.0, 0.0));
        assert!((v - Vector3f::new(2.0, 0.0, 0.0)).norm() < 1e-5);
        let back = t.inv_apply_point(p);
        assert!((back - Vector3f::new(1.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_rotation_keeps_normals_unit() {
        let r = Transform::rotate(Vector3f::new(1.0, 0.0, 0.0), std::f32::consts::FRAC_PI_2);
        let n = r.apply_normal(Vector3f::new(0.0, 0.0, 1.0));
        assert!((n.norm() - 1.0).abs() < 1e-5);
        assert!((n - Vector3f::new(0.0, -1.0, 0.0)).norm() < 1e-5);
    }
}
