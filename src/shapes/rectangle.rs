// Copyright @yucwang 2026

use crate::core::ad::{AdContext, Param};
use crate::core::interaction::{PositionSample, SurfaceInteraction};
use crate::core::shape::Shape;
use crate::math::constants::{EPSILON, Float, Vector2f, Vector3f};
use crate::math::dual::DiffVector3f;
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;

/// The square `[-1, 1]^2` of the local xy plane, placed by `to_world` and then
/// shifted by a (possibly differentiable) world-space offset.
pub struct Rectangle {
    to_world: Transform,
    offset: Param<Vector3f>,
    normal: Vector3f,
    area: Float,
    inv_area: Float,
}

impl Rectangle {
    pub fn new(to_world: Transform) -> Self {
        let dp_du = to_world.apply_vector(Vector3f::new(2.0, 0.0, 0.0));
        let dp_dv = to_world.apply_vector(Vector3f::new(0.0, 2.0, 0.0));
        let cross = dp_du.cross(&dp_dv);
        let area = cross.norm();
        let inv_area = if area > 0.0 { 1.0 / area } else { 0.0 };
        let normal = if area > 0.0 {
            cross / area
        } else {
            let n = to_world.apply_normal(Vector3f::new(0.0, 0.0, 1.0));
            if n.norm() > 0.0 { n.normalize() } else { Vector3f::new(0.0, 0.0, 1.0) }
        };

        Self { to_world, offset: Param::fixed(Vector3f::zeros()), normal, area, inv_area }
    }

    pub fn with_offset(mut self, offset: Param<Vector3f>) -> Self {
        self.offset = offset;
        self
    }

    pub fn normal(&self) -> Vector3f {
        self.normal
    }

    fn local_hit(&self, ray: &Ray3f) -> Option<Vector3f> {
        let shifted = Ray3f::new(ray.origin() - self.offset.value, ray.dir(), None, None);
        let ray_local = self.to_world.inv_apply_ray(&shifted);
        let dir = ray_local.dir();
        if dir.z.abs() < EPSILON {
            return None;
        }

        let t_local = -ray_local.origin().z / dir.z;
        let p_local = ray_local.at(t_local);
        if p_local.x.abs() > 1.0 || p_local.y.abs() > 1.0 {
            return None;
        }
        Some(p_local)
    }
}

impl Shape for Rectangle {
    fn ray_intersect(&self, ray: &Ray3f) -> Option<Float> {
        if self.area <= 0.0 {
            return None;
        }
        let p_local = self.local_hit(ray)?;
        let p_world = self.to_world.apply_point(p_local) + self.offset.value;
        let t = (p_world - ray.origin()).dot(&ray.dir());
        if ray.test_segment(t) { Some(t) } else { None }
    }

    fn interaction(&self,
                   ctx: &AdContext,
                   origin: &DiffVector3f,
                   dir: &Vector3f,
                   _t: Float) -> SurfaceInteraction {
        let center = ctx.lift_vector(&self.offset)
            .add_const(&self.to_world.apply_point(Vector3f::zeros()));
        let cos = self.normal.dot(dir);
        let t = center.sub(origin).dot_const(&self.normal) * (1.0 / cos);
        let p = origin.add(&DiffVector3f::constant(*dir).scale(&t));

        let p_local = self.to_world.inv_apply_point(p.value() - self.offset.value);
        let uv = Vector2f::new(0.5 * (p_local.x + 1.0), 0.5 * (p_local.y + 1.0));
        SurfaceInteraction::new(t, p, DiffVector3f::constant(self.normal), uv, dir)
    }

    fn sample_position(&self, ctx: &AdContext, u: &Vector2f) -> PositionSample {
        let p_local = Vector3f::new(2.0 * u.x - 1.0, 2.0 * u.y - 1.0, 0.0);
        let p = ctx.lift_vector(&self.offset).add_const(&self.to_world.apply_point(p_local));
        PositionSample {
            p,
            n: DiffVector3f::constant(self.normal),
            pdf: self.inv_area,
            delta: false,
        }
    }

    fn surface_area(&self) -> Float {
        self.area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ad::ParamTable;

    #[test]
    fn test_rectangle_intersection_and_area() {
        let rect = Rectangle::new(Transform::scale(Vector3f::new(2.0, 3.0, 1.0)));
        assert!((rect.surface_area() - 24.0).abs() < 1e-4);

        let ray = Ray3f::new(Vector3f::new(1.0, 1.0, 5.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        let t = rect.ray_intersect(&ray).unwrap();
        assert!((t - 5.0).abs() < 1e-5);

        let outside = Ray3f::new(Vector3f::new(2.5, 0.0, 5.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        assert!(rect.ray_intersect(&outside).is_none());
    }

    #[test]
    fn test_degenerate_rectangle_is_never_hit() {
        let rect = Rectangle::new(Transform::scale(Vector3f::new(0.0, 1.0, 1.0)));
        assert_eq!(rect.surface_area(), 0.0);
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        assert!(rect.ray_intersect(&ray).is_none());
        assert_eq!(rect.sample_position(&AdContext::detached(), &Vector2f::new(0.5, 0.5)).pdf, 0.0);
    }

    #[test]
    fn test_offset_moves_hit_distance() {
        let mut params = ParamTable::new();
        let id = params.declare("light.offset", 3);
        let rect = Rectangle::new(Transform::default())
            .with_offset(Param::tracked(Vector3f::new(0.0, 0.0, 1.0), id));
        let ray = Ray3f::new(Vector3f::new(0.2, 0.1, 4.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        let t = rect.ray_intersect(&ray).unwrap();
        assert!((t - 3.0).abs() < 1e-5);

        let si = rect.interaction(&AdContext::tracking(&params),
                                  &DiffVector3f::constant(ray.origin()), &ray.dir(), t);
        assert!((si.t().value() - 3.0).abs() < 1e-5);
        assert!((si.t().grad()[2] + 1.0).abs() < 1e-5);
        assert!(si.is_front_facing());
        assert!((si.uv() - Vector2f::new(0.6, 0.55)).norm() < 1e-5);
    }
}
