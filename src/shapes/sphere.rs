// Copyright @yucwang 2026

use crate::core::ad::{AdContext, Param};
use crate::core::interaction::{PositionSample, SurfaceInteraction};
use crate::core::shape::Shape;
use crate::math::constants::{Float, PI, Vector2f, Vector3f};
use crate::math::dual::{DiffFloat, DiffVector3f};
use crate::math::ray::Ray3f;
use crate::math::warp::sample_uniform_sphere;

pub struct Sphere {
    center: Param<Vector3f>,
    radius: Param<Float>,
}

impl Sphere {
    pub fn new(center: Param<Vector3f>, radius: Param<Float>) -> Self {
        Self { center, radius }
    }

    fn uv(n: &Vector3f) -> Vector2f {
        let mut phi = n.y.atan2(n.x);
        if phi < 0.0 {
            phi += 2.0 * PI;
        }
        Vector2f::new(phi / (2.0 * PI), n.z.max(-1.0).min(1.0).acos() / PI)
    }
}

impl Shape for Sphere {
    fn ray_intersect(&self, ray: &Ray3f) -> Option<Float> {
        let oc = ray.origin() - self.center.value;
        let d = ray.dir();
        let b = oc.dot(&d);
        let c = oc.dot(&oc) - self.radius.value * self.radius.value;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let near = -b - sqrt_disc;
        let far = -b + sqrt_disc;
        if ray.test_segment(near) {
            Some(near)
        } else if ray.test_segment(far) {
            Some(far)
        } else {
            None
        }
    }

    fn interaction(&self,
                   ctx: &AdContext,
                   origin: &DiffVector3f,
                   dir: &Vector3f,
                   t: Float) -> SurfaceInteraction {
        let center = ctx.lift_vector(&self.center);
        let radius = ctx.lift_float(&self.radius);
        let oc = origin.sub(&center);
        let b = oc.dot_const(dir);
        let c = oc.dot(&oc) - &radius * &radius;
        let sqrt_disc = (&b * &b - c).sqrt();

        // Pick whichever root the detached search found.
        let near = -&b - &sqrt_disc;
        let far = -&b + &sqrt_disc;
        let t_diff = if (near.value() - t).abs() <= (far.value() - t).abs() { near } else { far };

        let p = origin.add(&DiffVector3f::constant(*dir).scale(&t_diff));
        let n = p.sub(&center).scale(&radius.safe_recip());
        let uv = Self::uv(&n.value());
        SurfaceInteraction::new(t_diff, p, n, uv, dir)
    }

    fn sample_position(&self, ctx: &AdContext, u: &Vector2f) -> PositionSample {
        let center = ctx.lift_vector(&self.center);
        let radius = ctx.lift_float(&self.radius);
        let local = sample_uniform_sphere(u);
        let n = DiffVector3f::constant(local);
        let p = center.add(&n.scale(&radius));
        let area = self.surface_area();
        PositionSample {
            p,
            n,
            pdf: if area > 0.0 { 1.0 / area } else { 0.0 },
            delta: false,
        }
    }

    fn surface_area(&self) -> Float {
        4.0 * PI * self.radius.value * self.radius.value
    }
}
