// Copyright @yucwang 2023

use crate::core::ad::AdContext;
use crate::core::interaction::{ PositionSample, SurfaceInteraction };
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::dual::DiffVector3f;
use crate::math::ray::Ray3f;

pub trait Shape: Send + Sync {
    /// Distance to the closest hit within `[ray.min_t, ray.max_t]`, gradients detached.
    fn ray_intersect(&self, ray: &Ray3f) -> Option<Float>;

    /// Re-derives a hit found by `ray_intersect` at distance `t` from a
    /// differentiable ray origin and a detached direction.
    fn interaction(&self,
                   ctx: &AdContext,
                   origin: &DiffVector3f,
                   dir: &Vector3f,
                   t: Float) -> SurfaceInteraction;

    /// Uniformly samples a point on the surface; density is per unit area.
    fn sample_position(&self, ctx: &AdContext, u: &Vector2f) -> PositionSample;

    fn surface_area(&self) -> Float;
}
