// Copyright @yucwang 2026

use crate::core::ad::AdContext;
use crate::math::constants::Vector2f;
use crate::math::dual::DiffSpectrum;
use crate::math::ray::Ray3f;

pub trait Sensor: Sync {
    /// Film dimensions as `(width, height)`.
    fn film_size(&self) -> (usize, usize);

    /// Generates a primary ray for a point on the film, both samples in `[0, 1)^2`.
    /// The weight is the sensor importance of that ray.
    fn sample_ray(&self,
                  ctx: &AdContext,
                  film_sample: &Vector2f,
                  aperture_sample: &Vector2f) -> (Ray3f, DiffSpectrum);

    fn describe(&self) -> String {
        String::from("Sensor")
    }
}
