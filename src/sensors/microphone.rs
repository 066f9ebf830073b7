// Copyright @yucwang 2026

use crate::core::ad::AdContext;
use crate::core::sensor::Sensor;
use crate::math::constants::{Vector2f, Vector3f};
use crate::math::dual::DiffSpectrum;
use crate::math::ray::Ray3f;
use crate::math::spectrum::Spectrum;
use crate::math::warp::sample_uniform_sphere;

/// Omnidirectional point receiver. Its film is a row of time bins, so the
/// film sample is ignored and only the aperture sample picks a direction.
pub struct Microphone {
    position: Vector3f,
    time_bins: usize,
}

impl Microphone {
    pub fn new(position: Vector3f, time_bins: usize) -> Self {
        Self { position, time_bins }
    }

    pub fn position(&self) -> Vector3f {
        self.position
    }
}

impl Sensor for Microphone {
    fn film_size(&self) -> (usize, usize) {
        (self.time_bins, 1)
    }

    fn sample_ray(&self,
                  _ctx: &AdContext,
                  _film_sample: &Vector2f,
                  aperture_sample: &Vector2f) -> (Ray3f, DiffSpectrum) {
        let dir = sample_uniform_sphere(aperture_sample);
        let ray = Ray3f::new(self.position, dir, Some(0.0), None);
        (ray, DiffSpectrum::constant(Spectrum::new(1.0, 1.0, 1.0)))
    }

    fn describe(&self) -> String {
        format!("Microphone [{} bins, position {:?}]", self.time_bins, self.position)
    }
}
