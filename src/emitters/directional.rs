// Copyright @yucwang 2026

use crate::core::ad::{AdContext, Param};
use crate::core::emitter::{Emitter, EmitterFlag};
use crate::core::interaction::DirectionSample;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::dual::DiffSpectrum;
use crate::math::spectrum::Spectrum;

/// Parallel light travelling along `direction`, like the sun.
pub struct DirectionalEmitter {
    direction: Vector3f,
    irradiance: Param<Spectrum>,
}

impl DirectionalEmitter {
    pub fn new_with(direction: Vector3f, irradiance: Param<Spectrum>) -> Self {
        let len = direction.norm();
        let direction = if len > 0.0 { direction / len } else { Vector3f::new(0.0, 0.0, -1.0) };
        Self { direction, irradiance }
    }
}

impl Emitter for DirectionalEmitter {
    fn name(&self) -> &'static str {
        "directional"
    }

    fn flags(&self) -> EmitterFlag {
        EmitterFlag::INFINITE | EmitterFlag::DELTA
    }

    fn sample_direction(&self,
                        _ctx: &AdContext,
                        reference: &Vector3f,
                        _u: &Vector2f) -> (DirectionSample, Spectrum) {
        let ds = DirectionSample {
            p: reference - self.direction,
            n: self.direction,
            d: -self.direction,
            dist: Float::INFINITY,
            pdf: 1.0,
            delta: true,
            emitter: 0,
            uv: Vector2f::zeros(),
        };
        (ds, self.irradiance.value)
    }

    fn eval_delta(&self, ctx: &AdContext, _ds: &DirectionSample) -> DiffSpectrum {
        ctx.lift_vector(&self.irradiance)
    }

    fn pdf_direction(&self, _reference: &Vector3f, _ds: &DirectionSample) -> Float {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_points_against_travel_direction() {
        let emitter = DirectionalEmitter::new_with(Vector3f::new(0.0, 0.0, -2.0),
                                                   Param::fixed(Spectrum::new(3.0, 3.0, 3.0)));
        assert!(emitter.flags().contains(EmitterFlag::DELTA));
        let (ds, weight) = emitter.sample_direction(&AdContext::detached(), &Vector3f::zeros(),
                                                    &Vector2f::new(0.1, 0.9));
        assert_eq!(ds.d, Vector3f::new(0.0, 0.0, 1.0));
        assert!(ds.is_infinite());
        assert!(ds.delta);
        assert_eq!(weight, Spectrum::new(3.0, 3.0, 3.0));
        assert_eq!(emitter.pdf_direction(&Vector3f::zeros(), &ds), 0.0);
    }
}
