// Copyright @yucwang 2026

use crate::core::ad::{AdContext, Param};
use crate::core::emitter::{Emitter, EmitterFlag};
use crate::core::interaction::DirectionSample;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::dual::DiffSpectrum;
use crate::math::spectrum::Spectrum;
use crate::math::warp::{sample_uniform_sphere, sample_uniform_sphere_pdf};

/// Environment of uniform radiance surrounding the scene.
pub struct ConstantEmitter {
    radiance: Param<Spectrum>,
}

impl ConstantEmitter {
    pub fn new(radiance: Param<Spectrum>) -> Self {
        Self { radiance }
    }
}

impl Emitter for ConstantEmitter {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn flags(&self) -> EmitterFlag {
        EmitterFlag::INFINITE
    }

    fn eval_direction(&self, ctx: &AdContext, _d: &Vector3f) -> DiffSpectrum {
        ctx.lift_vector(&self.radiance)
    }

    fn sample_direction(&self,
                        _ctx: &AdContext,
                        reference: &Vector3f,
                        u: &Vector2f) -> (DirectionSample, Spectrum) {
        let d = sample_uniform_sphere(u);
        let pdf = sample_uniform_sphere_pdf();
        let ds = DirectionSample {
            p: reference + d,
            n: -d,
            d,
            dist: Float::INFINITY,
            pdf,
            delta: false,
            emitter: 0,
            uv: *u,
        };
        (ds, self.radiance.value / pdf)
    }

    fn pdf_direction(&self, _reference: &Vector3f, _ds: &DirectionSample) -> Float {
        sample_uniform_sphere_pdf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::INV_FOUR_PI;

    #[test]
    fn test_uniform_sampling_weight() {
        let emitter = ConstantEmitter::new(Param::fixed(Spectrum::new(1.0, 0.5, 0.25)));
        let (ds, weight) = emitter.sample_direction(&AdContext::detached(), &Vector3f::zeros(),
                                                    &Vector2f::new(0.4, 0.2));
        assert!((ds.pdf - INV_FOUR_PI).abs() < 1e-6);
        assert!((ds.d.norm() - 1.0).abs() < 1e-5);
        assert!((weight * INV_FOUR_PI - Spectrum::new(1.0, 0.5, 0.25)).norm() < 1e-5);
        let radiance = emitter.eval_direction(&AdContext::detached(), &ds.d);
        assert_eq!(radiance.value(), Spectrum::new(1.0, 0.5, 0.25));
    }
}
