// Copyright @yucwang 2026

use crate::core::ad::{AdContext, Param};
use crate::core::bsdf::{BSDFFlags, BSDFSample, BSDF};
use crate::core::interaction::SurfaceInteraction;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::dual::{DiffSpectrum, DiffVector3f};
use crate::math::spectrum::Spectrum;

pub fn reflect(wi: &Vector3f) -> Vector3f {
    Vector3f::new(-wi.x, -wi.y, wi.z)
}

/// Perfectly specular mirror.
pub struct ConductorBSDF {
    specular_reflectance: Param<Spectrum>,
}

impl ConductorBSDF {
    pub fn new(specular_reflectance: Param<Spectrum>) -> Self {
        Self { specular_reflectance }
    }
}

impl BSDF for ConductorBSDF {
    fn flags(&self) -> BSDFFlags {
        BSDFFlags::DELTA_REFLECTION
    }

    fn sample(&self, si: &SurfaceInteraction, _u1: Float, _u2: Vector2f) -> (BSDFSample, Spectrum) {
        let wi = si.wi();
        if wi.z <= 0.0 {
            return (BSDFSample::default(), Spectrum::zeros());
        }
        let sample = BSDFSample {
            wo: reflect(&wi),
            pdf: 1.0,
            eta: 1.0,
            sampled_type: BSDFFlags::DELTA_REFLECTION,
        };
        (sample, self.specular_reflectance.value)
    }

    fn eval(&self, _ctx: &AdContext, _si: &SurfaceInteraction, _wo: &DiffVector3f) -> DiffSpectrum {
        DiffSpectrum::zeros()
    }

    fn pdf(&self, _si: &SurfaceInteraction, _wo: &Vector3f) -> Float {
        0.0
    }

    fn eval_continuation(&self,
                         ctx: &AdContext,
                         _si: &SurfaceInteraction,
                         sample: &BSDFSample,
                         _wo_exact: &DiffVector3f) -> DiffSpectrum {
        if sample.pdf <= 0.0 {
            return DiffSpectrum::zeros();
        }
        ctx.lift_vector(&self.specular_reflectance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::dual::DiffFloat;

    #[test]
    fn test_mirror_reflection() {
        let n = DiffVector3f::constant(Vector3f::new(0.0, 0.0, 1.0));
        let d = Vector3f::new(0.6, 0.0, -0.8);
        let si = SurfaceInteraction::new(DiffFloat::constant(1.0), DiffVector3f::zeros(), n, Vector2f::zeros(), &d);
        let bsdf = ConductorBSDF::new(Param::fixed(Spectrum::new(0.9, 0.9, 0.9)));
        let (sample, weight) = bsdf.sample(&si, 0.5, Vector2f::new(0.5, 0.5));
        assert!(sample.sampled_type.is_delta());
        assert!((si.frame().to_world_detached(&sample.wo) - Vector3f::new(0.6, 0.0, 0.8)).norm() < 1e-5);
        assert_eq!(weight, Spectrum::new(0.9, 0.9, 0.9));

        let wo = DiffVector3f::constant(sample.wo);
        assert_eq!(bsdf.eval(&AdContext::detached(), &si, &wo).value(), Spectrum::zeros());
        let cont = bsdf.eval_continuation(&AdContext::detached(), &si, &sample, &wo);
        assert_eq!(cont.value(), weight * sample.pdf);
    }
}
