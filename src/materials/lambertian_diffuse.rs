// Copyright @yucwang 2023

use crate::core::ad::{AdContext, Param};
use crate::core::bsdf::{BSDFFlags, BSDFSample, BSDF};
use crate::core::interaction::SurfaceInteraction;
use crate::math::constants::{ Float, INV_PI, Vector2f, Vector3f };
use crate::math::dual::{ DiffFloat, DiffSpectrum, DiffVector3f };
use crate::math::spectrum::Spectrum;
use crate::math::warp::{ sample_cosine_hemisphere, sample_cosine_hemisphere_pdf };

// Two-sided Lambertian reflector.
pub struct LambertianDiffuseBSDF {
    reflectance: Param<Spectrum>,
}

impl LambertianDiffuseBSDF {
    pub fn new(reflectance: Param<Spectrum>) -> Self {
        Self { reflectance }
    }
}

impl BSDF for LambertianDiffuseBSDF {
    fn flags(&self) -> BSDFFlags {
        BSDFFlags::DIFFUSE_REFLECTION
    }

    fn sample(&self, si: &SurfaceInteraction, _u1: Float, u2: Vector2f) -> (BSDFSample, Spectrum) {
        let wi = si.wi();
        if wi.z == 0.0 {
            return (BSDFSample::default(), Spectrum::zeros());
        }

        let mut wo = sample_cosine_hemisphere(&u2);
        if wi.z < 0.0 {
            wo.z = -wo.z;
        }
        let pdf = sample_cosine_hemisphere_pdf(wo.z.abs());
        if pdf <= 0.0 {
            return (BSDFSample::default(), Spectrum::zeros());
        }

        let sample = BSDFSample {
            wo,
            pdf,
            eta: 1.0,
            sampled_type: BSDFFlags::DIFFUSE_REFLECTION,
        };
        (sample, self.reflectance.value)
    }

    fn eval(&self, ctx: &AdContext, si: &SurfaceInteraction, wo: &DiffVector3f) -> DiffSpectrum {
        let wi = si.wi();
        if wi.z * wo.z.value() <= 0.0 {
            return DiffSpectrum::zeros();
        }
        let cos_theta = wo.z.abs() * INV_PI;
        ctx.lift_vector(&self.reflectance).scale(&cos_theta)
    }

    fn pdf(&self, si: &SurfaceInteraction, wo: &Vector3f) -> Float {
        if si.wi().z * wo.z <= 0.0 {
            return 0.0;
        }
        sample_cosine_hemisphere_pdf(wo.z.abs())
    }

    fn eval_pdf(&self, ctx: &AdContext, si: &SurfaceInteraction, wo: &DiffVector3f) -> (DiffSpectrum, DiffFloat) {
        if si.wi().z * wo.z.value() <= 0.0 {
            return (DiffSpectrum::zeros(), DiffFloat::constant(0.0));
        }
        let pdf = wo.z.abs() * INV_PI;
        (ctx.lift_vector(&self.reflectance).scale(&pdf), pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ad::ParamTable;
    use crate::math::dual::DiffFloat;

    fn interaction() -> SurfaceInteraction {
        let n = DiffVector3f::constant(Vector3f::new(0.0, 0.0, 1.0));
        let p = DiffVector3f::zeros();
        SurfaceInteraction::new(DiffFloat::constant(1.0), p, n, Vector2f::zeros(), &Vector3f::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn test_sample_weight_equals_eval_over_pdf() {
        let bsdf = LambertianDiffuseBSDF::new(Param::fixed(Spectrum::new(0.2, 0.5, 0.8)));
        let si = interaction();
        let (sample, weight) = bsdf.sample(&si, 0.0, Vector2f::new(0.3, 0.7));
        assert!(sample.pdf > 0.0);
        assert!(sample.wo.z > 0.0);
        let value = bsdf.eval(&AdContext::detached(), &si, &DiffVector3f::constant(sample.wo));
        let expected = value.value() / sample.pdf;
        assert!((expected - weight).norm() < 1e-5);
        assert!((bsdf.pdf(&si, &sample.wo) - sample.pdf).abs() < 1e-6);
    }

    #[test]
    fn test_below_horizon_is_black() {
        let bsdf = LambertianDiffuseBSDF::new(Param::fixed(Spectrum::new(1.0, 1.0, 1.0)));
        let si = interaction();
        let wo = DiffVector3f::constant(Vector3f::new(0.0, 0.6, -0.8));
        assert_eq!(bsdf.eval(&AdContext::detached(), &si, &wo).value(), Spectrum::zeros());
        assert_eq!(bsdf.pdf(&si, &wo.value()), 0.0);
    }

    #[test]
    fn test_reflectance_gradient() {
        let mut params = ParamTable::new();
        let id = params.declare("albedo", 3);
        let bsdf = LambertianDiffuseBSDF::new(Param::tracked(Spectrum::new(0.5, 0.5, 0.5), id));
        let si = interaction();
        let wo = DiffVector3f::constant(Vector3f::new(0.0, 0.0, 1.0));
        let value = bsdf.eval(&AdContext::tracking(&params), &si, &wo);
        assert!((value.x.grad()[0] - INV_PI).abs() < 1e-6);
        assert_eq!(value.x.grad()[1], 0.0);
    }

    #[test]
    fn test_density_follows_direction() {
        let bsdf = LambertianDiffuseBSDF::new(Param::fixed(Spectrum::new(0.5, 0.5, 0.5)));
        let si = interaction();
        let wo = DiffVector3f::new(DiffFloat::constant(0.6), DiffFloat::constant(0.0),
                                   DiffFloat::variable(0.8, 0, 1));
        let (value, pdf) = bsdf.eval_pdf(&AdContext::detached(), &si, &wo);
        assert!((pdf.value() - bsdf.pdf(&si, &wo.value())).abs() < 1e-6);
        assert!((pdf.grad()[0] - INV_PI).abs() < 1e-6);
        assert!((value.x.value() - 0.5 * pdf.value()).abs() < 1e-6);
    }
}
