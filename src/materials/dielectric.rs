// Copyright @yucwang 2026

use crate::core::ad::{AdContext, Param};
use crate::core::bsdf::{BSDFFlags, BSDFSample, BSDF};
use crate::core::interaction::SurfaceInteraction;
use crate::materials::conductor::reflect;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::dual::{DiffFloat, DiffSpectrum, DiffVector3f};
use crate::math::spectrum::Spectrum;

/// Unpolarized Fresnel reflectance for a local cosine `cos_i` and relative IOR
/// `eta = eta_t / eta_i`. Returns `(F, cos_t, eta_it, eta_ti)` with `cos_t`
/// signed so that it points to the opposite side of `cos_i`.
pub fn fresnel_dielectric(cos_i: Float, eta: Float) -> (Float, Float, Float, Float) {
    let cos_i = cos_i.max(-1.0).min(1.0);
    let entering = cos_i >= 0.0;
    let eta_it = if entering { eta } else { 1.0 / eta };
    let eta_ti = 1.0 / eta_it;

    let sin2_t = eta_ti * eta_ti * (1.0 - cos_i * cos_i).max(0.0);
    if sin2_t >= 1.0 {
        return (1.0, 0.0, eta_it, eta_ti);
    }
    let cos_i_abs = cos_i.abs();
    let cos_t_abs = (1.0 - sin2_t).sqrt();

    let r_s = (cos_i_abs - eta_it * cos_t_abs) / (cos_i_abs + eta_it * cos_t_abs);
    let r_p = (eta_it * cos_i_abs - cos_t_abs) / (eta_it * cos_i_abs + cos_t_abs);
    let f = 0.5 * (r_s * r_s + r_p * r_p);
    let cos_t = if entering { -cos_t_abs } else { cos_t_abs };
    (f, cos_t, eta_it, eta_ti)
}

pub fn refract(wi: &Vector3f, cos_t: Float, eta_ti: Float) -> Vector3f {
    Vector3f::new(-eta_ti * wi.x, -eta_ti * wi.y, cos_t)
}

/// Smooth interface between two dielectrics, e.g. air and glass.
pub struct DielectricBSDF {
    eta: Float,
    specular_reflectance: Param<Spectrum>,
    specular_transmittance: Param<Spectrum>,
}

impl DielectricBSDF {
    pub fn new(int_ior: Float,
               ext_ior: Float,
               specular_reflectance: Param<Spectrum>,
               specular_transmittance: Param<Spectrum>) -> Self {
        Self {
            eta: int_ior / ext_ior,
            specular_reflectance,
            specular_transmittance,
        }
    }
}

impl BSDF for DielectricBSDF {
    fn flags(&self) -> BSDFFlags {
        BSDFFlags::DELTA_REFLECTION | BSDFFlags::DELTA_TRANSMISSION
    }

    fn sample(&self, si: &SurfaceInteraction, u1: Float, _u2: Vector2f) -> (BSDFSample, Spectrum) {
        let wi = si.wi();
        let (f, cos_t, eta_it, eta_ti) = fresnel_dielectric(wi.z, self.eta);

        if u1 <= f {
            let sample = BSDFSample {
                wo: reflect(&wi),
                pdf: f,
                eta: 1.0,
                sampled_type: BSDFFlags::DELTA_REFLECTION,
            };
            (sample, self.specular_reflectance.value)
        } else {
            let sample = BSDFSample {
                wo: refract(&wi, cos_t, eta_ti),
                pdf: 1.0 - f,
                eta: eta_it,
                sampled_type: BSDFFlags::DELTA_TRANSMISSION,
            };
            // Radiance is compressed by eta_ti^2 when crossing the interface.
            (sample, self.specular_transmittance.value * (eta_ti * eta_ti))
        }
    }

    fn eval(&self, _ctx: &AdContext, _si: &SurfaceInteraction, _wo: &DiffVector3f) -> DiffSpectrum {
        DiffSpectrum::zeros()
    }

    fn pdf(&self, _si: &SurfaceInteraction, _wo: &Vector3f) -> Float {
        0.0
    }

    fn eval_continuation(&self,
                         ctx: &AdContext,
                         si: &SurfaceInteraction,
                         sample: &BSDFSample,
                         _wo_exact: &DiffVector3f) -> DiffSpectrum {
        if sample.pdf <= 0.0 {
            return DiffSpectrum::zeros();
        }
        let (f, _, _, eta_ti) = fresnel_dielectric(si.wi().z, self.eta);
        if sample.sampled_type.contains(BSDFFlags::DELTA_REFLECTION) {
            ctx.lift_vector(&self.specular_reflectance).scale(&DiffFloat::constant(f))
        } else {
            let k = (1.0 - f) * eta_ti * eta_ti;
            ctx.lift_vector(&self.specular_transmittance).scale(&DiffFloat::constant(k))
        }
    }
}
