// Copyright @yucwang 2026

use crate::core::ad::AdContext;
use crate::core::interaction::{DirectionSample, SurfaceInteraction};
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::dual::DiffSpectrum;
use crate::math::spectrum::Spectrum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterFlag(u8);

impl EmitterFlag {
    pub const NONE: Self = Self(0);
    pub const INFINITE: Self = Self(1 << 0);
    pub const SURFACE: Self = Self(1 << 1);
    pub const DELTA: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }
}

impl std::ops::BitOr for EmitterFlag {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

pub trait Emitter: Send + Sync {
    fn name(&self) -> &'static str;

    fn flags(&self) -> EmitterFlag;

    /// Radiance leaving a surface emitter at `si` towards the ray that hit it.
    fn eval(&self, _ctx: &AdContext, _si: &SurfaceInteraction) -> DiffSpectrum {
        DiffSpectrum::zeros()
    }

    /// Radiance arriving from infinity along `-d`, for rays escaping in direction `d`.
    fn eval_direction(&self, _ctx: &AdContext, _d: &Vector3f) -> DiffSpectrum {
        DiffSpectrum::zeros()
    }

    /// Samples a direction from `reference` towards the emitter. The returned
    /// weight is emitted radiance over the sample density, gradients detached.
    /// `emitter` of the sample is left for the caller to fill in.
    fn sample_direction(&self,
                        ctx: &AdContext,
                        reference: &Vector3f,
                        u: &Vector2f) -> (DirectionSample, Spectrum);

    /// Differentiable radiance of a delta sample, which cannot be re-evaluated
    /// by intersecting the emitter.
    fn eval_delta(&self, _ctx: &AdContext, _ds: &DirectionSample) -> DiffSpectrum {
        DiffSpectrum::zeros()
    }

    /// Solid-angle density of `sample_direction` producing `ds`.
    fn pdf_direction(&self, reference: &Vector3f, ds: &DirectionSample) -> Float;
}
