// Copyright @yucwang 2023

use crate::core::ad::AdContext;
use crate::core::interaction::SurfaceInteraction;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::dual::{ DiffFloat, DiffSpectrum, DiffVector3f };
use crate::math::spectrum::Spectrum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BSDFFlags(u8);

impl BSDFFlags {
    pub const NONE: Self = Self(0);
    pub const DIFFUSE_REFLECTION: Self = Self(1 << 0);
    pub const DELTA_REFLECTION: Self = Self(1 << 1);
    pub const DELTA_TRANSMISSION: Self = Self(1 << 2);

    pub const DELTA: Self = Self(Self::DELTA_REFLECTION.0 | Self::DELTA_TRANSMISSION.0);
    pub const SMOOTH: Self = Self::DIFFUSE_REFLECTION;

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    pub fn is_delta(self) -> bool {
        self.contains(Self::DELTA)
    }

    /// Has at least one lobe with a continuous density.
    pub fn is_smooth(self) -> bool {
        self.contains(Self::SMOOTH)
    }
}

impl std::ops::BitOr for BSDFFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

// Directions are expressed in the local shading frame of the interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BSDFSample {
    pub wo: Vector3f,
    /// Solid-angle density for smooth lobes, discrete lobe probability for delta lobes.
    pub pdf: Float,
    /// Relative index of refraction along the sampled direction.
    pub eta: Float,
    pub sampled_type: BSDFFlags,
}

impl Default for BSDFSample {
    fn default() -> Self {
        Self {
            wo: Vector3f::zeros(),
            pdf: 0.0,
            eta: 1.0,
            sampled_type: BSDFFlags::NONE,
        }
    }
}

pub trait BSDF: Send + Sync {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn flags(&self) -> BSDFFlags;

    /// Draws a direction with gradients detached. Returns the sample and its
    /// weight `f * |cos| / pdf`; a zero pdf marks a failed sample.
    fn sample(&self, si: &SurfaceInteraction, u1: Float, u2: Vector2f) -> (BSDFSample, Spectrum);

    /// Cosine-weighted BSDF value for a local direction. Zero for delta lobes.
    fn eval(&self, ctx: &AdContext, si: &SurfaceInteraction, wo: &DiffVector3f) -> DiffSpectrum;

    fn pdf(&self, si: &SurfaceInteraction, wo: &Vector3f) -> Float;

    /// Value and density together. The density only carries gradients for
    /// materials whose lobes move with `wo`.
    fn eval_pdf(&self, ctx: &AdContext, si: &SurfaceInteraction, wo: &DiffVector3f) -> (DiffSpectrum, DiffFloat) {
        (self.eval(ctx, si, wo), DiffFloat::constant(self.pdf(si, &wo.value())))
    }

    /// Differentiable value of a previously drawn sample, re-evaluated along
    /// `wo_exact`. Its primal equals `weight * sample.pdf`, which is what
    /// lets the continuation weight be rewritten as a ratio.
    fn eval_continuation(&self,
                         ctx: &AdContext,
                         si: &SurfaceInteraction,
                         _sample: &BSDFSample,
                         wo_exact: &DiffVector3f) -> DiffSpectrum {
        self.eval(ctx, si, wo_exact)
    }
}
