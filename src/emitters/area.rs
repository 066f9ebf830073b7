// Copyright @yucwang 2026

use crate::core::ad::{AdContext, Param};
use crate::core::emitter::{Emitter, EmitterFlag};
use crate::core::interaction::{DirectionSample, SurfaceInteraction};
use crate::core::shape::Shape;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::dual::DiffSpectrum;
use crate::math::spectrum::Spectrum;
use std::sync::Arc;

/// Uniform one-sided emission from the front side of a shape.
pub struct AreaEmitter {
    shape: Arc<dyn Shape>,
    radiance: Param<Spectrum>,
}

impl AreaEmitter {
    pub fn from_shape(shape: Arc<dyn Shape>, radiance: Param<Spectrum>) -> Self {
        Self { shape, radiance }
    }

    fn invalid_sample() -> (DirectionSample, Spectrum) {
        (DirectionSample::default(), Spectrum::zeros())
    }
}

impl Emitter for AreaEmitter {
    fn name(&self) -> &'static str {
        "area"
    }

    fn flags(&self) -> EmitterFlag {
        EmitterFlag::SURFACE
    }

    fn eval(&self, ctx: &AdContext, si: &SurfaceInteraction) -> DiffSpectrum {
        if si.is_front_facing() {
            ctx.lift_vector(&self.radiance)
        } else {
            DiffSpectrum::zeros()
        }
    }

    fn sample_direction(&self,
                        ctx: &AdContext,
                        reference: &Vector3f,
                        u: &Vector2f) -> (DirectionSample, Spectrum) {
        let ps = self.shape.sample_position(ctx, u);
        let p = ps.p.value();
        let n = ps.n.value();
        let to_light = p - reference;
        let dist = to_light.norm();
        if ps.pdf <= 0.0 || dist <= 0.0 {
            return Self::invalid_sample();
        }
        let d = to_light / dist;
        let cos_light = -n.dot(&d);
        if cos_light <= 0.0 {
            return Self::invalid_sample();
        }

        let pdf = ps.pdf * dist * dist / cos_light;
        let ds = DirectionSample { p, n, d, dist, pdf, delta: false, emitter: 0, uv: *u };
        (ds, self.radiance.value / pdf)
    }

    fn pdf_direction(&self, _reference: &Vector3f, ds: &DirectionSample) -> Float {
        let area = self.shape.surface_area();
        let cos_light = -ds.n.dot(&ds.d);
        if area <= 0.0 || cos_light <= 0.0 {
            return 0.0;
        }
        ds.dist * ds.dist / (area * cos_light)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::dual::{DiffFloat, DiffVector3f};
    use crate::math::transform::Transform;
    use crate::shapes::rectangle::Rectangle;

    fn light() -> AreaEmitter {
        // Unit-area square at z = 1 facing down.
        let to_world = Transform::translate(Vector3f::new(0.0, 0.0, 1.0))
            .compose(&Transform::rotate(Vector3f::new(1.0, 0.0, 0.0), crate::math::constants::PI))
            .compose(&Transform::scale(Vector3f::new(0.5, 0.5, 1.0)));
        AreaEmitter::from_shape(Arc::new(Rectangle::new(to_world)),
                                Param::fixed(Spectrum::new(2.0, 2.0, 2.0)))
    }

    #[test]
    fn test_sample_matches_pdf_direction() {
        let emitter = light();
        let reference = Vector3f::zeros();
        let (ds, weight) = emitter.sample_direction(&AdContext::detached(), &reference,
                                                    &Vector2f::new(0.3, 0.6));
        assert!(ds.pdf > 0.0);
        assert!((ds.d.norm() - 1.0).abs() < 1e-5);
        assert!((emitter.pdf_direction(&reference, &ds) - ds.pdf).abs() < 1e-3 * ds.pdf);
        assert!((weight * ds.pdf - Spectrum::new(2.0, 2.0, 2.0)).norm() < 1e-4);
    }

    #[test]
    fn test_only_front_side_emits() {
        let emitter = light();
        let (ds, weight) = emitter.sample_direction(&AdContext::detached(),
                                                    &Vector3f::new(0.0, 0.0, 2.0),
                                                    &Vector2f::new(0.5, 0.5));
        assert_eq!(ds.pdf, 0.0);
        assert_eq!(weight, Spectrum::zeros());

        let n = DiffVector3f::constant(Vector3f::new(0.0, 0.0, -1.0));
        let up = Vector3f::new(0.0, 0.0, 1.0);
        let from_below = SurfaceInteraction::new(DiffFloat::constant(1.0), DiffVector3f::zeros(), n.clone(), Vector2f::zeros(), &up);
        assert_eq!(emitter.eval(&AdContext::detached(), &from_below).value(), Spectrum::new(2.0, 2.0, 2.0));
        let from_above = SurfaceInteraction::new(DiffFloat::constant(1.0), DiffVector3f::zeros(), n, Vector2f::zeros(), &(-up));
        assert_eq!(emitter.eval(&AdContext::detached(), &from_above).value(), Spectrum::zeros());
    }
}
