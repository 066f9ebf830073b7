// Copyright @yucwang 2026

use crate::core::ad::{AdContext, Param, ParamTable};
use crate::core::bsdf::BSDF;
use crate::core::emitter::{Emitter, EmitterFlag};
use crate::core::interaction::{DirectionSample, SurfaceInteraction};
use crate::core::shape::Shape;
use crate::emitters::area::AreaEmitter;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::dual::DiffVector3f;
use crate::math::ray::Ray3f;
use crate::math::spectrum::Spectrum;
use std::sync::Arc;

pub struct SceneObject {
    pub shape: Arc<dyn Shape>,
    pub material: Arc<dyn BSDF>,
    pub emitter: Option<usize>,
    pub name: Option<String>,
}

impl SceneObject {
    pub fn new(shape: Arc<dyn Shape>, material: Arc<dyn BSDF>) -> Self {
        Self { shape, material, emitter: None, name: None }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }
}

/// Shapes, their materials, the emitters and the table of differentiable
/// parameters they were built with.
pub struct Scene {
    objects: Vec<SceneObject>,
    emitters: Vec<Arc<dyn Emitter>>,
    environment: Option<usize>,
    params: ParamTable,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            emitters: Vec::new(),
            environment: None,
            params: ParamTable::new(),
        }
    }

    pub fn params(&self) -> &ParamTable {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParamTable {
        &mut self.params
    }

    pub fn add_object(&mut self, object: SceneObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Adds an object whose front side emits `radiance`.
    pub fn add_area_light(&mut self, mut object: SceneObject, radiance: Param<Spectrum>) -> usize {
        let emitter = AreaEmitter::from_shape(object.shape.clone(), radiance);
        self.emitters.push(Arc::new(emitter));
        object.emitter = Some(self.emitters.len() - 1);
        self.add_object(object)
    }

    /// Adds an emitter that is not attached to a shape. An infinite,
    /// non-delta emitter becomes the environment seen by escaping rays.
    pub fn add_emitter(&mut self, emitter: Arc<dyn Emitter>) -> usize {
        let flags = emitter.flags();
        self.emitters.push(emitter);
        let index = self.emitters.len() - 1;
        if flags.contains(EmitterFlag::INFINITE) && !flags.contains(EmitterFlag::DELTA) {
            if self.environment.is_some() {
                log::warn!("Scene already has an environment emitter, replacing it.");
            }
            self.environment = Some(index);
        }
        index
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn emitters(&self) -> &[Arc<dyn Emitter>] {
        &self.emitters
    }

    pub fn environment(&self) -> Option<(usize, &dyn Emitter)> {
        let index = self.environment?;
        self.emitters.get(index).map(|e| (index, e.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Closest object along `ray` and the distance to it, gradients detached.
    pub fn closest_hit(&self, ray: &Ray3f) -> Option<(usize, Float)> {
        let mut ray = *ray;
        let mut closest = None;
        for (idx, object) in self.objects.iter().enumerate() {
            if let Some(t) = object.shape.ray_intersect(&ray) {
                if ray.update(t) {
                    closest = Some((idx, t));
                }
            }
        }
        closest
    }

    /// Finds the closest hit with the detached ray and re-derives it from the
    /// differentiable `origin`, so the result follows both the hit shape's
    /// parameters and the origin's.
    pub fn ray_intersect(&self,
                         ctx: &AdContext,
                         ray: &Ray3f,
                         origin: &DiffVector3f) -> Option<SurfaceInteraction> {
        let (idx, t) = self.closest_hit(ray)?;
        let si = self.objects[idx].shape.interaction(ctx, origin, &ray.dir(), t);
        Some(si.with_shape_index(idx))
    }

    /// True when anything blocks `ray` within its segment.
    pub fn ray_test(&self, ray: &Ray3f) -> bool {
        self.objects.iter().any(|object| object.shape.ray_intersect(ray).is_some())
    }

    pub fn material(&self, si: &SurfaceInteraction) -> Option<&dyn BSDF> {
        let idx = si.shape_index()?;
        self.objects.get(idx).map(|o| o.material.as_ref())
    }

    pub fn emitter_at(&self, si: &SurfaceInteraction) -> Option<(usize, &dyn Emitter)> {
        let idx = si.shape_index()?;
        let emitter = self.objects.get(idx)?.emitter?;
        self.emitters.get(emitter).map(|e| (emitter, e.as_ref()))
    }

    /// Shape an emitter is attached to, if any.
    pub fn emitter_shape(&self, emitter: usize) -> Option<usize> {
        self.objects.iter().position(|o| o.emitter == Some(emitter))
    }

    fn selection_pdf(&self) -> Float {
        if self.emitters.is_empty() {
            0.0
        } else {
            1.0 / self.emitters.len() as Float
        }
    }

    /// Picks an emitter uniformly and samples a direction towards it. The
    /// returned density includes the selection probability and the weight
    /// divides by it. Visibility is left to the caller.
    pub fn sample_emitter_direction(&self,
                                    ctx: &AdContext,
                                    reference: &Vector3f,
                                    u: &Vector2f) -> (DirectionSample, Spectrum) {
        if self.emitters.is_empty() {
            return (DirectionSample::default(), Spectrum::zeros());
        }
        let count = self.emitters.len();
        let scaled = u.x * count as Float;
        let index = (scaled as usize).min(count - 1);
        let u_reused = Vector2f::new((scaled - index as Float).min(1.0 - Float::EPSILON), u.y);

        let (mut ds, weight) = self.emitters[index].sample_direction(ctx, reference, &u_reused);
        let select_pdf = self.selection_pdf();
        ds.emitter = index;
        ds.pdf *= select_pdf;
        if ds.pdf <= 0.0 {
            return (ds, Spectrum::zeros());
        }
        (ds, weight / select_pdf)
    }

    /// Density with which `sample_emitter_direction` would produce `ds`.
    /// Delta emitters can never be hit, so they report zero.
    pub fn pdf_emitter_direction(&self, reference: &Vector3f, ds: &DirectionSample) -> Float {
        match self.emitters.get(ds.emitter) {
            Some(emitter) if !emitter.flags().contains(EmitterFlag::DELTA) => {
                emitter.pdf_direction(reference, ds) * self.selection_pdf()
            }
            _ => 0.0,
        }
    }

    /// Describes a hit on an emitter as if it had been sampled from `reference`.
    pub fn direction_sample_for_hit(reference: &Vector3f,
                                    si: &SurfaceInteraction,
                                    emitter: usize) -> DirectionSample {
        let p = si.p_detached();
        let to_hit = p - reference;
        let dist = to_hit.norm();
        let d = if dist > 0.0 { to_hit / dist } else { Vector3f::zeros() };
        DirectionSample { p, n: si.n_detached(), d, dist, pdf: 0.0, delta: false, emitter, uv: si.uv() }
    }

    /// Describes an escaping ray as a sample of the environment emitter.
    pub fn direction_sample_for_escape(reference: &Vector3f,
                                       d: &Vector3f,
                                       emitter: usize) -> DirectionSample {
        DirectionSample {
            p: reference + d,
            n: -d,
            d: *d,
            dist: Float::INFINITY,
            pdf: 0.0,
            delta: false,
            emitter,
            uv: Vector2f::zeros(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitters::constant::ConstantEmitter;
    use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
    use crate::math::transform::Transform;
    use crate::shapes::rectangle::Rectangle;
    use crate::shapes::sphere::Sphere;

    fn diffuse() -> Arc<dyn BSDF> {
        Arc::new(LambertianDiffuseBSDF::new(Param::fixed(Spectrum::new(0.5, 0.5, 0.5))))
    }

    fn sphere(center: Vector3f, radius: Float) -> Arc<dyn Shape> {
        Arc::new(Sphere::new(Param::fixed(center), Param::fixed(radius)))
    }

    fn test_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(sphere(Vector3f::new(0.0, 0.0, 5.0), 1.0), diffuse()));
        scene.add_object(SceneObject::new(sphere(Vector3f::new(0.0, 0.0, 10.0), 1.0), diffuse()));
        let light = Transform::translate(Vector3f::new(0.0, 0.0, -3.0));
        scene.add_area_light(SceneObject::new(Arc::new(Rectangle::new(light)), diffuse()).with_name("light"),
                             Param::fixed(Spectrum::new(4.0, 4.0, 4.0)));
        scene.add_emitter(Arc::new(ConstantEmitter::new(Param::fixed(Spectrum::new(1.0, 1.0, 1.0)))));
        scene
    }

    #[test]
    fn test_closest_hit_wins() {
        let scene = test_scene();
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let (idx, t) = scene.closest_hit(&ray).unwrap();
        assert_eq!(idx, 0);
        assert!((t - 4.0).abs() < 1e-5);

        let si = scene.ray_intersect(&AdContext::detached(), &ray,
                                     &DiffVector3f::constant(ray.origin())).unwrap();
        assert_eq!(si.shape_index(), Some(0));
        assert!(scene.material(&si).is_some());
        assert!(scene.emitter_at(&si).is_none());
        assert!(scene.ray_test(&ray));

        let up = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 1.0, 0.0), None, None);
        assert!(scene.closest_hit(&up).is_none());
        assert!(!scene.ray_test(&up));
    }

    #[test]
    fn test_area_light_is_registered() {
        let scene = test_scene();
        assert_eq!(scene.emitters().len(), 2);
        assert_eq!(scene.environment().map(|(idx, _)| idx), Some(1));
        assert_eq!(scene.emitter_shape(0), Some(2));

        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, -1.0), None, None);
        let si = scene.ray_intersect(&AdContext::detached(), &ray,
                                     &DiffVector3f::constant(ray.origin())).unwrap();
        let (emitter, _) = scene.emitter_at(&si).unwrap();
        assert_eq!(emitter, 0);
    }

    #[test]
    fn test_emitter_selection_is_part_of_density() {
        let scene = test_scene();
        let reference = Vector3f::zeros();
        // u.x below one half selects the area light.
        let (ds, weight) = scene.sample_emitter_direction(&AdContext::detached(), &reference,
                                                          &Vector2f::new(0.2, 0.5));
        assert_eq!(ds.emitter, 0);
        assert!(ds.pdf > 0.0);
        let pdf = scene.pdf_emitter_direction(&reference, &ds);
        assert!((pdf - ds.pdf).abs() < 1e-3 * ds.pdf);
        assert!((weight * ds.pdf - Spectrum::new(4.0, 4.0, 4.0)).norm() < 1e-3);

        let (ds, _) = scene.sample_emitter_direction(&AdContext::detached(), &reference,
                                                     &Vector2f::new(0.7, 0.5));
        assert_eq!(ds.emitter, 1);
        assert!(ds.is_infinite());
    }

    #[test]
    fn test_empty_scene_has_nothing_to_sample() {
        let scene = Scene::new();
        let (ds, weight) = scene.sample_emitter_direction(&AdContext::detached(), &Vector3f::zeros(),
                                                          &Vector2f::new(0.5, 0.5));
        assert_eq!(ds.pdf, 0.0);
        assert_eq!(weight, Spectrum::zeros());
        assert!(scene.environment().is_none());
    }
}
