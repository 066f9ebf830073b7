// Copyright @yucwang 2026

//! Small scenes shared by the integrator tests.

use crate::core::ad::{Param, ParamTable};
use crate::core::bsdf::BSDF;
use crate::core::scene::{Scene, SceneObject};
use crate::emitters::constant::ConstantEmitter;
use crate::materials::conductor::ConductorBSDF;
use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
use crate::math::constants::{Float, PI, Vector3f};
use crate::math::spectrum::Spectrum;
use crate::math::transform::Transform;
use crate::sensors::microphone::Microphone;
use crate::sensors::perspective::PerspectiveCamera;
use crate::shapes::rectangle::Rectangle;
use crate::shapes::sphere::Sphere;
use std::sync::Arc;

pub fn grey(v: Float) -> Spectrum {
    Spectrum::new(v, v, v)
}

fn diffuse(reflectance: Param<Spectrum>) -> Arc<dyn BSDF> {
    Arc::new(LambertianDiffuseBSDF::new(reflectance))
}

fn tracked(params: &mut ParamTable, name: &str, width: usize, value: Spectrum) -> Param<Spectrum> {
    Param::tracked(value, params.declare(name, width))
}

/// Unit diffuse sphere at the origin inside a constant environment of radiance `env`.
pub fn sphere_in_environment(albedo: Float, env: Float) -> (Scene, PerspectiveCamera) {
    let mut scene = Scene::new();
    let reflectance = tracked(scene.params_mut(), "sphere.reflectance", 3, grey(albedo));
    let radiance = tracked(scene.params_mut(), "env.radiance", 1, grey(env));
    let sphere = Sphere::new(Param::fixed(Vector3f::zeros()), Param::fixed(1.0));
    scene.add_object(SceneObject::new(Arc::new(sphere), diffuse(reflectance)).with_name("sphere"));
    scene.add_emitter(Arc::new(ConstantEmitter::new(radiance)));

    let camera = PerspectiveCamera::new(Vector3f::new(0.0, 0.0, -4.0), Vector3f::zeros(),
                                        Vector3f::new(0.0, 1.0, 0.0), 40.0 * PI / 180.0,
                                        8, 8, 0.0, Float::MAX);
    (scene, camera)
}

/// Floor with a diffuse and a mirror sphere under a square area light, plus a dim environment.
pub fn lit_room(albedo: Float, light_scale: Float, light_lift: Float) -> (Scene, PerspectiveCamera) {
    let mut scene = Scene::new();
    let reflectance = tracked(scene.params_mut(), "sphere.reflectance", 3, grey(albedo));
    let radiance = tracked(scene.params_mut(), "light.radiance", 1, grey(5.0 * light_scale));
    let offset_id = scene.params_mut().declare("light.offset", 3);

    let floor = Rectangle::new(Transform::scale(Vector3f::new(3.0, 3.0, 1.0)));
    scene.add_object(SceneObject::new(Arc::new(floor), diffuse(Param::fixed(grey(0.6)))));

    let sphere = Sphere::new(Param::fixed(Vector3f::new(0.5, 0.0, 0.5)), Param::fixed(0.5));
    scene.add_object(SceneObject::new(Arc::new(sphere), diffuse(reflectance)));

    let mirror = Sphere::new(Param::fixed(Vector3f::new(-0.8, 0.4, 0.4)), Param::fixed(0.4));
    let chrome: Arc<dyn BSDF> = Arc::new(ConductorBSDF::new(Param::fixed(grey(0.9))));
    scene.add_object(SceneObject::new(Arc::new(mirror), chrome));

    let to_world = Transform::translate(Vector3f::new(0.0, 0.0, 2.0))
        .compose(&Transform::rotate(Vector3f::new(1.0, 0.0, 0.0), PI))
        .compose(&Transform::scale(Vector3f::new(0.5, 0.5, 1.0)));
    let light = Rectangle::new(to_world)
        .with_offset(Param::tracked(Vector3f::new(0.0, 0.0, light_lift), offset_id));
    scene.add_area_light(SceneObject::new(Arc::new(light), diffuse(Param::fixed(grey(0.0)))),
                         radiance);
    scene.add_emitter(Arc::new(ConstantEmitter::new(Param::fixed(grey(0.1)))));

    let camera = PerspectiveCamera::new(Vector3f::new(0.0, -4.0, 2.5), Vector3f::new(0.0, 0.0, 0.4),
                                        Vector3f::new(0.0, 0.0, 1.0), 45.0 * PI / 180.0,
                                        6, 6, 0.0, Float::MAX);
    (scene, camera)
}

/// Large diffuse floor of albedo 0.5 lit by a spherical light of radius 0.5
/// and radiance 10 centred 2 units above the origin. The floor at the origin
/// reflects `0.5 * 10 * (0.5 / 2)^2`.
pub fn sphere_light_over_floor() -> (Scene, PerspectiveCamera, Float) {
    let mut scene = Scene::new();
    let floor = Rectangle::new(Transform::scale(Vector3f::new(10.0, 10.0, 1.0)));
    scene.add_object(SceneObject::new(Arc::new(floor), diffuse(Param::fixed(grey(0.5)))));

    let bulb = Sphere::new(Param::fixed(Vector3f::new(0.0, 0.0, 2.0)), Param::fixed(0.5));
    scene.add_area_light(SceneObject::new(Arc::new(bulb), diffuse(Param::fixed(grey(0.0)))),
                         Param::fixed(grey(10.0)));

    let camera = PerspectiveCamera::new(Vector3f::new(3.0, 0.0, 1.0), Vector3f::zeros(),
                                        Vector3f::new(0.0, 0.0, 1.0), PI / 180.0,
                                        1, 1, 0.0, Float::MAX);
    (scene, camera, 0.5 * 10.0 * 0.0625)
}

/// Square light of side 0.2 and radiance 100 facing down from `height` above a
/// large diffuse floor of albedo 0.5, and a one-pixel camera looking at the
/// floor point `(x, 0, 0)`.
pub fn small_light_over_floor(height: Float, x: Float) -> (Scene, PerspectiveCamera) {
    let mut scene = Scene::new();
    let offset_id = scene.params_mut().declare("light.offset", 3);
    let floor = Rectangle::new(Transform::scale(Vector3f::new(10.0, 10.0, 1.0)));
    scene.add_object(SceneObject::new(Arc::new(floor), diffuse(Param::fixed(grey(0.5)))));

    let to_world = Transform::rotate(Vector3f::new(1.0, 0.0, 0.0), PI)
        .compose(&Transform::scale(Vector3f::new(0.1, 0.1, 1.0)));
    let light = Rectangle::new(to_world)
        .with_offset(Param::tracked(Vector3f::new(0.0, 0.0, height), offset_id));
    scene.add_area_light(SceneObject::new(Arc::new(light), diffuse(Param::fixed(grey(0.0)))),
                         Param::fixed(grey(100.0)));

    let target = Vector3f::new(x, 0.0, 0.0);
    let camera = PerspectiveCamera::new(target + Vector3f::new(0.0, -2.0, 1.0), target,
                                        Vector3f::new(0.0, 0.0, 1.0), PI / 180.0,
                                        1, 1, 0.0, Float::MAX);
    (scene, camera)
}

/// Microphone at the origin and a spherical source of radius 2 at distance 10.
pub fn acoustic_source(time_bins: usize) -> (Scene, Microphone) {
    let mut scene = Scene::new();
    let radiance = tracked(scene.params_mut(), "source.radiance", 1, grey(100.0));
    let source = Sphere::new(Param::fixed(Vector3f::new(10.0, 0.0, 0.0)), Param::fixed(2.0));
    scene.add_area_light(SceneObject::new(Arc::new(source), diffuse(Param::fixed(grey(0.0)))),
                         radiance);
    (scene, Microphone::new(Vector3f::zeros(), time_bins))
}

/// `acoustic_source` above a large diffuse floor 3 units below the microphone,
/// whose reflectance is tracked as `floor.reflectance`.
pub fn acoustic_source_over_floor(time_bins: usize) -> (Scene, Microphone) {
    let (mut scene, microphone) = acoustic_source(time_bins);
    let reflectance = tracked(scene.params_mut(), "floor.reflectance", 3, grey(0.5));
    let to_world = Transform::translate(Vector3f::new(0.0, 0.0, -3.0))
        .compose(&Transform::scale(Vector3f::new(20.0, 20.0, 1.0)));
    scene.add_object(SceneObject::new(Arc::new(Rectangle::new(to_world)), diffuse(reflectance)));
    (scene, microphone)
}
