// Copyright 2020 TwoCookingMice

use prb_render::core::ad::Param;
use prb_render::core::bsdf::BSDF;
use prb_render::core::error::RenderError;
use prb_render::core::integrator::{Integrator, RenderSettings};
use prb_render::core::scene::{Scene, SceneObject};
use prb_render::core::sensor::Sensor;
use prb_render::emitters::constant::ConstantEmitter;
use prb_render::integrators::path::PathIntegrator;
use prb_render::integrators::prb::{PrbConfig, PrbIntegrator, TimeResolvedConfig};
use prb_render::io::exr_utils;
use prb_render::materials::conductor::ConductorBSDF;
use prb_render::materials::lambertian_diffuse::LambertianDiffuseBSDF;
use prb_render::math::bitmap::Bitmap;
use prb_render::math::constants::{Float, PI, Vector3f};
use prb_render::math::spectrum::Spectrum;
use prb_render::math::transform::Transform;
use prb_render::sensors::microphone::Microphone;
use prb_render::sensors::perspective::PerspectiveCamera;
use prb_render::shapes::rectangle::Rectangle;
use prb_render::shapes::sphere::Sphere;

use std::env;
use std::sync::Arc;

struct Options {
    output_path: String,
    spp: u32,
    max_depth: u32,
    seed: u64,
    integrator: String,
    gradient: Option<String>,
    acoustic: bool,
}

fn parse_options(args: &[String]) -> Option<Options> {
    let mut options = Options {
        output_path: args.get(1)?.clone(),
        spp: 16,
        max_depth: 6,
        seed: 0,
        integrator: "prb".to_string(),
        gradient: None,
        acoustic: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--spp" => {
                i += 1;
                options.spp = args.get(i)?.parse::<u32>().ok()?;
            }
            "--max-depth" => {
                i += 1;
                options.max_depth = args.get(i)?.parse::<u32>().ok()?;
            }
            "--seed" => {
                i += 1;
                options.seed = args.get(i)?.parse::<u64>().ok()?;
            }
            "--integrator" => {
                i += 1;
                options.integrator = args.get(i)?.clone();
            }
            "--gradient" => {
                i += 1;
                options.gradient = Some(args.get(i)?.clone());
            }
            "--acoustic" => options.acoustic = true,
            other => log::warn!("Ignoring unknown argument {}.", other),
        }
        i += 1;
    }
    Some(options)
}

fn diffuse(reflectance: Param<Spectrum>) -> Arc<dyn BSDF> {
    Arc::new(LambertianDiffuseBSDF::new(reflectance))
}

fn grey(v: Float) -> Spectrum {
    Spectrum::new(v, v, v)
}

// Floor and back wall, a diffuse and a mirror sphere, a square ceiling light and a dim sky.
fn build_demo_scene() -> Scene {
    let mut scene = Scene::new();
    let albedo_id = scene.params_mut().declare("sphere.reflectance", 3);
    let light_id = scene.params_mut().declare("light.radiance", 1);
    let offset_id = scene.params_mut().declare("light.offset", 3);

    let floor = Rectangle::new(Transform::scale(Vector3f::new(4.0, 4.0, 1.0)));
    scene.add_object(SceneObject::new(Arc::new(floor), diffuse(Param::fixed(grey(0.7)))).with_name("floor"));

    let wall_to_world = Transform::translate(Vector3f::new(0.0, 2.0, 2.0))
        .compose(&Transform::rotate(Vector3f::new(1.0, 0.0, 0.0), 0.5 * PI))
        .compose(&Transform::scale(Vector3f::new(4.0, 2.0, 1.0)));
    let wall = Rectangle::new(wall_to_world);
    scene.add_object(SceneObject::new(Arc::new(wall), diffuse(Param::fixed(Spectrum::new(0.6, 0.2, 0.2))))
        .with_name("wall"));

    let sphere = Sphere::new(Param::fixed(Vector3f::new(0.6, 0.3, 0.6)), Param::fixed(0.6));
    let reflectance = Param::tracked(Spectrum::new(0.2, 0.5, 0.7), albedo_id);
    scene.add_object(SceneObject::new(Arc::new(sphere), diffuse(reflectance)).with_name("sphere"));

    let mirror = Sphere::new(Param::fixed(Vector3f::new(-0.9, -0.2, 0.5)), Param::fixed(0.5));
    let chrome: Arc<dyn BSDF> = Arc::new(ConductorBSDF::new(Param::fixed(grey(0.95))));
    scene.add_object(SceneObject::new(Arc::new(mirror), chrome).with_name("mirror"));

    let light_to_world = Transform::translate(Vector3f::new(0.0, 0.0, 3.0))
        .compose(&Transform::rotate(Vector3f::new(1.0, 0.0, 0.0), PI))
        .compose(&Transform::scale(Vector3f::new(0.6, 0.6, 1.0)));
    let light = Rectangle::new(light_to_world).with_offset(Param::tracked(Vector3f::zeros(), offset_id));
    let light_object = SceneObject::new(Arc::new(light), diffuse(Param::fixed(grey(0.0)))).with_name("light");
    scene.add_area_light(light_object, Param::tracked(grey(12.0), light_id));

    scene.add_emitter(Arc::new(ConstantEmitter::new(Param::fixed(grey(0.05)))));
    log::info!("Demo scene built with {} objects and {} emitters.", scene.len(), scene.emitters().len());
    scene
}

fn write_or_exit(image: &Bitmap, path: &str) {
    if let Err(e) = exr_utils::write_exr_to_file(image, path) {
        log::error!("Failed to write {}: {}.", path, e);
        std::process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), RenderError> {
    let scene = build_demo_scene();
    let config = PrbConfig { max_depth: options.max_depth, ..PrbConfig::default() };
    let settings = RenderSettings::new(options.spp, options.seed);

    if options.acoustic {
        let time = TimeResolvedConfig { max_time: 0.05, speed_of_sound: 343.0, time_bins: 500 };
        let microphone = Microphone::new(Vector3f::new(0.0, -1.5, 1.2), time.time_bins);
        log::info!("Sensor: {}", microphone.describe());
        let integrator = PrbIntegrator::time_resolved(config, time)?;
        let response = integrator.render(&scene, &microphone, &settings)?;
        write_or_exit(&response, &options.output_path);
        return Ok(());
    }

    let camera = PerspectiveCamera::new(Vector3f::new(0.0, -5.0, 2.0), Vector3f::new(0.0, 0.0, 0.8),
                                        Vector3f::new(0.0, 0.0, 1.0), 45.0 * PI / 180.0,
                                        256, 256, 0.0, Float::MAX);
    log::info!("Sensor: {}", camera.describe());

    let integrator: Box<dyn Integrator> = match options.integrator.as_str() {
        "path" => Box::new(PathIntegrator::new(config)?),
        _ => Box::new(PrbIntegrator::new(config)?),
    };
    let image = integrator.render(&scene, &camera, &settings)?;
    write_or_exit(&image, &options.output_path);

    if let Some(param) = &options.gradient {
        let derivative = integrator.render_forward(&scene, &camera, &settings, param)?;
        let path = format!("{}.d_{}.exr", options.output_path.trim_end_matches(".exr"), param);
        write_or_exit(&derivative, &path);
    }
    Ok(())
}

fn main() {
    env::set_var("RUST_LOG", "info");
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let options = match parse_options(&args) {
        Some(options) => options,
        None => {
            eprintln!("Usage: {} <output.exr> [--spp N] [--max-depth N] [--seed N] \
                       [--integrator prb|path] [--gradient PARAM] [--acoustic]", args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&options) {
        log::error!("Rendering failed: {}.", e);
        std::process::exit(1);
    }
}
