// Copyright @yucwang 2026

use crate::core::ad::AdContext;
use crate::core::error::RenderError;
use crate::core::integrator::{Integrator, RenderSettings};
use crate::core::rng::IndependentSampler;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::integrators::prb::{mis_weight, PrbConfig};
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::dual::DiffVector3f;
use crate::math::ray::Ray3f;
use crate::math::spectrum::{is_black, max_value, Spectrum};
use crate::renderers::blocks::run_blocks;

const PIXELS_PER_BLOCK: usize = 64;

/// Which estimators of direct illumination contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Emitter and BSDF sampling combined with the balance heuristic.
    Mis,
    /// Emission is only found by hitting emitters; delta emitters are never seen.
    BsdfOnly,
    /// Emission is only found by sampling emitters, except after delta bounces.
    EmitterOnly,
}

/// Plain unidirectional path tracer without any differentiation support.
pub struct PathIntegrator {
    config: PrbConfig,
    strategy: Strategy,
}

impl PathIntegrator {
    pub fn new(config: PrbConfig) -> Result<Self, RenderError> {
        config.validate()?;
        Ok(Self { config, strategy: Strategy::Mis })
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    fn emission_weight(&self, depth: u32, prev_delta: bool, prev_pdf: Float, em_pdf: Float) -> Float {
        if depth == 0 || prev_delta {
            return 1.0;
        }
        match self.strategy {
            Strategy::Mis => mis_weight(prev_pdf, em_pdf),
            Strategy::BsdfOnly => 1.0,
            Strategy::EmitterOnly => 0.0,
        }
    }

    fn trace_path(&self, scene: &Scene, mut ray: Ray3f, sampler: &mut IndependentSampler) -> Spectrum {
        let ctx = AdContext::detached();
        let mut radiance = Spectrum::zeros();
        let mut throughput = Spectrum::new(1.0, 1.0, 1.0);
        let mut eta: Float = 1.0;
        let mut prev_p = ray.origin();
        let mut prev_pdf: Float = 0.0;
        let mut prev_delta = true;

        for depth in 0..self.config.max_depth {
            let hidden = self.config.hide_emitters && depth == 0;
            let si = match scene.ray_intersect(&ctx, &ray, &DiffVector3f::constant(ray.origin())) {
                Some(si) => si,
                None => {
                    if let Some((env_index, env)) = scene.environment() {
                        if !hidden {
                            let ds = Scene::direction_sample_for_escape(&prev_p, &ray.dir(), env_index);
                            let em_pdf = scene.pdf_emitter_direction(&prev_p, &ds);
                            let w = self.emission_weight(depth, prev_delta, prev_pdf, em_pdf);
                            let le = env.eval_direction(&ctx, &ray.dir()).value();
                            radiance += throughput.component_mul(&le) * w;
                        }
                    }
                    break;
                }
            };

            if let Some((emitter_index, emitter)) = scene.emitter_at(&si) {
                if !hidden {
                    let ds = Scene::direction_sample_for_hit(&prev_p, &si, emitter_index);
                    let em_pdf = scene.pdf_emitter_direction(&prev_p, &ds);
                    let w = self.emission_weight(depth, prev_delta, prev_pdf, em_pdf);
                    radiance += throughput.component_mul(&emitter.eval(&ctx, &si).value()) * w;
                }
            }

            if depth + 1 >= self.config.max_depth {
                break;
            }
            let bsdf = match scene.material(&si) {
                Some(bsdf) => bsdf,
                None => break,
            };

            if self.strategy != Strategy::BsdfOnly && bsdf.flags().is_smooth() {
                let u = sampler.next_2d();
                let (ds, em_weight) = scene.sample_emitter_direction(&ctx, &si.p_detached(), &u);
                if ds.pdf > 0.0 {
                    let shadow = if ds.is_infinite() { si.spawn_ray(&ds.d) } else { si.spawn_ray_to(&ds.p) };
                    if !scene.ray_test(&shadow) {
                        let wo = si.frame().to_local_detached(&ds.d);
                        let (f, bsdf_pdf) = bsdf.eval_pdf(&ctx, &si, &DiffVector3f::constant(wo));
                        let w = if ds.delta || self.strategy == Strategy::EmitterOnly {
                            1.0
                        } else {
                            mis_weight(ds.pdf, bsdf_pdf.value())
                        };
                        radiance += throughput.component_mul(&f.value()).component_mul(&em_weight) * w;
                    }
                }
            }

            let u1 = sampler.next_1d();
            let u2 = sampler.next_2d();
            let (sample, weight) = bsdf.sample(&si, u1, u2);
            if sample.pdf <= 0.0 || is_black(&weight) {
                break;
            }
            throughput = throughput.component_mul(&weight);
            eta *= sample.eta;
            prev_p = si.p_detached();
            prev_pdf = sample.pdf;
            prev_delta = sample.sampled_type.is_delta();
            ray = si.spawn_ray(&si.frame().to_world_detached(&sample.wo));

            if depth + 1 >= self.config.rr_depth {
                let q = (max_value(&throughput) * eta * eta).min(0.95);
                if sampler.next_1d() >= q {
                    break;
                }
                throughput /= q;
            }
        }

        radiance
    }
}

impl Integrator for PathIntegrator {
    fn name(&self) -> &'static str {
        "path"
    }

    fn render(&self,
              scene: &Scene,
              sensor: &dyn Sensor,
              settings: &RenderSettings) -> Result<Bitmap, RenderError> {
        settings.validate()?;
        let (width, height) = sensor.film_size();
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidConfig { field: "film", reason: "must not be empty" });
        }
        log::info!("path: rendering {}x{} at {} spp.", width, height, settings.spp);

        let inv_spp = 1.0 / settings.spp as Float;
        let seed = settings.seed ^ 0x5851_f42d_4c95_7f2d;
        let blocks = run_blocks(width * height, PIXELS_PER_BLOCK, |range| {
            range.map(|pixel| {
                let (x, y) = (pixel % width, pixel / width);
                let mut sampler = IndependentSampler::new(seed, pixel as u64);
                let mut color = Vector3f::zeros();
                for _ in 0..settings.spp {
                    let offset = sampler.next_2d();
                    let film_sample = Vector2f::new((x as Float + offset.x) / width as Float,
                                                    (y as Float + offset.y) / height as Float);
                    let aperture = sampler.next_2d();
                    let (ray, weight) = sensor.sample_ray(&AdContext::detached(), &film_sample, &aperture);
                    color += self.trace_path(scene, ray, &mut sampler).component_mul(&weight.value());
                }
                color * inv_spp
            }).collect::<Vec<Spectrum>>()
        });

        let mut image = Bitmap::new(width, height);
        for (pixel, color) in blocks.into_iter().flatten().enumerate() {
            image[(pixel % width, pixel / width)] = color;
        }
        log::info!("path: render done.");
        Ok(image)
    }
}
