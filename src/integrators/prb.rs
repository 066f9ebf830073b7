// Copyright @yucwang 2026

//! Path replay backpropagation.
//!
//! Every sample lane runs the same random walk up to twice. The primal pass
//! estimates radiance with next-event estimation and MIS while all gradients
//! are detached. The differential pass replays the walk from a clone of the
//! lane (and therefore of its sampler), re-attaches the differentiable
//! quantities used at each vertex and pushes the vertex's share of the path
//! radiance through them, so only O(1) state per lane is ever alive.

use crate::core::ad::{AdContext, GradScope, ParamGradients, Proxied};
use crate::core::error::RenderError;
use crate::core::film::ImageAccumulator;
use crate::core::integrator::{Integrator, RenderSettings};
use crate::core::interaction::{DirectionSample, SurfaceInteraction};
use crate::core::rng::{IndependentSampler, SampleStream};
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::dual::{DiffFloat, DiffSpectrum, DiffVector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{is_black, max_value, mean_value, Spectrum};
use crate::renderers::blocks::{run_blocks, BLOCK_LANES};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrbConfig {
    /// Longest path in vertices; 1 only shows directly visible emitters.
    pub max_depth: u32,
    /// Depth from which Russian roulette may terminate paths.
    pub rr_depth: u32,
    /// Do not show emitters seen directly by the sensor.
    pub hide_emitters: bool,
}

impl Default for PrbConfig {
    fn default() -> Self {
        Self { max_depth: 6, rr_depth: 5, hide_emitters: false }
    }
}

impl PrbConfig {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.max_depth == 0 {
            return Err(RenderError::InvalidConfig { field: "max_depth", reason: "must be positive" });
        }
        if self.rr_depth == 0 {
            return Err(RenderError::InvalidConfig { field: "rr_depth", reason: "must be positive" });
        }
        if self.rr_depth > self.max_depth {
            log::warn!("rr_depth {} exceeds max_depth {}, Russian roulette never triggers.",
                       self.rr_depth, self.max_depth);
        }
        Ok(())
    }
}

/// Settings of the energy-time response recorded by a `Microphone`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeResolvedConfig {
    /// Length of the recorded response in seconds.
    pub max_time: Float,
    /// Propagation speed in scene units per second.
    pub speed_of_sound: Float,
    pub time_bins: usize,
}

impl Default for TimeResolvedConfig {
    fn default() -> Self {
        Self { max_time: 1.0, speed_of_sound: 343.0, time_bins: 1000 }
    }
}

impl TimeResolvedConfig {
    pub fn validate(&self) -> Result<(), RenderError> {
        if !(self.max_time > 0.0) {
            return Err(RenderError::InvalidConfig { field: "max_time", reason: "must be positive" });
        }
        if !(self.speed_of_sound > 0.0) {
            return Err(RenderError::InvalidConfig { field: "speed_of_sound", reason: "must be positive" });
        }
        if self.time_bins == 0 {
            return Err(RenderError::InvalidConfig { field: "time_bins", reason: "must be positive" });
        }
        Ok(())
    }

    /// Distance after which nothing can land on the response any more.
    pub fn max_distance(&self) -> Float {
        self.max_time * self.speed_of_sound
    }

    /// Film coordinate of energy that travelled `distance`.
    pub fn coordinate(&self, distance: Float) -> Option<Vector2f> {
        if !distance.is_finite() {
            return None;
        }
        let time = distance / self.speed_of_sound;
        Some(Vector2f::new(time / self.max_time * self.time_bins as Float, 0.5))
    }
}

/// What a sample lane measures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    /// Radiance splatted at the lane's film position.
    Image,
    /// Energy splatted at the time bin of the distance travelled so far.
    TimeResolved(TimeResolvedConfig),
}

/// Where the contributions found by `PrbIntegrator::sample` go.
pub enum Splat<'a> {
    /// Accumulate into a film.
    Film(&'a mut Bitmap),
    /// Weight every contribution by the adjoint image read at its coordinate.
    Adjoint(&'a Bitmap),
    /// Keep contributions on the lane only.
    Lane,
    /// Accumulate the forward derivative of every contribution at its own
    /// coordinate. Only meaningful for a forward replay.
    Tangent(&'a mut Bitmap),
}

#[derive(Debug, Clone)]
enum NextVertex {
    /// Not traced yet; only the primary ray starts like this.
    Pending,
    Hit(SurfaceInteraction),
    Escaped,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PrevVertex {
    p: Vector3f,
    pdf: Float,
    delta: bool,
}

/// State of one sample lane, carried from bounce to bounce.
#[derive(Debug, Clone)]
pub struct PathState {
    sampler: IndependentSampler,
    ray: Ray3f,
    next: NextVertex,
    pos: Vector2f,
    weight: Spectrum,
    distance: Float,
    depth: u32,
    throughput: Spectrum,
    eta: Float,
    prev: PrevVertex,
    active: bool,
    radiance: Spectrum,
    differential: Spectrum,
    /// Forward derivative of the log throughput of the path so far.
    prefix_tangent: Spectrum,
}

impl PathState {
    /// Lane starting with primary `ray` of sensor importance `weight`,
    /// recording at film position `pos`.
    pub fn new(sampler: IndependentSampler, ray: Ray3f, pos: Vector2f, weight: Spectrum) -> Self {
        Self {
            sampler,
            next: NextVertex::Pending,
            prev: PrevVertex { p: ray.origin(), pdf: 0.0, delta: true },
            ray,
            pos,
            weight,
            distance: 0.0,
            depth: 0,
            throughput: Spectrum::new(1.0, 1.0, 1.0),
            eta: 1.0,
            active: true,
            radiance: Spectrum::zeros(),
            differential: Spectrum::zeros(),
            prefix_tangent: Spectrum::zeros(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn distance(&self) -> Float {
        self.distance
    }

    pub fn pos(&self) -> Vector2f {
        self.pos
    }

    /// Sum of the weighted contributions recorded by the primal pass; the
    /// differential pass counts it down to zero.
    pub fn radiance(&self) -> Spectrum {
        self.radiance
    }

    /// Forward-mode derivative accumulated by the differential pass.
    pub fn differential(&self) -> Spectrum {
        self.differential
    }
}

enum BlockFilm {
    Lanes(Vec<(Vector2f, Spectrum)>),
    Film(Bitmap),
}

/// Balance heuristic, zero when neither strategy can produce the sample.
pub fn mis_weight(pdf_a: Float, pdf_b: Float) -> Float {
    let sum = pdf_a + pdf_b;
    if sum > 0.0 { pdf_a / sum } else { 0.0 }
}

fn diff_mis_weight(pdf_a: &DiffFloat, pdf_b: &DiffFloat) -> DiffFloat {
    pdf_a.safe_div(&(pdf_a + pdf_b))
}

// Solid-angle density `pdf` of a surface emitter hit at `si` from `from`,
// following the hit as it moves with the emitter.
fn hit_density(si: &SurfaceInteraction, from: &Vector3f, pdf: Float) -> DiffFloat {
    let to_hit = si.p().sub(&DiffVector3f::constant(*from));
    let dist2 = to_hit.dot(&to_hit);
    let cos = si.n().dot(&to_hit.normalize()).abs();
    let k = dist2 * cos.safe_recip();
    let kv = k.value();
    if pdf <= 0.0 || !(kv > 0.0) {
        return DiffFloat::constant(pdf);
    }
    k * (pdf / kv)
}

// Ratio trick: primal 1, gradient of value / primal; zero where primal is.
fn ratio(value: &DiffFloat, primal: Float) -> DiffFloat {
    if primal == 0.0 {
        return DiffFloat::constant(0.0);
    }
    DiffFloat::replace_grad(1.0, &(value * (1.0 / primal)))
}

pub struct PrbIntegrator {
    config: PrbConfig,
    response: Response,
}

impl PrbIntegrator {
    pub fn new(config: PrbConfig) -> Result<Self, RenderError> {
        config.validate()?;
        Ok(Self { config, response: Response::Image })
    }

    pub fn time_resolved(config: PrbConfig, time: TimeResolvedConfig) -> Result<Self, RenderError> {
        config.validate()?;
        time.validate()?;
        Ok(Self { config, response: Response::TimeResolved(time) })
    }

    pub fn config(&self) -> &PrbConfig {
        &self.config
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Advances all `lanes` in lockstep until every one has terminated and
    /// returns the number of bounces executed. Without `scope` this is the
    /// primal pass; with one it replays lanes cloned before the primal pass,
    /// whose radiance was then set to the primal result.
    pub fn sample(&self,
                  scene: &Scene,
                  lanes: &mut [PathState],
                  splat: &mut Splat<'_>,
                  mut scope: Option<&mut GradScope>) -> u32 {
        let mut bounces = 0;
        while bounces < self.config.max_depth && lanes.iter().any(|lane| lane.active) {
            for lane in lanes.iter_mut().filter(|lane| lane.active) {
                self.bounce(scene, lane, splat, scope.as_deref_mut());
            }
            bounces += 1;
        }
        bounces
    }

    fn bounce(&self,
              scene: &Scene,
              lane: &mut PathState,
              splat: &mut Splat<'_>,
              scope: Option<&mut GradScope>) {
        let primal = scope.is_none();
        let ctx = scope.as_ref().map_or_else(AdContext::detached, |s| s.context());
        let mut lo = DiffSpectrum::zeros();

        let si = match std::mem::replace(&mut lane.next, NextVertex::Escaped) {
            NextVertex::Hit(si) => Some(si),
            NextVertex::Escaped => None,
            NextVertex::Pending => {
                scene.ray_intersect(&ctx, &lane.ray, &DiffVector3f::constant(lane.ray.origin()))
            }
        };

        let si = match si {
            Some(si) => si,
            None => {
                self.escape(scene, &ctx, lane, splat, scope.as_deref(), &mut lo, primal);
                lane.active = false;
                Self::propagate(lane, &lo, scope);
                return;
            }
        };

        // Emission, weighted against having sampled this emitter from the previous vertex.
        if let Some((emitter_index, emitter)) = scene.emitter_at(&si) {
            if !(self.config.hide_emitters && lane.depth == 0) {
                let mis = if lane.depth == 0 || lane.prev.delta {
                    DiffFloat::constant(1.0)
                } else {
                    let ds = Scene::direction_sample_for_hit(&lane.prev.p, &si, emitter_index);
                    let em_pdf = scene.pdf_emitter_direction(&lane.prev.p, &ds);
                    diff_mis_weight(&DiffFloat::constant(lane.prev.pdf),
                                    &hit_density(&si, &lane.prev.p, em_pdf))
                };
                let le = emitter.eval(&ctx, &si).scale(&mis).component_mul_const(&lane.throughput);
                let coord = self.coordinate(lane, lane.distance + si.t().value());
                let w = self.record(splat, lane, coord, &le.value(), primal);
                Self::splat_tangent(splat, scope.as_deref(), lane, coord, &le, &w);
                lo = lo.add(&le.component_mul_const(&w));
            }
        }

        let bsdf = match scene.material(&si) {
            Some(bsdf) => bsdf,
            None => {
                lane.active = false;
                Self::propagate(lane, &lo, scope);
                return;
            }
        };
        let active_next = lane.depth + 1 < self.config.max_depth;

        // Next-event estimation.
        if active_next && bsdf.flags().is_smooth() {
            let u = lane.sampler.next_2d();
            let (ds, em_weight) = scene.sample_emitter_direction(&ctx.suspend(), &si.p_detached(), &u);
            if ds.pdf > 0.0 {
                if let Some((em_value, d, em_pdf)) = Self::reattach_emitter(scene, &ctx, &si, &ds, &em_weight) {
                    let (f, bsdf_pdf) = bsdf.eval_pdf(&ctx, &si, &si.to_local(&d));
                    let mis = if ds.delta { DiffFloat::constant(1.0) } else { diff_mis_weight(&em_pdf, &bsdf_pdf) };
                    let lr = f.component_mul(&em_value).scale(&mis).component_mul_const(&lane.throughput);
                    let coord = self.coordinate(lane, lane.distance + si.t().value() + ds.dist);
                    let w = self.record(splat, lane, coord, &lr.value(), primal);
                    Self::splat_tangent(splat, scope.as_deref(), lane, coord, &lr, &w);
                    lo = lo.add(&lr.component_mul_const(&w));
                }
            }
        }

        // Continuation, sampled with gradients detached.
        let u1 = lane.sampler.next_1d();
        let u2 = lane.sampler.next_2d();
        let (bs, bsdf_weight) = bsdf.sample(&si, u1, u2);
        let valid = bs.pdf > 0.0 && !is_black(&bsdf_weight);
        let ray = si.spawn_ray(&si.frame().to_world_detached(&bs.wo));

        let mut next = NextVertex::Escaped;
        let mut wo_exact = DiffVector3f::constant(bs.wo);
        if active_next && valid {
            if let Some(next_si) = scene.ray_intersect(&ctx, &ray, si.p()) {
                wo_exact = si.to_local(&next_si.p().sub(si.p()).normalize());
                next = NextVertex::Hit(next_si);
            }
        }

        // Everything found past this vertex went through the continuation weight.
        if !primal && valid {
            let f_det = bsdf_weight * bs.pdf;
            let f_diff = bsdf.eval_continuation(&ctx, &si, &bs, &wo_exact);
            let r = DiffSpectrum::new(ratio(&f_diff.x, f_det.x),
                                      ratio(&f_diff.y, f_det.y),
                                      ratio(&f_diff.z, f_det.z));
            lo = lo.add(&r.component_mul_const(&lane.radiance));
            if let Some(s) = scope.as_deref().filter(|s| s.is_forward()) {
                lane.prefix_tangent += s.forward_to_spectrum(&r);
            }
        }
        Self::propagate(lane, &lo, scope);

        lane.throughput = lane.throughput.component_mul(&bsdf_weight);
        lane.eta *= bs.eta;
        lane.distance += si.t().value();
        lane.prev = PrevVertex { p: si.p_detached(), pdf: bs.pdf, delta: bs.sampled_type.is_delta() };
        lane.depth += 1;
        lane.ray = ray;
        lane.next = next;

        let mut active = active_next && valid && mean_value(&lane.throughput) > 0.0;
        if let Response::TimeResolved(time) = self.response {
            active &= lane.distance <= time.max_distance();
        }
        if active && lane.depth >= self.config.rr_depth {
            let q = (max_value(&lane.throughput) * lane.eta * lane.eta).min(0.95);
            active = lane.sampler.next_1d() < q;
            if active {
                lane.throughput /= q;
            }
        }
        lane.active = active;
    }

    fn escape(&self,
              scene: &Scene,
              ctx: &AdContext,
              lane: &mut PathState,
              splat: &mut Splat<'_>,
              scope: Option<&GradScope>,
              lo: &mut DiffSpectrum,
              primal: bool) {
        let (env_index, env) = match scene.environment() {
            Some(env) => env,
            None => return,
        };
        if self.config.hide_emitters && lane.depth == 0 {
            return;
        }
        let d = lane.ray.dir();
        let mis = if lane.depth == 0 || lane.prev.delta {
            1.0
        } else {
            let ds = Scene::direction_sample_for_escape(&lane.prev.p, &d, env_index);
            mis_weight(lane.prev.pdf, scene.pdf_emitter_direction(&lane.prev.p, &ds))
        };
        let le = env.eval_direction(ctx, &d).component_mul_const(&(lane.throughput * mis));
        let coord = self.coordinate(lane, Float::INFINITY);
        let w = self.record(splat, lane, coord, &le.value(), primal);
        Self::splat_tangent(splat, scope, lane, coord, &le, &w);
        *lo = lo.add(&le.component_mul_const(&w));
    }

    /// Re-traces an emitter sample from `si`. Returns the emitter weight, whose
    /// primal value is the sampled one and whose gradient follows the sampled
    /// point re-derived on the emitter, the differentiable direction towards
    /// that point and the solid-angle density of the sample. `None` when the
    /// sample is occluded.
    fn reattach_emitter(scene: &Scene,
                        ctx: &AdContext,
                        si: &SurfaceInteraction,
                        ds: &DirectionSample,
                        em_weight: &Spectrum) -> Option<(DiffSpectrum, DiffVector3f, DiffFloat)> {
        let emitter = scene.emitters().get(ds.emitter)?;
        let ray = si.spawn_ray(&ds.d);

        if ds.is_infinite() {
            if scene.ray_test(&ray) {
                return None;
            }
            let value = if ds.delta {
                emitter.eval_delta(ctx, ds)
            } else {
                emitter.eval_direction(ctx, &ds.d)
            };
            let proxy = value.scale_const(1.0 / ds.pdf);
            return Some((Proxied::with_proxy(*em_weight, proxy).differentiable(),
                         DiffVector3f::constant(ds.d),
                         DiffFloat::constant(ds.pdf)));
        }

        let (shape_index, t) = scene.closest_hit(&ray)?;
        if scene.emitter_shape(ds.emitter) != Some(shape_index)
            || (t - ds.dist).abs() > 1e-3 * ds.dist.max(1.0) {
            return None;
        }
        let shape = &scene.objects()[shape_index].shape;
        let em_si = shape.interaction(ctx, si.p(), &ds.d, t).with_shape_index(shape_index);

        // The sampled point stays at its place on the emitter's surface, so
        // it moves with the emitter and the direction towards it turns.
        let ps = shape.sample_position(ctx, &ds.uv);
        let to_emitter = ps.p.sub(si.p());
        let dist2 = to_emitter.dot(&to_emitter);
        let d = to_emitter.normalize();
        // Solid angle per unit emitter area.
        let jacobian = ps.n.dot(&d).abs() * dist2.safe_recip();
        let j = jacobian.value();
        if !(j > 0.0) {
            return None;
        }
        let proxy = emitter.eval(ctx, &em_si).scale(&jacobian).scale_const(1.0 / (j * ds.pdf));
        let pdf = jacobian.safe_recip() * (j * ds.pdf);
        Some((Proxied::with_proxy(*em_weight, proxy).differentiable(), d, pdf))
    }

    fn coordinate(&self, lane: &PathState, distance: Float) -> Option<Vector2f> {
        match self.response {
            Response::Image => Some(lane.pos),
            Response::TimeResolved(time) => time.coordinate(distance),
        }
    }

    /// Records contribution `c` at `coord` and returns the spectral weight it
    /// enters the lane's radiance with.
    fn record(&self,
              splat: &mut Splat<'_>,
              lane: &mut PathState,
              coord: Option<Vector2f>,
              c: &Spectrum,
              primal: bool) -> Spectrum {
        let pos = match coord {
            Some(pos) => pos,
            None => return Spectrum::zeros(),
        };
        let w = match splat {
            Splat::Film(film) => {
                film.put(&pos, &c.component_mul(&lane.weight), primal);
                lane.weight
            }
            Splat::Adjoint(adjoint) => adjoint.read(&pos, true).component_mul(&lane.weight),
            Splat::Lane | Splat::Tangent(_) => lane.weight,
        };
        if primal {
            lane.radiance += w.component_mul(c);
        } else {
            lane.radiance -= w.component_mul(c);
        }
        w
    }

    /// Splats the forward derivative of contribution `c`: its own tangent
    /// plus the tangent carried by the detached path prefix.
    fn splat_tangent(splat: &mut Splat<'_>,
                     scope: Option<&GradScope>,
                     lane: &PathState,
                     coord: Option<Vector2f>,
                     c: &DiffSpectrum,
                     w: &Spectrum) {
        if let (Splat::Tangent(film), Some(scope), Some(pos)) = (splat, scope, coord) {
            let dc = scope.forward_to_spectrum(c) + c.value().component_mul(&lane.prefix_tangent);
            film.put(&pos, &dc.component_mul(w), true);
        }
    }

    fn propagate(lane: &mut PathState, lo: &DiffSpectrum, scope: Option<&mut GradScope>) {
        match scope {
            Some(scope) if scope.is_forward() => lane.differential += scope.forward_to_spectrum(lo),
            Some(scope) => scope.backward_from(&lo.sum(), 1.0),
            None => {}
        }
    }

    fn check_sensor(&self, sensor: &dyn Sensor) -> Result<(usize, usize), RenderError> {
        let (width, height) = sensor.film_size();
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidConfig { field: "film", reason: "must not be empty" });
        }
        if let Response::TimeResolved(time) = self.response {
            if (width, height) != (time.time_bins, 1) {
                return Err(RenderError::InvalidConfig {
                    field: "time_bins",
                    reason: "must match the sensor film",
                });
            }
        }
        Ok((width, height))
    }

    fn wavefront_size(&self, film: (usize, usize), settings: &RenderSettings) -> u64 {
        match self.response {
            Response::Image => film.0 as u64 * film.1 as u64 * settings.spp as u64,
            Response::TimeResolved(_) => settings.spp as u64,
        }
    }

    /// Lanes `range` of the wavefront. Image lanes are ordered pixel by pixel,
    /// `spp` consecutive lanes per pixel.
    fn spawn_lanes(&self,
                   sensor: &dyn Sensor,
                   stream: &SampleStream,
                   spp: u32,
                   range: Range<usize>) -> Vec<PathState> {
        let (width, height) = sensor.film_size();
        range.map(|index| {
            let mut sampler = stream.lane(index as u32);
            let film_offset = sampler.next_2d();
            let aperture = sampler.next_2d();
            let (pos, film_sample) = match self.response {
                Response::Image => {
                    let pixel = index / spp as usize;
                    let pos = Vector2f::new((pixel % width) as Float + film_offset.x,
                                            (pixel / width) as Float + film_offset.y);
                    (pos, Vector2f::new(pos.x / width as Float, pos.y / height as Float))
                }
                Response::TimeResolved(_) => (Vector2f::zeros(), film_offset),
            };
            let (ray, weight) = sensor.sample_ray(&AdContext::detached(), &film_sample, &aperture);
            PathState::new(sampler, ray, pos, weight.value())
        }).collect()
    }

    fn prepare(&self,
               sensor: &dyn Sensor,
               settings: &RenderSettings) -> Result<((usize, usize), SampleStream, usize), RenderError> {
        settings.validate()?;
        let film = self.check_sensor(sensor)?;
        let wavefront = self.wavefront_size(film, settings);
        let stream = SampleStream::prepare(settings.seed, wavefront)?;
        Ok((film, stream, wavefront as usize))
    }

    fn develop(film: (usize, usize), blocks: Vec<BlockFilm>, spp: u32) -> Bitmap {
        let mut image = Bitmap::new(film.0, film.1);
        for block in &blocks {
            match block {
                BlockFilm::Lanes(lanes) => {
                    for (pos, value) in lanes {
                        image.put(pos, value, true);
                    }
                }
                BlockFilm::Film(bitmap) => image.merge(bitmap),
            }
        }
        image.scale(1.0 / spp as Float);
        image
    }
}

impl Integrator for PrbIntegrator {
    fn name(&self) -> &'static str {
        match self.response {
            Response::Image => "prb",
            Response::TimeResolved(_) => "prb_time_resolved",
        }
    }

    fn render(&self,
              scene: &Scene,
              sensor: &dyn Sensor,
              settings: &RenderSettings) -> Result<Bitmap, RenderError> {
        let (film, stream, wavefront) = self.prepare(sensor, settings)?;
        log::info!("{}: rendering {}x{} at {} spp.", self.name(), film.0, film.1, settings.spp);

        let blocks = run_blocks(wavefront, BLOCK_LANES, |range| {
            let mut lanes = self.spawn_lanes(sensor, &stream, settings.spp, range);
            match self.response {
                Response::Image => {
                    self.sample(scene, &mut lanes, &mut Splat::Lane, None);
                    BlockFilm::Lanes(lanes.iter().map(|l| (l.pos, l.radiance)).collect())
                }
                Response::TimeResolved(_) => {
                    let mut bitmap = Bitmap::new(film.0, film.1);
                    self.sample(scene, &mut lanes, &mut Splat::Film(&mut bitmap), None);
                    BlockFilm::Film(bitmap)
                }
            }
        });

        let image = Self::develop(film, blocks, settings.spp);
        log::info!("{}: render done.", self.name());
        Ok(image)
    }

    fn render_forward(&self,
                      scene: &Scene,
                      sensor: &dyn Sensor,
                      settings: &RenderSettings,
                      param: &str) -> Result<Bitmap, RenderError> {
        let seed = scene.params().lookup(param)
            .ok_or_else(|| RenderError::UnknownParameter(param.to_string()))?;
        let (film, stream, wavefront) = self.prepare(sensor, settings)?;
        log::info!("{}: forward derivative of {} on {}x{} at {} spp.",
                   self.name(), param, film.0, film.1, settings.spp);

        let blocks = run_blocks(wavefront, BLOCK_LANES, |range| {
            let mut lanes = self.spawn_lanes(sensor, &stream, settings.spp, range);
            let mut replay = lanes.clone();
            self.sample(scene, &mut lanes, &mut Splat::Lane, None);
            for (r, p) in replay.iter_mut().zip(lanes.iter()) {
                r.radiance = p.radiance;
            }

            let mut scope = GradScope::forward(scene.params(), seed);
            match self.response {
                Response::Image => {
                    self.sample(scene, &mut replay, &mut Splat::Lane, Some(&mut scope));
                    BlockFilm::Lanes(replay.iter().map(|l| (l.pos, l.differential)).collect())
                }
                Response::TimeResolved(_) => {
                    let mut tangent = Bitmap::new(film.0, film.1);
                    self.sample(scene, &mut replay, &mut Splat::Tangent(&mut tangent), Some(&mut scope));
                    BlockFilm::Film(tangent)
                }
            }
        });

        let image = Self::develop(film, blocks, settings.spp);
        log::info!("{}: forward pass done.", self.name());
        Ok(image)
    }

    fn render_backward(&self,
                       scene: &Scene,
                       sensor: &dyn Sensor,
                       settings: &RenderSettings,
                       grad_in: &Bitmap) -> Result<ParamGradients, RenderError> {
        let (film, stream, wavefront) = self.prepare(sensor, settings)?;
        if grad_in.dimensions() != film {
            return Err(RenderError::GradientShape { expected: film, found: grad_in.dimensions() });
        }
        log::info!("{}: backward pass on {}x{} at {} spp, {} parameter slots.",
                   self.name(), film.0, film.1, settings.spp, scene.params().slots());

        let mut adjoint = grad_in.clone();
        adjoint.scale(1.0 / settings.spp as Float);

        let scopes = run_blocks(wavefront, BLOCK_LANES, |range| {
            let mut lanes = self.spawn_lanes(sensor, &stream, settings.spp, range);
            let mut replay = lanes.clone();
            self.sample(scene, &mut lanes, &mut Splat::Adjoint(&adjoint), None);
            for (r, p) in replay.iter_mut().zip(lanes.iter()) {
                r.radiance = p.radiance;
            }

            let mut scope = GradScope::backward(scene.params());
            self.sample(scene, &mut replay, &mut Splat::Adjoint(&adjoint), Some(&mut scope));
            scope
        });

        let mut scope = GradScope::backward(scene.params());
        for block in scopes {
            scope.merge(block);
        }
        log::info!("{}: backward pass done.", self.name());
        Ok(scope.into_gradients())
    }
}
