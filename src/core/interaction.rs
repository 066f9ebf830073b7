// Copyright @yucwang 2023

use crate::core::tangent_frame::ShadingFrame;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::dual::{ DiffFloat, DiffVector3f };
use crate::math::ray::Ray3f;

/// Surface hit produced by the intersector. Position and normal are dual
/// values so that geometry parameters reach everything derived from them.
#[derive(Debug, Clone)]
pub struct SurfaceInteraction {
    t: DiffFloat,
    p: DiffVector3f,
    n: DiffVector3f,
    uv: Vector2f,
    frame: ShadingFrame,
    wi: Vector3f,
    shape_index: Option<usize>,
}

impl SurfaceInteraction {
    /// `n` must be unit length; `ray_dir` is the direction of the ray that found the hit.
    pub fn new(t: DiffFloat,
               p: DiffVector3f,
               n: DiffVector3f,
               uv: Vector2f,
               ray_dir: &Vector3f) -> Self {
        let frame = ShadingFrame::new(&n);
        let wi = frame.to_local_detached(&(-ray_dir));
        Self { t, p, n, uv, frame, wi, shape_index: None }
    }

    pub fn with_shape_index(mut self, shape_index: usize) -> Self {
        self.shape_index = Some(shape_index);
        self
    }

    pub fn t(&self) -> &DiffFloat {
        &self.t
    }

    pub fn p(&self) -> &DiffVector3f {
        &self.p
    }

    pub fn n(&self) -> &DiffVector3f {
        &self.n
    }

    pub fn p_detached(&self) -> Vector3f {
        self.p.value()
    }

    pub fn n_detached(&self) -> Vector3f {
        self.n.value()
    }

    pub fn uv(&self) -> Vector2f {
        self.uv
    }

    pub fn frame(&self) -> &ShadingFrame {
        &self.frame
    }

    /// Direction towards the previous vertex, in the local shading frame.
    pub fn wi(&self) -> Vector3f {
        self.wi
    }

    /// True when the incoming ray arrived on the side the normal points to.
    pub fn is_front_facing(&self) -> bool {
        self.wi.z > 0.0
    }

    pub fn shape_index(&self) -> Option<usize> {
        self.shape_index
    }

    pub fn to_local(&self, d: &DiffVector3f) -> DiffVector3f {
        self.frame.to_local(d)
    }

    pub fn spawn_ray(&self, d: &Vector3f) -> Ray3f {
        Ray3f::spawn(self.p_detached(), self.n_detached(), *d)
    }

    pub fn spawn_ray_to(&self, target: &Vector3f) -> Ray3f {
        Ray3f::spawn_to(self.p_detached(), self.n_detached(), *target)
    }
}

/// Point sampled on a surface, with density per unit area.
#[derive(Debug, Clone)]
pub struct PositionSample {
    pub p: DiffVector3f,
    pub n: DiffVector3f,
    pub pdf: Float,
    pub delta: bool,
}

/// Direction sampled from a reference point towards an emitter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectionSample {
    /// Sampled position; meaningless for emitters at infinity.
    pub p: Vector3f,
    pub n: Vector3f,
    /// Unit direction from the reference point to `p`.
    pub d: Vector3f,
    /// Distance to `p`, infinite for emitters at infinity.
    pub dist: Float,
    /// Solid-angle density including emitter selection. Delta emitters report
    /// their selection probability alone.
    pub pdf: Float,
    pub delta: bool,
    pub emitter: usize,
    /// Surface sample the position was drawn from, for emitters with a shape.
    pub uv: Vector2f,
}

impl DirectionSample {
    pub fn is_infinite(&self) -> bool {
        !self.dist.is_finite()
    }
}
