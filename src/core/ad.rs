// Copyright @yucwang 2026

//! The small slice of automatic differentiation the integrators rely on:
//! declaring differentiable parameters, lifting them into dual values,
//! suspending tracking, and seeding forward or backward traversals.

use crate::math::constants::{Float, Vector3f};
use crate::math::dual::{DiffFloat, DiffSpectrum, Diff3, Dual};

/// Gradient slots owned by one declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId {
    offset: usize,
    width: usize,
}

impl ParamId {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

/// Registry of the differentiable parameters of a scene.
#[derive(Debug, Clone, Default)]
pub struct ParamTable {
    entries: Vec<(String, ParamId)>,
    slots: usize,
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str, width: usize) -> ParamId {
        if let Some(id) = self.lookup(name) {
            log::warn!("Parameter {} declared twice, reusing its slots.", name);
            return id;
        }
        let id = ParamId { offset: self.slots, width };
        self.slots += width;
        self.entries.push((name.to_string(), id));
        id
    }

    pub fn lookup(&self, name: &str) -> Option<ParamId> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, id)| *id)
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A scene value that may be marked differentiable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<T> {
    pub value: T,
    pub id: Option<ParamId>,
}

impl<T> Param<T> {
    pub fn fixed(value: T) -> Self {
        Self { value, id: None }
    }

    pub fn tracked(value: T, id: ParamId) -> Self {
        Self { value, id: Some(id) }
    }
}

/// Whether dual values produced right now should carry gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdContext {
    slots: usize,
    tracking: bool,
}

impl AdContext {
    pub fn detached() -> Self {
        Self { slots: 0, tracking: false }
    }

    pub fn tracking(params: &ParamTable) -> Self {
        Self { slots: params.slots(), tracking: true }
    }

    /// A copy of this context with gradient recording suspended.
    pub fn suspend(&self) -> Self {
        Self { slots: self.slots, tracking: false }
    }

    pub fn lift_float(&self, param: &Param<Float>) -> DiffFloat {
        match param.id {
            Some(id) if self.tracking => DiffFloat::variable(param.value, id.offset, self.slots),
            _ => DiffFloat::constant(param.value),
        }
    }

    pub fn lift_vector(&self, param: &Param<Vector3f>) -> Diff3 {
        match param.id {
            Some(id) if self.tracking && id.width == 3 => Diff3::new(
                DiffFloat::variable(param.value.x, id.offset, self.slots),
                DiffFloat::variable(param.value.y, id.offset + 1, self.slots),
                DiffFloat::variable(param.value.z, id.offset + 2, self.slots),
            ),
            Some(id) if self.tracking && id.width == 1 => {
                // A single slot drives all three channels.
                let k = DiffFloat::variable(1.0, id.offset, self.slots);
                Diff3::constant(param.value).scale(&k)
            }
            _ => Diff3::constant(param.value),
        }
    }
}

/// A value computed with gradients detached, paired with an optional
/// differentiable stand-in of equal primal value.
#[derive(Debug, Clone, PartialEq)]
pub struct Proxied<D: Dual> {
    pub primal: D::Primal,
    pub proxy: Option<D>,
}

impl<D: Dual> Proxied<D> {
    pub fn detached(primal: D::Primal) -> Self {
        Self { primal, proxy: None }
    }

    pub fn with_proxy(primal: D::Primal, proxy: D) -> Self {
        Self { primal, proxy: Some(proxy) }
    }

    /// The proxy when present, otherwise the primal lifted as a constant.
    /// Its primal always equals `self.primal`.
    pub fn differentiable(&self) -> D {
        match &self.proxy {
            Some(p) => p.with_primal(self.primal),
            None => D::from_primal(self.primal),
        }
    }
}

/// Request-scoped traversal state of one `render_forward`/`render_backward` call.
#[derive(Debug)]
pub struct GradScope {
    params: ParamTable,
    tangent: Vec<Float>,
    grads: Vec<Float>,
}

impl GradScope {
    pub fn backward(params: &ParamTable) -> Self {
        Self { params: params.clone(), tangent: Vec::new(), grads: vec![0.0; params.slots()] }
    }

    /// Forward scope seeded with the unit tangent of `seed` (all its slots set to 1).
    pub fn forward(params: &ParamTable, seed: ParamId) -> Self {
        let mut tangent = vec![0.0; params.slots()];
        for t in tangent.iter_mut().skip(seed.offset).take(seed.width) {
            *t = 1.0;
        }
        Self { params: params.clone(), tangent, grads: vec![0.0; params.slots()] }
    }

    /// True for scopes created by `forward`, which project gradients on a seed tangent.
    pub fn is_forward(&self) -> bool {
        !self.tangent.is_empty()
    }

    pub fn context(&self) -> AdContext {
        AdContext::tracking(&self.params)
    }

    pub fn forward_to(&self, value: &DiffFloat) -> Float {
        value.grad().iter().zip(self.tangent.iter()).map(|(g, t)| g * t).sum()
    }

    pub fn forward_to_spectrum(&self, value: &DiffSpectrum) -> Vector3f {
        Vector3f::new(self.forward_to(&value.x), self.forward_to(&value.y), self.forward_to(&value.z))
    }

    pub fn backward_from(&mut self, value: &DiffFloat, adjoint: Float) {
        if adjoint == 0.0 {
            return;
        }
        for (dst, g) in self.grads.iter_mut().zip(value.grad().iter()) {
            *dst += adjoint * g;
        }
    }

    /// Adds the gradients collected by another scope over the same parameters.
    pub fn merge(&mut self, other: GradScope) {
        for (dst, g) in self.grads.iter_mut().zip(other.grads.iter()) {
            *dst += g;
        }
    }

    pub fn into_gradients(self) -> ParamGradients {
        ParamGradients { params: self.params, values: self.grads }
    }
}

/// Gradients of a scalar objective with respect to the declared parameters.
#[derive(Debug, Clone)]
pub struct ParamGradients {
    params: ParamTable,
    values: Vec<Float>,
}

impl ParamGradients {
    pub fn get(&self, name: &str) -> Option<&[Float]> {
        let id = self.params.lookup(name)?;
        self.values.get(id.offset..id.offset + id.width)
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn as_slice(&self) -> &[Float] {
        &self.values
    }
}
