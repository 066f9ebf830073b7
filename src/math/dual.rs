// Copyright @yucwang 2026

//! Forward-mode dual numbers over the scene's parameter slots.
//!
//! A `DiffFloat` carries its primal value and the dense gradient of that value
//! with respect to every declared parameter slot. An empty gradient means the
//! value is a constant, so detached arithmetic never allocates.

use super::constants::{Float, Vector3f};
use std::ops::{Add, Div, Mul, Neg, Sub};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffFloat {
    v: Float,
    g: Vec<Float>,
}

// ka * a + kb * b over gradients of possibly different lengths.
fn axpby(ka: Float, a: &[Float], kb: Float, b: &[Float]) -> Vec<Float> {
    if a.is_empty() && b.is_empty() {
        return Vec::new();
    }
    let n = a.len().max(b.len());
    (0..n)
        .map(|i| {
            let ai = a.get(i).copied().unwrap_or(0.0);
            let bi = b.get(i).copied().unwrap_or(0.0);
            ka * ai + kb * bi
        })
        .collect()
}

fn scaled(k: Float, a: &[Float]) -> Vec<Float> {
    a.iter().map(|v| k * v).collect()
}

impl DiffFloat {
    pub fn constant(v: Float) -> Self {
        Self { v, g: Vec::new() }
    }

    /// A value whose gradient is the unit vector of `slot` among `slots` slots.
    pub fn variable(v: Float, slot: usize, slots: usize) -> Self {
        let mut g = vec![0.0; slots.max(slot + 1)];
        g[slot] = 1.0;
        Self { v, g }
    }

    pub fn value(&self) -> Float {
        self.v
    }

    pub fn grad(&self) -> &[Float] {
        &self.g
    }

    pub fn has_grad(&self) -> bool {
        self.g.iter().any(|v| *v != 0.0)
    }

    pub fn detach(&self) -> Self {
        Self::constant(self.v)
    }

    /// Keeps the primal `value` but takes the gradient of `proxy`.
    pub fn replace_grad(value: Float, proxy: &DiffFloat) -> Self {
        Self { v: value, g: proxy.g.clone() }
    }

    pub fn sqrt(&self) -> Self {
        let v = self.v.max(0.0).sqrt();
        let k = if v > 0.0 { 0.5 / v } else { 0.0 };
        Self { v, g: scaled(k, &self.g) }
    }

    pub fn abs(&self) -> Self {
        if self.v < 0.0 { -self } else { self.clone() }
    }

    /// `1 / self`, or 0 with zero gradient when `self == 0`.
    pub fn safe_recip(&self) -> Self {
        if self.v == 0.0 {
            return Self::constant(0.0);
        }
        let r = 1.0 / self.v;
        Self { v: r, g: scaled(-r * r, &self.g) }
    }

    /// `self / den`, or 0 when `den == 0`.
    pub fn safe_div(&self, den: &DiffFloat) -> Self {
        if den.v == 0.0 {
            return Self::constant(0.0);
        }
        self / den
    }
}

impl From<Float> for DiffFloat {
    fn from(v: Float) -> Self {
        Self::constant(v)
    }
}

impl<'a, 'b> Add<&'b DiffFloat> for &'a DiffFloat {
    type Output = DiffFloat;
    fn add(self, rhs: &'b DiffFloat) -> DiffFloat {
        DiffFloat { v: self.v + rhs.v, g: axpby(1.0, &self.g, 1.0, &rhs.g) }
    }
}

impl<'a, 'b> Sub<&'b DiffFloat> for &'a DiffFloat {
    type Output = DiffFloat;
    fn sub(self, rhs: &'b DiffFloat) -> DiffFloat {
        DiffFloat { v: self.v - rhs.v, g: axpby(1.0, &self.g, -1.0, &rhs.g) }
    }
}

impl<'a, 'b> Mul<&'b DiffFloat> for &'a DiffFloat {
    type Output = DiffFloat;
    fn mul(self, rhs: &'b DiffFloat) -> DiffFloat {
        DiffFloat { v: self.v * rhs.v, g: axpby(rhs.v, &self.g, self.v, &rhs.g) }
    }
}

impl<'a, 'b> Div<&'b DiffFloat> for &'a DiffFloat {
    type Output = DiffFloat;
    fn div(self, rhs: &'b DiffFloat) -> DiffFloat {
        let inv = 1.0 / rhs.v;
        let v = self.v * inv;
        DiffFloat { v, g: axpby(inv, &self.g, -v * inv, &rhs.g) }
    }
}

impl<'a> Neg for &'a DiffFloat {
    type Output = DiffFloat;
    fn neg(self) -> DiffFloat {
        DiffFloat { v: -self.v, g: scaled(-1.0, &self.g) }
    }
}

impl<'a> Mul<Float> for &'a DiffFloat {
    type Output = DiffFloat;
    fn mul(self, rhs: Float) -> DiffFloat {
        DiffFloat { v: self.v * rhs, g: scaled(rhs, &self.g) }
    }
}

impl<'a> Add<Float> for &'a DiffFloat {
    type Output = DiffFloat;
    fn add(self, rhs: Float) -> DiffFloat {
        DiffFloat { v: self.v + rhs, g: self.g.clone() }
    }
}

macro_rules! forward_owned_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<DiffFloat> for DiffFloat {
            type Output = DiffFloat;
            fn $method(self, rhs: DiffFloat) -> DiffFloat {
                (&self).$method(&rhs)
            }
        }
        impl<'a> $imp<&'a DiffFloat> for DiffFloat {
            type Output = DiffFloat;
            fn $method(self, rhs: &'a DiffFloat) -> DiffFloat {
                (&self).$method(rhs)
            }
        }
        impl<'a> $imp<DiffFloat> for &'a DiffFloat {
            type Output = DiffFloat;
            fn $method(self, rhs: DiffFloat) -> DiffFloat {
                self.$method(&rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);
forward_owned_binop!(Div, div);

impl Neg for DiffFloat {
    type Output = DiffFloat;
    fn neg(self) -> DiffFloat {
        -&self
    }
}

impl Mul<Float> for DiffFloat {
    type Output = DiffFloat;
    fn mul(self, rhs: Float) -> DiffFloat {
        &self * rhs
    }
}

/// Three dual numbers, used both as a position/direction and as a spectrum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diff3 {
    pub x: DiffFloat,
    pub y: DiffFloat,
    pub z: DiffFloat,
}

pub type DiffVector3f = Diff3;
pub type DiffSpectrum = Diff3;

impl Diff3 {
    pub fn new(x: DiffFloat, y: DiffFloat, z: DiffFloat) -> Self {
        Self { x, y, z }
    }

    pub fn constant(v: Vector3f) -> Self {
        Self::new(v.x.into(), v.y.into(), v.z.into())
    }

    pub fn zeros() -> Self {
        Self::constant(Vector3f::zeros())
    }

    pub fn value(&self) -> Vector3f {
        Vector3f::new(self.x.value(), self.y.value(), self.z.value())
    }

    pub fn detach(&self) -> Self {
        Self::constant(self.value())
    }

    pub fn has_grad(&self) -> bool {
        self.x.has_grad() || self.y.has_grad() || self.z.has_grad()
    }

    pub fn map(&self, f: impl Fn(&DiffFloat) -> DiffFloat) -> Self {
        Self::new(f(&self.x), f(&self.y), f(&self.z))
    }

    pub fn add(&self, rhs: &Diff3) -> Self {
        Self::new(&self.x + &rhs.x, &self.y + &rhs.y, &self.z + &rhs.z)
    }

    pub fn sub(&self, rhs: &Diff3) -> Self {
        Self::new(&self.x - &rhs.x, &self.y - &rhs.y, &self.z - &rhs.z)
    }

    pub fn neg(&self) -> Self {
        self.map(|v| -v)
    }

    pub fn add_const(&self, rhs: &Vector3f) -> Self {
        Self::new(&self.x + rhs.x, &self.y + rhs.y, &self.z + rhs.z)
    }

    pub fn scale(&self, k: &DiffFloat) -> Self {
        self.map(|v| v * k)
    }

    pub fn scale_const(&self, k: Float) -> Self {
        self.map(|v| v * k)
    }

    pub fn component_mul(&self, rhs: &Diff3) -> Self {
        Self::new(&self.x * &rhs.x, &self.y * &rhs.y, &self.z * &rhs.z)
    }

    pub fn component_mul_const(&self, rhs: &Vector3f) -> Self {
        Self::new(&self.x * rhs.x, &self.y * rhs.y, &self.z * rhs.z)
    }

    pub fn dot(&self, rhs: &Diff3) -> DiffFloat {
        &self.x * &rhs.x + &self.y * &rhs.y + &self.z * &rhs.z
    }

    pub fn dot_const(&self, rhs: &Vector3f) -> DiffFloat {
        &self.x * rhs.x + &self.y * rhs.y + &self.z * rhs.z
    }

    pub fn cross(&self, rhs: &Diff3) -> Self {
        Self::new(
            &self.y * &rhs.z - &self.z * &rhs.y,
            &self.z * &rhs.x - &self.x * &rhs.z,
            &self.x * &rhs.y - &self.y * &rhs.x,
        )
    }

    pub fn sum(&self) -> DiffFloat {
        &self.x + &self.y + &self.z
    }

    pub fn norm(&self) -> DiffFloat {
        self.dot(self).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let inv = self.norm().safe_recip();
        self.scale(&inv)
    }
}

/// A dual value viewed through its primal part.
pub trait Dual: Clone {
    type Primal: Copy + std::fmt::Debug + PartialEq;

    fn primal(&self) -> Self::Primal;

    fn from_primal(v: Self::Primal) -> Self;

    /// `v` carrying the gradient of `self`.
    fn with_primal(&self, v: Self::Primal) -> Self;
}

impl Dual for DiffFloat {
    type Primal = Float;

    fn primal(&self) -> Float {
        self.value()
    }

    fn from_primal(v: Float) -> Self {
        DiffFloat::constant(v)
    }

    fn with_primal(&self, v: Float) -> Self {
        DiffFloat::replace_grad(v, self)
    }
}

impl Dual for Diff3 {
    type Primal = Vector3f;

    fn primal(&self) -> Vector3f {
        self.value()
    }

    fn from_primal(v: Vector3f) -> Self {
        Diff3::constant(v)
    }

    fn with_primal(&self, v: Vector3f) -> Self {
        Diff3::new(self.x.with_primal(v.x), self.y.with_primal(v.y), self.z.with_primal(v.z))
    }
}
