// Copyright @yucwang 2026

use crate::math::constants::Vector3f;
use crate::math::dual::DiffVector3f;

/// Shading frame whose axes follow a differentiable normal.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingFrame {
    pub s: DiffVector3f,
    pub t: DiffVector3f,
    pub n: DiffVector3f,
}

impl ShadingFrame {
    pub fn new(n: &DiffVector3f) -> Self {
        let nv = n.value();
        let up = if nv.z.abs() < 0.999 {
            Vector3f::new(0.0, 0.0, 1.0)
        } else {
            Vector3f::new(1.0, 0.0, 0.0)
        };
        let s = n.cross(&DiffVector3f::constant(up)).normalize();
        let t = n.cross(&s).normalize();
        Self { s, t, n: n.clone() }
    }

    pub fn to_local(&self, v: &DiffVector3f) -> DiffVector3f {
        DiffVector3f::new(v.dot(&self.s), v.dot(&self.t), v.dot(&self.n))
    }

    /// Detached counterpart used by sampling routines.
    pub fn to_local_detached(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.s.value()), v.dot(&self.t.value()), v.dot(&self.n.value()))
    }

    pub fn to_world_detached(&self, v: &Vector3f) -> Vector3f {
        self.s.value() * v.x + self.t.value() * v.y + self.n.value() * v.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_round_trip() {
        let n = Vector3f::new(0.3, -0.4, 0.866).normalize();
        let frame = ShadingFrame::new(&DiffVector3f::constant(n));
        let v = Vector3f::new(0.1, 0.7, -0.2);
        let back = frame.to_world_detached(&frame.to_local_detached(&v));
        assert!((back - v).norm() < 1e-5);
        assert!((frame.to_local_detached(&n) - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-5);
    }
}
