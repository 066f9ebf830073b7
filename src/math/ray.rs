// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f, RAY_EPSILON};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray3f {
    origin: Vector3f,
    dir: Vector3f,
    pub min_t: Float,
    pub max_t: Float
}

impl Ray3f {
    pub fn new(o: Vector3f, d: Vector3f,
               min_t: Option<Float>, max_t: Option<Float>) -> Self {
        Self { origin: o, dir: d.normalize(),
               min_t: min_t.unwrap_or(0.0),
               max_t: max_t.unwrap_or(Float::MAX)}
    }

    /// Ray leaving a surface point, pushed off along the side of `n` that `d` points to.
    pub fn spawn(p: Vector3f, n: Vector3f, d: Vector3f) -> Self {
        let offset = if d.dot(&n) >= 0.0 { n } else { -n };
        Self::new(p + offset * RAY_EPSILON, d, Some(RAY_EPSILON), None)
    }

    /// Shadow ray from a surface point towards `target`, stopping just short of it.
    pub fn spawn_to(p: Vector3f, n: Vector3f, target: Vector3f) -> Self {
        let d = target - p;
        let dist = d.norm();
        let mut ray = Self::spawn(p, n, d);
        ray.max_t = (dist * (1.0 - 1e-3)).max(0.0);
        ray
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn dir(&self) -> Vector3f {
        self.dir
    }

    pub fn at(&self, t: Float) -> Vector3f {
        self.origin + self.dir * t
    }

    pub fn update(&mut self, t: Float) -> bool {
        if t < self.min_t || t > self.max_t {
            false
        } else {
            self.max_t = t;
            true
        }
    }

    pub fn test_segment(&self, t: Float) -> bool {
        t >= self.min_t && t <= self.max_t
    }
}

/* Tests for Ray */

#[cfg(test)]
mod tests {
    use super::Vector3f;
    use super::{Ray3f};

    #[test]
    fn test_ray3f() {
        let o = Vector3f::new(0.0, 0.0, 0.0);
        let d = Vector3f::new(1.0, 0.0, 1.0);
        let mut ray = Ray3f::new(o, d, None, None);
        assert_eq!(o, ray.origin());

        let v1 = ray.at(2.0);
        assert!((v1[0] - std::f32::consts::SQRT_2).abs() < 1e-6);
        assert!((v1[1] - 0.0).abs() < 1e-6);
        assert!((v1[2] - std::f32::consts::SQRT_2).abs() < 1e-6);

        let status1 = ray.update(100.0);
        let status2 = ray.update(105.0);
        assert_eq!(status1, true);
        assert_eq!(status2, false);
    }

    #[test]
    fn test_spawn_offsets_to_direction_side() {
        let n = Vector3f::new(0.0, 0.0, 1.0);
        let up = Ray3f::spawn(Vector3f::zeros(), n, Vector3f::new(0.0, 0.0, 1.0));
        let down = Ray3f::spawn(Vector3f::zeros(), n, Vector3f::new(0.0, 0.0, -1.0));
        assert!(up.origin().z > 0.0);
        assert!(down.origin().z < 0.0);

        let shadow = Ray3f::spawn_to(Vector3f::zeros(), n, Vector3f::new(0.0, 0.0, 2.0));
        assert!(shadow.max_t < 2.0 && shadow.max_t > 1.9);
    }
}
