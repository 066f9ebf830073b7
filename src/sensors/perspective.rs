// Copyright @yucwang 2026

use crate::core::ad::AdContext;
use crate::core::sensor::Sensor;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::dual::DiffSpectrum;
use crate::math::ray::Ray3f;
use crate::math::spectrum::Spectrum;

pub struct PerspectiveCamera {
    origin: Vector3f,
    forward: Vector3f,
    right: Vector3f,
    up: Vector3f,
    tan_half_fov_y: Float,
    aspect: Float,
    near_clip: Float,
    far_clip: Float,
    width: usize,
    height: usize,
}

impl PerspectiveCamera {
    pub fn new(origin: Vector3f,
               target: Vector3f,
               up: Vector3f,
               fov_y_radians: Float,
               width: usize,
               height: usize,
               near_clip: Float,
               far_clip: Float) -> Self {
        let forward = (target - origin).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward).normalize();
        let aspect = if height > 0 { width as Float / height as Float } else { 1.0 };

        Self {
            origin,
            forward,
            right,
            up,
            tan_half_fov_y: (0.5 * fov_y_radians).tan(),
            aspect,
            near_clip,
            far_clip,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

impl Sensor for PerspectiveCamera {
    fn film_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn sample_ray(&self,
                  _ctx: &AdContext,
                  film_sample: &Vector2f,
                  _aperture_sample: &Vector2f) -> (Ray3f, DiffSpectrum) {
        let px = (2.0 * film_sample.x - 1.0) * self.aspect * self.tan_half_fov_y;
        let py = (1.0 - 2.0 * film_sample.y) * self.tan_half_fov_y;

        let d_camera = Vector3f::new(px, py, 1.0).normalize();
        let dir = (self.right * d_camera.x + self.up * d_camera.y + self.forward * d_camera.z).normalize();

        let inv_z = 1.0 / d_camera.z;
        let near_t = self.near_clip * inv_z;
        let far_t = self.far_clip * inv_z;
        let origin = self.origin + dir * near_t;
        let ray = Ray3f::new(origin, dir, Some(0.0), Some((far_t - near_t).max(0.0)));
        (ray, DiffSpectrum::constant(Spectrum::new(1.0, 1.0, 1.0)))
    }

    fn describe(&self) -> String {
        format!("PerspectiveCamera [{}x{}, origin {:?}]", self.width, self.height, self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perspective_camera_center_ray() {
        let origin = Vector3f::new(0.0, 0.0, 0.0);
        let target = Vector3f::new(0.0, 0.0, -1.0);
        let up = Vector3f::new(0.0, 1.0, 0.0);
        let fov_y = std::f32::consts::FRAC_PI_2;
        let cam = PerspectiveCamera::new(origin, target, up, fov_y, 4, 4, 0.0, Float::MAX);

        let (ray, weight) = cam.sample_ray(&AdContext::detached(), &Vector2f::new(0.5, 0.5),
                                           &Vector2f::new(0.5, 0.5));
        let dir = ray.dir();

        assert!((dir.x - 0.0).abs() < 1e-6);
        assert!((dir.y - 0.0).abs() < 1e-6);
        assert!((dir.z + 1.0).abs() < 1e-6);
        assert_eq!(weight.value(), Spectrum::new(1.0, 1.0, 1.0));
        assert_eq!(cam.film_size(), (4, 4));
    }

    #[test]
    fn test_film_top_maps_to_camera_up() {
        let cam = PerspectiveCamera::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0),
                                         Vector3f::new(0.0, 1.0, 0.0),
                                         std::f32::consts::FRAC_PI_2, 8, 4, 0.0, Float::MAX);
        let (ray, _) = cam.sample_ray(&AdContext::detached(), &Vector2f::new(0.5, 0.0),
                                      &Vector2f::zeros());
        assert!(ray.dir().y > 0.0);
        assert!(((ray.dir().y / ray.dir().z) - 1.0).abs() < 1e-5);
    }
}
