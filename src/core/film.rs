// Copyright @yucwang 2026

use crate::math::bitmap::Bitmap;
use crate::math::constants::Vector2f;
use crate::math::spectrum::Spectrum;

/// Splatting target addressed by continuous film coordinates.
pub trait ImageAccumulator {
    /// Adds `value` at `pos`. Inactive lanes and positions off the film are dropped.
    fn put(&mut self, pos: &Vector2f, value: &Spectrum, active: bool);

    /// Value stored at `pos`, zero when inactive or off the film.
    fn read(&self, pos: &Vector2f, active: bool) -> Spectrum;
}

impl ImageAccumulator for Bitmap {
    fn put(&mut self, pos: &Vector2f, value: &Spectrum, active: bool) {
        if !active {
            return;
        }
        if let Some(texel) = self.texel(pos) {
            self[texel] += value;
        }
    }

    fn read(&self, pos: &Vector2f, active: bool) -> Spectrum {
        if !active {
            return Spectrum::zeros();
        }
        match self.texel(pos) {
            Some(texel) => self[texel],
            None => Spectrum::zeros(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_accumulates_and_drops_outside() {
        let mut film = Bitmap::new(4, 2);
        let value = Spectrum::new(1.0, 2.0, 3.0);
        film.put(&Vector2f::new(1.5, 0.5), &value, true);
        film.put(&Vector2f::new(1.2, 0.9), &value, true);
        film.put(&Vector2f::new(1.5, 0.5), &value, false);
        film.put(&Vector2f::new(4.5, 0.5), &value, true);
        film.put(&Vector2f::new(-0.5, 0.5), &value, true);

        assert_eq!(film[(1, 0)], value * 2.0);
        assert_eq!(film.read(&Vector2f::new(1.9, 0.1), true), value * 2.0);
        assert_eq!(film.read(&Vector2f::new(1.9, 0.1), false), Spectrum::zeros());
        assert_eq!(film.read(&Vector2f::new(9.0, 0.1), true), Spectrum::zeros());
        let total: Spectrum = film.data().iter().sum();
        assert_eq!(total, value * 2.0);
    }
}
