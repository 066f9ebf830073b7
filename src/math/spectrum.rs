// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};

// Three-channel spectral value. In the image variant the channels are RGB,
// in the time-resolved variant they are three frequency bands.
pub type Spectrum = Vector3f;

pub fn is_black(s: &Spectrum) -> bool {
    s.x == 0.0 && s.y == 0.0 && s.z == 0.0
}

pub fn max_value(s: &Spectrum) -> Float {
    s.x.max(s.y).max(s.z)
}

pub fn mean_value(s: &Spectrum) -> Float {
    (s.x + s.y + s.z) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectrum_helpers() {
        let s = Spectrum::new(0.5, 2.0, 0.5);
        assert!(!is_black(&s));
        assert!(is_black(&Spectrum::zeros()));
        assert_eq!(max_value(&s), 2.0);
        assert!((mean_value(&s) - 1.0).abs() < 1e-6);
    }
}
