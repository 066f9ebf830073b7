// Copyright @yucwang 2026

use crate::core::error::RenderError;
use crate::math::constants::{Float, Vector2f};

const PCG_MULT: u64 = 6364136223846793005;

fn mix64(mut v: u64) -> u64 {
    v ^= v >> 31;
    v = v.wrapping_mul(0x7fb5d329728ea185);
    v ^= v >> 27;
    v = v.wrapping_mul(0x81dadef4bc2dd44d);
    v ^ (v >> 33)
}

/// PCG32 stream owned by one sample lane. Cloning it replays the exact
/// same sequence of decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndependentSampler {
    state: u64,
    inc: u64,
}

impl IndependentSampler {
    pub fn new(seed: u64, stream: u64) -> Self {
        let mut rng = Self { state: 0, inc: (stream << 1) | 1 };
        rng.next_u32();
        rng.state = rng.state.wrapping_add(mix64(seed));
        rng.next_u32();
        rng
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.state = old.wrapping_mul(PCG_MULT).wrapping_add(self.inc);
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform sample in `[0, 1)`.
    pub fn next_1d(&mut self) -> Float {
        // 24 random mantissa bits keep the result strictly below one.
        (self.next_u32() >> 8) as Float * (1.0 / (1u32 << 24) as Float)
    }

    pub fn next_2d(&mut self) -> Vector2f {
        let u = self.next_1d();
        let v = self.next_1d();
        Vector2f::new(u, v)
    }
}

/// Seeding information shared by all lanes of one wavefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleStream {
    seed: u64,
    wavefront_size: u32,
}

impl SampleStream {
    /// Validates that every lane of the wavefront has an addressable index.
    pub fn prepare(seed: u64, wavefront_size: u64) -> Result<Self, RenderError> {
        if wavefront_size > u32::MAX as u64 {
            return Err(RenderError::SamplerExhausted { requested: wavefront_size });
        }
        Ok(Self { seed, wavefront_size: wavefront_size as u32 })
    }

    pub fn wavefront_size(&self) -> u32 {
        self.wavefront_size
    }

    pub fn lane(&self, index: u32) -> IndependentSampler {
        debug_assert!(index < self.wavefront_size);
        IndependentSampler::new(self.seed, index as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_in_unit_interval() {
        let mut rng = IndependentSampler::new(7, 3);
        let mut sum = 0.0;
        for _ in 0..10000 {
            let u = rng.next_1d();
            assert!(u >= 0.0 && u < 1.0);
            sum += u;
        }
        assert!((sum / 10000.0 - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_clone_replays_stream() {
        let mut a = IndependentSampler::new(1, 42);
        a.next_2d();
        let mut b = a.clone();
        for _ in 0..16 {
            assert_eq!(a.next_1d(), b.next_1d());
        }
    }

    #[test]
    fn test_lanes_are_decorrelated() {
        let stream = SampleStream::prepare(5, 2).unwrap();
        let mut a = stream.lane(0);
        let mut b = stream.lane(1);
        let same = (0..32).filter(|_| a.next_u32() == b.next_u32()).count();
        assert!(same < 2);
    }

    #[test]
    fn test_prepare_rejects_oversized_wavefront() {
        let err = SampleStream::prepare(0, u32::MAX as u64 + 1).unwrap_err();
        assert_eq!(err, RenderError::SamplerExhausted { requested: u32::MAX as u64 + 1 });
        assert!(SampleStream::prepare(0, u32::MAX as u64).is_ok());
    }
}
