// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector2f, Vector3f };

use std::ops;
use std::vec::Vec;

#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    data: Vec<Vector3f>,
    height: usize,
    width: usize
}

impl ops::Index<(usize, usize)> for Bitmap {
    type Output = Vector3f;

    fn index(&self, index: (usize, usize)) -> &Vector3f {
        assert!(index.0 < self.width && index.1 < self.height);
        &self.data[index.0 + self.width * index.1]
    }
}

impl ops::IndexMut<(usize, usize)> for Bitmap {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Vector3f {
        assert!(index.0 < self.width && index.1 < self.height);
        &mut self.data[index.0 + self.width * index.1]
    }
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        let pixel_number = width * height;
        Self { data: vec!(Vector3f::new(0.0, 0.0, 0.0);
                          pixel_number),
               width: width,
               height: height }
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> Vector3f) -> Self {
        let mut bitmap = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                bitmap[(x, y)] = f(x, y);
            }
        }
        bitmap
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[Vector3f] {
        &self.data
    }

    /// Maps a continuous film position onto a texel, `None` when it falls outside.
    pub fn texel(&self, pos: &Vector2f) -> Option<(usize, usize)> {
        if !(pos.x >= 0.0 && pos.y >= 0.0) {
            return None;
        }
        let x = pos.x.floor() as usize;
        let y = pos.y.floor() as usize;
        if x < self.width && y < self.height {
            Some((x, y))
        } else {
            None
        }
    }

    /// Adds `other` texel by texel. Both bitmaps must share dimensions.
    pub fn merge(&mut self, other: &Bitmap) {
        assert_eq!(self.dimensions(), other.dimensions());
        for (dst, src) in self.data.iter_mut().zip(other.data.iter()) {
            *dst += *src;
        }
    }

    pub fn scale(&mut self, factor: Float) {
        for v in self.data.iter_mut() {
            *v *= factor;
        }
    }

    /// Sum over all texels of the component-wise product with `other`.
    pub fn dot(&self, other: &Bitmap) -> Float {
        assert_eq!(self.dimensions(), other.dimensions());
        self.data.iter().zip(other.data.iter())
            .map(|(a, b)| a.dot(b))
            .sum()
    }
}

/* Test for Bitmap */
