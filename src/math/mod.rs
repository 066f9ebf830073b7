// Copyright 2020 @TwoCookingMice

pub mod bitmap;
pub mod constants;
pub mod dual;
pub mod ray;
pub mod transform;
pub mod spectrum;
pub mod warp;
