// Copyright @yucwang 2021

pub mod ad;
pub mod bsdf;
pub mod emitter;
pub mod error;
pub mod film;
pub mod integrator;
pub mod interaction;
pub mod rng;
pub mod scene;
pub mod sensor;
pub mod shape;
pub mod tangent_frame;
