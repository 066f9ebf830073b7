// Copyright @yucwang 2021

pub mod conductor;
pub mod dielectric;
pub mod lambertian_diffuse;
