// Copyright @yucwang 2021

pub mod area;
pub mod constant;
pub mod directional;
