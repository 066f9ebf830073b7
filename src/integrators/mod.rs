// Copyright @yucwang 2021

pub mod path;
pub mod prb;

#[cfg(test)]
pub(crate) mod fixtures;
