// Copyright @yucwang 2021

pub mod microphone;
pub mod perspective;
