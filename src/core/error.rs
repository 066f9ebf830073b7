// Copyright @yucwang 2026

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum RenderError {
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    #[error("{operation} is not supported by the {integrator} integrator")]
    Unsupported {
        integrator: &'static str,
        operation: &'static str,
    },

    #[error("wavefront of {requested} samples exceeds the addressable sample-index range")]
    SamplerExhausted { requested: u64 },

    #[error("gradient image is {found:?} but the sensor film is {expected:?}")]
    GradientShape {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
}
