// Copyright @yucwang 2026

use crate::core::ad::ParamGradients;
use crate::core::error::RenderError;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::math::bitmap::Bitmap;

/// Per-call sampling settings shared by every integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub spp: u32,
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self { spp: 16, seed: 0 }
    }
}

impl RenderSettings {
    pub fn new(spp: u32, seed: u64) -> Self {
        Self { spp, seed }
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.spp == 0 {
            return Err(RenderError::InvalidConfig { field: "spp", reason: "must be positive" });
        }
        Ok(())
    }
}

pub trait Integrator: Sync {
    fn name(&self) -> &'static str;

    /// Primal image of `sensor`, averaged over `settings.spp` samples per texel.
    fn render(&self,
              scene: &Scene,
              sensor: &dyn Sensor,
              settings: &RenderSettings) -> Result<Bitmap, RenderError>;

    /// Derivative of the image along the tangent that moves parameter `param` by one.
    fn render_forward(&self,
                      _scene: &Scene,
                      _sensor: &dyn Sensor,
                      _settings: &RenderSettings,
                      _param: &str) -> Result<Bitmap, RenderError> {
        Err(RenderError::Unsupported { integrator: self.name(), operation: "render_forward" })
    }

    /// Gradient of `<grad_in, image>` with respect to every scene parameter.
    fn render_backward(&self,
                       _scene: &Scene,
                       _sensor: &dyn Sensor,
                       _settings: &RenderSettings,
                       _grad_in: &Bitmap) -> Result<ParamGradients, RenderError> {
        Err(RenderError::Unsupported { integrator: self.name(), operation: "render_backward" })
    }
}
