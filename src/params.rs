use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::Transforms;

/// Per-draw uniforms. Read-only while a draw is shaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawParams {
    /// Base surface colour (RGBA).
    pub color: Vec4,
    /// Specular intensity, nominally in `[0, 1]`. Values above 1 saturate
    /// the rim blend towards the reflected-view term.
    pub specular: f32,
    pub lighting: bool,
    /// Replaces the shaded colour with the sky ramp.
    pub gradient: bool,
    /// Viewport size in pixels.
    pub resolution: Vec2,
    pub transforms: Transforms,
}

impl DrawParams {
    pub fn new(color: Vec4, transforms: Transforms, resolution: Vec2) -> Self {
        Self {
            color,
            specular: 0.0,
            lighting: true,
            gradient: false,
            resolution,
            transforms,
        }
    }

    pub fn with_specular(mut self, specular: f32) -> Self {
        self.specular = specular;
        self
    }

    pub fn with_lighting(mut self, lighting: bool) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn with_gradient(mut self, gradient: bool) -> Self {
        self.gradient = gradient;
        self
    }
}

impl Default for DrawParams {
    fn default() -> Self {
        Self::new(Vec4::ONE, Transforms::default(), Vec2::ONE)
    }
}
