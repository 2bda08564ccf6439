//! Per-fragment lighting.
//!
//! The lit colour is `color * (ambient + diffuse) + highlight * specular`
//! per RGB channel. The ambient term is the model baseline plus an optional
//! rim contribution; the diffuse term is the key light's `N.L`, reduced by
//! half the specular value and rescaled into the headroom left above the
//! ambient baseline. The sky gradient, when enabled, replaces the result.

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::config::{RIM_REFLECTION_WEIGHT, RIM_UP_WEIGHT};
use crate::{DrawParams, ShadingConfig, VertexOutput};

/// Interpolated inputs of one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub eye_position: Vec3,
    pub eye_normal: Vec3,
    pub globe_normal: Vec3,
    pub eye_up: Vec3,
    pub eye_vector: Vec3,
    /// Window coordinate in pixels, origin at the bottom-left corner.
    pub frag_coord: Vec2,
    pub front_facing: bool,
}

impl Fragment {
    /// Builds a fragment from vertex-stage outputs at a pixel.
    pub fn from_varyings(varyings: &VertexOutput, frag_coord: Vec2, front_facing: bool) -> Self {
        Self {
            eye_position: varyings.eye_position,
            eye_normal: varyings.eye_normal,
            globe_normal: varyings.globe_normal,
            eye_up: varyings.eye_up,
            eye_vector: varyings.eye_vector,
            frag_coord,
            front_facing,
        }
    }

    /// Eye and globe normals renormalized and turned towards the viewer,
    /// so the inside of a cut-away shell lights like its outside.
    pub fn oriented_normals(&self) -> (Vec3, Vec3) {
        let eye = self.eye_normal.normalize_or_zero();
        let globe = self.globe_normal.normalize_or_zero();
        if self.front_facing {
            (eye, globe)
        } else {
            (-eye, -globe)
        }
    }
}

/// Final colour of a fragment.
pub fn shade(config: &ShadingConfig, fragment: &Fragment, params: &DrawParams) -> Vec4 {
    if params.gradient {
        return config
            .gradient
            .color_at(fragment.frag_coord.y, params.resolution.y);
    }
    if !params.lighting {
        return params.color;
    }
    lit_color(config, fragment, params)
}

fn lit_color(config: &ShadingConfig, fragment: &Fragment, params: &DrawParams) -> Vec4 {
    let model = &config.model;
    let specular = params.specular;
    let (normal, _) = fragment.oriented_normals();

    let mut diffuse = config
        .light
        .vector_from(fragment.eye_position)
        .dot(normal)
        .max(0.0);

    let mut highlight = 0.0;
    if model.highlight {
        highlight = model.highlight_mask(diffuse, specular);
        diffuse -= specular / 2.0;
    }

    let mut ambient = model.ambient;
    if model.rim {
        ambient += rim_fill(fragment, normal, params);
    }

    // Rescaled against the baseline, not the rim-adjusted ambient.
    let diffuse = if diffuse < 0.0 {
        0.0
    } else {
        diffuse * (1.0 - model.ambient)
    };

    let rgb = params.color.truncate() * (ambient + diffuse) + Vec3::splat(highlight * specular);
    rgb.extend(params.color.w)
}

/// Blend of the reflected view direction's height (in model space) and the
/// up-vector fill, weighted by the clamped specular value.
fn rim_fill(fragment: &Fragment, normal: Vec3, params: &DrawParams) -> f32 {
    let view = fragment.eye_vector.normalize_or_zero();
    let reflected = reflect(view, normal).normalize_or_zero();
    let reflected = params.transforms.model_view.transpose() * reflected.extend(1.0);
    let up = fragment.eye_up.normalize_or_zero().dot(normal);
    let blend = params.specular.clamp(0.0, 1.0);
    blend * reflected.y * RIM_REFLECTION_WEIGHT + (1.0 - blend) * up * RIM_UP_WEIGHT
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}
