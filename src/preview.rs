use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};
use log::info;

use crate::{DrawParams, Fragment, GlobeShader, Transforms, Vertex};

/// Distance from the eye to the globe centre.
const EYE_DISTANCE: f32 = 3.0;

/// Settings of a CPU preview render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewOptions {
    /// Width and height of the square image in pixels.
    pub size: u32,
    /// Globe radius as a fraction of the half-extent of the view.
    pub radius: f32,
    pub color: Vec4,
    pub specular: f32,
    pub lighting: bool,
    /// Paint only the sky ramp.
    pub gradient_only: bool,
    /// Show the inside of the far hemisphere, as seen through a cutaway.
    pub back_faces: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            size: 256,
            radius: 0.8,
            color: Vec4::new(0.35, 0.55, 0.85, 1.0),
            specular: 0.5,
            lighting: true,
            gradient_only: false,
            back_faces: false,
        }
    }
}

/// Shades an orthographic view of a unit globe over the sky gradient.
///
/// Each covered pixel runs the vertex stage on the exact sphere point under
/// it, so no interpolation error enters the preview.
pub fn render_preview(shader: &GlobeShader, options: &PreviewOptions) -> Result<RgbaImage> {
    if options.size == 0 {
        return Err(anyhow!("preview size must be at least one pixel"));
    }
    if !(options.radius > 0.0 && options.radius <= 1.0) {
        return Err(anyhow!(
            "preview radius must lie in (0, 1], got {}",
            options.radius
        ));
    }

    let size = options.size as f32;
    let transforms = Transforms::new(
        Mat4::from_translation(Vec3::new(0.0, 0.0, -EYE_DISTANCE)),
        Mat4::orthographic_rh_gl(-1.0, 1.0, -1.0, 1.0, 0.1, 2.0 * EYE_DISTANCE),
    )
    .context("preview transforms are degenerate")?;

    let globe = DrawParams::new(options.color, transforms, Vec2::splat(size))
        .with_specular(options.specular)
        .with_lighting(options.lighting);
    let sky = &shader.config().gradient;

    let mut covered = 0u32;
    let image = RgbaImage::from_fn(options.size, options.size, |x, y| {
        // Image rows run downwards; fragment coordinates run upwards.
        let frag_coord = Vec2::new(x as f32 + 0.5, size - y as f32 - 0.5);
        let ndc = frag_coord / size * 2.0 - Vec2::ONE;
        let on_globe = ndc / options.radius;
        let color = match sphere_vertex(on_globe, options.back_faces) {
            Some(vertex) if !options.gradient_only => {
                covered += 1;
                let varyings = shader.vertex(&vertex, &globe);
                let fragment = Fragment::from_varyings(&varyings, frag_coord, !options.back_faces);
                shader.fragment(&fragment, &globe)
            }
            _ => sky.color_at(frag_coord.y, size),
        };
        Rgba(to_rgba8(color))
    });

    info!(
        "rendered {size}x{size} preview, {covered} globe pixels ({model:?})",
        size = options.size,
        model = shader.config().model
    );
    Ok(image)
}

/// Point on the unit sphere under a view-plane position, if any.
fn sphere_vertex(point: Vec2, far_side: bool) -> Option<Vertex> {
    let depth_squared = 1.0 - point.length_squared();
    if depth_squared < 0.0 {
        return None;
    }
    let depth = depth_squared.sqrt();
    let position = if far_side {
        point.extend(-depth)
    } else {
        point.extend(depth)
    };
    Some(Vertex::new(position, position))
}

/// Quantizes a shaded colour for an 8-bit colour attachment.
pub fn to_rgba8(color: Vec4) -> [u8; 4] {
    let scaled = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    [
        scaled.x as u8,
        scaled.y as u8,
        scaled.z as u8,
        scaled.w as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GradientRamp;
    use crate::{ShadingConfig, ShadingModel};

    fn options(size: u32) -> PreviewOptions {
        PreviewOptions {
            size,
            ..PreviewOptions::default()
        }
    }

    #[test]
    fn corners_show_the_sky_gradient() {
        let shader = GlobeShader::default();
        let image = render_preview(&shader, &options(64)).unwrap();
        let ramp = GradientRamp::default();
        let bottom = to_rgba8(ramp.color_at(0.5, 64.0));
        let top = to_rgba8(ramp.color_at(63.5, 64.0));
        assert_eq!(image.get_pixel(0, 63).0, bottom);
        assert_eq!(image.get_pixel(0, 0).0, top);
    }

    #[test]
    fn gradient_only_paints_every_row_with_the_ramp() {
        let shader = GlobeShader::default();
        let mut options = options(16);
        options.gradient_only = true;
        let image = render_preview(&shader, &options).unwrap();
        let ramp = GradientRamp::default();
        for y in 0..16 {
            let expected = to_rgba8(ramp.color_at(16.0 - y as f32 - 0.5, 16.0));
            assert_eq!(image.get_pixel(8, y).0, expected);
            assert_eq!(image.get_pixel(0, y).0, expected);
        }
    }

    #[test]
    fn globe_centre_is_lit_with_the_surface_color() {
        let shader = GlobeShader::new(ShadingConfig::with_model(ShadingModel::CLASSIC));
        let mut options = options(33);
        options.color = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let image = render_preview(&shader, &options).unwrap();
        let centre = image.get_pixel(16, 16).0;
        assert!(centre[0] > 200);
        assert_eq!(centre[1], 0);
        assert_eq!(centre[2], 0);
        assert_eq!(centre[3], 255);
    }

    #[test]
    fn unlit_globe_is_flat() {
        let shader = GlobeShader::default();
        let mut options = options(32);
        options.lighting = false;
        let image = render_preview(&shader, &options).unwrap();
        let expected = to_rgba8(options.color);
        assert_eq!(image.get_pixel(16, 16).0, expected);
        assert_eq!(image.get_pixel(10, 20).0, expected);
    }

    #[test]
    fn cutaway_interior_is_lit_like_the_outside() {
        let shader = GlobeShader::new(ShadingConfig::with_model(ShadingModel::CLASSIC));
        let outside = render_preview(&shader, &options(33)).unwrap();
        let mut inside_options = options(33);
        inside_options.back_faces = true;
        let inside = render_preview(&shader, &inside_options).unwrap();
        // Dead centre the flipped far-side normal points straight at the eye.
        assert_eq!(outside.get_pixel(16, 16), inside.get_pixel(16, 16));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let shader = GlobeShader::default();
        assert!(render_preview(&shader, &options(0)).is_err());
        let mut options = options(8);
        options.radius = 1.5;
        assert!(render_preview(&shader, &options).is_err());
    }

    #[test]
    fn quantization_clamps() {
        assert_eq!(to_rgba8(Vec4::new(1.2, -0.1, 0.5, 1.0)), [255, 0, 128, 255]);
    }
}
