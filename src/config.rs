use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use glam::{Vec3, Vec4};
use log::debug;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

/// Key light direction in eye space.
pub const DEFAULT_LIGHT_DIRECTION: Vec3 = Vec3::new(0.5, -0.7, 1.5);
/// Distance along the key light direction used by the positional light form.
pub const DEFAULT_LIGHT_DISTANCE: f32 = 10.0;
/// Colour of the sky gradient at the bottom edge of the viewport.
pub const GRADIENT_BASE: Vec3 = Vec3::new(0.68, 0.68, 0.73);
/// Amount the sky gradient brightens from the bottom to the top edge.
pub const GRADIENT_SLOPE: f32 = 0.18;
/// World up axis fed through the normal matrix for the fill term.
pub const WORLD_UP: Vec3 = Vec3::Y;
/// Weight of the reflected view vector's vertical component in the rim term.
pub const RIM_REFLECTION_WEIGHT: f32 = 1.0 / 5.0;
/// Weight of `dot(up, normal)` in the fill term.
pub const RIM_UP_WEIGHT: f32 = 1.0 / 10.0;

/// Constants and feature switches of one lighting variant.
///
/// The historical shader variants only differ in these values, so a single
/// shading function parameterised by this struct covers all of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadingModel {
    /// Baseline ambient term before the rim contribution.
    pub ambient: f32,
    /// Enables the specular highlight mask.
    pub highlight: bool,
    /// Enables the reflected-view rim and up-vector fill terms.
    pub rim: bool,
    /// Exponent applied to the highlight mask.
    pub falloff: f32,
    pub highlight_divisor: f32,
    /// Upper bound of the highlight mask.
    pub highlight_ceiling: f32,
    /// Width of the highlight band near `p == 1` at zero specular.
    pub highlight_size: f32,
    /// How much each unit of specular narrows the highlight band.
    pub highlight_size_slope: f32,
}

impl ShadingModel {
    /// Diffuse plus ambient only.
    pub const CLASSIC: Self = Self {
        ambient: 0.65,
        highlight: false,
        rim: false,
        falloff: 3.0,
        highlight_divisor: 25.0,
        highlight_ceiling: 0.0,
        highlight_size: 0.1,
        highlight_size_slope: 0.05,
    };

    /// Adds a small specular highlight, no rim.
    pub const SPECULAR: Self = Self {
        ambient: 0.60,
        highlight: true,
        rim: false,
        falloff: 3.0,
        highlight_divisor: 25.0,
        highlight_ceiling: 0.10,
        highlight_size: 0.1,
        highlight_size_slope: 0.05,
    };

    /// The complete model: highlight, rim and up-vector fill.
    pub const GLOBE: Self = Self {
        ambient: 0.60,
        highlight: true,
        rim: true,
        falloff: 3.0,
        highlight_divisor: 25.0,
        highlight_ceiling: 0.25,
        highlight_size: 0.1,
        highlight_size_slope: 0.05,
    };

    /// Looks up a preset by its configuration name.
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "classic" => Some(Self::CLASSIC),
            "specular" => Some(Self::SPECULAR),
            "globe" => Some(Self::GLOBE),
            _ => None,
        }
    }

    /// Highlight mask for a diffuse factor `p` in `[0, 1]`.
    ///
    /// Returns zero once the specular value closes the highlight band.
    pub fn highlight_mask(&self, diffuse: f32, specular: f32) -> f32 {
        let size = self.highlight_size - specular * self.highlight_size_slope;
        if size <= 0.0 {
            return 0.0;
        }
        let mask = ((diffuse - (1.0 - size)) / size).max(0.0) * 2.0;
        (mask.powf(self.falloff) / self.highlight_divisor).min(self.highlight_ceiling)
    }
}

impl Default for ShadingModel {
    fn default() -> Self {
        Self::GLOBE
    }
}

/// The fixed key light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyLight {
    pub direction: Vec3,
    /// When set, the light sits at `direction * distance` in eye space and
    /// the light vector is taken per fragment from its position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl KeyLight {
    /// Unit vector from the fragment towards the light.
    pub fn vector_from(&self, eye_position: Vec3) -> Vec3 {
        match self.distance {
            Some(distance) => (self.direction * distance - eye_position).normalize_or_zero(),
            None => self.direction.normalize_or_zero(),
        }
    }
}

impl Default for KeyLight {
    fn default() -> Self {
        Self {
            direction: DEFAULT_LIGHT_DIRECTION,
            distance: None,
        }
    }
}

/// Vertical screen-space sky ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientRamp {
    pub base: Vec3,
    pub slope: f32,
}

impl GradientRamp {
    /// Ramp colour for a fragment row, with `frag_y` measured from the
    /// bottom edge in pixels.
    pub fn color_at(&self, frag_y: f32, height: f32) -> Vec4 {
        let grad = if height > 0.0 {
            self.slope * frag_y / height
        } else {
            0.0
        };
        (self.base + Vec3::splat(grad)).extend(1.0)
    }
}

impl Default for GradientRamp {
    fn default() -> Self {
        Self {
            base: GRADIENT_BASE,
            slope: GRADIENT_SLOPE,
        }
    }
}

/// Everything the shader pair needs besides per-draw uniforms.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShadingConfig {
    #[serde(default)]
    pub model: ShadingModel,
    #[serde(default)]
    pub light: KeyLight,
    #[serde(default)]
    pub gradient: GradientRamp,
}

impl ShadingConfig {
    pub fn with_model(model: ShadingModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Reads and parses a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        let config = Self::from_xml(&xml)
            .with_context(|| format!("invalid shading config {}", path.display()))?;
        debug!("loaded shading config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Parses a `<shading>` document. Every element is optional; `<model>`
    /// picks the preset that the remaining elements override.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid shading XML")?;
        let root = document.root_element();
        if !root.has_tag_name("shading") {
            return Err(anyhow!(
                "expected <shading> root element, found <{}>",
                root.tag_name().name()
            ));
        }

        let mut model = match optional_text(&root, "model") {
            Some(name) => ShadingModel::preset(&name)
                .ok_or_else(|| anyhow!("unknown shading model {name:?}"))?,
            None => ShadingModel::default(),
        };
        model.ambient = parse_f32(optional_text(&root, "ambient"), model.ambient)?;
        model.highlight = parse_bool(optional_text(&root, "highlight"), model.highlight)?;
        model.rim = parse_bool(optional_text(&root, "rim"), model.rim)?;
        model.falloff = parse_f32(optional_text(&root, "falloff"), model.falloff)?;
        model.highlight_ceiling = parse_f32(
            optional_text(&root, "highlight-ceiling"),
            model.highlight_ceiling,
        )?;
        model.highlight_divisor = parse_f32(
            optional_text(&root, "highlight-divisor"),
            model.highlight_divisor,
        )?;
        model.highlight_size =
            parse_f32(optional_text(&root, "highlight-size"), model.highlight_size)?;
        model.highlight_size_slope = parse_f32(
            optional_text(&root, "highlight-size-slope"),
            model.highlight_size_slope,
        )?;
        if model.highlight_divisor == 0.0 {
            return Err(anyhow!("highlight-divisor must not be zero"));
        }

        let mut light = KeyLight::default();
        light.direction = parse_vec3(optional_text(&root, "light"), light.direction)?;
        if let Some(distance) = optional_text(&root, "light-distance") {
            light.distance = Some(parse_f32(Some(distance), DEFAULT_LIGHT_DISTANCE)?);
        }
        if light.direction.length_squared() <= f32::EPSILON {
            return Err(anyhow!("light direction must not be zero"));
        }

        let mut gradient = GradientRamp::default();
        gradient.base = parse_vec3(optional_text(&root, "gradient-base"), gradient.base)?;
        gradient.slope = parse_f32(optional_text(&root, "gradient-slope"), gradient.slope)?;

        Ok(Self {
            model,
            light,
            gradient,
        })
    }
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let numbers = value
        .split_whitespace()
        .map(|component| {
            parse_f32(Some(component.to_string()), 0.0)
                .with_context(|| format!("invalid vector component {component:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!(
            "vector needs 3 components, found {}",
            numbers.len()
        )),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    let Some(value) = value else {
        return Ok(default);
    };
    let number = value
        .parse::<f32>()
        .map_err(|err| anyhow!("failed to parse float {value:?}: {err}"))?;
    if !number.is_finite() {
        return Err(anyhow!("float {value:?} must be finite"));
    }
    Ok(number)
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref() {
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(anyhow!("expected true or false, found {other:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static SAMPLE: Lazy<String> = Lazy::new(|| {
        r#"
        <shading>
            <model>specular</model>
            <ambient>0.62</ambient>
            <rim>true</rim>
            <light>0 0 1</light>
            <light-distance>8</light-distance>
            <gradient-slope>0.2</gradient-slope>
        </shading>
        "#
        .to_string()
    });

    #[test]
    fn xml_overrides_preset_fields() {
        let config = ShadingConfig::from_xml(&SAMPLE).unwrap();
        assert_eq!(config.model.ambient, 0.62);
        assert!(config.model.rim);
        assert!(config.model.highlight);
        assert_eq!(config.model.highlight_ceiling, 0.10);
        assert_eq!(config.light.direction, Vec3::Z);
        assert_eq!(config.light.distance, Some(8.0));
        assert_eq!(config.gradient.base, GRADIENT_BASE);
        assert_eq!(config.gradient.slope, 0.2);
    }

    #[test]
    fn empty_document_is_the_globe_model() {
        let config = ShadingConfig::from_xml("<shading/>").unwrap();
        assert_eq!(config, ShadingConfig::default());
        assert_eq!(config.model, ShadingModel::GLOBE);
        assert_eq!(config.light.distance, None);
    }

    #[test]
    fn malformed_inputs_are_errors() {
        assert!(ShadingConfig::from_xml("<scene/>").is_err());
        assert!(ShadingConfig::from_xml("<shading><model>toon</model></shading>").is_err());
        assert!(ShadingConfig::from_xml("<shading><light>1 2</light></shading>").is_err());
        assert!(ShadingConfig::from_xml("<shading><light>0 0 0</light></shading>").is_err());
        assert!(ShadingConfig::from_xml("<shading><rim>maybe</rim></shading>").is_err());
        assert!(
            ShadingConfig::from_xml("<shading><highlight-divisor>0</highlight-divisor></shading>")
                .is_err()
        );
    }

    #[test]
    fn non_finite_numbers_are_errors() {
        for xml in [
            "<shading><ambient>inf</ambient></shading>",
            "<shading><falloff>NaN</falloff></shading>",
            "<shading><gradient-slope>-inf</gradient-slope></shading>",
            "<shading><light>0 NaN 1</light></shading>",
            "<shading><gradient-base>0.5 0.5 inf</gradient-base></shading>",
            "<shading><light-distance>infinity</light-distance></shading>",
        ] {
            assert!(ShadingConfig::from_xml(xml).is_err(), "{xml} should be rejected");
        }
    }

    #[test]
    fn highlight_band_fields_are_configurable() {
        let config = ShadingConfig::from_xml(
            "<shading>\
                <highlight-divisor>20</highlight-divisor>\
                <highlight-size>0.2</highlight-size>\
                <highlight-size-slope>0.1</highlight-size-slope>\
            </shading>",
        )
        .unwrap();
        assert_eq!(config.model.highlight_divisor, 20.0);
        assert_eq!(config.model.highlight_size, 0.2);
        assert_eq!(config.model.highlight_size_slope, 0.1);
        assert_eq!(config.model.falloff, ShadingModel::GLOBE.falloff);
    }

    #[test]
    fn gradient_ramp_matches_reference_values() {
        let ramp = GradientRamp::default();
        let bottom = ramp.color_at(0.0, 200.0);
        assert!((bottom - Vec4::new(0.68, 0.68, 0.73, 1.0)).abs().max_element() < 1e-6);
        let middle = ramp.color_at(100.0, 200.0);
        assert!((middle - Vec4::new(0.77, 0.77, 0.82, 1.0)).abs().max_element() < 1e-6);
        assert_eq!(ramp.color_at(50.0, 0.0), bottom);
    }

    #[test]
    fn highlight_mask_is_capped_and_closes_at_high_specular() {
        let model = ShadingModel::GLOBE;
        assert_eq!(model.highlight_mask(1.0, 0.0), 0.25);
        assert_eq!(model.highlight_mask(0.5, 0.0), 0.0);
        assert_eq!(model.highlight_mask(1.0, 2.0), 0.0);
        assert_eq!(ShadingModel::SPECULAR.highlight_mask(1.0, 0.0), 0.10);
    }

    #[test]
    fn positional_light_points_from_fragment() {
        let light = KeyLight {
            direction: Vec3::Z,
            distance: Some(10.0),
        };
        let vector = light.vector_from(Vec3::new(0.0, 0.0, 5.0));
        assert!((vector - Vec3::Z).length() < 1e-6);
    }
}
