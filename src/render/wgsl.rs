use glam::Vec3;

use crate::config::{RIM_REFLECTION_WEIGHT, RIM_UP_WEIGHT};
use crate::ShadingConfig;

/// Builds the WGSL program (`vs_main` / `fs_main`) for a configuration.
///
/// The shading constants are emitted as module-scope `const`s ahead of a
/// fixed body, so every variant shares one source.
pub fn shader_source(config: &ShadingConfig) -> String {
    let model = &config.model;
    let mut source = String::with_capacity(PROGRAM.len() + 1024);
    source.push_str(&format!("const AMBIENT: f32 = {};\n", float(model.ambient)));
    source.push_str(&format!("const HAS_HIGHLIGHT: bool = {};\n", model.highlight));
    source.push_str(&format!("const HAS_RIM: bool = {};\n", model.rim));
    source.push_str(&format!("const FALLOFF: f32 = {};\n", float(model.falloff)));
    source.push_str(&format!(
        "const HIGHLIGHT_DIVISOR: f32 = {};\n",
        float(model.highlight_divisor)
    ));
    source.push_str(&format!(
        "const HIGHLIGHT_CEILING: f32 = {};\n",
        float(model.highlight_ceiling)
    ));
    source.push_str(&format!(
        "const HIGHLIGHT_SIZE: f32 = {};\n",
        float(model.highlight_size)
    ));
    source.push_str(&format!(
        "const HIGHLIGHT_SIZE_SLOPE: f32 = {};\n",
        float(model.highlight_size_slope)
    ));
    source.push_str(&format!(
        "const LIGHT_DIRECTION: vec3<f32> = {};\n",
        vec3(config.light.direction)
    ));
    // Zero selects the directional form.
    source.push_str(&format!(
        "const LIGHT_DISTANCE: f32 = {};\n",
        float(config.light.distance.unwrap_or(0.0))
    ));
    source.push_str(&format!(
        "const GRADIENT_BASE: vec3<f32> = {};\n",
        vec3(config.gradient.base)
    ));
    source.push_str(&format!(
        "const GRADIENT_SLOPE: f32 = {};\n",
        float(config.gradient.slope)
    ));
    source.push_str(&format!(
        "const RIM_REFLECTION_WEIGHT: f32 = {};\n",
        float(RIM_REFLECTION_WEIGHT)
    ));
    source.push_str(&format!(
        "const RIM_UP_WEIGHT: f32 = {};\n",
        float(RIM_UP_WEIGHT)
    ));
    source.push_str(PROGRAM);
    source
}

// `{:?}` always keeps a decimal point or exponent, which WGSL needs to
// infer a float literal.
fn float(value: f32) -> String {
    format!("{value:?}")
}

fn vec3(value: Vec3) -> String {
    format!(
        "vec3<f32>({}, {}, {})",
        float(value.x),
        float(value.y),
        float(value.z)
    )
}

const PROGRAM: &str = r#"
const FLAG_LIGHTING: u32 = 1u;
const FLAG_GRADIENT: u32 = 2u;

struct DrawUniforms {
    model_view: mat4x4<f32>,
    mvp: mat4x4<f32>,
    normal_matrix: mat3x3<f32>,
    color: vec4<f32>,
    resolution: vec2<f32>,
    specular: f32,
    flags: u32,
}

@group(0) @binding(0)
var<uniform> draw: DrawUniforms;

struct VertexInput {
    @location(0) vertex: vec4<f32>,
    @location(1) normal: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) eye_position: vec3<f32>,
    @location(1) eye_normal: vec3<f32>,
    @location(2) globe_normal: vec3<f32>,
    @location(3) eye_up: vec3<f32>,
    @location(4) eye_vector: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let eye = draw.model_view * input.vertex;
    out.clip_position = draw.mvp * input.vertex;
    out.eye_position = eye.xyz;
    out.eye_normal = normalize(draw.normal_matrix * input.normal.xyz);
    out.globe_normal = input.normal.xyz;
    out.eye_up = normalize(draw.normal_matrix * vec3<f32>(0.0, 1.0, 0.0));
    out.eye_vector = normalize(eye.xyz);
    return out;
}

fn light_vector(eye_position: vec3<f32>) -> vec3<f32> {
    if (LIGHT_DISTANCE > 0.0) {
        return normalize(LIGHT_DIRECTION * LIGHT_DISTANCE - eye_position);
    }
    return normalize(LIGHT_DIRECTION);
}

fn highlight_mask(diffuse: f32, specular: f32) -> f32 {
    let size = HIGHLIGHT_SIZE - specular * HIGHLIGHT_SIZE_SLOPE;
    if (size <= 0.0) {
        return 0.0;
    }
    let mask = max((diffuse - (1.0 - size)) / size, 0.0) * 2.0;
    return min(pow(mask, FALLOFF) / HIGHLIGHT_DIVISOR, HIGHLIGHT_CEILING);
}

fn lit_color(input: VertexOutput, front_facing: bool) -> vec4<f32> {
    var normal = normalize(input.eye_normal);
    if (!front_facing) {
        normal = -normal;
    }
    let specular = draw.specular;

    var diffuse = max(dot(light_vector(input.eye_position), normal), 0.0);
    var highlight = 0.0;
    if (HAS_HIGHLIGHT) {
        highlight = highlight_mask(diffuse, specular);
        diffuse = diffuse - specular / 2.0;
    }

    var ambient = AMBIENT;
    if (HAS_RIM) {
        let reflected = normalize(reflect(normalize(input.eye_vector), normal));
        let model_reflected = transpose(draw.model_view) * vec4<f32>(reflected, 1.0);
        let up = dot(normalize(input.eye_up), normal);
        let blend = clamp(specular, 0.0, 1.0);
        ambient = ambient + blend * model_reflected.y * RIM_REFLECTION_WEIGHT
            + (1.0 - blend) * up * RIM_UP_WEIGHT;
    }

    if (diffuse < 0.0) {
        diffuse = 0.0;
    } else {
        diffuse = diffuse * (1.0 - AMBIENT);
    }

    let rgb = draw.color.rgb * (ambient + diffuse) + vec3<f32>(highlight * specular);
    return vec4<f32>(rgb, draw.color.a);
}

@fragment
fn fs_main(input: VertexOutput, @builtin(front_facing) front_facing: bool) -> @location(0) vec4<f32> {
    if ((draw.flags & FLAG_GRADIENT) != 0u) {
        var grad = 0.0;
        if (draw.resolution.y > 0.0) {
            // Framebuffer rows count down from the top; the ramp counts up.
            grad = GRADIENT_SLOPE * (draw.resolution.y - input.clip_position.y) / draw.resolution.y;
        }
        return vec4<f32>(GRADIENT_BASE + vec3<f32>(grad), 1.0);
    }
    if ((draw.flags & FLAG_LIGHTING) == 0u) {
        return draw.color;
    }
    return lit_color(input, front_facing);
}
"#;
