use glam::{DVec2, DVec3};
use std::f64::consts::PI;

/// Edge function used in rasterization
pub fn edge_function(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Converts one sRGB encoded channel in [0, 1] to linear
pub fn srgb_to_linear(c: f64) -> f64 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

/// Converts one linear channel to sRGB encoding, clamped to [0, 1]
pub fn linear_to_srgb(c: f64) -> f64 {
    let c = c.clamp(0.0, 1.0);
    if c < 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(0.41666) - 0.055
    }
}

/// Encodes a linear color as 8-bit sRGB
pub fn encode_color(color: DVec3) -> [u8; 3] {
    [
        (linear_to_srgb(color.x) * 255.0).round() as u8,
        (linear_to_srgb(color.y) * 255.0).round() as u8,
        (linear_to_srgb(color.z) * 255.0).round() as u8,
    ]
}

/// Calculates the cosine falloff between a surface normal and the direction towards a light
pub fn calculate_light_intensity(normal: DVec3, light_dir: DVec3) -> f64 {
    normal.dot(light_dir).max(0.0)
}

/// Lambertian diffuse BRDF
pub fn brdf_lambert(diffuse_color: DVec3) -> DVec3 {
    diffuse_color / PI
}

/// Schlick's approximation of the Fresnel term with f90 = 1
pub fn fresnel_schlick(f0: DVec3, v_dot_h: f64) -> DVec3 {
    let fresnel = (1.0 - v_dot_h).clamp(0.0, 1.0).powi(5);
    f0 + (DVec3::ONE - f0) * fresnel
}

/// GGX specular BRDF with the height-correlated Smith visibility term
pub fn brdf_ggx(
    light_dir: DVec3,
    view_dir: DVec3,
    normal: DVec3,
    specular_color: DVec3,
    roughness: f64,
) -> DVec3 {
    let alpha = roughness * roughness;
    let half = (light_dir + view_dir).normalize_or_zero();

    let dot_nl = normal.dot(light_dir).clamp(0.0, 1.0);
    let dot_nv = normal.dot(view_dir).clamp(0.0, 1.0);
    let dot_nh = normal.dot(half).clamp(0.0, 1.0);
    let dot_vh = view_dir.dot(half).clamp(0.0, 1.0);

    let fresnel = fresnel_schlick(specular_color, dot_vh);

    let a2 = alpha * alpha;
    let gv = dot_nl * (a2 + (1.0 - a2) * dot_nv * dot_nv).sqrt();
    let gl = dot_nv * (a2 + (1.0 - a2) * dot_nl * dot_nl).sqrt();
    let visibility = 0.5 / (gv + gl).max(1e-6);

    let denom = dot_nh * dot_nh * (a2 - 1.0) + 1.0;
    let distribution = a2 / (PI * denom * denom).max(1e-12);

    fresnel * (visibility * distribution)
}

/// Rounds a value to 15 significant digits to drop accumulated float noise
pub fn to_precision_15(value: f64) -> f64 {
    format!("{value:.14e}").parse().unwrap_or(value)
}
