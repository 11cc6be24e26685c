use glam::{DMat4, DVec3, DVec4};
use std::cmp::Ordering;

use crate::camera::PerspectiveCamera;
use crate::graphics::{clip_triangle, draw_triangle, BlendMode, Fragment, Framebuffer};
use crate::math::{brdf_ggx, brdf_lambert, calculate_light_intensity, encode_color};
use crate::scene::{BasicMaterial, Light, Material, Mesh, Scene, StandardMaterial};
use crate::vertex::{ScreenVertex, Vertex};

/// Lowest roughness the lighting model accepts
const MIN_ROUGHNESS: f64 = 0.0525;

/// Counters for the last rendered frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderInfo {
    pub frame: u64,
    pub triangles: usize,
}

/// Lights gathered from the scene once per frame
struct Lighting {
    ambient: DVec3,
    /// (direction towards the light, color * intensity)
    directional: Vec<(DVec3, DVec3)>,
}

impl Lighting {
    fn gather(scene: &Scene) -> Self {
        let mut lighting = Lighting {
            ambient: DVec3::ZERO,
            directional: Vec::new(),
        };
        for light in scene.lights() {
            match light {
                Light::Ambient(l) => lighting.ambient += l.color * l.intensity,
                Light::Directional(l) => lighting
                    .directional
                    .push((l.direction(), l.color * l.intensity)),
            }
        }
        lighting
    }
}

/// Software renderer drawing a scene into a supersampled framebuffer.
///
/// The logical size is the viewport in pixels, the framebuffer is that size times the
/// pixel ratio, and `resolve` averages it back down to the logical size.
pub struct Renderer {
    width: f64,
    height: f64,
    pixel_ratio: f64,
    pub clear_color: DVec3,
    framebuffer: Framebuffer,
    info: RenderInfo,
}

impl Renderer {
    pub fn new(width: f64, height: f64) -> Self {
        let mut renderer = Renderer {
            width,
            height,
            pixel_ratio: 1.0,
            clear_color: DVec3::ZERO,
            framebuffer: Framebuffer::new(0, 0),
            info: RenderInfo::default(),
        };
        renderer.allocate();
        renderer
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.allocate();
    }

    pub fn set_pixel_ratio(&mut self, pixel_ratio: f64) {
        self.pixel_ratio = pixel_ratio;
        self.allocate();
    }

    fn allocate(&mut self) {
        let (width, height) = self.buffer_size();
        self.framebuffer.resize(width, height);
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Size of the drawing buffer (logical size times pixel ratio)
    pub fn buffer_size(&self) -> (usize, usize) {
        (
            (self.width * self.pixel_ratio).floor().max(0.0) as usize,
            (self.height * self.pixel_ratio).floor().max(0.0) as usize,
        )
    }

    /// Size of the resolved image
    pub fn output_size(&self) -> (usize, usize) {
        (
            self.width.floor().max(0.0) as usize,
            self.height.floor().max(0.0) as usize,
        )
    }

    pub fn info(&self) -> RenderInfo {
        self.info
    }

    #[cfg(test)]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Draws `scene` as seen through `camera`
    pub fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        self.framebuffer.clear(self.clear_color);
        self.info.frame += 1;
        self.info.triangles = 0;

        let lighting = Lighting::gather(scene);
        let view = camera.view_matrix();
        let view_projection = camera.view_projection();

        // Opaque first, then transparent back to front
        let (mut transparent, opaque): (Vec<&Mesh>, Vec<&Mesh>) = scene
            .meshes()
            .iter()
            .partition(|mesh| mesh.material.is_transparent());
        transparent.sort_by(|a, b| {
            let za = view.transform_point3(a.position).z;
            let zb = view.transform_point3(b.position).z;
            za.partial_cmp(&zb).unwrap_or(Ordering::Equal)
        });

        for mesh in opaque.into_iter().chain(transparent) {
            self.draw_mesh(mesh, &view_projection, camera.position, &lighting);
        }
    }

    fn draw_mesh(
        &mut self,
        mesh: &Mesh,
        view_projection: &DMat4,
        eye: DVec3,
        lighting: &Lighting,
    ) {
        let model = mesh.model_matrix();
        let orientation = mesh.orientation();
        let mvp = *view_projection * model;
        let geometry = &mesh.geometry;

        // Vertex stage
        let vertices: Vec<Vertex> = (0..geometry.positions.len())
            .map(|i| {
                let local = geometry.positions[i];
                Vertex {
                    clip: mvp * local.extend(1.0),
                    position: model.transform_point3(local),
                    normal: orientation * geometry.normals[i],
                    uv: geometry.uvs[i],
                }
            })
            .collect();

        let blend = if mesh.material.is_transparent() {
            BlendMode::Alpha
        } else {
            BlendMode::Opaque
        };
        let mut shade = |fragment: &Fragment| match &mesh.material {
            Material::Standard(material) => shade_standard(material, fragment, eye, lighting),
            Material::Basic(material) => shade_basic(material, fragment),
        };

        let (width, height) = (
            self.framebuffer.width() as f64,
            self.framebuffer.height() as f64,
        );
        for &[a, b, c] in &geometry.indices {
            let polygon = clip_triangle([vertices[a], vertices[b], vertices[c]]);
            if polygon.len() < 3 {
                continue;
            }
            let projected: Vec<ScreenVertex> = polygon
                .iter()
                .map(|v| ScreenVertex::project(v, width, height))
                .collect();

            // Fan out the clipped polygon
            for i in 1..projected.len() - 1 {
                draw_triangle(
                    &projected[0],
                    &projected[i],
                    &projected[i + 1],
                    &mut self.framebuffer,
                    blend,
                    &mut shade,
                );
            }
            self.info.triangles += 1;
        }
    }

    /// Averages the framebuffer down to the output size and encodes it as 8-bit sRGB, row-major
    pub fn resolve(&self) -> Vec<[u8; 3]> {
        let (out_width, out_height) = self.output_size();
        let (buf_width, buf_height) = (self.framebuffer.width(), self.framebuffer.height());
        let mut output = Vec::with_capacity(out_width * out_height);
        if buf_width == 0 || buf_height == 0 {
            output.resize(out_width * out_height, encode_color(self.clear_color));
            return output;
        }

        let span = |o: usize, out: usize, buf: usize| -> (usize, usize) {
            let start = (o * buf / out).min(buf - 1);
            let end = ((o + 1) * buf / out).clamp(start + 1, buf);
            (start, end)
        };

        for oy in 0..out_height {
            let (y0, y1) = span(oy, out_height, buf_height);
            for ox in 0..out_width {
                let (x0, x1) = span(ox, out_width, buf_width);
                let mut sum = DVec3::ZERO;
                for y in y0..y1 {
                    for x in x0..x1 {
                        sum += self.framebuffer.pixel(x, y);
                    }
                }
                let count = ((y1 - y0) * (x1 - x0)) as f64;
                output.push(encode_color(sum / count));
            }
        }
        output
    }
}

/// Roughness/metalness lighting for lit materials
fn shade_standard(
    material: &StandardMaterial,
    fragment: &Fragment,
    eye: DVec3,
    lighting: &Lighting,
) -> DVec4 {
    let texel = material
        .map
        .as_ref()
        .map_or(DVec4::ONE, |map| map.sample(fragment.uv));
    let albedo = material.color * texel.truncate();

    let metalness = material.metalness.clamp(0.0, 1.0);
    let roughness = material.roughness.clamp(MIN_ROUGHNESS, 1.0);
    let diffuse_color = albedo * (1.0 - metalness);
    let specular_color = DVec3::splat(0.04).lerp(albedo, metalness);

    let normal = fragment.normal;
    let view_dir = (eye - fragment.position).normalize_or_zero();

    let mut color = lighting.ambient * brdf_lambert(diffuse_color);
    for &(light_dir, radiance) in &lighting.directional {
        let irradiance = radiance * calculate_light_intensity(normal, light_dir);
        color += irradiance
            * (brdf_lambert(diffuse_color)
                + brdf_ggx(light_dir, view_dir, normal, specular_color, roughness));
    }

    color.extend(texel.w)
}

/// Unlit color, opacity scaled by the alpha map's green channel
fn shade_basic(material: &BasicMaterial, fragment: &Fragment) -> DVec4 {
    let coverage = material
        .alpha_map
        .as_ref()
        .map_or(1.0, |map| map.sample(fragment.uv).y);
    material.color.extend(material.opacity * coverage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{FAR, FOV_DEGREES, NEAR};
    use crate::geometry::Geometry;
    use crate::scene::{AmbientLight, DirectionalLight};
    use crate::texture::Texture;
    use image::{Rgba, RgbaImage};
    use std::f64::consts::FRAC_PI_2;

    fn top_down_camera(aspect: f64) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(FOV_DEGREES, aspect, NEAR, FAR);
        camera.position = DVec3::new(0.0, 3.0, 0.001);
        camera.look_at(DVec3::ZERO);
        camera
    }

    fn floor(material: Material) -> Mesh {
        let mut mesh = Mesh::new("floor", Geometry::plane(20.0, 20.0), material);
        mesh.rotation.x = -FRAC_PI_2;
        mesh
    }

    fn lit_scene(ambient: f64) -> Scene {
        let mut scene = Scene::new();
        scene.add_light(Light::Ambient(AmbientLight {
            color: DVec3::ONE,
            intensity: ambient,
        }));
        scene.add_light(Light::Directional(DirectionalLight {
            color: DVec3::ONE,
            intensity: 1.5,
            position: DVec3::new(0.0, 1.0, 0.0),
        }));
        scene.add_mesh(floor(Material::Standard(StandardMaterial::default())));
        scene
    }

    fn center(renderer: &Renderer) -> DVec3 {
        let fb = renderer.framebuffer();
        fb.pixel(fb.width() / 2, fb.height() / 2)
    }

    #[test]
    fn empty_scene_resolves_to_clear_color() {
        let mut renderer = Renderer::new(4.0, 4.0);
        renderer.render(&Scene::new(), &top_down_camera(1.0));
        assert_eq!(renderer.resolve(), vec![[0, 0, 0]; 16]);
        assert_eq!(renderer.info().frame, 1);
    }

    #[test]
    fn lit_floor_brightens_with_ambient_intensity() {
        let camera = top_down_camera(1.0);
        let mut renderer = Renderer::new(16.0, 16.0);

        renderer.render(&lit_scene(0.0), &camera);
        let dim = center(&renderer);
        renderer.render(&lit_scene(3.0), &camera);
        let bright = center(&renderer);

        assert!(dim.x > 0.0);
        assert!(bright.x > dim.x);
        assert_eq!(renderer.info().triangles, 2);
    }

    #[test]
    fn floor_seen_from_below_is_culled() {
        let mut camera = top_down_camera(1.0);
        camera.position = DVec3::new(0.0, -3.0, 0.001);
        let mut renderer = Renderer::new(8.0, 8.0);
        renderer.render(&lit_scene(1.0), &camera);
        assert_eq!(center(&renderer), DVec3::ZERO);
    }

    #[test]
    fn camera_inside_floor_extent_still_draws_it() {
        // The floor spans past the camera, so it gets clipped at the near plane
        let mut camera = PerspectiveCamera::new(FOV_DEGREES, 1.0, NEAR, FAR);
        camera.position = DVec3::new(0.0, 1.0, 2.0);
        camera.look_at(DVec3::ZERO);
        let mut renderer = Renderer::new(16.0, 16.0);
        renderer.render(&lit_scene(1.0), &camera);
        let fb = renderer.framebuffer();
        assert!(fb.pixel(8, 15).x > 0.0);
    }

    #[test]
    fn transparent_decal_darkens_what_is_behind_it() {
        let camera = top_down_camera(1.0);
        let mut scene = lit_scene(1.0);
        let mut renderer = Renderer::new(16.0, 16.0);
        renderer.render(&scene, &camera);
        let bare = center(&renderer);

        let alpha = Texture::from_image(RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255])));
        let mut decal = Mesh::new(
            "decal",
            Geometry::plane(1.5, 1.5),
            Material::Basic(BasicMaterial {
                color: DVec3::ZERO,
                alpha_map: Some(alpha),
                transparent: true,
                opacity: 0.5,
            }),
        );
        decal.rotation.x = -FRAC_PI_2;
        decal.position.y = 0.01;
        scene.add_mesh(decal);

        renderer.render(&scene, &camera);
        let shaded = center(&renderer);
        assert!((shaded.x - bare.x * 0.5).abs() < 1e-9);
    }

    #[test]
    fn pixel_ratio_supersamples_and_resolves() {
        let mut renderer = Renderer::new(5.0, 3.0);
        renderer.set_pixel_ratio(2.0);
        assert_eq!(renderer.buffer_size(), (10, 6));
        renderer.clear_color = DVec3::ONE;
        renderer.render(&Scene::new(), &top_down_camera(5.0 / 3.0));
        let image = renderer.resolve();
        assert_eq!(image.len(), 15);
        assert!(image.iter().all(|p| *p == [255, 255, 255]));
    }
}
