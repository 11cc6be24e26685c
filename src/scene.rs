use glam::{DMat4, DQuat, DVec3, EulerRot};
use std::f64::consts::FRAC_PI_2;
use std::rc::Rc;

use crate::geometry::Geometry;
use crate::texture::{ColorSpace, Texture, TextureLoader};

pub const SHADOW_TEXTURE: &str = "/textures/simpleShadow.jpg";
pub const BALL_TEXTURE: &str = "/textures/basketball.png";
pub const COURT_TEXTURE: &str = "/textures/basketballcourt.jpg";

pub const AMBIENT_INTENSITY: f64 = 1.0;
pub const DIRECTIONAL_INTENSITY: f64 = 1.5;
pub const DIRECTIONAL_POSITION: DVec3 = DVec3::new(2.0, 2.0, -1.0);
pub const SPHERE_RADIUS: f64 = 0.5;
pub const SPHERE_SEGMENTS: usize = 32;
pub const BALL_ROUGHNESS: f64 = 0.7;
pub const GROUND_SIZE: f64 = 20.0;
pub const GROUND_Y: f64 = -0.5;
pub const SHADOW_SIZE: f64 = 1.5;
/// Height of the shadow decal above the ground
pub const SHADOW_OFFSET: f64 = 0.01;

/// Light that reaches every surface equally
#[derive(Clone, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: DVec3,
    pub intensity: f64,
}

/// Light shining from `position` towards the origin
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: DVec3,
    pub intensity: f64,
    pub position: DVec3,
}

impl DirectionalLight {
    /// Unit vector from a surface towards the light
    pub fn direction(&self) -> DVec3 {
        self.position.normalize_or_zero()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Ambient(AmbientLight),
    Directional(DirectionalLight),
}

impl Light {
    pub fn intensity(&self) -> f64 {
        match self {
            Light::Ambient(light) => light.intensity,
            Light::Directional(light) => light.intensity,
        }
    }

    pub fn intensity_mut(&mut self) -> &mut f64 {
        match self {
            Light::Ambient(light) => &mut light.intensity,
            Light::Directional(light) => &mut light.intensity,
        }
    }

    /// Only directional lights have a position
    pub fn position_mut(&mut self) -> Option<&mut DVec3> {
        match self {
            Light::Ambient(_) => None,
            Light::Directional(light) => Some(&mut light.position),
        }
    }

    pub fn position(&self) -> Option<DVec3> {
        match self {
            Light::Ambient(_) => None,
            Light::Directional(light) => Some(light.position),
        }
    }
}

/// Lit material with a roughness/metalness response
#[derive(Clone)]
pub struct StandardMaterial {
    pub color: DVec3,
    pub map: Option<Texture>,
    pub roughness: f64,
    pub metalness: f64,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        StandardMaterial {
            color: DVec3::ONE,
            map: None,
            roughness: 1.0,
            metalness: 0.0,
        }
    }
}

/// Unlit material. The alpha map's green channel scales opacity.
#[derive(Clone)]
pub struct BasicMaterial {
    pub color: DVec3,
    pub alpha_map: Option<Texture>,
    pub transparent: bool,
    pub opacity: f64,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        BasicMaterial {
            color: DVec3::ONE,
            alpha_map: None,
            transparent: false,
            opacity: 1.0,
        }
    }
}

#[derive(Clone)]
pub enum Material {
    Standard(StandardMaterial),
    Basic(BasicMaterial),
}

impl Material {
    /// Transparent materials are drawn after opaque ones and blended
    pub fn is_transparent(&self) -> bool {
        matches!(self, Material::Basic(m) if m.transparent)
    }

    pub fn standard(&self) -> Option<&StandardMaterial> {
        match self {
            Material::Standard(m) => Some(m),
            Material::Basic(_) => None,
        }
    }

    pub fn standard_mut(&mut self) -> Option<&mut StandardMaterial> {
        match self {
            Material::Standard(m) => Some(m),
            Material::Basic(_) => None,
        }
    }

    pub fn basic(&self) -> Option<&BasicMaterial> {
        match self {
            Material::Basic(m) => Some(m),
            Material::Standard(_) => None,
        }
    }

    pub fn basic_mut(&mut self) -> Option<&mut BasicMaterial> {
        match self {
            Material::Basic(m) => Some(m),
            Material::Standard(_) => None,
        }
    }
}

/// Geometry placed in the world with its own material
#[derive(Clone)]
pub struct Mesh {
    pub name: &'static str,
    pub geometry: Rc<Geometry>,
    pub material: Material,
    pub position: DVec3,
    /// Euler angles in radians, applied in XYZ order
    pub rotation: DVec3,
}

impl Mesh {
    pub fn new(name: &'static str, geometry: Geometry, material: Material) -> Self {
        Mesh {
            name,
            geometry: Rc::new(geometry),
            material,
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
        }
    }

    pub fn orientation(&self) -> DQuat {
        DQuat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Object to world transform
    pub fn model_matrix(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.orientation(), self.position)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshId(usize);

/// Root container of lights and meshes
#[derive(Default)]
pub struct Scene {
    lights: Vec<Light>,
    meshes: Vec<Mesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_light(&mut self, light: Light) -> LightId {
        self.lights.push(light);
        LightId(self.lights.len() - 1)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn light(&self, id: LightId) -> &Light {
        &self.lights[id.0]
    }

    pub fn light_mut(&mut self, id: LightId) -> &mut Light {
        &mut self.lights[id.0]
    }

    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> &mut Mesh {
        &mut self.meshes[id.0]
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }
}

/// The three images the scene is dressed with
#[derive(Clone)]
pub struct SceneTextures {
    pub baked_shadow: Texture,
    pub ball: Texture,
    pub court: Texture,
}

impl SceneTextures {
    /// Requests every texture and tags it as sRGB. Does not wait for the decodes.
    pub fn load(loader: &mut TextureLoader) -> Self {
        let textures = SceneTextures {
            baked_shadow: loader.load(SHADOW_TEXTURE),
            ball: loader.load(BALL_TEXTURE),
            court: loader.load(COURT_TEXTURE),
        };
        for texture in [&textures.baked_shadow, &textures.ball, &textures.court] {
            texture.set_color_space(ColorSpace::Srgb);
        }
        textures
    }
}

/// Ids of the scene objects the rest of the app touches
#[derive(Clone, Copy, Debug)]
pub struct SceneHandles {
    pub ambient: LightId,
    pub directional: LightId,
    pub sphere: MeshId,
    pub shadow: MeshId,
}

/// Builds the lights, materials and meshes of the court scene
pub fn build_scene(textures: &SceneTextures) -> (Scene, SceneHandles) {
    let mut scene = Scene::new();

    // Lights
    let ambient = scene.add_light(Light::Ambient(AmbientLight {
        color: DVec3::ONE,
        intensity: AMBIENT_INTENSITY,
    }));
    let directional = scene.add_light(Light::Directional(DirectionalLight {
        color: DVec3::ONE,
        intensity: DIRECTIONAL_INTENSITY,
        position: DIRECTIONAL_POSITION,
    }));

    // Materials
    let court_material = StandardMaterial {
        map: Some(textures.court.clone()),
        ..Default::default()
    };
    let ball_material = StandardMaterial {
        map: Some(textures.ball.clone()),
        roughness: BALL_ROUGHNESS,
        ..Default::default()
    };
    let shadow_material = BasicMaterial {
        color: DVec3::ZERO,
        alpha_map: Some(textures.baked_shadow.clone()),
        transparent: true,
        ..Default::default()
    };

    // Objects
    let sphere = Mesh::new(
        "sphere",
        Geometry::sphere(SPHERE_RADIUS, SPHERE_SEGMENTS, SPHERE_SEGMENTS),
        Material::Standard(ball_material),
    );

    let mut ground = Mesh::new(
        "ground",
        Geometry::plane(GROUND_SIZE, GROUND_SIZE),
        Material::Standard(court_material),
    );
    ground.rotation.x = -FRAC_PI_2;
    ground.position.y = GROUND_Y;

    let mut shadow = Mesh::new(
        "shadow",
        Geometry::plane(SHADOW_SIZE, SHADOW_SIZE),
        Material::Basic(shadow_material),
    );
    shadow.rotation.x = -FRAC_PI_2;
    shadow.position.y = ground.position.y + SHADOW_OFFSET;

    let sphere = scene.add_mesh(sphere);
    scene.add_mesh(ground);
    let handles = SceneHandles {
        ambient,
        directional,
        sphere,
        shadow: scene.add_mesh(shadow),
    };

    (scene, handles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder_textures() -> SceneTextures {
        SceneTextures {
            baked_shadow: Texture::placeholder(),
            ball: Texture::placeholder(),
            court: Texture::placeholder(),
        }
    }

    fn ground(scene: &Scene) -> &Mesh {
        scene.meshes().iter().find(|m| m.name == "ground").unwrap()
    }

    #[test]
    fn lights_use_initial_constants() {
        let (scene, handles) = build_scene(&placeholder_textures());
        assert_eq!(scene.lights().len(), 2);
        assert_eq!(
            scene.light(handles.ambient),
            &Light::Ambient(AmbientLight {
                color: DVec3::ONE,
                intensity: 1.0
            })
        );
        let directional = scene.light(handles.directional);
        assert_eq!(directional.intensity(), 1.5);
        assert_eq!(directional.position(), Some(DVec3::new(2.0, 2.0, -1.0)));
    }

    #[test]
    fn meshes_use_initial_constants() {
        let textures = placeholder_textures();
        let (scene, handles) = build_scene(&textures);
        assert_eq!(scene.meshes().len(), 3);

        let sphere = scene.mesh(handles.sphere);
        assert_eq!(sphere.position, DVec3::ZERO);
        assert_eq!(sphere.geometry.positions.len(), 33 * 33);
        let ball = sphere.material.standard().unwrap();
        assert_eq!(ball.roughness, 0.7);
        assert_eq!(ball.metalness, 0.0);
        assert!(ball.map.as_ref().unwrap().ptr_eq(&textures.ball));

        let ground = ground(&scene);
        assert_eq!(ground.position.y, -0.5);
        assert_eq!(ground.material.standard().unwrap().roughness, 1.0);

        let shadow = scene.mesh(handles.shadow);
        assert!((shadow.position.y - -0.49).abs() < 1e-12);
        assert!(shadow.material.is_transparent());
        let decal = shadow.material.basic().unwrap();
        assert_eq!(decal.color, DVec3::ZERO);
        assert_eq!(decal.opacity, 1.0);
        assert!(decal.alpha_map.as_ref().unwrap().ptr_eq(&textures.baked_shadow));
    }

    #[test]
    fn planes_are_laid_flat_facing_up() {
        let (scene, handles) = build_scene(&placeholder_textures());
        for mesh in [ground(&scene), scene.mesh(handles.shadow)] {
            let up = mesh.orientation() * DVec3::Z;
            assert!((up - DVec3::Y).length() < 1e-12);
        }
    }

    #[test]
    fn scene_textures_are_tagged_srgb() {
        let dir = std::env::temp_dir().join(format!("ballcourt-scene-{}", std::process::id()));
        let mut loader = TextureLoader::new(&dir);
        let textures = SceneTextures::load(&mut loader);
        assert_eq!(textures.ball.color_space(), ColorSpace::Srgb);
        assert_eq!(textures.court.color_space(), ColorSpace::Srgb);
        assert_eq!(textures.baked_shadow.color_space(), ColorSpace::Srgb);
        assert_eq!(textures.ball.source(), Some(dir.join("textures/basketball.png")));
    }
}
