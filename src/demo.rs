//! # Demo Scene
//!
//! Builds the chicken farm: a grass ground plane, ten chickens (some walking,
//! some spinning), a button, two coils, the free-fly camera and the skybox.
//!
//! Everything is CPU-side, so the scene can be built and stepped without a
//! GPU. The render engine uploads meshes and textures on the first frame.

use std::collections::HashMap;

use cgmath::{Deg, Matrix3, Vector2, Vector3};
use thiserror::Error;
use winit::keyboard::KeyCode;

use crate::{
    assets::{AssetError, AssetLoader, Texture2DDescription, TextureFormat},
    behaviour::{
        CameraControlBehaviour, FollowPathBehaviour, SimpleMoveBehaviour, SpinBehaviour,
        TurnAroundBehaviour,
    },
    config::AppConfig,
    gfx::{
        camera::Camera,
        geometry::{add_ico_sphere, add_plane, invert_faces, MeshBuilder},
        lighting::LightingMode,
        programs::{self, DIFFUSE, ENVIRONMENT, ENVIRONMENT_ROTATION, SHININESS},
        resources::{MaterialId, MeshId, Resources, ShaderError, ShaderId, Texture},
        scene::{EntityId, GameScene, Renderer},
    },
    input::KeyPressWatcher,
};

/// Render layer of the skybox; drawn after all opaque scenery
pub const SKYBOX_LAYER: i32 = 100;

const SHININESS_VALUE: f32 = 8.0;
const PATH_SPEED: f32 = 4.0;
const CHICKEN_SCALE: f32 = 0.4;
const COIL_SCALE: f32 = 0.5;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
}

/// The populated scene and the handles the frame loop needs
pub struct DemoScene {
    pub scene: GameScene,
    pub resources: Resources,
    pub scene_shader: ShaderId,
    pub skybox_shader: ShaderId,
    pub camera: EntityId,
    pub key_watchers: Vec<KeyPressWatcher>,
}

struct Materials {
    ground: MaterialId,
    chicken: MaterialId,
    stone: MaterialId,
    button: MaterialId,
}

/// Loads each OBJ file once and hands out shared mesh ids
struct MeshCache<'a> {
    loader: &'a AssetLoader,
    loaded: HashMap<&'static str, MeshId>,
}

impl<'a> MeshCache<'a> {
    fn new(loader: &'a AssetLoader) -> Self {
        Self {
            loader,
            loaded: HashMap::new(),
        }
    }

    fn get(&mut self, resources: &mut Resources, path: &'static str) -> Result<MeshId, AssetError> {
        if let Some(id) = self.loaded.get(path) {
            return Ok(*id);
        }
        let id = resources.add_mesh(self.loader.mesh(path)?);
        self.loaded.insert(path, id);
        Ok(id)
    }
}

/// Builds the demo scene using the configured asset root
pub fn build(config: &AppConfig) -> Result<DemoScene, DemoError> {
    build_with_loader(config, &AssetLoader::from_config(&config.assets))
}

pub fn build_with_loader(config: &AppConfig, loader: &AssetLoader) -> Result<DemoScene, DemoError> {
    let mut resources = Resources::new();

    let mut scene_program = programs::scene_shader(&config.lighting)?;
    LightingMode::from_condition(config.lighting.initial_mode).apply(&mut scene_program)?;
    let scene_shader = resources.add_shader(scene_program);
    let skybox_shader = resources.add_shader(programs::skybox_shader());

    let materials = create_materials(&mut resources, loader, scene_shader)?;

    // Unused by any material, kept as a ready white texture
    let mut blank = Texture2DDescription {
        width: 1,
        height: 1,
        format: TextureFormat::Rgb8,
    }
    .create();
    blank.clear();
    resources.add_texture(Texture::image("blank", blank));

    let mut scene = GameScene::new("test");
    let mut meshes = MeshCache::new(loader);

    populate_scenery(&mut scene, &mut resources, &mut meshes, &materials)?;
    let camera = create_camera(&mut scene, config);
    create_skybox(&mut scene, &mut resources, loader, skybox_shader)?;

    let key_watchers = vec![KeyPressWatcher::new(KeyCode::KeyT, |scene: &mut GameScene| {
        let Some(camera) = scene.main_camera() else {
            return;
        };
        if let Some(camera) = scene.camera_mut(camera) {
            camera.toggle_ortho();
            log::info!("Orthographic projection: {}", camera.is_orthographic());
        }
    })];

    scene.update_world_matrices();
    log::info!(
        "Built scene '{}' with {} entities",
        scene.name(),
        scene.entity_count()
    );

    Ok(DemoScene {
        scene,
        resources,
        scene_shader,
        skybox_shader,
        camera,
        key_watchers,
    })
}

fn create_materials(
    resources: &mut Resources,
    loader: &AssetLoader,
    shader: ShaderId,
) -> Result<Materials, DemoError> {
    let textured = |resources: &mut Resources, image: &str| -> Result<MaterialId, DemoError> {
        let texture = resources.add_texture(Texture::image(image, loader.texture_2d(image)?));
        let material = resources.add_material(shader)?;
        resources.set_material(material, DIFFUSE, texture)?;
        resources.set_material(material, SHININESS, SHININESS_VALUE)?;
        Ok(material)
    };

    Ok(Materials {
        ground: textured(resources, "images/grass.jpg")?,
        chicken: textured(resources, "images/DrumstickTexture.png")?,
        stone: textured(resources, "images/Stone_001_Specular.png")?,
        button: textured(resources, "images/ButtonTexture.png")?,
    })
}

/// Placement of one piece of scenery
struct Placement {
    name: &'static str,
    mesh: &'static str,
    position: [f32; 3],
    rotation: [f32; 3],
    scale: f32,
}

fn place(
    scene: &mut GameScene,
    resources: &mut Resources,
    meshes: &mut MeshCache,
    material: MaterialId,
    placement: Placement,
) -> Result<EntityId, DemoError> {
    let mesh = meshes.get(resources, placement.mesh)?;
    let entity = scene.create_entity(placement.name);
    if let Some(transform) = scene.transform_mut(entity) {
        transform
            .set_local_position(placement.position)
            .set_local_rotation_euler(placement.rotation)
            .set_uniform_scale(placement.scale);
    }
    scene.set_renderer(entity, Renderer::new(mesh, material));
    Ok(entity)
}

/// Chickens that pace up and down between two points, facing their heading
fn bind_pacing(scene: &mut GameScene, entity: EntityId, from: [f32; 3], to: [f32; 3]) {
    scene.bind(
        entity,
        FollowPathBehaviour::new(vec![from.into(), to.into()], PATH_SPEED),
    );
    scene.bind(
        entity,
        TurnAroundBehaviour::new(
            -3.9,
            9.9,
            Vector3::new(90.0, 0.0, 0.0),
            Vector3::new(90.0, 0.0, 180.0),
        ),
    );
}

fn populate_scenery(
    scene: &mut GameScene,
    resources: &mut Resources,
    meshes: &mut MeshCache,
    materials: &Materials,
) -> Result<(), DemoError> {
    let ground = scene.create_entity("ground_object");
    {
        let mut builder = MeshBuilder::new();
        add_plane(
            &mut builder,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::unit_z(),
            Vector3::unit_x(),
            Vector2::new(25.0, 25.0),
            [1.0; 4],
        );
        let mesh = resources.add_mesh(builder.bake());
        scene.set_renderer(ground, Renderer::new(mesh, materials.ground));
        scene.bind_disabled(ground, SimpleMoveBehaviour::default());
    }

    // Giant chicken behind the button
    let chicken = place(scene, resources, meshes, materials.chicken, Placement {
        name: "chicken_main_object",
        mesh: "models/ChickenStill.obj",
        position: [0.0, -9.0, 0.0],
        rotation: [90.0, 0.0, 180.0],
        scale: 1.0,
    })?;
    scene.bind_disabled(chicken, SimpleMoveBehaviour::default());

    let chicken1 = place(scene, resources, meshes, materials.chicken, Placement {
        name: "chicken_object_1",
        mesh: "models/Chicken1.obj",
        position: [6.0, -4.0, 0.0],
        rotation: [90.0, 0.0, 180.0],
        scale: CHICKEN_SCALE,
    })?;
    bind_pacing(scene, chicken1, [6.0, 10.0, 0.0], [6.0, -4.0, 0.0]);

    place(scene, resources, meshes, materials.chicken, Placement {
        name: "chicken_object_2",
        mesh: "models/Chicken2.obj",
        position: [8.0, 10.0, 0.0],
        rotation: [45.0, -90.0, 180.0],
        scale: CHICKEN_SCALE,
    })?;

    let chicken3 = place(scene, resources, meshes, materials.chicken, Placement {
        name: "chicken_object_3",
        mesh: "models/Chicken3.obj",
        position: [2.0, 4.0, 0.0],
        rotation: [50.0, 90.0, 180.0],
        scale: CHICKEN_SCALE,
    })?;
    scene.bind_disabled(chicken3, SimpleMoveBehaviour::default());

    let chicken4 = place(scene, resources, meshes, materials.chicken, Placement {
        name: "chicken_object_4",
        mesh: "models/Chicken4.obj",
        position: [0.0, 0.0, 0.0],
        rotation: [90.0, 0.0, 180.0],
        scale: CHICKEN_SCALE,
    })?;
    scene.bind(chicken4, SpinBehaviour::new(Vector2::new(90.0, 0.0), 1));

    // Fallen over, spinning
    let chicken5 = place(scene, resources, meshes, materials.chicken, Placement {
        name: "chicken_object_5",
        mesh: "models/Chicken5.obj",
        position: [2.0, 9.0, 0.0],
        rotation: [0.0, 90.0, 180.0],
        scale: CHICKEN_SCALE,
    })?;
    scene.bind(chicken5, SpinBehaviour::new(Vector2::new(0.0, 0.0), 1));

    let chicken6 = place(scene, resources, meshes, materials.chicken, Placement {
        name: "chicken_object_6",
        mesh: "models/Chicken6.obj",
        position: [-4.0, 10.0, 0.0],
        rotation: [90.0, 0.0, 180.0],
        scale: CHICKEN_SCALE,
    })?;
    bind_pacing(scene, chicken6, [-4.0, -4.0, 0.0], [-4.0, 10.0, 0.0]);

    let chicken7 = place(scene, resources, meshes, materials.chicken, Placement {
        name: "chicken_object_7",
        mesh: "models/Chicken7.obj",
        position: [-7.0, 8.0, 0.0],
        rotation: [0.0, 0.0, 0.0],
        scale: CHICKEN_SCALE,
    })?;
    scene.bind_disabled(chicken7, SimpleMoveBehaviour::default());

    // Upside down, spinning
    let chicken8 = place(scene, resources, meshes, materials.chicken, Placement {
        name: "chicken_object_8",
        mesh: "models/Chicken3.obj",
        position: [-7.0, -3.0, 3.0],
        rotation: [-90.0, 0.0, 180.0],
        scale: CHICKEN_SCALE,
    })?;
    scene.bind(chicken8, SpinBehaviour::new(Vector2::new(-90.0, 0.0), 1));

    let chicken9 = place(scene, resources, meshes, materials.chicken, Placement {
        name: "chicken_object_9",
        mesh: "models/Chicken7.obj",
        position: [11.0, -2.0, 0.0],
        rotation: [90.0, 90.0, 180.0],
        scale: CHICKEN_SCALE,
    })?;
    scene.bind_disabled(chicken9, SimpleMoveBehaviour::default());

    let button = place(scene, resources, meshes, materials.button, Placement {
        name: "button_object",
        mesh: "models/Button.obj",
        position: [0.0, -6.0, 0.0],
        rotation: [90.0, 0.0, 0.0],
        scale: 1.0,
    })?;
    scene.bind_disabled(button, SimpleMoveBehaviour::default());

    for (name, x) in [("coil_object", 8.0), ("coil_object_2", -8.0)] {
        let coil = place(scene, resources, meshes, materials.stone, Placement {
            name,
            mesh: "models/Coil.obj",
            position: [x, -8.0, 0.0],
            rotation: [90.0, 0.0, 0.0],
            scale: COIL_SCALE,
        })?;
        scene.bind_disabled(coil, SimpleMoveBehaviour::default());
    }

    Ok(())
}

fn create_camera(scene: &mut GameScene, config: &AppConfig) -> EntityId {
    let camera = scene.create_entity("Camera");
    if let Some(transform) = scene.transform_mut(camera) {
        transform
            .set_local_position([0.0, 5.0, 3.0])
            .look_at([0.0, 0.0, 0.0], Vector3::unit_z());
    }

    let settings = &config.camera;
    let mut projection = Camera::new(
        settings.fov,
        settings.ortho_height,
        settings.near,
        settings.far,
    );
    projection.resize(config.window.width, config.window.height);
    scene.set_camera(camera, projection);
    scene.set_main_camera(camera);
    scene.bind(
        camera,
        CameraControlBehaviour::new(
            settings.move_speed,
            settings.boost_multiplier,
            settings.mouse_sensitivity,
        ),
    );
    camera
}

fn create_skybox(
    scene: &mut GameScene,
    resources: &mut Resources,
    loader: &AssetLoader,
    shader: ShaderId,
) -> Result<EntityId, DemoError> {
    let environment = loader.cube_map("images/cubemaps/skybox/ocean.jpg")?;
    let environment = resources.add_texture(Texture::cube_map("skybox", environment));

    let material = resources.add_material(shader)?;
    resources.set_material(material, ENVIRONMENT, environment)?;
    resources.set_material(
        material,
        ENVIRONMENT_ROTATION,
        Matrix3::from_angle_x(Deg(90.0)),
    )?;
    if let Some(material) = resources.material_mut(material) {
        material.set_render_layer(SKYBOX_LAYER);
    }

    let mut builder = MeshBuilder::new();
    add_ico_sphere(&mut builder, Vector3::new(0.0, 0.0, 0.0), 1.0, 0, [1.0; 4]);
    invert_faces(&mut builder);
    let mesh = resources.add_mesh(builder.bake());

    let skybox = scene.create_entity("skybox");
    scene.set_renderer(skybox, Renderer::new(mesh, material));
    Ok(skybox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::UniformValue;
    use approx::assert_relative_eq;
    use cgmath::InnerSpace;

    fn demo() -> DemoScene {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path(), true);
        build_with_loader(&AppConfig::default(), &loader).unwrap()
    }

    #[test]
    fn test_missing_assets_fail_without_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path(), false);
        let result = build_with_loader(&AppConfig::default(), &loader);
        assert!(matches!(result, Err(DemoError::Asset(e)) if e.is_missing()));
    }

    #[test]
    fn test_every_named_object_exists() {
        let demo = demo();
        let mut names = vec![
            "ground_object",
            "chicken_main_object",
            "button_object",
            "coil_object",
            "coil_object_2",
            "Camera",
            "skybox",
        ];
        let chickens: Vec<String> = (1..=9).map(|i| format!("chicken_object_{}", i)).collect();
        names.extend(chickens.iter().map(String::as_str));
        for name in names {
            assert!(demo.scene.find_by_name(name).is_some(), "missing {}", name);
        }
        assert_eq!(demo.scene.main_camera(), Some(demo.camera));
    }

    #[test]
    fn test_shared_obj_files_load_once() {
        let demo = demo();
        let mesh_of = |name: &str| {
            let entity = demo.scene.find_by_name(name).unwrap();
            demo.scene.renderer(entity).unwrap().mesh
        };
        assert_eq!(mesh_of("chicken_object_3"), mesh_of("chicken_object_8"));
        assert_eq!(mesh_of("chicken_object_7"), mesh_of("chicken_object_9"));
        assert_eq!(mesh_of("coil_object"), mesh_of("coil_object_2"));
        assert_ne!(mesh_of("chicken_object_1"), mesh_of("chicken_object_2"));
    }

    #[test]
    fn test_skybox_material_is_drawn_last() {
        let demo = demo();
        let skybox = demo.scene.find_by_name("skybox").unwrap();
        let material_id = demo.scene.renderer(skybox).unwrap().material;
        let material = demo.resources.material(material_id).unwrap();
        assert_eq!(material.render_layer(), SKYBOX_LAYER);
        assert_eq!(material.shader(), demo.skybox_shader);
        assert!(material.texture(ENVIRONMENT).is_some());

        let Some(UniformValue::Mat3(rotation)) = material.block().get(ENVIRONMENT_ROTATION) else {
            panic!("environment rotation not set");
        };
        let up = rotation * Vector3::unit_y();
        assert_relative_eq!(up, Vector3::unit_z(), epsilon = 1e-6);
    }

    #[test]
    fn test_scene_materials_have_shininess() {
        let demo = demo();
        let coil = demo.scene.find_by_name("coil_object").unwrap();
        let material = demo
            .resources
            .material(demo.scene.renderer(coil).unwrap().material)
            .unwrap();
        assert_eq!(material.shader(), demo.scene_shader);
        assert_eq!(
            material.block().get(SHININESS),
            Some(UniformValue::Float(SHININESS_VALUE))
        );
        assert!(material.texture(DIFFUSE).is_some());
    }

    #[test]
    fn test_camera_looks_at_origin() {
        let demo = demo();
        let transform = demo.scene.transform(demo.camera).unwrap();
        assert_relative_eq!(transform.local_position(), Vector3::new(0.0, 5.0, 3.0));
        let expected = (Vector3::new(0.0, 0.0, 0.0) - Vector3::new(0.0, 5.0, 3.0)).normalize();
        assert_relative_eq!(transform.forward(), expected, epsilon = 1e-5);
    }

    #[test]
    fn test_t_key_toggles_orthographic_camera() {
        use crate::input::InputState;

        let mut demo = demo();
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyT, true);
        for watcher in demo.key_watchers.iter_mut() {
            watcher.poll(&input, &mut demo.scene);
        }
        assert!(demo.scene.camera(demo.camera).unwrap().is_orthographic());
    }
}
