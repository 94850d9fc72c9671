//! Steps the demo scene through whole frames without a window or GPU

use approx::assert_relative_eq;
use cgmath::Vector3;
use lighting_demo::{
    app::{advance_scene, draw_items, retire_destroyed},
    assets::AssetLoader,
    behaviour::SimpleMoveBehaviour,
    config::AppConfig,
    demo::{build_with_loader, DemoScene, SKYBOX_LAYER},
    gfx::{
        lighting::LightingMode,
        programs::{AMBIENT_STRENGTH, CONDITION},
        rendering::{build_draw_list, DrawCommand, DrawStats},
        resources::UniformValue,
        scene::quat_from_euler_degrees,
    },
    input::InputState,
};
use winit::keyboard::KeyCode;

fn demo() -> DemoScene {
    let dir = tempfile::tempdir().unwrap();
    let loader = AssetLoader::new(dir.path(), true);
    build_with_loader(&AppConfig::default(), &loader).unwrap()
}

fn step(demo: &mut DemoScene, delta_time: f32, input: &mut InputState) {
    for watcher in demo.key_watchers.iter_mut() {
        watcher.poll(input, &mut demo.scene);
    }
    advance_scene(&mut demo.scene, delta_time, input);
    retire_destroyed(&mut demo.scene);
    input.end_frame();
}

#[test]
fn test_draw_list_groups_scene_and_draws_sky_last() {
    let demo = demo();
    let commands = build_draw_list(draw_items(&demo.scene, &demo.resources));
    let stats = DrawStats::from_commands(&commands);

    assert_eq!(stats.draws, 15);
    assert_eq!(stats.shader_binds, 2);
    // Four scene materials plus the skybox
    assert_eq!(stats.material_binds, 5);

    let skybox = demo.scene.find_by_name("skybox").unwrap();
    assert!(matches!(
        commands.last(),
        Some(DrawCommand::Draw { entity, .. }) if *entity == skybox
    ));
    assert_eq!(
        commands.iter().find(|c| matches!(c, DrawCommand::BindShader(_))),
        Some(&DrawCommand::BindShader(demo.scene_shader))
    );

    let sky_material = demo.scene.renderer(skybox).unwrap().material;
    assert_eq!(
        demo.resources.material(sky_material).unwrap().render_layer(),
        SKYBOX_LAYER
    );
}

#[test]
fn test_pacing_chicken_walks_and_turns_around() {
    let mut demo = demo();
    let mut input = InputState::new();
    let chicken = demo.scene.find_by_name("chicken_object_1").unwrap();

    step(&mut demo, 1.0, &mut input);
    let transform = demo.scene.transform(chicken).unwrap();
    assert_relative_eq!(transform.local_position(), Vector3::new(6.0, 0.0, 0.0));

    for _ in 0..3 {
        step(&mut demo, 1.0, &mut input);
    }
    let transform = demo.scene.transform(chicken).unwrap();
    assert_relative_eq!(transform.local_position(), Vector3::new(6.0, 10.0, 0.0));
    assert_relative_eq!(
        transform.local_rotation(),
        quat_from_euler_degrees(Vector3::new(90.0, 0.0, 0.0))
    );

    // Heading back down the path
    step(&mut demo, 1.0, &mut input);
    let transform = demo.scene.transform(chicken).unwrap();
    assert_relative_eq!(transform.local_position(), Vector3::new(6.0, 6.0, 0.0));
}

#[test]
fn test_spinning_chickens_advance_one_degree_per_frame() {
    let mut demo = demo();
    let mut input = InputState::new();
    let chicken = demo.scene.find_by_name("chicken_object_8").unwrap();

    for _ in 0..11 {
        step(&mut demo, 0.016, &mut input);
    }
    assert_relative_eq!(
        demo.scene.transform(chicken).unwrap().local_rotation(),
        quat_from_euler_degrees(Vector3::new(-90.0, 0.0, 10.0)),
        epsilon = 1e-6
    );
}

#[test]
fn test_scenery_moves_only_after_enabling() {
    let mut demo = demo();
    let mut input = InputState::new();
    let button = demo.scene.find_by_name("button_object").unwrap();
    let start = demo.scene.transform(button).unwrap().local_position();

    input.set_key(KeyCode::KeyI, true);
    step(&mut demo, 1.0, &mut input);
    assert_eq!(demo.scene.transform(button).unwrap().local_position(), start);

    assert_eq!(
        demo.scene.set_behaviours_enabled::<SimpleMoveBehaviour>(true),
        8
    );
    step(&mut demo, 1.0, &mut input);
    let moved = demo.scene.transform(button).unwrap().local_position();
    assert!(moved.y > start.y);
    assert_relative_eq!(moved.x, start.x);
}

#[test]
fn test_mode_switch_updates_scene_shader_only() {
    let mut demo = demo();
    let shader = demo.resources.shader_mut(demo.scene_shader).unwrap();
    LightingMode::AmbientOnly.apply(shader).unwrap();
    LightingMode::DiffuseOnly.apply(shader).unwrap();

    let block = demo.resources.shader(demo.scene_shader).unwrap().block();
    assert_eq!(block.get(CONDITION), Some(UniformValue::Int(2)));
    // Ambient values from the previous mode are kept
    assert_eq!(block.get(AMBIENT_STRENGTH), Some(UniformValue::Float(0.38)));

    let sky = demo.resources.shader(demo.skybox_shader).unwrap();
    assert!(sky.block().get(CONDITION).is_none());
}

#[test]
fn test_ortho_toggle_fires_once_per_press() {
    let mut demo = demo();
    let mut input = InputState::new();

    input.set_key(KeyCode::KeyT, true);
    step(&mut demo, 0.016, &mut input);
    input.set_key(KeyCode::KeyT, true);
    step(&mut demo, 0.016, &mut input);
    assert!(demo.scene.camera(demo.camera).unwrap().is_orthographic());

    input.set_key(KeyCode::KeyT, false);
    step(&mut demo, 0.016, &mut input);
    input.set_key(KeyCode::KeyT, true);
    step(&mut demo, 0.016, &mut input);
    assert!(!demo.scene.camera(demo.camera).unwrap().is_orthographic());
}

#[test]
fn test_destroyed_entity_is_drawn_until_frame_ends() {
    let mut demo = demo();
    let input = InputState::new();
    let chicken = demo.scene.find_by_name("chicken_object_3").unwrap();
    let drawn = |demo: &DemoScene| {
        draw_items(&demo.scene, &demo.resources)
            .iter()
            .any(|item| item.entity == chicken)
    };

    demo.scene.request_destroy(chicken);
    advance_scene(&mut demo.scene, 0.016, &input);
    assert!(drawn(&demo));

    assert_eq!(retire_destroyed(&mut demo.scene), 1);
    assert!(!demo.scene.contains(chicken));
    assert!(!drawn(&demo));
}
