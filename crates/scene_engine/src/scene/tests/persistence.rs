//! Scene save/load

use approx::assert_relative_eq;

use crate::assets::{Encoding, FlyweightRegistry, ResourceError, ResourceId};
use crate::component::{Camera, ComponentFactory, ModelState, PointLight, Property};
use crate::foundation::math::{Transform, Vec3};
use crate::scene::{
    Aabb, ComponentRecord, FlatNode, NodeFlags, NodePayload, NodeTree, Scene, SceneError,
    SceneRecord,
};

fn factory() -> ComponentFactory {
    ComponentFactory::with_builtin(FlyweightRegistry::new())
}

/// `world` with a camera rig, a lamp and a ship model below the origin
fn sample_scene() -> Scene {
    let mut scene = Scene::new("world");
    let rig = scene.create_node("rig");
    let eye = scene.create_node("eye");
    let lamp = scene.create_node("lamp");
    let ship = scene.create_node("ship");
    scene.add(rig).unwrap();
    scene.add(lamp).unwrap();

    let models = FlyweightRegistry::new();
    let graph = scene.graph_mut();
    graph.add_child(rig, eye).unwrap();
    graph.add_child(rig, ship).unwrap();
    graph
        .set_local_transform(
            rig,
            Transform::from_translation(Vec3::new(0.0, 5.0, 0.0)).with_axis_angle(Vec3::y(), 0.25),
        )
        .unwrap();
    graph
        .set_local_transform(eye, Transform::from_translation(Vec3::new(0.0, 0.0, 12.0)))
        .unwrap();
    graph
        .set_local_transform(ship, Transform::identity().with_uniform_scale(3.0))
        .unwrap();
    graph
        .set_local_aabb(ship, Aabb::new(Vec3::zeros(), Vec3::new(2.0, 1.0, 4.0)))
        .unwrap();
    graph.set_flags(lamp, NodeFlags::VISIBLE, false).unwrap();

    graph
        .add_component(eye, Box::new(Camera::new(70.0, 0.5, 900.0)))
        .unwrap();
    graph.add_component(lamp, Box::new(PointLight)).unwrap();
    let mut state = ModelState::new(models);
    state.set_model(ResourceId::new("Model", "ship.mdl"));
    state.set_active_animation(2);
    graph.add_component(ship, Box::new(state)).unwrap();

    scene.set_camera(Some(eye)).unwrap();
    scene
}

fn assert_same_scene(original: &Scene, restored: &Scene) {
    assert_eq!(restored.name(), original.name());
    assert_eq!(restored.len(), original.len());

    let before = original.pre_order();
    let after = restored.pre_order();
    assert_eq!(before.len(), after.len());
    for (&old, &new) in before.iter().zip(&after) {
        let (a, b) = (original.graph(), restored.graph());
        assert_eq!(a.name(old), b.name(new));
        assert_eq!(a.flags(old), b.flags(new));
        assert_eq!(a.index_of(old).unwrap(), b.index_of(new).unwrap());
        assert_eq!(a.child_count(old), b.child_count(new));
        assert_eq!(a.local_aabb(old), b.local_aabb(new));
        assert_relative_eq!(
            a.local_transform(old).unwrap(),
            b.local_transform(new).unwrap(),
            epsilon = 1e-5
        );
        assert_relative_eq!(
            a.global_transform(old).unwrap(),
            b.global_transform(new).unwrap(),
            epsilon = 1e-4
        );
        assert_eq!(a.component_count(old), b.component_count(new));
        for index in 0..a.component_count(old) {
            let (ca, cb) = (
                a.component_by_index(old, index).unwrap(),
                b.component_by_index(new, index).unwrap(),
            );
            assert_eq!(ca.id(), cb.id());
            assert_eq!(ca.properties(), cb.properties());
        }
    }

    let camera = restored.camera().unwrap();
    assert_eq!(restored.graph().name(camera), Some("eye"));
}

#[test]
fn test_round_trip_binary() {
    let scene = sample_scene();
    let buffer = scene.serialize(Encoding::Binary).unwrap();
    assert_eq!(&buffer[..8], b"AEONSCE\0");

    let restored = Scene::deserialize(&buffer, &factory()).unwrap();
    assert_same_scene(&scene, &restored);
}

#[test]
fn test_round_trip_text() {
    let scene = sample_scene();
    let buffer = scene.serialize(Encoding::Text).unwrap();
    assert_eq!(&buffer[..8], b"AEONSCE\n");
    let text = std::str::from_utf8(&buffer[8..]).unwrap();
    assert!(text.contains("Field of Vision"));

    let restored = Scene::deserialize(&buffer, &factory()).unwrap();
    assert_same_scene(&scene, &restored);
}

#[test]
fn test_record_is_pre_order_with_parent_links() {
    let record = sample_scene().to_record();
    let names: Vec<&str> = record.nodes.iter().map(|flat| flat.node.name.as_str()).collect();
    assert_eq!(names, vec!["rig", "eye", "ship", "lamp"]);
    let parents: Vec<Option<usize>> = record.nodes.iter().map(|flat| flat.parent).collect();
    assert_eq!(parents, vec![None, Some(0), Some(0), None]);
    assert_eq!(record.camera, Some(1));

    let camera = &record.nodes[1].node.components[0];
    assert_eq!(camera.name, "Camera");
    assert_eq!(camera.properties.len(), 3);
}

#[test]
fn test_tree_form_matches_flat_form() {
    let record = sample_scene().to_record();
    let trees = record.clone().into_trees().unwrap();
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[0].node.name, "rig");
    assert_eq!(trees[0].children.len(), 2);
    assert_eq!(trees[0].children[1].node.name, "ship");
    assert!(trees[1].children.is_empty());

    let flattened = SceneRecord::from_trees(record.name.clone(), trees);
    assert_eq!(flattened.nodes, record.nodes);
}

#[test]
fn test_parent_must_precede_child() {
    let record = SceneRecord {
        name: "broken".to_string(),
        camera: None,
        nodes: vec![
            FlatNode {
                parent: None,
                node: NodePayload::default(),
            },
            FlatNode {
                parent: Some(2),
                node: NodePayload::default(),
            },
            FlatNode {
                parent: Some(0),
                node: NodePayload::default(),
            },
        ],
    };
    assert!(matches!(
        Scene::from_record(&record, &factory()),
        Err(SceneError::InvalidParentReference { record: 1, parent: 2 })
    ));
    assert!(matches!(
        record.into_trees(),
        Err(SceneError::InvalidParentReference { .. })
    ));
}

#[test]
fn test_unknown_component_fails() {
    let record = SceneRecord {
        name: "mystery".to_string(),
        camera: None,
        nodes: vec![FlatNode {
            parent: None,
            node: NodePayload {
                name: "box".to_string(),
                components: vec![ComponentRecord {
                    name: "Teleporter".to_string(),
                    properties: Vec::new(),
                }],
                ..NodePayload::default()
            },
        }],
    };
    assert!(matches!(
        Scene::from_record(&record, &factory()),
        Err(SceneError::UnknownComponent(name)) if name == "Teleporter"
    ));
}

#[test]
fn test_failed_load_keeps_current_scene() {
    let mut scene = sample_scene();
    let mut buffer = scene.serialize(Encoding::Binary).unwrap();
    buffer.truncate(buffer.len() / 2);

    assert!(scene.load_buffer(&buffer, &factory()).is_err());
    assert_eq!(scene.len(), 4);
    assert_eq!(scene.name(), "world");

    let other = Scene::new("empty").serialize(Encoding::Text).unwrap();
    scene.load_buffer(&other, &factory()).unwrap();
    assert!(scene.is_empty());
    assert_eq!(scene.name(), "empty");
}

#[test]
fn test_bad_header_rejected() {
    let result = Scene::deserialize(b"AEONMDL\0rest", &factory());
    assert!(matches!(
        result,
        Err(SceneError::Resource(ResourceError::BadMagic { .. }))
    ));
}

#[test]
fn test_stored_properties_override_defaults() {
    let record = sample_scene().to_record();
    let restored = Scene::from_record(&record, &factory()).unwrap();
    let eye = restored.camera().unwrap();
    let camera = restored.graph().component_as::<Camera>(eye).unwrap();
    assert_eq!(camera.near_plane(), 0.5);
    assert_eq!(camera.far_plane(), 900.0);
    assert_eq!(camera.field_of_view(), 70.0);

    let ship = restored.graph().find_by_name("ship").unwrap();
    let state = restored.graph().component_as::<ModelState>(ship).unwrap();
    assert_eq!(state.active_animation(), 2);
    assert_eq!(state.model(), ResourceId::new("Model", "ship.mdl"));
    assert_eq!(
        restored
            .graph()
            .component(ship, ModelState::ID.id())
            .and_then(|c| c.property_by_name("Active Animation")),
        Some(Property::UInt(2))
    );
}

#[test]
fn test_file_round_trip() {
    let path = std::env::temp_dir().join(format!("scene_engine_scene_{}.sce", std::process::id()));
    let scene = sample_scene();
    scene.save_to_file(&path, Encoding::Text).unwrap();
    let restored = Scene::load_from_file(&path, &factory()).unwrap();
    assert_same_scene(&scene, &restored);
    let _ = std::fs::remove_file(&path);

    assert!(matches!(
        Scene::load_from_file(&path, &factory()),
        Err(SceneError::Resource(ResourceError::Io { .. }))
    ));
}

#[test]
fn test_nested_tree_round_trips_through_text() {
    let tree = NodeTree {
        node: NodePayload {
            name: "outer".to_string(),
            ..NodePayload::default()
        },
        children: vec![NodeTree {
            node: NodePayload {
                name: "inner".to_string(),
                ..NodePayload::default()
            },
            children: Vec::new(),
        }],
    };
    let text = ron::to_string(&tree).unwrap();
    let back: NodeTree = ron::from_str(&text).unwrap();
    assert_eq!(back, tree);
}
