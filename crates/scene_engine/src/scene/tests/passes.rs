//! Update, message and render passes over a scene

use std::any::Any;
use std::sync::Arc;

use approx::assert_relative_eq;
use parking_lot::Mutex;

use crate::assets::{Assembly, FlyweightRegistry, Model, ModelRecord, ResourceId};
use crate::component::{Camera, Component, ModelState, PointLight};
use crate::config::SceneSettings;
use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::foundation::string_id::StringId;
use crate::render::Renderer;
use crate::scene::{NodeFlags, NodeId, Scene, SceneGraph};

type Log = Arc<Mutex<Vec<String>>>;

/// Writes `"<node>:<component>"` to a shared log on every update
struct Recorder {
    id: StringId,
    dependencies: Vec<u32>,
    log: Log,
}

impl Recorder {
    fn boxed(id: StringId, dependencies: &[StringId], log: &Log) -> Box<dyn Component> {
        Box::new(Self {
            id,
            dependencies: dependencies.iter().map(StringId::id).collect(),
            log: Arc::clone(log),
        })
    }
}

impl Component for Recorder {
    fn id(&self) -> StringId {
        self.id
    }

    fn dependencies(&self) -> &[u32] {
        &self.dependencies
    }

    fn update(&mut self, graph: &mut SceneGraph, node: NodeId, _delta: f64) {
        let name = graph.name(node).unwrap_or("?").to_string();
        self.log.lock().push(format!("{name}:{}", self.id.name()));
    }

    fn process_message(&mut self, graph: &mut SceneGraph, node: NodeId, kind: u32, payload: &dyn Any) {
        let name = graph.name(node).unwrap_or("?").to_string();
        let text = payload.downcast_ref::<&str>().copied().unwrap_or("");
        self.log.lock().push(format!("{name}:{kind}:{text}"));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Moves its node up by one unit per second
struct Climber;

impl Climber {
    const ID: StringId = StringId::new("Climber");
}

impl Component for Climber {
    fn id(&self) -> StringId {
        Self::ID
    }

    #[allow(clippy::cast_possible_truncation)]
    fn update(&mut self, graph: &mut SceneGraph, node: NodeId, delta: f64) {
        if let Some(local) = graph.local_transform(node) {
            let moved = local.with_translation(local.translation + Vec3::new(0.0, delta as f32, 0.0));
            graph.set_local_transform(node, moved).unwrap();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Counts its own updates
#[derive(Default)]
struct Ticker {
    ticks: u32,
}

impl Ticker {
    const ID: StringId = StringId::new("Ticker");
}

impl Component for Ticker {
    fn id(&self) -> StringId {
        Self::ID
    }

    fn update(&mut self, _graph: &mut SceneGraph, _node: NodeId, _delta: f64) {
        self.ticks += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Copies the sibling ticker's count during its own update
struct Follower {
    seen: Vec<Option<u32>>,
}

impl Follower {
    const ID: StringId = StringId::new("Follower");
    const DEPENDS: [u32; 1] = [Ticker::ID.id()];
}

impl Component for Follower {
    fn id(&self) -> StringId {
        Self::ID
    }

    fn dependencies(&self) -> &[u32] {
        &Self::DEPENDS
    }

    fn update(&mut self, graph: &mut SceneGraph, node: NodeId, _delta: f64) {
        let ticks = graph.component_as::<Ticker>(node).map(|ticker| ticker.ticks);
        self.seen.push(ticks);
        // The running component is not visible through its own node.
        assert!(graph.component(node, Self::ID.id()).is_none());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Detaches itself on its first update
struct OneShot;

impl Component for OneShot {
    fn id(&self) -> StringId {
        StringId::new("One Shot")
    }

    fn update(&mut self, graph: &mut SceneGraph, node: NodeId, _delta: f64) {
        graph.remove_component(node, self.id().id());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
struct CountingRenderer {
    draws: Vec<(Vec3, ResourceId)>,
}

impl Renderer for CountingRenderer {
    fn render(
        &mut self,
        global: &Transform,
        mesh: &ResourceId,
        _pipeline: &ResourceId,
        _material: Option<&ResourceId>,
        _skeleton: Option<&[Mat4]>,
    ) {
        self.draws.push((global.translation, *mesh));
    }
}

const FIRST: StringId = StringId::new("First");
const SECOND: StringId = StringId::new("Second");
const THIRD: StringId = StringId::new("Third");

#[test]
fn test_update_runs_dependencies_first_and_parents_first() {
    let log = Log::default();
    let mut scene = Scene::new("passes");
    let parent = scene.create_node("parent");
    let child = scene.create_node("child");
    scene.add(parent).unwrap();
    scene.graph_mut().add_child(parent, child).unwrap();

    let graph = scene.graph_mut();
    graph.add_component(child, Recorder::boxed(FIRST, &[], &log)).unwrap();
    graph.add_component(parent, Recorder::boxed(THIRD, &[SECOND], &log)).unwrap();
    graph.add_component(parent, Recorder::boxed(SECOND, &[FIRST], &log)).unwrap();
    graph.add_component(parent, Recorder::boxed(FIRST, &[], &log)).unwrap();

    scene.update(0.016);
    assert_eq!(
        *log.lock(),
        vec!["parent:First", "parent:Second", "parent:Third", "child:First"]
    );

    // Components are back on their nodes after the pass.
    assert_eq!(scene.graph().component_count(parent), 3);
    assert_eq!(scene.graph().component_count(child), 1);
}

#[test]
fn test_dependents_see_this_tick_state_of_dependencies() {
    let mut scene = Scene::new("siblings");
    let node = scene.create_node("node");
    scene.add(node).unwrap();
    let graph = scene.graph_mut();
    graph
        .add_component(node, Box::new(Follower { seen: Vec::new() }))
        .unwrap();
    graph.add_component(node, Box::new(Ticker::default())).unwrap();

    scene.update(0.1);
    scene.update(0.1);

    let follower = scene.graph().component_as::<Follower>(node).unwrap();
    assert_eq!(follower.seen, vec![Some(1), Some(2)]);
    assert_eq!(scene.graph().component_count(node), 2);
}

#[test]
fn test_component_removed_during_update_stays_removed() {
    let mut scene = Scene::new("one shot");
    let node = scene.create_node("node");
    scene.add(node).unwrap();
    let graph = scene.graph_mut();
    graph.add_component(node, Box::new(OneShot)).unwrap();
    graph.add_component(node, Box::new(Ticker::default())).unwrap();

    scene.update(0.1);
    scene.update(0.1);

    assert_eq!(scene.graph().component_count(node), 1);
    assert_eq!(scene.graph().component_as::<Ticker>(node).unwrap().ticks, 2);
}

#[test]
fn test_component_cycle_rejected() {
    let log = Log::default();
    let mut scene = Scene::new("cycle");
    let node = scene.create_node("node");
    let graph = scene.graph_mut();
    graph.add_component(node, Recorder::boxed(FIRST, &[SECOND], &log)).unwrap();

    let result = graph.add_component(node, Recorder::boxed(SECOND, &[FIRST], &log));
    assert!(matches!(result, Err(crate::scene::SceneError::Dependency(_))));
    assert_eq!(graph.component_count(node), 1);
}

#[test]
fn test_update_skips_disabled_nodes_only() {
    let log = Log::default();
    let mut scene = Scene::new("disabled");
    let parent = scene.create_node("parent");
    let child = scene.create_node("child");
    scene.add(parent).unwrap();
    let graph = scene.graph_mut();
    graph.add_child(parent, child).unwrap();
    graph.add_component(parent, Recorder::boxed(FIRST, &[], &log)).unwrap();
    graph.add_component(child, Recorder::boxed(FIRST, &[], &log)).unwrap();
    graph.set_flags(parent, NodeFlags::ENABLED, false).unwrap();

    scene.update(1.0);
    assert_eq!(*log.lock(), vec!["child:First"]);
}

#[test]
fn test_update_components_can_move_their_node() {
    let mut scene = Scene::new("climb");
    let parent = scene.create_node("parent");
    let child = scene.create_node("child");
    scene.add(parent).unwrap();
    let graph = scene.graph_mut();
    graph.add_child(parent, child).unwrap();
    graph.add_component(parent, Box::new(Climber)).unwrap();

    scene.update(0.5);
    scene.update(0.5);
    assert_relative_eq!(
        scene.graph().global_transform(child).unwrap().translation,
        Vec3::new(0.0, 1.0, 0.0),
        epsilon = 1e-6
    );
}

#[test]
fn test_broadcast_reaches_enabled_nodes() {
    let log = Log::default();
    let mut scene = Scene::new("broadcast");
    let on = scene.create_node("on");
    let off = scene.create_node("off");
    scene.add(on).unwrap();
    scene.add(off).unwrap();
    let graph = scene.graph_mut();
    graph.add_component(on, Recorder::boxed(FIRST, &[], &log)).unwrap();
    graph.add_component(off, Recorder::boxed(FIRST, &[], &log)).unwrap();
    graph.set_flags(off, NodeFlags::ENABLED, false).unwrap();

    scene.broadcast_message(7, &"ping");
    assert_eq!(*log.lock(), vec!["on:7:ping"]);
}

#[test]
fn test_render_submits_visible_models() {
    let models = FlyweightRegistry::<Model>::new();
    let model_id = ResourceId::new("Model", "ship.mdl");
    let mesh = ResourceId::new("Mesh", "hull.msh");
    let record = ModelRecord {
        default_pipeline: Some(ResourceId::new("Pipeline", "solid.pln")),
        assemblies: vec![
            Assembly {
                mesh: Some(mesh),
                pipeline: None,
                material: None,
            },
            Assembly {
                mesh: None,
                pipeline: None,
                material: None,
            },
        ],
        ..Default::default()
    };
    models.pack(model_id.path_id, Model::from_record(record)).unwrap();

    let mut scene = Scene::new("render");
    let shown = scene.create_node("shown");
    let hidden = scene.create_node("hidden");
    scene.add(shown).unwrap();
    scene.add(hidden).unwrap();
    for node in [shown, hidden] {
        let mut state = ModelState::new(Arc::clone(&models));
        state.set_model(model_id);
        scene.graph_mut().add_component(node, Box::new(state)).unwrap();
    }
    scene
        .graph_mut()
        .set_local_transform(shown, Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)))
        .unwrap();
    scene.graph_mut().set_flags(hidden, NodeFlags::VISIBLE, false).unwrap();

    let mut renderer = CountingRenderer::default();
    scene.render(&mut renderer);
    assert_eq!(renderer.draws, vec![(Vec3::new(1.0, 2.0, 3.0), mesh)]);

    // Unpacking the model stops submission without touching the scene.
    models.unpack(model_id.path_id);
    let mut renderer = CountingRenderer::default();
    scene.render(&mut renderer);
    assert!(renderer.draws.is_empty());
}

#[test]
fn test_camera_matrices() {
    let mut scene = Scene::new("camera");
    let eye = scene.create_node("eye");
    scene.add(eye).unwrap();
    scene
        .graph_mut()
        .set_local_transform(eye, Transform::from_translation(Vec3::new(0.0, 0.0, 10.0)))
        .unwrap();
    assert!(scene.view_matrix().is_none());

    scene.set_camera(Some(eye)).unwrap();
    let view = scene.view_matrix().unwrap();
    let origin = view.transform_point(&crate::foundation::math::Point3::origin());
    assert_relative_eq!(origin.z, -10.0, epsilon = 1e-5);
    assert!(scene.projection_matrix(1.5).is_none());

    scene
        .graph_mut()
        .add_component(eye, Box::new(Camera::default()))
        .unwrap();
    let projection = scene.projection_matrix(1.5).unwrap();
    assert_relative_eq!(projection, Camera::default().projection_matrix(1.5).unwrap());

    let camera = scene.graph_mut().component_as_mut::<Camera>(eye).unwrap();
    camera.set_near_plane(5.0);
    camera.set_far_plane(5.0);
    assert!(scene.projection_matrix(1.0).is_none());

    scene.destroy(eye).unwrap();
    assert_eq!(scene.camera(), None);
}

#[test]
fn test_point_lights_report_world_positions() {
    let mut scene = Scene::new("lights");
    let lamp_post = scene.create_node("post");
    let bulb = scene.create_node("bulb");
    let plain = scene.create_node("plain");
    scene.add(lamp_post).unwrap();
    scene.add(plain).unwrap();
    let graph = scene.graph_mut();
    graph.add_child(lamp_post, bulb).unwrap();
    graph.add_component(bulb, Box::new(PointLight)).unwrap();
    graph
        .set_local_transform(lamp_post, Transform::from_translation(Vec3::new(2.0, 0.0, 0.0)))
        .unwrap();
    graph
        .set_local_transform(bulb, Transform::from_translation(Vec3::new(0.0, 3.0, 0.0)))
        .unwrap();

    let lights = scene.point_lights();
    assert_eq!(lights.len(), 1);
    assert_relative_eq!(lights[0], Vec3::new(2.0, 3.0, 0.0), epsilon = 1e-6);
}

#[test]
fn test_settings_drive_node_defaults() {
    let settings = SceneSettings {
        default_name: "configured".to_string(),
        nodes_enabled: true,
        nodes_visible: false,
    };
    let mut scene = Scene::from_settings(&settings);
    let node = scene.create_node("n");
    assert_eq!(scene.name(), "configured");
    assert_eq!(scene.graph().flags(node), Some(NodeFlags::ENABLED));
}

#[test]
fn test_scene_root_list_delegates() {
    let mut scene = Scene::new("roots");
    let a = scene.create_node("a");
    let b = scene.create_node("b");
    let c = scene.create_node("c");
    scene.add(a).unwrap();
    scene.add(c).unwrap();
    scene.insert(1, b).unwrap();
    assert_eq!(scene.roots(), &[a, b, c]);
    assert_eq!(scene.child(2), Some(c));
    assert_eq!(scene.child_count(), 3);

    assert_eq!(scene.remove_by_index(0).unwrap(), a);
    scene.remove(c).unwrap();
    assert_eq!(scene.roots(), &[b]);
    assert!(scene.remove(c).is_err());
    assert_eq!(scene.index_of(b).unwrap(), 0);
    assert_eq!(scene.len(), 3);

    scene.graph_mut().add_child(b, a).unwrap();
    scene.move_node(0, a).unwrap();
    assert_eq!(scene.roots(), &[a, b]);
    assert_eq!(scene.pre_order(), vec![a, b]);
}
