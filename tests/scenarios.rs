use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use eframe::egui::{Pos2, Rect, pos2, vec2};
use packet_topo::config::{SceneConfig, YAxis};
use packet_topo::error::SceneError;
use packet_topo::graph::{Edge, GraphModel, Node, NodePosition};
use packet_topo::scene::camera::CameraState;
use packet_topo::scene::interaction::InputEvent;
use packet_topo::scene::mapper::Viewport;
use packet_topo::scene::renderer::FrameMode;
use packet_topo::scene::{NoopObserver, Scene, SceneObserver};

const SIZE: f32 = 1000.0;

fn diagonal() -> (GraphModel, Vec<NodePosition>) {
    let graph = GraphModel::new(
        vec![Node::new("N1", 5), Node::new("N2", 50), Node::new("N3", 500)],
        vec![Edge::new("N1", "N2", 4), Edge::new("N2", "N3", 9)],
    );
    let positions = vec![
        NodePosition::new("N1", 0.1, 0.1),
        NodePosition::new("N2", 0.4, 0.4),
        NodePosition::new("N3", 0.9, 0.9),
    ];
    (graph, positions)
}

fn scene_with(config: SceneConfig, observer: Box<dyn SceneObserver>) -> Scene {
    let mut scene = Scene::new(config, observer);
    scene.set_viewport(Viewport::logical(SIZE, SIZE));
    let (graph, positions) = diagonal();
    scene.set_graph(graph, positions);
    scene
}

fn scene() -> Scene {
    scene_with(SceneConfig::default(), Box::new(NoopObserver))
}

/// Where a normalized position lands at the identity camera.
fn on_screen(scene: &Scene, x: f32, y: f32) -> Pos2 {
    scene.mapper().normalized_to_logical(
        pos2(x, y),
        &Viewport::logical(SIZE, SIZE),
        &CameraState::default(),
    )
}

fn click(scene: &mut Scene, at: Pos2, time: f64) {
    scene.handle_input(InputEvent::down(at, time));
    scene.handle_input(InputEvent::up(at, time + 0.05));
}

fn settle(scene: &mut Scene) {
    for _ in 0..2_000 {
        scene.frame(1.0 / 60.0, Viewport::logical(SIZE, SIZE));
        if scene.camera().is_settled() {
            return;
        }
    }
    panic!("camera never settled");
}

fn selected(scene: &Scene) -> Vec<&str> {
    scene
        .selection()
        .selected()
        .iter()
        .map(String::as_str)
        .collect()
}

#[derive(Default)]
struct Recorder(Rc<RefCell<Vec<String>>>);

impl SceneObserver for Recorder {
    fn on_select(&mut self, id: &str, additive: bool) {
        self.0.borrow_mut().push(format!("select {id} {additive}"));
    }

    fn on_select_many(&mut self, ids: &BTreeSet<String>, additive: bool) {
        let ids = ids.iter().cloned().collect::<Vec<_>>().join(",");
        self.0.borrow_mut().push(format!("select_many {ids} {additive}"));
    }

    fn on_clear_selection(&mut self) {
        self.0.borrow_mut().push("clear".to_owned());
    }

    fn on_hover(&mut self, id: Option<&str>) {
        self.0.borrow_mut().push(format!("hover {}", id.unwrap_or("-")));
    }
}

#[test]
fn refresh_drops_selected_ids_that_disappeared() {
    let mut scene = scene();
    scene.set_selection(["N3".to_owned(), "N1".to_owned()]);
    assert_eq!(selected(&scene), ["N1", "N3"]);

    let graph = GraphModel::new(vec![Node::new("N1", 5), Node::new("N2", 50)], Vec::new());
    let positions = vec![
        NodePosition::new("N1", 0.1, 0.1),
        NodePosition::new("N2", 0.4, 0.4),
    ];
    scene.set_graph(graph, positions);
    assert_eq!(selected(&scene), ["N1"]);

    scene.set_graph(GraphModel::default(), Vec::new());
    assert!(scene.selection().is_empty());
}

#[test]
fn shift_drag_selects_nodes_inside_the_rubber_band() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut scene = scene_with(SceneConfig::default(), Box::new(Recorder(Rc::clone(&log))));

    scene.handle_input(InputEvent::down(pos2(50.0, 50.0), 0.0).with_shift());
    scene.handle_input(InputEvent::moved(pos2(300.0, 300.0), 0.05));
    assert_eq!(
        scene.selection_rect(),
        Some(Rect::from_min_max(pos2(50.0, 50.0), pos2(300.0, 300.0)))
    );
    scene.handle_input(InputEvent::moved(pos2(550.0, 550.0), 0.1));
    scene.handle_input(InputEvent::up(pos2(550.0, 550.0), 0.15));

    assert_eq!(selected(&scene), ["N1", "N2"]);
    assert!(scene.selection_rect().is_none());
    assert_eq!(scene.camera().target(), CameraState::default());
    assert_eq!(log.borrow().last().map(String::as_str), Some("select_many N1,N2 true"));
}

#[test]
fn fit_to_view_frames_the_layout_with_padding() {
    let mut scene = Scene::new(SceneConfig::default(), Box::new(NoopObserver));
    scene.set_viewport(Viewport::logical(SIZE, SIZE));
    let graph = GraphModel::new(vec![Node::new("A", 1), Node::new("B", 1)], Vec::new());
    scene.set_graph(
        graph,
        vec![NodePosition::new("A", 0.0, 0.0), NodePosition::new("B", 1.0, 1.0)],
    );

    scene.request_fit_to_view();
    settle(&mut scene);

    let camera = scene.camera().current();
    assert!((camera.scale - 0.8).abs() < 1e-4, "scale {}", camera.scale);
    assert!(camera.offset.length() < 1e-3, "offset {:?}", camera.offset);
}

#[test]
fn click_selects_while_drag_pans() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut scene = scene_with(SceneConfig::default(), Box::new(Recorder(Rc::clone(&log))));

    let n1 = on_screen(&scene, 0.1, 0.1);
    click(&mut scene, n1, 0.0);
    assert_eq!(selected(&scene), ["N1"]);
    assert_eq!(log.borrow().as_slice(), ["select N1 false"]);

    scene.handle_input(InputEvent::down(pos2(600.0, 200.0), 1.0));
    scene.handle_input(InputEvent::moved(pos2(700.0, 260.0), 1.05));
    scene.handle_input(InputEvent::up(pos2(700.0, 260.0), 1.5));
    assert_eq!(scene.camera().target().offset, vec2(100.0, 60.0));
    assert_eq!(selected(&scene), ["N1"], "a drag leaves the selection alone");
    assert!(!scene.camera().has_momentum());

    click(&mut scene, pos2(600.0, 200.0), 2.0);
    assert!(scene.selection().is_empty());
    assert_eq!(log.borrow().last().map(String::as_str), Some("clear"));
}

#[test]
fn shift_click_toggles_membership() {
    let mut scene = scene();
    let n1 = on_screen(&scene, 0.1, 0.1);
    let n2 = on_screen(&scene, 0.4, 0.4);

    click(&mut scene, n1, 0.0);
    scene.handle_input(InputEvent::down(n2, 1.0).with_shift());
    scene.handle_input(InputEvent::up(n2, 1.05).with_shift());
    assert_eq!(selected(&scene), ["N1", "N2"]);

    scene.handle_input(InputEvent::down(n1, 2.0).with_shift());
    scene.handle_input(InputEvent::up(n1, 2.05).with_shift());
    assert_eq!(selected(&scene), ["N2"]);
}

#[test]
fn hover_is_reported_once_per_change() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut scene = scene_with(SceneConfig::default(), Box::new(Recorder(Rc::clone(&log))));
    let n2 = on_screen(&scene, 0.4, 0.4);

    scene.handle_input(InputEvent::moved(n2, 0.0));
    scene.handle_input(InputEvent::moved(n2 + vec2(1.0, 0.0), 0.01));
    scene.handle_input(InputEvent::moved(pos2(700.0, 100.0), 0.02));
    scene.handle_input(InputEvent::leave(0.03));

    assert_eq!(log.borrow().as_slice(), ["hover N2", "hover -"]);
    assert!(scene.selection().hovered().is_none());
}

#[test]
fn double_click_on_a_node_focuses_it() {
    let mut scene = scene();
    let n2 = on_screen(&scene, 0.4, 0.4);

    scene.handle_input(InputEvent::down(n2, 0.0).with_click_count(2));
    scene.handle_input(InputEvent::up(n2, 0.05));

    assert_eq!(selected(&scene), ["N2"]);
    let target = scene.camera().target();
    assert_eq!(target.scale, scene.config().camera.focus_scale);
    settle(&mut scene);
    let centered = scene.mapper().normalized_to_logical(
        pos2(0.4, 0.4),
        &Viewport::logical(SIZE, SIZE),
        &scene.camera().current(),
    );
    assert!((centered - pos2(500.0, 500.0)).length() < 0.5, "{centered:?}");
}

#[test]
fn scroll_zooms_only_with_the_zoom_modifier() {
    let mut scene = scene();
    let plain = InputEvent::scroll(pos2(500.0, 500.0), vec2(0.0, 40.0), 0.0);
    assert!(!scene.handle_input(plain));
    assert_eq!(scene.camera().target().scale, 1.0);

    let mut zooming = plain;
    zooming.modifiers.zoom = true;
    assert!(scene.handle_input(zooming));
    assert!(scene.camera().target().scale > 1.0);
    assert_eq!(scene.frame(1.0 / 60.0, Viewport::logical(SIZE, SIZE)), FrameMode::Animating);
}

#[test]
fn identical_refresh_reuses_render_data() {
    let mut scene = scene();
    assert_eq!(scene.base_rebuilds(), 1);
    let first = scene.render_data().cloned().expect("render data");

    let (graph, positions) = diagonal();
    scene.set_graph(graph, positions);
    assert_eq!(scene.base_rebuilds(), 1);
    let second = scene.render_data().cloned().expect("render data");
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    let highlights = scene.highlight_rebuilds();
    scene.set_selection(["N2".to_owned()]);
    assert_eq!(scene.base_rebuilds(), 1);
    assert_eq!(scene.highlight_rebuilds(), highlights + 1);

    scene.focus_neighborhood_of("N1");
    assert_eq!(scene.base_rebuilds(), 2);
}

#[test]
fn picking_survives_a_missing_renderer() {
    let mut scene = scene();
    scene.set_renderer(Err(SceneError::RendererUnavailable("headless".to_owned())));
    assert!(!scene.rendering_enabled());

    let n3 = on_screen(&scene, 0.9, 0.9);
    assert_eq!(scene.hit_test(n3).as_deref(), Some("N3"));
    click(&mut scene, n3, 0.0);
    assert_eq!(selected(&scene), ["N3"]);
}

#[test]
fn y_up_input_is_flipped_before_picking() {
    let mut config = SceneConfig::default();
    config.interaction.y_axis = YAxis::Up;
    let mut scene = scene_with(config, Box::new(NoopObserver));

    let n1 = on_screen(&scene, 0.1, 0.1);
    click(&mut scene, pos2(n1.x, SIZE - n1.y), 0.0);
    assert_eq!(selected(&scene), ["N1"]);
}

#[test]
fn focus_request_for_unknown_node_is_refused() {
    let mut scene = scene();
    assert!(!scene.request_focus("NOPE"));
    assert_eq!(scene.camera().target(), CameraState::default());
    assert!(scene.request_focus("N3"));
    assert_ne!(scene.camera().target(), CameraState::default());
}

#[test]
fn hover_is_cleared_when_the_hovered_node_disappears() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut scene = scene_with(SceneConfig::default(), Box::new(Recorder(Rc::clone(&log))));
    let n3 = on_screen(&scene, 0.9, 0.9);
    scene.handle_input(InputEvent::moved(n3, 0.0));
    assert_eq!(scene.selection().hovered(), Some("N3"));

    let graph = GraphModel::new(
        vec![Node::new("N1", 5), Node::new("N2", 50)],
        vec![Edge::new("N1", "N2", 4)],
    );
    let positions = vec![
        NodePosition::new("N1", 0.1, 0.1),
        NodePosition::new("N2", 0.4, 0.4),
    ];
    scene.set_graph(graph, positions);

    assert!(scene.selection().hovered().is_none());
    assert_eq!(log.borrow().as_slice(), ["hover N3", "hover -"]);
}

#[test]
fn holding_the_pointer_still_lets_frames_go_idle() {
    let mut scene = scene();
    scene.handle_input(InputEvent::down(pos2(700.0, 100.0), 0.0));

    let mut mode = FrameMode::Animating;
    for _ in 0..60 {
        mode = scene.frame(1.0 / 60.0, Viewport::logical(SIZE, SIZE));
    }
    assert_eq!(mode, FrameMode::Idle);
}

#[test]
fn rubber_band_selects_only_the_nodes_it_covers() {
    let mut scene = Scene::new(SceneConfig::default(), Box::new(NoopObserver));
    scene.set_viewport(Viewport::logical(SIZE, SIZE));
    let graph = GraphModel::new(
        vec![Node::new("a", 1), Node::new("b", 1), Node::new("c", 1)],
        Vec::new(),
    );
    scene.set_graph(
        graph,
        vec![
            NodePosition::new("a", 0.1, 0.1),
            NodePosition::new("b", 0.5, 0.5),
            NodePosition::new("c", 0.9, 0.9),
        ],
    );

    scene.handle_input(InputEvent::down(pos2(50.0, 50.0), 0.0).with_shift());
    scene.handle_input(InputEvent::moved(pos2(550.0, 550.0), 0.05));
    scene.handle_input(InputEvent::up(pos2(550.0, 550.0), 0.1));

    assert_eq!(selected(&scene), ["a", "b"]);
}
