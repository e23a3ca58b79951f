//! The interactive graph scene: buffers, camera, picking and input wired
//! together behind one host-facing type.

pub mod build;
pub mod camera;
pub mod interaction;
pub mod labels;
pub mod mapper;
pub mod renderer;
pub mod selection;

use std::collections::BTreeSet;
use std::sync::Arc;

use eframe::egui::{Painter, Pos2, Rect};

use crate::config::SceneConfig;
use crate::error::Result;
use crate::graph::{GraphModel, NodePosition};

use build::{BuildInput, HighlightData, RenderData, RenderDataBuilder};
use camera::{Camera, CameraState};
use hit_test::HitTester;
use interaction::{InputEvent, Intent, InteractionController, NodePicker};
use mapper::{CoordinateMapper, Space, Viewport};
use renderer::{FrameMode, FrameScheduler, FrameView, SceneRenderer};
use selection::SelectionState;

/// Callbacks into the host. Every method defaults to doing nothing.
pub trait SceneObserver {
    fn on_select(&mut self, _id: &str, _additive: bool) {}
    fn on_select_many(&mut self, _ids: &BTreeSet<String>, _additive: bool) {}
    fn on_clear_selection(&mut self) {}
    fn on_hover(&mut self, _id: Option<&str>) {}
    fn on_camera_changed(&mut self, _camera: CameraState) {}
}

pub struct NoopObserver;

impl SceneObserver for NoopObserver {}

/// Hit-testing in device pixels for locations given in logical points.
struct ScenePicker<'a> {
    tester: &'a HitTester,
    data: Option<&'a RenderData>,
    viewport: Viewport,
    camera: CameraState,
}

impl NodePicker for ScenePicker<'_> {
    fn pick(&self, point: Pos2) -> Option<String> {
        let data = self.data?;
        self.tester
            .hit_test(
                data,
                self.viewport.to_device(point),
                &self.viewport,
                &self.camera,
                Space::Device,
            )
            .map(str::to_owned)
    }

    fn pick_rect(&self, rect: Rect) -> BTreeSet<String> {
        let Some(data) = self.data else {
            return BTreeSet::new();
        };
        self.tester.nodes_in_rect(
            data,
            self.viewport.rect_to_device(rect),
            &self.viewport,
            &self.camera,
            Space::Device,
        )
    }
}

pub struct Scene {
    config: SceneConfig,
    mapper: CoordinateMapper,
    camera: Camera,
    builder: RenderDataBuilder,
    hit_tester: HitTester,
    controller: InteractionController,
    selection: SelectionState,
    renderer: Option<SceneRenderer>,
    scheduler: FrameScheduler,
    observer: Box<dyn SceneObserver>,
    graph: GraphModel,
    positions: Vec<NodePosition>,
    focus: BTreeSet<String>,
    self_call: Option<String>,
    data: Option<Arc<RenderData>>,
    highlight: Option<Arc<HighlightData>>,
    reported_camera: CameraState,
}

impl Scene {
    pub fn new(config: SceneConfig, observer: Box<dyn SceneObserver>) -> Self {
        let mapper = CoordinateMapper::new(&config.mapping);
        Self {
            camera: Camera::new(config.camera.clone(), mapper),
            builder: RenderDataBuilder::new(config.style.clone(), &config.limits),
            hit_tester: HitTester::new(mapper, &config.hit_test),
            controller: InteractionController::new(config.interaction.clone()),
            selection: SelectionState::default(),
            renderer: Some(SceneRenderer::new(config.style.clone())),
            scheduler: FrameScheduler::new(config.camera.settle_grace_secs),
            observer,
            graph: GraphModel::default(),
            positions: Vec::new(),
            focus: BTreeSet::new(),
            self_call: None,
            data: None,
            highlight: None,
            reported_camera: CameraState::default(),
            mapper,
            config,
        }
    }

    /// Installs the host's renderer, or disables drawing when it could not
    /// be created. Picking and input keep working either way.
    pub fn set_renderer(&mut self, renderer: Result<SceneRenderer>) {
        match renderer {
            Ok(mut renderer) => {
                if let (Some(data), Some(highlight)) = (&self.data, &self.highlight) {
                    renderer.set_buffers(Arc::clone(data), Arc::clone(highlight));
                }
                self.renderer = Some(renderer);
            }
            Err(error) => {
                tracing::warn!(%error, "scene drawing disabled");
                self.renderer = None;
            }
        }
    }

    pub fn rendering_enabled(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn render_data(&self) -> Option<&Arc<RenderData>> {
        self.data.as_ref()
    }

    pub fn base_rebuilds(&self) -> u64 {
        self.builder.base_rebuilds()
    }

    pub fn highlight_rebuilds(&self) -> u64 {
        self.builder.highlight_rebuilds()
    }

    pub fn frame_mode(&self) -> FrameMode {
        self.scheduler.mode()
    }

    /// Replaces the snapshot. Selected ids missing from the new node set are
    /// dropped without a callback.
    pub fn set_graph(&mut self, graph: GraphModel, positions: Vec<NodePosition>) {
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            positions = positions.len(),
            "scene refresh"
        );
        self.graph = graph;
        self.positions = positions;

        let present = self.graph.node_ids();
        let hovered_gone = self
            .selection
            .hovered()
            .is_some_and(|id| !present.contains(id));
        let pruned = self.selection.retain_present(|id| present.contains(id));
        if pruned > 0 {
            tracing::debug!(pruned, "dropped selection ids missing from refresh");
        }
        if hovered_gone {
            self.controller.reset_hover();
            self.observer.on_hover(None);
        }
        self.refresh();
    }

    /// Dims everything outside `ids`; `None` or an empty set shows all.
    pub fn set_focus_neighborhood(&mut self, ids: Option<BTreeSet<String>>) {
        self.focus = ids.unwrap_or_default();
        self.refresh();
    }

    /// Focus on `id` and its direct neighbors.
    pub fn focus_neighborhood_of(&mut self, id: &str) {
        let ids = self.graph.neighborhood(id);
        self.set_focus_neighborhood(Some(ids));
    }

    pub fn set_self_call(&mut self, self_call: Option<String>) {
        self.self_call = self_call.filter(|call| !call.trim().is_empty());
        self.refresh();
    }

    pub fn request_fit_to_view(&mut self) {
        let bounds = self.data.as_ref().and_then(|data| data.bounds);
        match bounds {
            Some(bounds) => {
                let viewport = self.camera.viewport();
                self.camera.fit_to_bounds(
                    bounds.min.x,
                    bounds.min.y,
                    bounds.max.x,
                    bounds.max.y,
                    viewport,
                    self.config.camera.fit_padding,
                );
            }
            None => self.camera.zoom_to_fit(),
        }
        self.scheduler.wake();
    }

    pub fn request_reset(&mut self) {
        self.camera.reset();
        self.scheduler.wake();
    }

    /// Centers the camera on a rendered node. Returns false for unknown or
    /// unplaced ids.
    pub fn request_focus(&mut self, id: &str) -> bool {
        let Some(center) = self
            .data
            .as_ref()
            .and_then(|data| data.node(id))
            .map(|node| node.center())
        else {
            tracing::debug!(id, "focus request for a node that is not rendered");
            return false;
        };
        self.camera.focus(center);
        self.scheduler.wake();
        true
    }

    /// Host-driven selection. Unknown ids are ignored; no callback fires.
    pub fn set_selection<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        let present = self.graph.node_ids();
        let ids = ids
            .into_iter()
            .filter(|id| present.contains(id.as_str()))
            .collect::<Vec<_>>();
        self.selection.replace(ids);
        self.refresh_highlight();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.refresh_highlight();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.camera.set_viewport(viewport);
    }

    /// Node under a point given in logical view points.
    pub fn hit_test(&self, point: Pos2) -> Option<String> {
        self.picker().pick(point)
    }

    /// Nodes inside a rectangle given in logical view points.
    pub fn nodes_in_rect(&self, rect: Rect) -> BTreeSet<String> {
        self.picker().pick_rect(rect)
    }

    /// Rubber band of an in-flight rectangle select, in logical points.
    pub fn selection_rect(&self) -> Option<Rect> {
        self.controller.selection_rect()
    }

    /// Feeds one input event through the gesture state machine. Returns
    /// whether the scene consumed it.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        let target_before = self.camera.target();
        let picker = ScenePicker {
            tester: &self.hit_tester,
            data: self.data.as_deref(),
            viewport: self.camera.viewport(),
            camera: self.camera.current(),
        };
        let outcome = self.controller.handle(event, &mut self.camera, &picker);

        let had_intents = !outcome.intents.is_empty();
        for intent in outcome.intents {
            self.apply_intent(intent);
        }
        if had_intents {
            self.refresh_highlight();
        }
        if had_intents || self.camera.target() != target_before || self.camera.has_momentum() {
            self.scheduler.wake();
        }
        outcome.consumed
    }

    /// Advances the camera by `dt` seconds. Returns whether the host should
    /// keep requesting frames.
    pub fn frame(&mut self, dt: f32, viewport: Viewport) -> FrameMode {
        self.camera.set_viewport(viewport);
        let moved = self.camera.tick(dt);

        let current = self.camera.current();
        if current != self.reported_camera {
            self.reported_camera = current;
            self.observer.on_camera_changed(current);
        }

        let busy = moved || !self.camera.is_settled();
        self.scheduler.update(busy, dt)
    }

    /// Whether a pointer drag is currently panning the view.
    pub fn is_panning(&self) -> bool {
        self.controller.is_panning()
    }

    /// Draws the scene into `rect`, which must be the area last passed to
    /// [`Scene::set_viewport`] or [`Scene::frame`]. Does nothing when drawing
    /// is disabled.
    pub fn paint(&mut self, painter: &Painter, rect: Rect) {
        let (viewport, camera, labels) = self.frame_plan();
        let selection_rect = self.controller.selection_rect();
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        renderer.paint(
            painter,
            &FrameView {
                rect,
                viewport,
                camera,
                mapper: &self.mapper,
                labels: &labels,
                selection_rect,
            },
        );
    }

    /// Viewport, camera and labels for the next paint, taken from the same
    /// state picking uses.
    fn frame_plan(&self) -> (Viewport, CameraState, Vec<labels::LabelPlacement>) {
        let viewport = self.camera.viewport();
        let camera = self.camera.current();
        let labels = self
            .data
            .as_ref()
            .map(|data| {
                labels::place_labels(
                    data,
                    &self.selection,
                    &self.mapper,
                    &viewport,
                    &camera,
                    &self.config.limits,
                )
            })
            .unwrap_or_default();
        (viewport, camera, labels)
    }

    fn picker(&self) -> ScenePicker<'_> {
        ScenePicker {
            tester: &self.hit_tester,
            data: self.data.as_deref(),
            viewport: self.camera.viewport(),
            camera: self.camera.current(),
        }
    }

    fn apply_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Select { id, additive } => {
                self.selection.select(&id, additive);
                self.observer.on_select(&id, additive);
            }
            Intent::SelectMany { ids, additive } => {
                self.selection.select_many(ids.iter().cloned(), additive);
                self.observer.on_select_many(&ids, additive);
            }
            Intent::ClearSelection => {
                self.selection.clear();
                self.observer.on_clear_selection();
            }
            Intent::Hover(id) => {
                self.selection.set_hovered(id.clone());
                self.observer.on_hover(id.as_deref());
            }
            Intent::Focus(id) => {
                self.request_focus(&id);
            }
        }
    }

    fn refresh(&mut self) {
        let input = BuildInput {
            graph: &self.graph,
            positions: &self.positions,
            focus: &self.focus,
            self_call: self.self_call.as_deref(),
        };
        let (data, rebuilt) = self.builder.build(&input);
        if rebuilt {
            self.scheduler.wake();
        }
        self.data = Some(data);
        self.refresh_highlight();
    }

    fn refresh_highlight(&mut self) {
        let Some(data) = &self.data else {
            return;
        };
        let (highlight, rebuilt) = self.builder.build_highlight(data, &self.selection);
        if rebuilt {
            self.scheduler.wake();
        }
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.set_buffers(Arc::clone(data), Arc::clone(&highlight));
        }
        self.highlight = Some(highlight);
    }
}
