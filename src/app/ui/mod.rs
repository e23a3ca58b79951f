use std::collections::{BTreeSet, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};

use eframe::egui::{self, Context, Sense};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use packet_topo::config::SceneConfig;
use packet_topo::error::Result;
use packet_topo::scene::camera::CameraState;
use packet_topo::scene::mapper::Viewport;
use packet_topo::scene::renderer::{FrameMode, SceneRenderer};
use packet_topo::scene::{Scene, SceneObserver};

use super::Loaded;
use super::input::InputBridge;

mod details;
mod fps;
mod panels;

const SEARCH_RESULT_LIMIT: usize = 12;

/// What the scene reported since the last frame.
#[derive(Clone, Debug, PartialEq)]
enum SceneEvent {
    Selected { id: String, additive: bool },
    SelectedMany { count: usize },
    Cleared,
    Hovered(Option<String>),
    Camera(CameraState),
}

struct ChannelObserver {
    tx: Sender<SceneEvent>,
}

impl ChannelObserver {
    fn send(&self, event: SceneEvent) {
        let _ = self.tx.send(event);
    }
}

impl SceneObserver for ChannelObserver {
    fn on_select(&mut self, id: &str, additive: bool) {
        self.send(SceneEvent::Selected {
            id: id.to_owned(),
            additive,
        });
    }

    fn on_select_many(&mut self, ids: &BTreeSet<String>, _additive: bool) {
        self.send(SceneEvent::SelectedMany { count: ids.len() });
    }

    fn on_clear_selection(&mut self) {
        self.send(SceneEvent::Cleared);
    }

    fn on_hover(&mut self, id: Option<&str>) {
        self.send(SceneEvent::Hovered(id.map(str::to_owned)));
    }

    fn on_camera_changed(&mut self, camera: CameraState) {
        self.send(SceneEvent::Camera(camera));
    }
}

struct SearchCache {
    query: String,
    graph_revision: u64,
    hits: Vec<(String, i64)>,
}

pub(super) struct ViewModel {
    scene: Scene,
    events: Receiver<SceneEvent>,
    input: InputBridge,
    self_call: Option<String>,
    graph_revision: u64,
    fit_pending: bool,
    search: String,
    search_cache: Option<SearchCache>,
    focus_selection: bool,
    applied_focus: Option<BTreeSet<String>>,
    hovered: Option<String>,
    zoom: f32,
    status: Option<String>,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

impl ViewModel {
    pub(super) fn new(
        config: SceneConfig,
        renderer: Result<SceneRenderer>,
        self_call: Option<String>,
        loaded: Loaded,
    ) -> Self {
        let (tx, events) = mpsc::channel();
        let mut scene = Scene::new(config, Box::new(ChannelObserver { tx }));
        scene.set_renderer(renderer);

        let mut model = Self {
            scene,
            events,
            input: InputBridge::default(),
            self_call,
            graph_revision: 0,
            fit_pending: true,
            search: String::new(),
            search_cache: None,
            focus_selection: false,
            applied_focus: None,
            hovered: None,
            zoom: 1.0,
            status: None,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        };
        model.apply(loaded);
        model
    }

    /// Installs a freshly loaded snapshot, keeping camera and surviving
    /// selection.
    pub(super) fn apply(&mut self, loaded: Loaded) {
        let Loaded {
            snapshot,
            positions,
        } = loaded;
        let self_call = snapshot.self_call.or_else(|| self.self_call.clone());
        self.scene.set_self_call(self_call.clone());
        self.self_call = self_call;
        self.scene.set_graph(snapshot.graph, positions);
        self.graph_revision += 1;
        self.applied_focus = None;
        self.sync_focus();
        self.status = Some(format!(
            "loaded {} nodes / {} edges",
            self.scene.graph().node_count(),
            self.scene.graph().edge_count()
        ));
    }

    pub(super) fn set_status(&mut self, status: String) {
        self.status = Some(status);
    }

    /// Draws the whole window. Returns whether a reload was requested.
    pub(super) fn show(&mut self, ctx: &Context, source: &str, is_reloading: bool) -> bool {
        self.update_fps_counter(ctx);
        self.drain_events();

        let reload_requested = self.show_top_bar(ctx, source, is_reloading);
        self.show_status_bar(ctx);
        self.show_search_panel(ctx);
        self.show_details_panel(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let rect = ui.available_rect_before_wrap();
                let response = ui.allocate_rect(rect, Sense::hover());
                self.show_scene(ctx, ui.painter_at(rect), rect, response.contains_pointer());
            });

        self.drain_events();
        self.sync_focus();
        reload_requested
    }

    fn show_scene(&mut self, ctx: &Context, painter: egui::Painter, rect: egui::Rect, hovered: bool) {
        let pixels_per_point = ctx.pixels_per_point();
        let viewport = Viewport::new(rect.size(), pixels_per_point);
        self.scene.set_viewport(viewport);
        if self.fit_pending && viewport.is_drawable() {
            self.scene.request_fit_to_view();
            self.fit_pending = false;
        }

        let events = ctx.input(|input| self.input.collect(input, rect, hovered));
        for event in events {
            self.scene.handle_input(event);
        }
        if self.scene.is_panning() {
            ctx.set_cursor_icon(egui::CursorIcon::Grabbing);
        } else if hovered && self.scene.selection().hovered().is_some() {
            ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        let dt = ctx.input(|input| input.stable_dt).min(0.1);
        let mode = self.scene.frame(dt, viewport);
        self.scene.paint(&painter, rect);
        if mode == FrameMode::Animating {
            ctx.request_repaint();
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SceneEvent::Selected { id, additive } => {
                    tracing::debug!(%id, additive, "node selected");
                    self.status = Some(format!("selected {id}"));
                }
                SceneEvent::SelectedMany { count } => {
                    self.status = Some(format!("selected {count} nodes"));
                }
                SceneEvent::Cleared => self.status = None,
                SceneEvent::Hovered(id) => self.hovered = id,
                SceneEvent::Camera(camera) => self.zoom = camera.scale,
            }
        }
    }

    /// Keeps the dimmed neighborhood in step with the selection while the
    /// focus toggle is on.
    fn sync_focus(&mut self) {
        let wanted = if self.focus_selection && !self.scene.selection().is_empty() {
            let graph = self.scene.graph();
            Some(
                self.scene
                    .selection()
                    .selected()
                    .iter()
                    .flat_map(|id| graph.neighborhood(id))
                    .collect::<BTreeSet<_>>(),
            )
        } else {
            None
        };
        if wanted != self.applied_focus {
            self.scene.set_focus_neighborhood(wanted.clone());
            self.applied_focus = wanted;
        }
    }

    fn search_hits(&mut self) -> &[(String, i64)] {
        let query = self.search.trim().to_owned();
        let stale = self
            .search_cache
            .as_ref()
            .is_none_or(|cache| cache.query != query || cache.graph_revision != self.graph_revision);
        if stale {
            let matcher = SkimMatcherV2::default();
            let mut hits = if query.is_empty() {
                Vec::new()
            } else {
                self.scene
                    .graph()
                    .nodes
                    .iter()
                    .filter_map(|node| {
                        let score = fuzzy_match_score(&matcher, &node.id, &query).max(
                            fuzzy_match_score(&matcher, node.display_label(), &query),
                        )?;
                        Some((node.id.clone(), score))
                    })
                    .collect::<Vec<_>>()
            };
            hits.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            hits.truncate(SEARCH_RESULT_LIMIT);
            self.search_cache = Some(SearchCache {
                query,
                graph_revision: self.graph_revision,
                hits,
            });
        }
        self.search_cache
            .as_ref()
            .map(|cache| cache.hits.as_slice())
            .unwrap_or_default()
    }

    /// Selects `id` and flies the camera to it.
    fn jump_to(&mut self, id: &str) {
        self.scene.set_selection([id.to_owned()]);
        if !self.scene.request_focus(id) {
            self.status = Some(format!("{id} is not drawn"));
        }
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}
