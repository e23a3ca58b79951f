use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use anyhow::Result;
use eframe::egui::{self, Context};
use packet_topo::config::SceneConfig;
use packet_topo::error::SceneError;
use packet_topo::graph::{NodePosition, Snapshot, load_snapshot, sample_snapshot};
use packet_topo::layout::{DEFAULT_ITERATIONS, layout_graph};
use packet_topo::scene::renderer::SceneRenderer;

mod input;
mod ui;

use ui::ViewModel;

const DEMO_SELF_CALL: &str = "N0CALL";

#[derive(Clone, Debug)]
pub enum SnapshotSource {
    File(PathBuf),
    Demo { nodes: usize },
}

impl SnapshotSource {
    fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Demo { nodes } => format!("demo network ({nodes} nodes)"),
        }
    }
}

/// A snapshot with every node placed.
pub(crate) struct Loaded {
    pub(crate) snapshot: Snapshot,
    pub(crate) positions: Vec<NodePosition>,
}

type LoadResult = Result<Loaded, String>;

pub struct PacketTopoApp {
    source: SnapshotSource,
    config: SceneConfig,
    self_call: Option<String>,
    renderer: Option<packet_topo::error::Result<SceneRenderer>>,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

impl PacketTopoApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: SceneConfig,
        source: SnapshotSource,
        self_call: Option<String>,
    ) -> Self {
        let renderer = SceneRenderer::for_context(cc, config.style.clone());
        let state = Self::start_load(&source, self_call.clone());
        Self {
            source,
            config,
            self_call,
            renderer: Some(renderer),
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: SnapshotSource, self_call: Option<String>) -> Receiver<LoadResult> {
        let (tx, rx): (Sender<LoadResult>, _) = mpsc::channel();

        thread::spawn(move || {
            let result = load(&source, self_call.as_deref()).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: &SnapshotSource, self_call: Option<String>) -> AppState {
        tracing::info!(source = %source.describe(), "loading topology");
        AppState::Loading {
            rx: Self::spawn_load(source.clone(), self_call),
        }
    }

    fn ready(&mut self, loaded: Loaded) -> AppState {
        let renderer = self.renderer.take().unwrap_or_else(|| {
            Err(SceneError::RendererUnavailable(
                "renderer was already handed to a scene".to_owned(),
            ))
        });
        AppState::Ready(Box::new(ViewModel::new(
            self.config.clone(),
            renderer,
            self.self_call.clone(),
            loaded,
        )))
    }
}

fn load(source: &SnapshotSource, self_call: Option<&str>) -> Result<Loaded> {
    let mut snapshot = match source {
        SnapshotSource::File(path) => load_snapshot(path)?,
        SnapshotSource::Demo { nodes } => {
            sample_snapshot(*nodes, self_call.unwrap_or(DEMO_SELF_CALL))
        }
    };
    if snapshot.self_call.is_none() {
        snapshot.self_call = self_call.map(str::to_owned);
    }

    let positions = match snapshot.positions.take() {
        Some(positions) => positions,
        None => {
            tracing::debug!(nodes = snapshot.graph.node_count(), "computing layout");
            layout_graph(&snapshot.graph, DEFAULT_ITERATIONS)
        }
    };
    Ok(Loaded {
        snapshot,
        positions,
    })
}

impl eframe::App for PacketTopoApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(result);
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading network topology...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load network topology");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.state = Self::start_load(&self.source, self.self_call.clone());
                    return;
                }
            }
            AppState::Ready(model) => {
                let is_reloading = self.reload_rx.is_some();
                let reload_requested = model.show(ctx, &self.source.describe(), is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    tracing::info!(source = %self.source.describe(), "reloading topology");
                    self.reload_rx = Some(Self::spawn_load(self.source.clone(), self.self_call.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(loaded)) => model.apply(loaded),
                        Ok(Err(error)) => {
                            tracing::warn!(%error, "reload failed, keeping the current snapshot");
                            model.set_status(format!("reload failed: {error}"));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            model.set_status("background load worker disconnected".to_owned());
                        }
                    }
                }
            }
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(loaded) => self.ready(loaded),
                Err(error) => {
                    tracing::error!(%error, "failed to load topology");
                    AppState::Error(error)
                }
            };
            ctx.request_repaint();
        }
    }
}
