mod app;

use std::path::PathBuf;

use clap::Parser;
use packet_topo::config::{SceneConfig, load_config};
use tracing_subscriber::EnvFilter;

use app::{PacketTopoApp, SnapshotSource};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Topology snapshot (JSON). A generated demo network is shown when omitted.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Scene configuration (JSON). Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// The monitoring station's own callsign, highlighted in the graph.
    #[arg(long)]
    self_call: Option<String>,

    /// Node count of the generated demo network.
    #[arg(long, default_value_t = 120)]
    demo_nodes: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path).unwrap_or_else(|error| {
            tracing::warn!("using default scene config: {error:#}");
            SceneConfig::default()
        }),
        None => SceneConfig::default(),
    };

    let source = match args.snapshot {
        Some(path) => SnapshotSource::File(path),
        None => SnapshotSource::Demo {
            nodes: args.demo_nodes,
        },
    };
    let self_call = args.self_call.filter(|call| !call.trim().is_empty());

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "packet-topo",
        options,
        Box::new(move |cc| Ok(Box::new(PacketTopoApp::new(cc, config, source, self_call)))),
    )
    .map_err(|error| anyhow::anyhow!("eframe exited with an error: {error}"))
}
