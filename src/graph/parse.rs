use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use super::{Edge, GraphModel, Node, NodePosition};

/// A graph refresh as delivered by the aggregation side, optionally with a
/// precomputed layout.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub graph: GraphModel,
    pub positions: Option<Vec<NodePosition>>,
    pub self_call: Option<String>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default)]
    positions: Option<Vec<NodePosition>>,
    #[serde(default, rename = "self")]
    self_call: Option<String>,
}

pub fn parse_snapshot(raw: &str) -> Result<Snapshot> {
    let parsed: Value = serde_json::from_str(raw).context("invalid snapshot JSON")?;
    if !parsed.is_object() {
        return Err(anyhow!("unexpected JSON type for snapshot; expected an object"));
    }

    let raw = RawSnapshot::deserialize(parsed).context("invalid snapshot layout")?;
    if raw.nodes.iter().any(|node| node.id.trim().is_empty()) {
        return Err(anyhow!("snapshot contains a node with an empty id"));
    }

    let positions = raw.positions.map(|positions| {
        positions
            .into_iter()
            .filter(|position| position.x.is_finite() && position.y.is_finite())
            .map(|position| NodePosition {
                x: position.x.clamp(0.0, 1.0),
                y: position.y.clamp(0.0, 1.0),
                id: position.id,
            })
            .collect::<Vec<_>>()
    });

    Ok(Snapshot {
        graph: GraphModel::new(raw.nodes, raw.edges).with_computed_degrees(),
        positions,
        self_call: raw.self_call.filter(|call| !call.trim().is_empty()),
    })
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot =
        parse_snapshot(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        nodes = snapshot.graph.node_count(),
        edges = snapshot.graph.edge_count(),
        has_layout = snapshot.positions.is_some(),
        "loaded topology snapshot"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKind;

    #[test]
    fn parses_nodes_edges_and_positions() {
        let raw = r#"{
            "self": "W1AW-5",
            "nodes": [
                {"id": "W1AW", "label": "W1AW", "weight": 40, "is_official": true},
                {"id": "N0CALL-2", "weight": 3}
            ],
            "edges": [
                {"source_id": "W1AW", "target_id": "N0CALL-2", "weight": 7, "kind": "via_relay", "is_stale": true}
            ],
            "positions": [
                {"id": "W1AW", "x": 0.25, "y": 1.5},
                {"id": "N0CALL-2", "x": 0.75, "y": 0.5}
            ]
        }"#;

        let snapshot = parse_snapshot(raw).expect("snapshot parses");
        assert_eq!(snapshot.graph.node_count(), 2);
        assert_eq!(snapshot.graph.edges[0].kind, EdgeKind::ViaRelay);
        assert!(snapshot.graph.edges[0].is_stale);
        assert_eq!(snapshot.graph.node("W1AW").map(|node| node.degree), Some(1));
        assert_eq!(snapshot.self_call.as_deref(), Some("W1AW-5"));

        let positions = snapshot.positions.expect("positions present");
        assert_eq!(positions[0].y, 1.0);
    }

    #[test]
    fn missing_positions_leave_layout_to_the_host() {
        let snapshot = parse_snapshot(r#"{"nodes": [{"id": "A"}]}"#).expect("parses");
        assert!(snapshot.positions.is_none());
        assert_eq!(snapshot.graph.nodes[0].weight, 0);
    }

    #[test]
    fn rejects_non_object_and_empty_ids() {
        assert!(parse_snapshot("[1, 2]").is_err());
        assert!(parse_snapshot(r#"{"nodes": [{"id": " "}]}"#).is_err());
        assert!(parse_snapshot("not json").is_err());
    }
}
