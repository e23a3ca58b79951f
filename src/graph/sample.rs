use crate::util::stable_unit;

use super::{Edge, EdgeKind, GraphModel, Node, Snapshot};

const PREFIXES: [&str; 8] = ["W1", "K2", "N3", "G4", "VK2", "DL1", "PA0", "JA1"];
const SUFFIXES: [&str; 10] = ["AW", "XYZ", "BBS", "NOD", "RLY", "ABC", "QRP", "DX", "HF", "VHF"];

/// Deterministic demo topology: a few official nodes acting as hubs, stations
/// hanging off them, and some relayed links between stations.
pub fn sample_snapshot(node_count: usize, self_call: &str) -> Snapshot {
    let node_count = node_count.max(2);
    let hub_count = (node_count / 12).clamp(1, 8);

    let mut nodes = Vec::with_capacity(node_count);
    for index in 0..node_count {
        let prefix = PREFIXES[index % PREFIXES.len()];
        let suffix = SUFFIXES[(index / PREFIXES.len()) % SUFFIXES.len()];
        let ssid = index / (PREFIXES.len() * SUFFIXES.len());
        let id = if index == 0 {
            self_call.to_owned()
        } else if ssid == 0 {
            format!("{prefix}{suffix}")
        } else {
            format!("{prefix}{suffix}-{ssid}")
        };

        let traffic = stable_unit(&id);
        let weight = if index < hub_count {
            400 + (traffic * 4000.0) as u64
        } else {
            1 + (traffic * traffic * 300.0) as u64
        };

        nodes.push(Node {
            label: id.clone(),
            id,
            weight,
            degree: 0,
            is_self_node: index == 0,
            is_official: index > 0 && index < hub_count,
        });
    }

    let mut edges = Vec::new();
    for index in 1..node_count {
        let hub = if index < hub_count {
            0
        } else {
            index % hub_count
        };
        let id = &nodes[index].id;
        let roll = stable_unit(&format!("{id}/link"));
        edges.push(Edge {
            source_id: nodes[hub].id.clone(),
            target_id: id.clone(),
            weight: 1 + (roll * 120.0) as u64,
            kind: EdgeKind::Direct,
            is_stale: roll < 0.12,
        });

        if roll > 0.8 && index + 7 < node_count {
            edges.push(Edge {
                source_id: id.clone(),
                target_id: nodes[index + 7].id.clone(),
                weight: 1 + (roll * 20.0) as u64,
                kind: EdgeKind::ViaRelay,
                is_stale: false,
            });
        }
    }

    Snapshot {
        graph: GraphModel::new(nodes, edges).with_computed_degrees(),
        positions: None,
        self_call: Some(self_call.to_owned()),
    }
}
