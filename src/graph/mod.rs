mod parse;
mod sample;

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

pub use parse::{Snapshot, load_snapshot, parse_snapshot};
pub use sample::sample_snapshot;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    Direct,
    ViaRelay,
}

impl EdgeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::ViaRelay => "via relay",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub weight: u64,
    #[serde(default)]
    pub degree: u32,
    #[serde(default)]
    pub is_self_node: bool,
    #[serde(default)]
    pub is_official: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, weight: u64) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            weight,
            degree: 0,
            is_self_node: false,
            is_official: false,
        }
    }

    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub weight: u64,
    #[serde(default)]
    pub kind: EdgeKind,
    #[serde(default)]
    pub is_stale: bool,
}

impl Edge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, weight: u64) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            weight,
            kind: EdgeKind::Direct,
            is_stale: false,
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source_id == id || self.target_id == id
    }
}

/// Normalized layout coordinate for one node, `x` and `y` in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

impl NodePosition {
    pub fn new(id: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
        }
    }
}

/// Immutable snapshot of the topology. Replaced wholesale on every refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphModel {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphModel {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }

    /// Node ids one hop away from `id`, including `id` itself.
    pub fn neighborhood(&self, id: &str) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        if !self.contains(id) {
            return ids;
        }

        ids.insert(id.to_owned());
        for edge in &self.edges {
            if edge.source_id == id {
                ids.insert(edge.target_id.clone());
            } else if edge.target_id == id {
                ids.insert(edge.source_id.clone());
            }
        }
        ids
    }

    /// Fills `degree` from the edge list for snapshots that omit it.
    pub fn with_computed_degrees(mut self) -> Self {
        let mut degrees: HashMap<&str, u32> = HashMap::new();
        for edge in &self.edges {
            if edge.source_id == edge.target_id {
                continue;
            }
            *degrees.entry(edge.source_id.as_str()).or_default() += 1;
            *degrees.entry(edge.target_id.as_str()).or_default() += 1;
        }

        let degrees = degrees
            .into_iter()
            .map(|(id, degree)| (id.to_owned(), degree))
            .collect::<HashMap<_, _>>();
        for node in &mut self.nodes {
            if node.degree == 0 {
                node.degree = degrees.get(&node.id).copied().unwrap_or(0);
            }
        }
        self
    }

    pub fn top_by_weight(&self, limit: usize) -> Vec<&Node> {
        let mut nodes = self.nodes.iter().collect::<Vec<_>>();
        nodes.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.id.cmp(&b.id)));
        nodes.truncate(limit);
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GraphModel {
        GraphModel::new(
            vec![Node::new("A", 1), Node::new("B", 5), Node::new("C", 3)],
            vec![Edge::new("A", "B", 2), Edge::new("B", "C", 1)],
        )
    }

    #[test]
    fn neighborhood_includes_center_and_direct_neighbors() {
        let graph = triangle();
        let hood = graph.neighborhood("B");
        assert_eq!(hood.len(), 3);

        let hood = graph.neighborhood("A");
        assert!(hood.contains("A") && hood.contains("B"));
        assert!(!hood.contains("C"));

        assert!(graph.neighborhood("missing").is_empty());
    }

    #[test]
    fn computed_degrees_ignore_self_loops() {
        let mut graph = triangle();
        graph.edges.push(Edge::new("C", "C", 9));
        let graph = graph.with_computed_degrees();
        let degree = |id: &str| graph.node(id).map(|node| node.degree);
        assert_eq!(degree("A"), Some(1));
        assert_eq!(degree("B"), Some(2));
        assert_eq!(degree("C"), Some(1));
    }

    #[test]
    fn top_by_weight_breaks_ties_by_id() {
        let mut graph = triangle();
        graph.nodes.push(Node::new("D", 5));
        let top = graph
            .top_by_weight(2)
            .into_iter()
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(top, vec!["B", "D"]);
    }
}
