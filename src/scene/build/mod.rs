//! Instance buffers for the scene: one disk per node and one capsule per
//! edge in normalized layout space, plus a small highlight pass for the
//! selection and hover. Both tiers are memoized by key.

mod key;
mod style;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use eframe::egui::{Pos2, Rect, pos2};

use crate::config::{LimitsConfig, RgbaColor, StyleConfig};
use crate::graph::{Edge, GraphModel, NodePosition};

use super::selection::SelectionState;
use key::KeyContent;
pub use key::{HighlightKey, RenderKey};
pub use style::{edge_fraction, node_radius, normalize_log};

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct NodeInstance {
    /// Normalized layout position.
    pub center: [f32; 2],
    /// Radius in logical points at scale 1.
    pub radius: f32,
    pub color: RgbaColor,
}

impl NodeInstance {
    pub fn center(&self) -> Pos2 {
        pos2(self.center[0], self.center[1])
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct EdgeInstance {
    pub from: [f32; 2],
    pub to: [f32; 2],
    /// Thickness in logical points at scale 1.
    pub thickness: f32,
    pub color: RgbaColor,
}

impl EdgeInstance {
    pub fn from(&self) -> Pos2 {
        pos2(self.from[0], self.from[1])
    }

    pub fn to(&self) -> Pos2 {
        pos2(self.to[0], self.to[1])
    }
}

/// A ring drawn around a node at `radius_scale` times its on-screen radius.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct OutlineInstance {
    pub center: [f32; 2],
    pub radius: f32,
    pub radius_scale: f32,
    pub width: f32,
    pub color: RgbaColor,
}

impl OutlineInstance {
    pub fn center(&self) -> Pos2 {
        pos2(self.center[0], self.center[1])
    }
}

/// Base buffers. Immutable once built; replaced wholesale on a key change.
#[derive(Debug)]
pub struct RenderData {
    pub key: RenderKey,
    pub generation: u64,
    /// Ascending by weight so heavier nodes draw on top.
    pub nodes: Vec<NodeInstance>,
    pub node_ids: Vec<String>,
    pub node_labels: Vec<String>,
    pub node_index: HashMap<String, usize>,
    pub node_weights: Vec<u64>,
    pub self_index: Option<usize>,
    pub edges: Vec<EdgeInstance>,
    /// Node indices of each edge, parallel to `edges`.
    pub edge_endpoints: Vec<(usize, usize)>,
    /// Normalized bounding box of the rendered nodes.
    pub bounds: Option<Rect>,
    /// Nodes left out by the node cap.
    pub capped_nodes: usize,
}

impl RenderData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&NodeInstance> {
        self.node_index.get(id).map(|&index| &self.nodes[index])
    }
}

#[derive(Debug)]
pub struct HighlightData {
    pub key: HighlightKey,
    pub outlines: Vec<OutlineInstance>,
    pub edges: Vec<EdgeInstance>,
}

impl HighlightData {
    pub fn is_empty(&self) -> bool {
        self.outlines.is_empty() && self.edges.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BuildInput<'a> {
    pub graph: &'a GraphModel,
    pub positions: &'a [NodePosition],
    pub focus: &'a BTreeSet<String>,
    pub self_call: Option<&'a str>,
}

pub struct RenderDataBuilder {
    style: StyleConfig,
    max_nodes: usize,
    base: Option<Arc<RenderData>>,
    highlight: Option<Arc<HighlightData>>,
    generation: u64,
    base_rebuilds: u64,
    highlight_rebuilds: u64,
}

impl RenderDataBuilder {
    pub fn new(style: StyleConfig, limits: &LimitsConfig) -> Self {
        Self {
            style,
            max_nodes: limits.max_nodes.max(1),
            base: None,
            highlight: None,
            generation: 0,
            base_rebuilds: 0,
            highlight_rebuilds: 0,
        }
    }

    pub fn base_rebuilds(&self) -> u64 {
        self.base_rebuilds
    }

    pub fn highlight_rebuilds(&self) -> u64 {
        self.highlight_rebuilds
    }

    pub fn current(&self) -> Option<&Arc<RenderData>> {
        self.base.as_ref()
    }

    /// Returns the base buffers for `input` and whether they were rebuilt.
    pub fn build(&mut self, input: &BuildInput<'_>) -> (Arc<RenderData>, bool) {
        let key = RenderKey::new(KeyContent::from_input(input, &self.style, self.max_nodes));
        if let Some(base) = &self.base
            && base.key == key
        {
            return (Arc::clone(base), false);
        }

        self.generation = self.generation.wrapping_add(1);
        let data = Arc::new(build_base(key, self.generation));
        self.base_rebuilds += 1;
        tracing::debug!(
            generation = data.generation,
            digest = data.key.digest(),
            nodes = data.node_count(),
            edges = data.edge_count(),
            capped = data.capped_nodes,
            "rebuilt scene buffers"
        );

        self.base = Some(Arc::clone(&data));
        (data, true)
    }

    /// Returns the highlight pass over `base` for `selection`, rebuilt only
    /// when the base generation, selected ids or hovered id changed.
    pub fn build_highlight(
        &mut self,
        base: &RenderData,
        selection: &SelectionState,
    ) -> (Arc<HighlightData>, bool) {
        let key = HighlightKey {
            generation: base.generation,
            selected: selection.selected().clone(),
            hovered: selection.hovered().map(str::to_owned),
        };
        if let Some(highlight) = &self.highlight
            && highlight.key == key
        {
            return (Arc::clone(highlight), false);
        }

        let data = Arc::new(build_highlight(&self.style, base, key));
        self.highlight_rebuilds += 1;
        tracing::trace!(
            outlines = data.outlines.len(),
            edges = data.edges.len(),
            "rebuilt highlight buffers"
        );
        self.highlight = Some(Arc::clone(&data));
        (data, true)
    }
}

fn build_base(key: RenderKey, generation: u64) -> RenderData {
    let content = Arc::clone(&key.content);
    let style = &content.style;
    let focus_active = !content.focus.is_empty();

    let is_self = |id: &str, flagged: bool| {
        flagged
            || content
                .self_base
                .as_deref()
                .is_some_and(|base| crate::util::base_callsign(id) == base)
    };

    let mut placed = content
        .nodes
        .iter()
        .filter_map(|node| {
            content
                .positions
                .get(&node.id)
                .map(|&position| (node, position))
        })
        .collect::<Vec<_>>();
    placed.dedup_by(|a, b| a.0.id == b.0.id);

    let mut capped_nodes = 0;
    if placed.len() > content.max_nodes {
        placed.sort_by(|a, b| {
            let a_self = is_self(&a.0.id, a.0.is_self_node);
            let b_self = is_self(&b.0.id, b.0.is_self_node);
            b_self
                .cmp(&a_self)
                .then_with(|| b.0.weight.cmp(&a.0.weight))
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        capped_nodes = placed.len() - content.max_nodes;
        placed.truncate(content.max_nodes);
    }
    placed.sort_by(|a, b| a.0.weight.cmp(&b.0.weight).then_with(|| a.0.id.cmp(&b.0.id)));

    let min_weight = placed.iter().map(|(node, _)| node.weight.max(1)).min().unwrap_or(1);
    let max_weight = placed.iter().map(|(node, _)| node.weight.max(1)).max().unwrap_or(1);

    let mut nodes = Vec::with_capacity(placed.len());
    let mut node_ids = Vec::with_capacity(placed.len());
    let mut node_labels = Vec::with_capacity(placed.len());
    let mut node_weights = Vec::with_capacity(placed.len());
    let mut node_index = HashMap::with_capacity(placed.len());
    let mut self_index = None;
    let mut bounds: Option<Rect> = None;

    for (index, (node, (x, y))) in placed.iter().enumerate() {
        let t = normalize_log(node.weight, min_weight, max_weight);
        let node_is_self = is_self(&node.id, node.is_self_node);
        let in_focus = !focus_active || content.focus.contains(&node.id);
        let center = pos2(*x, *y);

        nodes.push(NodeInstance {
            center: [*x, *y],
            radius: style::lerp(style.min_radius, style.max_radius, t),
            color: style::node_color(style, t, node_is_self, node.is_official, in_focus),
        });
        node_ids.push(node.id.clone());
        node_labels.push(node.display_label().to_owned());
        node_weights.push(node.weight);
        node_index.insert(node.id.clone(), index);
        if node_is_self && self_index.is_none() {
            self_index = Some(index);
        }
        bounds = Some(match bounds {
            Some(rect) => rect.union(Rect::from_min_max(center, center)),
            None => Rect::from_min_max(center, center),
        });
    }

    // Parallel edges of one kind collapse into the heaviest.
    let mut slots: HashMap<_, usize> = HashMap::new();
    let mut kept_edges: Vec<(&Edge, usize, usize)> = Vec::new();
    for edge in &content.edges {
        let (Some(&from), Some(&to)) = (
            node_index.get(&edge.source_id),
            node_index.get(&edge.target_id),
        ) else {
            continue;
        };
        if from == to {
            continue;
        }
        match slots.get(&(from, to, edge.kind)) {
            Some(&slot) => {
                if edge.weight > kept_edges[slot].0.weight {
                    kept_edges[slot].0 = edge;
                }
            }
            None => {
                slots.insert((from, to, edge.kind), kept_edges.len());
                kept_edges.push((edge, from, to));
            }
        }
    }

    let max_edge_weight = kept_edges.iter().map(|(edge, _, _)| edge.weight).max().unwrap_or(0);
    let mut edges = Vec::with_capacity(kept_edges.len());
    let mut edge_endpoints = Vec::with_capacity(kept_edges.len());
    for (edge, from, to) in kept_edges {
        let fraction = edge_fraction(edge.weight, max_edge_weight);
        let in_focus = !focus_active
            || (content.focus.contains(&edge.source_id) && content.focus.contains(&edge.target_id));
        let alpha = style::edge_alpha(style, fraction, edge.kind, edge.is_stale, in_focus);

        edges.push(EdgeInstance {
            from: nodes[from].center,
            to: nodes[to].center,
            thickness: style::edge_thickness(style, fraction),
            color: style.edge.with_alpha(alpha),
        });
        edge_endpoints.push((from, to));
    }

    RenderData {
        key,
        generation,
        nodes,
        node_ids,
        node_labels,
        node_index,
        node_weights,
        self_index,
        edges,
        edge_endpoints,
        bounds,
        capped_nodes,
    }
}

fn build_highlight(style: &StyleConfig, base: &RenderData, key: HighlightKey) -> HighlightData {
    let mut outlines = Vec::new();
    let mut touched = HashSet::new();

    for id in &key.selected {
        if let Some(&index) = base.node_index.get(id) {
            touched.insert(index);
            let node = &base.nodes[index];
            outlines.push(OutlineInstance {
                center: node.center,
                radius: node.radius,
                radius_scale: style.selected_outline_scale,
                width: style.outline_width,
                color: style.accent,
            });
        }
    }

    if let Some(&index) = key.hovered.as_ref().and_then(|id| base.node_index.get(id)) {
        touched.insert(index);
        let node = &base.nodes[index];
        outlines.push(OutlineInstance {
            center: node.center,
            radius: node.radius,
            radius_scale: style.hovered_outline_scale,
            width: style.outline_width,
            color: style.hover_accent,
        });
    }

    let edges = base
        .edges
        .iter()
        .zip(&base.edge_endpoints)
        .filter(|(_, (from, to))| touched.contains(from) || touched.contains(to))
        .map(|(edge, _)| EdgeInstance {
            thickness: edge.thickness + style.highlight_edge_extra,
            color: style.highlight_edge.with_alpha(edge.color.alpha().max(0.9)),
            ..*edge
        })
        .collect();

    HighlightData {
        key,
        outlines,
        edges,
    }
}
