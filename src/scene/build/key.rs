use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::config::StyleConfig;
use crate::graph::{Edge, Node};
use crate::util::base_callsign;

use super::BuildInput;

/// Canonical, order-independent form of everything that feeds the base
/// instance buffers. The builder reads its input from here, so equal content
/// yields identical buffers regardless of the order the snapshot listed
/// things in.
#[derive(Clone, Debug, PartialEq)]
pub(super) struct KeyContent {
    pub(super) nodes: Vec<Node>,
    pub(super) edges: Vec<Edge>,
    /// Last entry wins for duplicate ids; non-finite entries are dropped.
    pub(super) positions: BTreeMap<String, (f32, f32)>,
    pub(super) focus: BTreeSet<String>,
    pub(super) self_base: Option<String>,
    pub(super) style: StyleConfig,
    pub(super) max_nodes: usize,
}

impl Hash for KeyContent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nodes.hash(state);
        self.edges.hash(state);
        self.positions.len().hash(state);
        for (id, (x, y)) in &self.positions {
            id.hash(state);
            x.to_bits().hash(state);
            y.to_bits().hash(state);
        }
        self.focus.hash(state);
        self.self_base.hash(state);
        self.style.hash_into(state);
        self.max_nodes.hash(state);
    }
}

impl KeyContent {
    pub(super) fn from_input(input: &BuildInput<'_>, style: &StyleConfig, max_nodes: usize) -> Self {
        let mut nodes = input.graph.nodes.clone();
        nodes.sort();

        let mut edges = input.graph.edges.clone();
        edges.sort();

        let mut positions = BTreeMap::new();
        for position in input.positions {
            if position.x.is_finite() && position.y.is_finite() {
                positions.insert(
                    position.id.clone(),
                    (position.x.clamp(0.0, 1.0), position.y.clamp(0.0, 1.0)),
                );
            }
        }

        let self_base = input
            .self_call
            .map(base_callsign)
            .filter(|base| !base.is_empty());

        Self {
            nodes,
            edges,
            positions,
            focus: input.focus.clone(),
            self_base,
            style: style.clone(),
            max_nodes,
        }
    }
}

/// Structural hash of the base render inputs. Equality compares the
/// canonical content after the digest, so a digest collision cannot alias two
/// different graphs.
#[derive(Clone, Debug)]
pub struct RenderKey {
    digest: u64,
    pub(super) content: Arc<KeyContent>,
}

impl RenderKey {
    pub(super) fn new(content: KeyContent) -> Self {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Self {
            digest: hasher.finish(),
            content: Arc::new(content),
        }
    }

    pub fn digest(&self) -> u64 {
        self.digest
    }
}

impl PartialEq for RenderKey {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
            && (Arc::ptr_eq(&self.content, &other.content) || self.content == other.content)
    }
}

/// Key of the highlight pass: the base generation it was drawn over plus the
/// selection and hover ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightKey {
    pub generation: u64,
    pub selected: BTreeSet<String>,
    pub hovered: Option<String>,
}
