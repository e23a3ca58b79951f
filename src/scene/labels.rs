use std::collections::HashSet;

use eframe::egui::{Pos2, Rect, vec2};

use crate::config::LimitsConfig;

use super::build::RenderData;
use super::camera::CameraState;
use super::mapper::{CoordinateMapper, Space, Viewport};
use super::selection::SelectionState;

/// Screen radius above which a node is labelled at any zoom.
const LARGE_NODE_RADIUS: f32 = 24.0;
const LABEL_GAP: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelPlacement {
    /// Index into the render data's node arrays.
    pub index: usize,
    /// Left-center anchor in logical points, relative to the view origin.
    pub anchor: Pos2,
    /// Selected, hovered or self.
    pub emphasized: bool,
}

/// Chooses which nodes get a text label this frame. Selected, hovered and
/// self nodes always do; the rest only when large on screen or when zoomed
/// past the label threshold, heaviest first, up to `max_labels` in total.
pub fn place_labels(
    data: &RenderData,
    selection: &SelectionState,
    mapper: &CoordinateMapper,
    viewport: &Viewport,
    camera: &CameraState,
    limits: &LimitsConfig,
) -> Vec<LabelPlacement> {
    if data.is_empty() || limits.max_labels == 0 || !viewport.is_drawable() {
        return Vec::new();
    }

    let view = Rect::from_min_size(Pos2::ZERO, viewport.logical_size());
    let placement = |index: usize, emphasized: bool| {
        let node = &data.nodes[index];
        let center = mapper.normalized_to_screen(node.center(), viewport, camera, Space::Logical);
        let radius = mapper.screen_radius(node.radius, viewport, camera, Space::Logical);
        view.expand(radius).contains(center).then_some((
            LabelPlacement {
                index,
                anchor: center + vec2(radius + LABEL_GAP, 0.0),
                emphasized,
            },
            radius,
        ))
    };

    let mut emphasized = Vec::new();
    if let Some(index) = selection.hovered().and_then(|id| data.node_index.get(id)) {
        emphasized.push(*index);
    }
    emphasized.extend(selection.selected().iter().filter_map(|id| data.node_index.get(id)));
    emphasized.extend(data.self_index);

    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for index in emphasized {
        if labels.len() >= limits.max_labels {
            return labels;
        }
        if seen.insert(index)
            && let Some((label, _)) = placement(index, true)
        {
            labels.push(label);
        }
    }

    let zoomed_in = camera.scale >= limits.label_min_scale;
    // Nodes are stored lightest first.
    for index in (0..data.node_count()).rev() {
        if labels.len() >= limits.max_labels {
            break;
        }
        if seen.contains(&index) {
            continue;
        }
        if let Some((label, radius)) = placement(index, false)
            && (zoomed_in || radius > LARGE_NODE_RADIUS)
        {
            labels.push(label);
        }
    }
    labels
}
