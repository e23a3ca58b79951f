//! Demo-host layout for snapshots that arrive without positions.
//!
//! A plain force-directed pass in an unbounded plane, then a uniform rescale
//! into the unit square the scene consumes.

use std::collections::HashMap;
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::graph::{GraphModel, NodePosition};
use crate::scene::build::normalize_log;
use crate::util::stable_pair;

pub const DEFAULT_ITERATIONS: usize = 220;

/// Normalized positions for every node of `graph`, deterministic for a given
/// graph.
pub fn layout_graph(graph: &GraphModel, iterations: usize) -> Vec<NodePosition> {
    let ids = graph.nodes.iter().map(|node| node.id.clone()).collect::<Vec<_>>();
    let index_by_id = ids
        .iter()
        .enumerate()
        .map(|(index, id)| (id.as_str(), index))
        .collect::<HashMap<_, _>>();
    let edges = graph
        .edges
        .iter()
        .filter_map(|edge| {
            Some((
                *index_by_id.get(edge.source_id.as_str())?,
                *index_by_id.get(edge.target_id.as_str())?,
            ))
        })
        .collect::<Vec<_>>();

    let min_weight = graph.nodes.iter().map(|node| node.weight).min().unwrap_or(1);
    let max_weight = graph.nodes.iter().map(|node| node.weight).max().unwrap_or(1);
    let radii = graph
        .nodes
        .iter()
        .map(|node| 6.0 + normalize_log(node.weight, min_weight, max_weight) * 26.0)
        .collect::<Vec<_>>();

    let world = force_layout(&ids, &edges, &radii, iterations);
    normalize(&ids, &world)
}

fn force_layout(
    node_ids: &[String],
    edges: &[(usize, usize)],
    node_radii: &[f32],
    iterations: usize,
) -> Vec<Vec2> {
    let n = node_ids.len();
    if n == 0 {
        return Vec::new();
    }

    let base_radius = (n as f32).sqrt() * 360.0;
    let mut positions = node_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let angle = (index as f32 / n as f32) * TAU;
            let (jx, jy) = stable_pair(id);
            let jitter = vec2(jx * 160.0, jy * 160.0);
            let radial = vec2(angle.cos(), angle.sin()) * base_radius;
            radial + jitter
        })
        .collect::<Vec<_>>();

    if n == 1 {
        return positions;
    }

    let area = (base_radius * 2.4).powi(2);
    let k = (area / n as f32).sqrt().max(24.0);
    let mut temperature = (k * 5.5).max(140.0);

    for _ in 0..iterations {
        let mut disp = vec![Vec2::ZERO; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let delta = positions[i] - positions[j];
                let distance = delta.length().max(0.5);
                let direction = delta / distance;

                let ri = node_radii.get(i).copied().unwrap_or(6.0);
                let rj = node_radii.get(j).copied().unwrap_or(6.0);
                let min_distance = (ri + rj) * 4.2;

                let force = (k * k * (1.0 + (ri + rj) * 0.015)) / distance;
                disp[i] += direction * force;
                disp[j] -= direction * force;

                if distance < min_distance {
                    let overlap_push = (min_distance - distance) * 2.4;
                    disp[i] += direction * overlap_push;
                    disp[j] -= direction * overlap_push;
                }
            }
        }

        for &(from, to) in edges {
            if from >= n || to >= n || from == to {
                continue;
            }

            let delta = positions[from] - positions[to];
            let distance = delta.length().max(0.5);
            let direction = delta / distance;

            let rf = node_radii.get(from).copied().unwrap_or(6.0);
            let rt = node_radii.get(to).copied().unwrap_or(6.0);
            let ideal_length = k + (rf + rt) * 3.5;
            let force = (distance - ideal_length) * 0.18;

            disp[from] -= direction * force;
            disp[to] += direction * force;
        }

        for (position, d) in positions.iter_mut().zip(disp.iter_mut()) {
            *d -= *position * 0.0012;
            let length = d.length();
            if length > 0.0 {
                *position += *d / length * length.min(temperature) * 0.92;
            }
        }

        temperature *= 0.965;
        if temperature < 0.55 {
            break;
        }
    }

    positions
}

/// Uniform scale into `[0, 1]`, centered on the shorter axis so the layout
/// keeps its aspect ratio.
fn normalize(ids: &[String], world: &[Vec2]) -> Vec<NodePosition> {
    let Some(first) = world.first() else {
        return Vec::new();
    };
    let (mut min, mut max) = (*first, *first);
    for position in world {
        min = min.min(*position);
        max = max.max(*position);
    }

    let span = (max - min).max_elem();
    if !(span.is_finite() && span > f32::EPSILON) {
        return ids.iter().map(|id| NodePosition::new(id.clone(), 0.5, 0.5)).collect();
    }
    let pad = (vec2(span, span) - (max - min)) * 0.5;

    ids.iter()
        .zip(world)
        .map(|(id, position)| {
            let unit = (*position - min + pad) / span;
            NodePosition::new(id.clone(), unit.x.clamp(0.0, 1.0), unit.y.clamp(0.0, 1.0))
        })
        .collect()
}
