use std::f32::consts::{PI, TAU};

use eframe::egui::{Color32, Mesh, Pos2, Vec2, vec2};

use crate::config::RgbaColor;

pub(crate) fn color32(color: RgbaColor) -> Color32 {
    let [r, g, b, a] = color.0.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8);
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// Segment count for a circle of `radius` points: smooth when large, cheap
/// when tiny.
fn segments_for(radius: f32) -> usize {
    ((radius * 1.5).ceil() as usize).clamp(8, 48)
}

fn unit(angle: f32) -> Vec2 {
    vec2(angle.cos(), angle.sin())
}

fn next_index(mesh: &Mesh) -> u32 {
    mesh.vertices.len() as u32
}

pub(super) fn disk(mesh: &mut Mesh, center: Pos2, radius: f32, color: Color32) {
    if radius <= 0.0 {
        return;
    }
    let segments = segments_for(radius);
    let hub = next_index(mesh);
    mesh.colored_vertex(center, color);
    for step in 0..segments {
        let angle = TAU * step as f32 / segments as f32;
        mesh.colored_vertex(center + unit(angle) * radius, color);
    }
    for step in 0..segments as u32 {
        let next = (step + 1) % segments as u32;
        mesh.add_triangle(hub, hub + 1 + step, hub + 1 + next);
    }
}

pub(super) fn ring(mesh: &mut Mesh, center: Pos2, radius: f32, width: f32, color: Color32) {
    if radius <= 0.0 || width <= 0.0 {
        return;
    }
    let inner = (radius - width * 0.5).max(0.0);
    let outer = radius + width * 0.5;
    let segments = segments_for(outer);
    let first = next_index(mesh);
    for step in 0..segments {
        let direction = unit(TAU * step as f32 / segments as f32);
        mesh.colored_vertex(center + direction * inner, color);
        mesh.colored_vertex(center + direction * outer, color);
    }
    for step in 0..segments as u32 {
        let next = (step + 1) % segments as u32;
        let (a, b) = (first + step * 2, first + step * 2 + 1);
        let (c, d) = (first + next * 2, first + next * 2 + 1);
        mesh.add_triangle(a, b, d);
        mesh.add_triangle(a, d, c);
    }
}

/// A quad from `from` to `to` with half-disk caps so joints stay round.
pub(super) fn capsule(mesh: &mut Mesh, from: Pos2, to: Pos2, thickness: f32, color: Color32) {
    let along = to - from;
    let length = along.length();
    if thickness <= 0.0 || !length.is_finite() {
        return;
    }
    let half = thickness * 0.5;
    if length <= f32::EPSILON {
        disk(mesh, from, half, color);
        return;
    }

    let direction = along / length;
    let normal = vec2(-direction.y, direction.x) * half;
    let first = next_index(mesh);
    mesh.colored_vertex(from + normal, color);
    mesh.colored_vertex(to + normal, color);
    mesh.colored_vertex(to - normal, color);
    mesh.colored_vertex(from - normal, color);
    mesh.add_triangle(first, first + 1, first + 2);
    mesh.add_triangle(first, first + 2, first + 3);

    if half >= 1.0 {
        let heading = direction.y.atan2(direction.x);
        half_disk(mesh, to, half, heading - PI * 0.5, color);
        half_disk(mesh, from, half, heading + PI * 0.5, color);
    }
}

fn half_disk(mesh: &mut Mesh, center: Pos2, radius: f32, start: f32, color: Color32) {
    let segments = (segments_for(radius) / 2).max(3);
    let hub = next_index(mesh);
    mesh.colored_vertex(center, color);
    for step in 0..=segments {
        let angle = start + PI * step as f32 / segments as f32;
        mesh.colored_vertex(center + unit(angle) * radius, color);
    }
    for step in 0..segments as u32 {
        mesh.add_triangle(hub, hub + 1 + step, hub + 2 + step);
    }
}
