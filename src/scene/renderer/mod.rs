//! Turns the instance buffers into one egui mesh per frame.
//!
//! Buffers arrive as `Arc`s and are swapped wholesale. Tessellation maps
//! every instance through the [`CoordinateMapper`] and is cached by frame
//! key, so an idle scene repaints the same mesh without touching the
//! instances.

mod cull;
mod scheduler;
mod tessellate;

use std::sync::Arc;

use eframe::egui::{Align2, Color32, FontId, Mesh, Painter, Pos2, Rect, Shape, Stroke, StrokeKind};

use crate::config::StyleConfig;
use crate::error::{Result, SceneError};

use super::build::{HighlightData, RenderData};
use super::camera::CameraState;
use super::labels::LabelPlacement;
use super::mapper::{CoordinateMapper, Space, Viewport};
pub use scheduler::{FrameMode, FrameScheduler};
pub(crate) use tessellate::color32;

#[derive(Clone, Copy, Debug, PartialEq)]
struct FrameKey {
    revision: u64,
    camera: CameraState,
    viewport: Viewport,
    origin: Pos2,
}

/// What one frame needs besides the buffers.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    /// Screen rectangle of the scene in logical points.
    pub rect: Rect,
    pub viewport: Viewport,
    pub camera: CameraState,
    pub mapper: &'a CoordinateMapper,
    pub labels: &'a [LabelPlacement],
    /// Rubber band in logical points relative to `rect.min`.
    pub selection_rect: Option<Rect>,
}

pub struct SceneRenderer {
    style: StyleConfig,
    base: Option<Arc<RenderData>>,
    highlight: Option<Arc<HighlightData>>,
    revision: u64,
    mesh: Option<(FrameKey, Arc<Mesh>)>,
    mesh_builds: u64,
}

impl SceneRenderer {
    pub fn new(style: StyleConfig) -> Self {
        Self {
            style,
            base: None,
            highlight: None,
            revision: 0,
            mesh: None,
            mesh_builds: 0,
        }
    }

    /// Fails when the host has no GPU painter to draw meshes with.
    pub fn for_context(cc: &eframe::CreationContext<'_>, style: StyleConfig) -> Result<Self> {
        if cc.gl.is_none() {
            return Err(SceneError::RendererUnavailable(
                "no OpenGL context available".to_owned(),
            ));
        }
        Ok(Self::new(style))
    }

    pub fn mesh_builds(&self) -> u64 {
        self.mesh_builds
    }

    /// Installs freshly built buffers. Identical `Arc`s are a no-op.
    pub fn set_buffers(&mut self, base: Arc<RenderData>, highlight: Arc<HighlightData>) {
        let same_base = self.base.as_ref().is_some_and(|old| Arc::ptr_eq(old, &base));
        let same_highlight = self
            .highlight
            .as_ref()
            .is_some_and(|old| Arc::ptr_eq(old, &highlight));
        if same_base && same_highlight {
            return;
        }
        self.base = Some(base);
        self.highlight = Some(highlight);
        self.revision = self.revision.wrapping_add(1);
        self.mesh = None;
    }

    pub fn paint(&mut self, painter: &Painter, view: &FrameView<'_>) {
        painter.rect_filled(view.rect, 0.0, color32(self.style.background));
        if !view.viewport.is_drawable() {
            return;
        }
        draw_grid(painter, view.rect, &view.camera);

        if let Some(mesh) = self.frame_mesh(view) {
            painter.add(Shape::mesh(mesh));
        }
        self.paint_labels(painter, view);

        if let Some(band) = view.selection_rect {
            let band = band.translate(view.rect.min.to_vec2());
            let fill = color32(self.style.selection_fill);
            painter.rect_filled(band, 0.0, fill);
            painter.rect_stroke(
                band,
                0.0,
                Stroke::new(1.0, fill.to_opaque()),
                StrokeKind::Inside,
            );
        }
    }

    fn frame_mesh(&mut self, view: &FrameView<'_>) -> Option<Arc<Mesh>> {
        let base = self.base.clone()?;
        let key = FrameKey {
            revision: self.revision,
            camera: view.camera,
            viewport: view.viewport,
            origin: view.rect.min,
        };
        if let Some((cached, mesh)) = &self.mesh
            && *cached == key
        {
            return Some(Arc::clone(mesh));
        }

        let mesh = Arc::new(self.tessellate(&base, self.highlight.as_deref(), view));
        self.mesh_builds += 1;
        tracing::trace!(
            vertices = mesh.vertices.len(),
            indices = mesh.indices.len(),
            "tessellated scene"
        );
        self.mesh = Some((key, Arc::clone(&mesh)));
        Some(mesh)
    }

    fn tessellate(&self, base: &RenderData, highlight: Option<&HighlightData>, view: &FrameView<'_>) -> Mesh {
        let mapper = view.mapper;
        let viewport = &view.viewport;
        let camera = &view.camera;
        let origin = view.rect.min.to_vec2();
        let clip = view.rect;
        let to_screen =
            |pos: Pos2| mapper.normalized_to_screen(pos, viewport, camera, Space::Logical) + origin;

        let mut mesh = Mesh::default();
        let edge_passes = std::iter::once(base.edges.as_slice())
            .chain(highlight.map(|highlight| highlight.edges.as_slice()));
        for edges in edge_passes {
            for edge in edges {
                let (start, end) = (to_screen(edge.from()), to_screen(edge.to()));
                let thickness = mapper.screen_thickness(edge.thickness, viewport, camera, Space::Logical);
                if cull::segment_visible(clip, start, end, thickness) {
                    tessellate::capsule(&mut mesh, start, end, thickness, color32(edge.color));
                }
            }
        }

        for node in &base.nodes {
            let center = to_screen(node.center());
            let radius = mapper.screen_radius(node.radius, viewport, camera, Space::Logical);
            if cull::circle_visible(clip, center, radius) {
                tessellate::disk(&mut mesh, center, radius, color32(node.color));
            }
        }

        for outline in highlight.iter().flat_map(|highlight| &highlight.outlines) {
            let center = to_screen(outline.center());
            let radius = mapper.screen_radius(outline.radius, viewport, camera, Space::Logical)
                * outline.radius_scale;
            if cull::circle_visible(clip, center, radius + outline.width) {
                tessellate::ring(&mut mesh, center, radius, outline.width, color32(outline.color));
            }
        }

        mesh
    }

    fn paint_labels(&self, painter: &Painter, view: &FrameView<'_>) {
        let Some(base) = &self.base else {
            return;
        };
        let color = color32(self.style.label);
        for label in view.labels {
            let Some(text) = base.node_labels.get(label.index) else {
                continue;
            };
            let size = if label.emphasized { 13.0 } else { 12.0 };
            painter.text(
                view.rect.min + label.anchor.to_vec2(),
                Align2::LEFT_CENTER,
                text,
                FontId::proportional(size),
                color,
            );
        }
    }
}

/// Background grid that moves with the camera.
fn draw_grid(painter: &Painter, rect: Rect, camera: &CameraState) {
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));
    let step = (56.0 * camera.scale.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + camera.offset;

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}
