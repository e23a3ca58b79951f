//! Normalized layout space → logical view points → device pixels.
//!
//! Everything that draws or picks goes through [`CoordinateMapper`]. The
//! logical and device variants differ only by `pixels_per_point`, applied to
//! the viewport, the inset and the camera offset; the camera scale is never
//! multiplied by it.

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::config::MappingConfig;

use super::camera::CameraState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Space {
    /// UI points, independent of the display's pixel density.
    Logical,
    /// Physical pixels, `logical * pixels_per_point`.
    Device,
}

/// Size of the drawing area in logical points plus the display density.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub size: Vec2,
    pub pixels_per_point: f32,
}

impl Viewport {
    pub fn new(size: Vec2, pixels_per_point: f32) -> Self {
        Self {
            size,
            pixels_per_point,
        }
    }

    pub fn logical(width: f32, height: f32) -> Self {
        Self::new(vec2(width, height), 1.0)
    }

    /// Zero, negative or non-finite sizes cannot be drawn into.
    pub fn is_drawable(&self) -> bool {
        self.size.x.is_finite() && self.size.y.is_finite() && self.size.x > 0.0 && self.size.y > 0.0
    }

    pub fn density(&self) -> f32 {
        positive_or_one(self.pixels_per_point)
    }

    pub fn factor(&self, space: Space) -> f32 {
        match space {
            Space::Logical => 1.0,
            Space::Device => self.density(),
        }
    }

    /// Logical size with degenerate axes replaced by 1.
    pub fn logical_size(&self) -> Vec2 {
        vec2(positive_or_one(self.size.x), positive_or_one(self.size.y))
    }

    pub fn size_in(&self, space: Space) -> Vec2 {
        self.logical_size() * self.factor(space)
    }

    pub fn to_device(&self, point: Pos2) -> Pos2 {
        (point.to_vec2() * self.density()).to_pos2()
    }

    pub fn to_logical(&self, point: Pos2) -> Pos2 {
        (point.to_vec2() / self.density()).to_pos2()
    }

    pub fn rect_to_device(&self, rect: Rect) -> Rect {
        Rect::from_two_pos(self.to_device(rect.min), self.to_device(rect.max))
    }
}

fn positive_or_one(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    inset: f32,
    zoom_radius_exponent: f32,
    min_screen_radius: f32,
    max_screen_radius: f32,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(&MappingConfig::default())
    }
}

impl CoordinateMapper {
    pub fn new(config: &MappingConfig) -> Self {
        let inset = if config.inset.is_finite() {
            config.inset.max(0.0)
        } else {
            0.0
        };
        Self {
            inset,
            zoom_radius_exponent: config.zoom_radius_exponent,
            min_screen_radius: config.min_screen_radius,
            max_screen_radius: config.max_screen_radius,
        }
    }

    pub fn inset(&self) -> f32 {
        self.inset
    }

    /// Size of the layout square inside the inset, never below 1 on either axis.
    pub fn layout_extent(&self, viewport: &Viewport, space: Space) -> Vec2 {
        let size = viewport.size_in(space);
        let inset = self.inset * viewport.factor(space);
        vec2(
            positive_or_one(size.x - 2.0 * inset),
            positive_or_one(size.y - 2.0 * inset),
        )
    }

    /// Camera-independent layout position: `inset + pos * extent`.
    pub fn normalized_to_base(&self, pos: Pos2, viewport: &Viewport, space: Space) -> Pos2 {
        let inset = self.inset * viewport.factor(space);
        let extent = self.layout_extent(viewport, space);
        pos2(inset + pos.x * extent.x, inset + pos.y * extent.y)
    }

    pub fn base_to_normalized(&self, base: Pos2, viewport: &Viewport, space: Space) -> Pos2 {
        let inset = self.inset * viewport.factor(space);
        let extent = self.layout_extent(viewport, space);
        pos2((base.x - inset) / extent.x, (base.y - inset) / extent.y)
    }

    pub fn normalized_to_screen(
        &self,
        pos: Pos2,
        viewport: &Viewport,
        camera: &CameraState,
        space: Space,
    ) -> Pos2 {
        let factor = viewport.factor(space);
        let base = self.normalized_to_base(pos, viewport, space);
        let center = (viewport.size_in(space) * 0.5).to_pos2();
        let scale = camera_scale(camera);
        center + (base - center) * scale + camera.offset * factor
    }

    pub fn screen_to_normalized(
        &self,
        point: Pos2,
        viewport: &Viewport,
        camera: &CameraState,
        space: Space,
    ) -> Pos2 {
        let factor = viewport.factor(space);
        let center = (viewport.size_in(space) * 0.5).to_pos2();
        let scale = camera_scale(camera);
        let base = center + (point - center - camera.offset * factor) / scale;
        self.base_to_normalized(base, viewport, space)
    }

    pub fn normalized_to_logical(&self, pos: Pos2, viewport: &Viewport, camera: &CameraState) -> Pos2 {
        self.normalized_to_screen(pos, viewport, camera, Space::Logical)
    }

    pub fn normalized_to_device(&self, pos: Pos2, viewport: &Viewport, camera: &CameraState) -> Pos2 {
        self.normalized_to_screen(pos, viewport, camera, Space::Device)
    }

    /// On-screen radius of a node with layout radius `radius` (logical points).
    pub fn screen_radius(
        &self,
        radius: f32,
        viewport: &Viewport,
        camera: &CameraState,
        space: Space,
    ) -> f32 {
        let zoomed = radius * camera_scale(camera).powf(self.zoom_radius_exponent);
        let logical = zoomed.clamp(self.min_screen_radius, self.max_screen_radius.max(self.min_screen_radius));
        logical * viewport.factor(space)
    }

    /// Thickness of an edge with layout thickness `thickness`, same zoom curve as nodes.
    pub fn screen_thickness(
        &self,
        thickness: f32,
        viewport: &Viewport,
        camera: &CameraState,
        space: Space,
    ) -> f32 {
        thickness * camera_scale(camera).powf(self.zoom_radius_exponent) * viewport.factor(space)
    }
}

fn camera_scale(camera: &CameraState) -> f32 {
    positive_or_one(camera.scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: Pos2, b: Pos2, eps: f32) -> bool {
        (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps
    }

    #[test]
    fn identity_camera_maps_center_to_center() {
        let mapper = CoordinateMapper::default();
        let viewport = Viewport::logical(800.0, 600.0);
        let screen = mapper.normalized_to_logical(pos2(0.5, 0.5), &viewport, &CameraState::default());
        assert!(close(screen, pos2(400.0, 300.0), 1e-4));
    }

    #[test]
    fn inset_keeps_corners_off_the_edge() {
        let mapper = CoordinateMapper::new(&MappingConfig {
            inset: 20.0,
            ..MappingConfig::default()
        });
        let viewport = Viewport::logical(200.0, 100.0);
        let camera = CameraState::default();
        assert!(close(
            mapper.normalized_to_logical(pos2(0.0, 0.0), &viewport, &camera),
            pos2(20.0, 20.0),
            1e-4
        ));
        assert!(close(
            mapper.normalized_to_logical(pos2(1.0, 1.0), &viewport, &camera),
            pos2(180.0, 80.0),
            1e-4
        ));
    }

    #[test]
    fn device_space_is_logical_times_density_without_touching_scale() {
        let mapper = CoordinateMapper::default();
        let viewport = Viewport::new(vec2(640.0, 480.0), 2.0);
        let camera = CameraState {
            scale: 1.7,
            offset: vec2(-30.0, 12.5),
        };
        let pos = pos2(0.3, 0.8);
        let logical = mapper.normalized_to_logical(pos, &viewport, &camera);
        let device = mapper.normalized_to_device(pos, &viewport, &camera);
        assert!(close(viewport.to_device(logical), device, 1e-3));

        let logical_radius = mapper.screen_radius(10.0, &viewport, &camera, Space::Logical);
        let device_radius = mapper.screen_radius(10.0, &viewport, &camera, Space::Device);
        assert!((device_radius - logical_radius * 2.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_viewport_does_not_produce_nan() {
        let mapper = CoordinateMapper::default();
        let camera = CameraState::default();
        for viewport in [
            Viewport::logical(0.0, 0.0),
            Viewport::logical(-5.0, 10.0),
            Viewport::new(vec2(f32::NAN, 3.0), 0.0),
        ] {
            assert!(!viewport.is_drawable());
            let screen = mapper.normalized_to_logical(pos2(0.5, 0.5), &viewport, &camera);
            let back = mapper.screen_to_normalized(screen, &viewport, &camera, Space::Logical);
            assert!(screen.x.is_finite() && screen.y.is_finite());
            assert!(back.x.is_finite() && back.y.is_finite());
        }
    }

    #[test]
    fn screen_radius_grows_with_zoom_and_respects_bounds() {
        let mapper = CoordinateMapper::default();
        let viewport = Viewport::logical(500.0, 500.0);
        let near = CameraState {
            scale: 4.0,
            offset: Vec2::ZERO,
        };
        let far = CameraState {
            scale: 0.25,
            offset: Vec2::ZERO,
        };
        let zoomed_in = mapper.screen_radius(10.0, &viewport, &near, Space::Logical);
        let zoomed_out = mapper.screen_radius(10.0, &viewport, &far, Space::Logical);
        assert!(zoomed_in > 10.0 && zoomed_out < 10.0);
        assert_eq!(
            mapper.screen_radius(1000.0, &viewport, &near, Space::Logical),
            MappingConfig::default().max_screen_radius
        );
    }

    proptest! {
        #[test]
        fn prop_screen_round_trip(
            x in 0.0f32..=1.0,
            y in 0.0f32..=1.0,
            width in 100.0f32..4000.0,
            height in 100.0f32..4000.0,
            density in 1.0f32..3.0,
            scale in 0.25f32..8.0,
            dx in -1.0f32..1.0,
            dy in -1.0f32..1.0,
            device in any::<bool>(),
        ) {
            let mapper = CoordinateMapper::default();
            let viewport = Viewport::new(vec2(width, height), density);
            let camera = CameraState { scale, offset: vec2(dx * width, dy * height) };
            let space = if device { Space::Device } else { Space::Logical };

            let screen = mapper.normalized_to_screen(pos2(x, y), &viewport, &camera, space);
            let back = mapper.screen_to_normalized(screen, &viewport, &camera, space);
            prop_assert!(close(back, pos2(x, y), 1e-4), "({x}, {y}) came back as {back:?}");
        }
    }
}
