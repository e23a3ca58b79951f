use eframe::egui::{Pos2, Vec2, vec2};

use crate::config::CameraConfig;

use super::mapper::{CoordinateMapper, Space, Viewport};

/// Uniform scale about the viewport center followed by an offset in logical
/// points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub scale: f32,
    pub offset: Vec2,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

/// Every operation writes the target; [`Camera::tick`] moves the current
/// value toward it. A new target replaces an in-flight animation without a
/// jump because the current value is continuous.
#[derive(Clone, Debug)]
pub struct Camera {
    config: CameraConfig,
    mapper: CoordinateMapper,
    viewport: Viewport,
    current: CameraState,
    target: CameraState,
    momentum: Vec2,
}

impl Camera {
    pub fn new(config: CameraConfig, mapper: CoordinateMapper) -> Self {
        Self {
            config,
            mapper,
            viewport: Viewport::logical(1.0, 1.0),
            current: CameraState::default(),
            target: CameraState::default(),
            momentum: Vec2::ZERO,
        }
    }

    pub fn current(&self) -> CameraState {
        self.current
    }

    pub fn target(&self) -> CameraState {
        self.target
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn has_momentum(&self) -> bool {
        self.momentum != Vec2::ZERO
    }

    /// Current equals target and nothing is drifting.
    pub fn is_settled(&self) -> bool {
        self.current == self.target && !self.has_momentum()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport == viewport {
            return;
        }
        self.viewport = viewport;
        self.target.offset = self.clamp_offset(self.target.offset, self.target.scale);
    }

    pub fn pan(&mut self, delta: Vec2) {
        if !(delta.x.is_finite() && delta.y.is_finite()) {
            return;
        }
        self.momentum = Vec2::ZERO;
        self.set_target_offset(self.target.offset + delta);
    }

    /// Zooms the target by `factor` keeping the point under `at` (logical
    /// view coordinates) stationary. Non-positive factors are ignored.
    pub fn zoom(&mut self, at: Pos2, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) || !(at.x.is_finite() && at.y.is_finite()) {
            return;
        }
        self.momentum = Vec2::ZERO;

        let old_scale = self.target.scale;
        let new_scale = self.clamp_scale(old_scale * factor);
        let center = self.center();
        let ratio = new_scale / old_scale;
        let offset = (at - center) - (at - center - self.target.offset) * ratio;

        self.target.scale = new_scale;
        self.set_target_offset(offset);
    }

    /// Fits the normalized box inside the layout area shrunk by `padding`
    /// on each side and centers it.
    pub fn fit_to_bounds(
        &mut self,
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
        viewport: Viewport,
        padding: f32,
    ) {
        if ![min_x, min_y, max_x, max_y].iter().all(|value| value.is_finite()) {
            return;
        }
        self.set_viewport(viewport);
        self.momentum = Vec2::ZERO;

        let (min_x, max_x) = (min_x.min(max_x), min_x.max(max_x));
        let (min_y, max_y) = (min_y.min(max_y), min_y.max(max_y));
        let min_extent = self.config.min_fit_extent.max(f32::EPSILON);
        let width = (max_x - min_x).max(min_extent);
        let height = (max_y - min_y).max(min_extent);
        let padding = if padding.is_finite() {
            padding.clamp(0.0, 0.45)
        } else {
            0.0
        };

        let scale = self.clamp_scale((1.0 - 2.0 * padding) / width.max(height));
        let box_center = Pos2::new((min_x + max_x) * 0.5, (min_y + max_y) * 0.5);
        self.target.scale = scale;
        self.set_target_offset(self.centering_offset(box_center, scale));
    }

    /// Zooms to the configured focus scale centered on a normalized point.
    pub fn focus(&mut self, on: Pos2) {
        if !(on.x.is_finite() && on.y.is_finite()) {
            return;
        }
        self.momentum = Vec2::ZERO;
        let scale = self.clamp_scale(self.config.focus_scale);
        self.target.scale = scale;
        self.set_target_offset(self.centering_offset(on, scale));
    }

    pub fn reset(&mut self) {
        self.momentum = Vec2::ZERO;
        self.target = CameraState::default();
        self.target.scale = self.clamp_scale(1.0);
    }

    /// The whole layout square at scale 1 is the fitted view.
    pub fn zoom_to_fit(&mut self) {
        self.reset();
    }

    /// Keeps drifting the target by `velocity` (points per second) after a
    /// pan is released.
    pub fn fling(&mut self, velocity: Vec2) {
        if !(velocity.x.is_finite() && velocity.y.is_finite())
            || velocity.length() < self.config.momentum_min_speed
        {
            self.momentum = Vec2::ZERO;
            return;
        }
        self.momentum = velocity;
    }

    /// Moves current straight to target, skipping the animation.
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    /// Advances one frame. Returns whether the current state changed, i.e.
    /// whether another frame should be drawn.
    pub fn tick(&mut self, dt: f32) -> bool {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt.min(0.25)
        } else {
            1.0 / 60.0
        };
        let frames = dt * 60.0;

        if self.has_momentum() {
            let wanted = self.target.offset + self.momentum * dt;
            let clamped = self.clamp_offset(wanted, self.target.scale);
            if clamped.x != wanted.x {
                self.momentum.x = 0.0;
            }
            if clamped.y != wanted.y {
                self.momentum.y = 0.0;
            }
            self.target.offset = clamped;

            self.momentum *= self.config.momentum_friction.powf(frames);
            if self.momentum.length() < self.config.momentum_min_speed {
                self.momentum = Vec2::ZERO;
            }
        }

        let before = self.current;
        let alpha = 1.0 - (1.0 - self.config.smoothing.clamp(0.0, 1.0)).powf(frames);
        self.current.scale += (self.target.scale - self.current.scale) * alpha;
        self.current.offset += (self.target.offset - self.current.offset) * alpha;

        let scale_gap = (self.target.scale - self.current.scale).abs();
        let offset_gap = (self.target.offset - self.current.offset).length();
        if scale_gap <= self.config.scale_epsilon && offset_gap <= self.config.offset_epsilon {
            self.current = self.target;
        }

        before != self.current
    }

    fn center(&self) -> Pos2 {
        (self.viewport.logical_size() * 0.5).to_pos2()
    }

    fn centering_offset(&self, normalized: Pos2, scale: f32) -> Vec2 {
        let base = self
            .mapper
            .normalized_to_base(normalized, &self.viewport, Space::Logical);
        -(base - self.center()) * scale
    }

    fn clamp_scale(&self, scale: f32) -> f32 {
        let min = self.config.min_zoom.max(f32::EPSILON);
        let max = self.config.max_zoom.max(min);
        if scale.is_finite() {
            scale.clamp(min, max)
        } else {
            max
        }
    }

    fn set_target_offset(&mut self, offset: Vec2) {
        self.target.offset = self.clamp_offset(offset, self.target.scale);
    }

    /// At least `pan_margin` points of the layout square stay inside the
    /// viewport on each axis.
    fn clamp_offset(&self, offset: Vec2, scale: f32) -> Vec2 {
        let size = self.viewport.logical_size();
        let half_extent = self.mapper.layout_extent(&self.viewport, Space::Logical) * 0.5;
        let margin = self.config.pan_margin.max(0.0);
        let limit = vec2(
            (size.x * 0.5 - margin + half_extent.x * scale).max(0.0),
            (size.y * 0.5 - margin + half_extent.y * scale).max(0.0),
        );
        vec2(
            offset.x.clamp(-limit.x, limit.x),
            offset.y.clamp(-limit.y, limit.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingConfig;
    use eframe::egui::pos2;
    use proptest::prelude::*;

    fn camera(width: f32, height: f32) -> Camera {
        let mut camera = Camera::new(CameraConfig::default(), CoordinateMapper::default());
        camera.set_viewport(Viewport::logical(width, height));
        camera
    }

    fn settle(camera: &mut Camera) -> usize {
        let mut frames = 0;
        while camera.tick(1.0 / 60.0) {
            frames += 1;
            assert!(frames < 10_000, "camera never settled");
        }
        frames
    }

    #[test]
    fn pan_moves_target_and_tick_converges() {
        let mut camera = camera(800.0, 600.0);
        camera.pan(vec2(40.0, -25.0));
        assert_eq!(camera.target().offset, vec2(40.0, -25.0));
        assert_eq!(camera.current().offset, Vec2::ZERO);

        assert!(settle(&mut camera) > 1);
        assert_eq!(camera.current(), camera.target());
        assert!(camera.is_settled());
        assert!(!camera.tick(1.0 / 60.0));
    }

    #[test]
    fn zoom_keeps_the_point_under_the_cursor_fixed() {
        let mut camera = camera(1000.0, 800.0);
        let mapper = CoordinateMapper::default();
        let viewport = camera.viewport();
        let at = pos2(730.0, 210.0);

        let before = mapper.screen_to_normalized(at, &viewport, &camera.target(), Space::Logical);
        camera.zoom(at, 1.5);
        let after = mapper.normalized_to_screen(before, &viewport, &camera.target(), Space::Logical);

        assert!((camera.target().scale - 1.5).abs() < 1e-6);
        assert!((after - at).length() < 1e-3, "drifted to {after:?}");
    }

    #[test]
    fn non_positive_zoom_factor_is_a_no_op() {
        let mut camera = camera(500.0, 500.0);
        camera.zoom(pos2(100.0, 100.0), 0.0);
        camera.zoom(pos2(100.0, 100.0), -3.0);
        camera.zoom(pos2(100.0, 100.0), f32::NAN);
        assert_eq!(camera.target(), CameraState::default());
    }

    #[test]
    fn repeated_zoom_converges_to_max_zoom() {
        let mut camera = camera(1000.0, 1000.0);
        let max_zoom = camera.config().max_zoom;
        for _ in 0..20 {
            camera.zoom(pos2(500.0, 500.0), 10.0);
            assert!(camera.target().scale <= max_zoom);
            for _ in 0..5 {
                camera.tick(1.0 / 60.0);
                assert!(camera.current().scale <= max_zoom);
            }
        }
        settle(&mut camera);
        assert_eq!(camera.current().scale, max_zoom);
    }

    #[test]
    fn fit_to_unit_box_with_ten_percent_padding() {
        let mut camera = camera(1.0, 1.0);
        camera.fit_to_bounds(0.0, 0.0, 1.0, 1.0, Viewport::logical(1000.0, 1000.0), 0.1);
        let target = camera.target();
        assert!((target.scale - 0.8).abs() < 1e-5);
        assert!(target.offset.length() < 1e-3);
    }

    #[test]
    fn fit_centers_an_off_center_box() {
        let mut camera = camera(1000.0, 1000.0);
        camera.fit_to_bounds(0.6, 0.6, 0.8, 0.8, Viewport::logical(1000.0, 1000.0), 0.1);
        let mapper = CoordinateMapper::default();
        let center = mapper.normalized_to_logical(
            pos2(0.7, 0.7),
            &camera.viewport(),
            &camera.target(),
        );
        assert!((camera.target().scale - 4.0).abs() < 1e-4);
        assert!((center - pos2(500.0, 500.0)).length() < 1e-2);
    }

    #[test]
    fn degenerate_box_does_not_zoom_to_infinity() {
        let mut camera = camera(1000.0, 1000.0);
        camera.fit_to_bounds(0.3, 0.3, 0.3, 0.3, Viewport::logical(1000.0, 1000.0), 0.1);
        let scale = camera.target().scale;
        assert!(scale.is_finite());
        assert!(scale <= camera.config().max_zoom);
    }

    #[test]
    fn focus_centers_the_point_at_focus_scale() {
        let mut camera = camera(900.0, 700.0);
        let mapper = CoordinateMapper::new(&MappingConfig::default());
        camera.focus(pos2(0.3, 0.6));
        let screen =
            mapper.normalized_to_logical(pos2(0.3, 0.6), &camera.viewport(), &camera.target());
        assert_eq!(camera.target().scale, camera.config().focus_scale);
        assert!((screen - pos2(450.0, 350.0)).length() < 1e-2);

        camera.reset();
        assert_eq!(camera.target(), CameraState::default());
    }

    #[test]
    fn pan_cannot_push_the_graph_out_of_view() {
        let mut camera = camera(800.0, 600.0);
        camera.pan(vec2(1.0e6, -1.0e6));
        camera.snap_to_target();

        let mapper = CoordinateMapper::default();
        let viewport = camera.viewport();
        let near_corner = mapper.normalized_to_logical(pos2(0.0, 1.0), &viewport, &camera.current());
        let margin = camera.config().pan_margin;
        assert!((near_corner.x - (800.0 - margin)).abs() < 1e-2);
        assert!((near_corner.y - margin).abs() < 1e-2);
    }

    #[test]
    fn new_target_supersedes_animation_without_jump() {
        let mut camera = camera(800.0, 600.0);
        camera.pan(vec2(200.0, 0.0));
        for _ in 0..3 {
            camera.tick(1.0 / 60.0);
        }
        let mid = camera.current();
        camera.pan(vec2(-400.0, 0.0));
        assert_eq!(camera.current(), mid);
        camera.tick(1.0 / 60.0);
        assert!(camera.current().offset.x < mid.offset.x);
    }

    #[test]
    fn fling_drifts_then_stops() {
        let mut camera = camera(800.0, 600.0);
        camera.fling(vec2(600.0, 0.0));
        assert!(camera.has_momentum());
        camera.tick(1.0 / 60.0);
        assert!(camera.target().offset.x > 0.0);
        settle(&mut camera);
        assert!(camera.is_settled());

        camera.fling(vec2(1.0, 0.0));
        assert!(!camera.has_momentum());
    }

    proptest! {
        #[test]
        fn prop_scale_stays_clamped(factors in proptest::collection::vec(0.01f32..20.0, 1..30)) {
            let mut camera = camera(640.0, 480.0);
            let config = camera.config().clone();
            for factor in factors {
                camera.zoom(pos2(100.0, 400.0), factor);
                camera.tick(1.0 / 30.0);
                prop_assert!(camera.target().scale >= config.min_zoom);
                prop_assert!(camera.target().scale <= config.max_zoom);
                prop_assert!(camera.current().scale <= config.max_zoom + 1e-4);
            }
        }
    }
}
