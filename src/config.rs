use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

/// Plain straight-alpha RGBA in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RgbaColor(pub [f32; 4]);

impl RgbaColor {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b, 1.0])
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    pub fn alpha(self) -> f32 {
        self.0[3]
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha.clamp(0.0, 1.0)])
    }

    pub fn scale_alpha(self, factor: f32) -> Self {
        self.with_alpha(self.alpha() * factor)
    }

    pub fn blend(self, overlay: Self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let inverse = 1.0 - amount;
        let mut out = [0.0; 4];
        for (channel, (base, over)) in out.iter_mut().zip(self.0.iter().zip(overlay.0.iter())) {
            *channel = base * inverse + over * amount;
        }
        Self(out)
    }

    fn hash_bits<H: Hasher>(&self, state: &mut H) {
        for channel in self.0 {
            channel.to_bits().hash(state);
        }
    }
}

/// Vertical direction of the host's input coordinate system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YAxis {
    /// y grows downward, same as the render space.
    #[default]
    Down,
    /// y grows upward; locations and deltas are flipped on the way in.
    Up,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub focus_scale: f32,
    /// Fraction of the remaining distance covered per 60 Hz frame.
    pub smoothing: f32,
    pub scale_epsilon: f32,
    pub offset_epsilon: f32,
    /// Logical points of graph that must stay inside the viewport.
    pub pan_margin: f32,
    /// Smallest normalized box extent `fit_to_bounds` will zoom onto.
    pub min_fit_extent: f32,
    pub fit_padding: f32,
    /// Momentum velocity retained per 60 Hz frame.
    pub momentum_friction: f32,
    pub momentum_min_speed: f32,
    pub settle_grace_secs: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.25,
            max_zoom: 8.0,
            focus_scale: 2.5,
            smoothing: 0.22,
            scale_epsilon: 1e-4,
            offset_epsilon: 0.05,
            pan_margin: 48.0,
            min_fit_extent: 0.05,
            fit_padding: 0.1,
            momentum_friction: 0.92,
            momentum_min_speed: 6.0,
            settle_grace_secs: 0.25,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Logical points between the viewport edge and the layout square.
    pub inset: f32,
    /// On-screen node radius grows as `scale^zoom_radius_exponent`.
    pub zoom_radius_exponent: f32,
    pub min_screen_radius: f32,
    pub max_screen_radius: f32,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            inset: 24.0,
            zoom_radius_exponent: 0.4,
            min_screen_radius: 2.0,
            max_screen_radius: 48.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub min_radius: f32,
    pub max_radius: f32,
    pub min_edge_thickness: f32,
    pub max_edge_thickness: f32,
    pub min_edge_alpha: f32,
    pub max_edge_alpha: f32,
    pub relay_alpha: f32,
    pub stale_alpha: f32,
    pub unfocused_alpha: f32,
    pub selected_outline_scale: f32,
    pub hovered_outline_scale: f32,
    pub outline_width: f32,
    pub highlight_edge_extra: f32,
    pub node_low: RgbaColor,
    pub node_high: RgbaColor,
    pub self_node: RgbaColor,
    pub official_node: RgbaColor,
    pub edge: RgbaColor,
    pub accent: RgbaColor,
    pub hover_accent: RgbaColor,
    pub highlight_edge: RgbaColor,
    pub label: RgbaColor,
    pub background: RgbaColor,
    pub selection_fill: RgbaColor,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            min_radius: 4.0,
            max_radius: 18.0,
            min_edge_thickness: 0.8,
            max_edge_thickness: 4.5,
            min_edge_alpha: 0.22,
            max_edge_alpha: 0.85,
            relay_alpha: 0.55,
            stale_alpha: 0.4,
            unfocused_alpha: 0.18,
            selected_outline_scale: 1.35,
            hovered_outline_scale: 1.2,
            outline_width: 2.0,
            highlight_edge_extra: 1.2,
            node_low: RgbaColor::rgb(0.22, 0.59, 0.84),
            node_high: RgbaColor::rgb(0.96, 0.31, 0.24),
            self_node: RgbaColor::rgb(0.40, 0.86, 0.47),
            official_node: RgbaColor::rgb(0.97, 0.77, 0.30),
            edge: RgbaColor::rgb(0.63, 0.67, 0.73),
            accent: RgbaColor::rgb(0.96, 0.81, 0.36),
            hover_accent: RgbaColor::rgb(1.0, 0.64, 0.40),
            highlight_edge: RgbaColor::rgb(0.95, 0.57, 0.37),
            label: RgbaColor::rgb(0.93, 0.93, 0.93),
            background: RgbaColor::rgb(0.075, 0.09, 0.114),
            selection_fill: RgbaColor::rgba(0.40, 0.77, 1.0, 0.18),
        }
    }
}

impl StyleConfig {
    /// Feeds every field that affects instance buffers into `state`.
    pub fn hash_into<H: Hasher>(&self, state: &mut H) {
        for value in [
            self.min_radius,
            self.max_radius,
            self.min_edge_thickness,
            self.max_edge_thickness,
            self.min_edge_alpha,
            self.max_edge_alpha,
            self.relay_alpha,
            self.stale_alpha,
            self.unfocused_alpha,
            self.selected_outline_scale,
            self.hovered_outline_scale,
            self.outline_width,
            self.highlight_edge_extra,
        ] {
            value.to_bits().hash(state);
        }
        for color in [
            self.node_low,
            self.node_high,
            self.self_node,
            self.official_node,
            self.edge,
            self.accent,
            self.hover_accent,
            self.highlight_edge,
        ] {
            color.hash_bits(state);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Logical points the pointer must travel before a press becomes a drag.
    pub drag_threshold: f32,
    pub scroll_zoom_rate: f32,
    pub max_scroll_step: f32,
    pub max_magnification_delta: f32,
    pub y_axis: YAxis,
    /// Release speed in points per second above which a pan keeps drifting.
    pub fling_min_speed: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3.0,
            scroll_zoom_rate: 0.0018,
            max_scroll_step: 0.15,
            max_magnification_delta: 0.25,
            y_axis: YAxis::Down,
            fling_min_speed: 120.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTestConfig {
    pub min_hit_radius: f32,
    pub hit_pad: f32,
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            min_hit_radius: 8.0,
            hit_pad: 4.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_nodes: usize,
    pub max_labels: usize,
    /// Camera scale above which ordinary nodes get labels.
    pub label_min_scale: f32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_nodes: 1500,
            max_labels: 80,
            label_min_scale: 1.6,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub mapping: MappingConfig,
    pub style: StyleConfig,
    pub interaction: InteractionConfig,
    pub hit_test: HitTestConfig,
    pub limits: LimitsConfig,
}

impl SceneConfig {
    pub fn validate(&self) -> Result<()> {
        fn range(name: &str, min: f32, max: f32) -> Result<()> {
            if min.is_finite() && max.is_finite() && min <= max {
                Ok(())
            } else {
                Err(SceneError::InvalidConfig(format!(
                    "{name}: expected min <= max, got {min} > {max}"
                )))
            }
        }

        fn positive(name: &str, value: f32) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SceneError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        }

        let camera = &self.camera;
        positive("camera.min_zoom", camera.min_zoom)?;
        range("camera zoom", camera.min_zoom, camera.max_zoom)?;
        positive("camera.focus_scale", camera.focus_scale)?;
        positive("camera.min_fit_extent", camera.min_fit_extent)?;
        if !(camera.smoothing > 0.0 && camera.smoothing <= 1.0) {
            return Err(SceneError::InvalidConfig(format!(
                "camera.smoothing must be in (0, 1], got {}",
                camera.smoothing
            )));
        }
        if !(0.0..0.5).contains(&camera.fit_padding) {
            return Err(SceneError::InvalidConfig(format!(
                "camera.fit_padding must be in [0, 0.5), got {}",
                camera.fit_padding
            )));
        }
        if !(0.0..1.0).contains(&camera.momentum_friction) {
            return Err(SceneError::InvalidConfig(format!(
                "camera.momentum_friction must be in [0, 1), got {}",
                camera.momentum_friction
            )));
        }

        range(
            "mapping screen radius",
            self.mapping.min_screen_radius,
            self.mapping.max_screen_radius,
        )?;
        range("style radius", self.style.min_radius, self.style.max_radius)?;
        range(
            "style edge thickness",
            self.style.min_edge_thickness,
            self.style.max_edge_thickness,
        )?;
        range(
            "style edge alpha",
            self.style.min_edge_alpha,
            self.style.max_edge_alpha,
        )?;
        positive("interaction.drag_threshold", self.interaction.drag_threshold)?;
        if self.limits.max_nodes == 0 {
            return Err(SceneError::InvalidConfig(
                "limits.max_nodes must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Reads a JSON config file. Missing fields take their defaults.
pub fn load_config(path: &Path) -> anyhow::Result<SceneConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: SceneConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config JSON in {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SceneConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SceneConfig =
            serde_json::from_str(r#"{"camera": {"max_zoom": 4.0}, "interaction": {"y_axis": "up"}}"#)
                .expect("parses");
        assert_eq!(config.camera.max_zoom, 4.0);
        assert_eq!(config.camera.min_zoom, CameraConfig::default().min_zoom);
        assert_eq!(config.interaction.y_axis, YAxis::Up);
        assert_eq!(config.style, StyleConfig::default());
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let mut config = SceneConfig::default();
        config.camera.min_zoom = 5.0;
        config.camera.max_zoom = 1.0;
        assert!(matches!(
            config.validate(),
            Err(SceneError::InvalidConfig(_))
        ));

        let mut config = SceneConfig::default();
        config.style.min_radius = 30.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn blend_and_alpha_scaling() {
        let black = RgbaColor::rgb(0.0, 0.0, 0.0);
        let white = RgbaColor::rgb(1.0, 1.0, 1.0);
        assert_eq!(black.blend(white, 0.5), RgbaColor::rgb(0.5, 0.5, 0.5));
        assert_eq!(white.scale_alpha(0.25).alpha(), 0.25);
        assert_eq!(white.scale_alpha(4.0).alpha(), 1.0);
    }
}
