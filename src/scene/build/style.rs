use crate::config::{RgbaColor, StyleConfig};
use crate::graph::EdgeKind;

pub(super) fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}

/// Log-scaled position of `value` between `min` and `max`; exactly 0.5 when
/// the range is degenerate.
pub fn normalize_log(value: u64, min: u64, max: u64) -> f32 {
    let min = min.max(1) as f64;
    let max = max.max(min as u64) as f64;
    let value = value.max(1) as f64;

    if (max - min).abs() < f64::EPSILON {
        return 0.5;
    }

    let denominator = max.ln() - min.ln();
    if denominator.abs() < f64::EPSILON {
        return 0.5;
    }

    ((value.ln() - min.ln()) / denominator).clamp(0.0, 1.0) as f32
}

pub fn node_radius(style: &StyleConfig, weight: u64, min: u64, max: u64) -> f32 {
    lerp(style.min_radius, style.max_radius, normalize_log(weight, min, max))
}

pub(super) fn node_color(
    style: &StyleConfig,
    t: f32,
    is_self: bool,
    is_official: bool,
    in_focus: bool,
) -> RgbaColor {
    let color = if is_self {
        style.self_node
    } else if is_official {
        style.official_node
    } else {
        style.node_low.blend(style.node_high, t)
    };

    if in_focus {
        color
    } else {
        color.scale_alpha(style.unfocused_alpha)
    }
}

/// Linear share of the heaviest edge, 0 when every edge weighs nothing.
pub fn edge_fraction(weight: u64, max_weight: u64) -> f32 {
    if max_weight == 0 {
        return 0.0;
    }
    (weight as f64 / max_weight as f64).clamp(0.0, 1.0) as f32
}

pub(super) fn edge_thickness(style: &StyleConfig, fraction: f32) -> f32 {
    lerp(style.min_edge_thickness, style.max_edge_thickness, fraction)
}

pub(super) fn edge_alpha(
    style: &StyleConfig,
    fraction: f32,
    kind: EdgeKind,
    is_stale: bool,
    in_focus: bool,
) -> f32 {
    let mut alpha = lerp(style.min_edge_alpha, style.max_edge_alpha, fraction);
    if kind == EdgeKind::ViaRelay {
        alpha *= style.relay_alpha;
    }
    if is_stale {
        alpha *= style.stale_alpha;
    }
    if !in_focus {
        alpha *= style.unfocused_alpha;
    }
    alpha.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn degenerate_weight_range_is_exactly_half() {
        assert_eq!(normalize_log(5, 5, 5), 0.5);
        assert_eq!(normalize_log(0, 0, 0), 0.5);
        let style = StyleConfig::default();
        let radius = node_radius(&style, 7, 7, 7);
        assert_eq!(radius, (style.min_radius + style.max_radius) * 0.5);
    }

    #[test]
    fn range_endpoints_map_to_radius_bounds() {
        let style = StyleConfig::default();
        assert_eq!(node_radius(&style, 1, 1, 1000), style.min_radius);
        assert_eq!(node_radius(&style, 1000, 1, 1000), style.max_radius);
        assert_eq!(node_radius(&style, 0, 1, 1000), style.min_radius);
    }

    #[test]
    fn edge_alpha_multipliers_stack() {
        let style = StyleConfig::default();
        let plain = edge_alpha(&style, 1.0, EdgeKind::Direct, false, true);
        let relay = edge_alpha(&style, 1.0, EdgeKind::ViaRelay, false, true);
        let stale_relay = edge_alpha(&style, 1.0, EdgeKind::ViaRelay, true, true);
        let dimmed = edge_alpha(&style, 1.0, EdgeKind::ViaRelay, true, false);
        assert!(plain > relay && relay > stale_relay && stale_relay > dimmed);
        assert!((relay - plain * style.relay_alpha).abs() < 1e-6);
    }

    #[test]
    fn edge_fraction_is_linear_and_guards_zero() {
        assert_eq!(edge_fraction(5, 10), 0.5);
        assert_eq!(edge_fraction(0, 0), 0.0);
        assert_eq!(edge_fraction(10, 10), 1.0);
    }

    proptest! {
        #[test]
        fn prop_radius_is_monotonic_in_weight(
            min in 1u64..1_000,
            span in 0u64..1_000_000,
            a in 0u64..1_000_000,
            b in 0u64..1_000_000,
        ) {
            let max = min + span;
            let (lo, hi) = (a.min(b).clamp(min, max), a.max(b).clamp(min, max));
            let style = StyleConfig::default();
            prop_assert!(node_radius(&style, lo, min, max) <= node_radius(&style, hi, min, max));
        }
    }
}
