use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Base callsign without SSID, upper-cased: `"w1aw-5"` becomes `"W1AW"`.
pub fn base_callsign(call: &str) -> String {
    let trimmed = call.trim();
    let base = match trimmed.rsplit_once('-') {
        Some((base, ssid)) if !base.is_empty() && is_ssid(ssid) => base,
        _ => trimmed,
    };
    base.to_ascii_uppercase()
}

fn is_ssid(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 2
        && value.bytes().all(|byte| byte.is_ascii_digit())
        && value.parse::<u8>().is_ok_and(|ssid| ssid <= 15)
}

/// Case-insensitive, SSID-aware match of a node id against the station's own
/// callsign.
pub fn matches_self_call(node_id: &str, self_call: &str) -> bool {
    let self_base = base_callsign(self_call);
    !self_base.is_empty() && base_callsign(node_id) == self_base
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Deterministic value in `[0, 1]` derived from `id`.
pub fn stable_unit(id: &str) -> f32 {
    let (x, _) = stable_pair(id);
    (x + 1.0) * 0.5
}
