//! Interactive renderer for packet-radio network topology snapshots.
//!
//! [`scene::Scene`] owns everything between a [`graph::GraphModel`] with
//! normalized positions and pixels on screen: camera, render buffers,
//! picking and pointer gestures. The binary wraps it in an eframe window.

pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod scene;
pub mod util;
