//! Pointer, scroll and pinch events in, selection intents and camera
//! mutations out.
//!
//! Locations are logical points with y growing downward. Hosts whose input
//! space grows upward set [`YAxis::Up`] and the controller flips locations
//! on the way in, which also inverts vertical drag deltas. Scroll and
//! magnification amounts are not positions and pass through unchanged.

use std::collections::BTreeSet;

use eframe::egui::{Pos2, Rect, Vec2, pos2};

use crate::config::{InteractionConfig, YAxis};

use super::camera::Camera;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    /// Platform zoom modifier (Ctrl, or Cmd on macOS) for wheel zoom.
    pub zoom: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Down,
    /// Pointer motion, with or without a button held.
    Move,
    Up,
    /// Pointer left the view.
    Leave,
    /// Wheel or trackpad scroll; amount in `delta`.
    Scroll,
    /// Pinch; relative magnification in `delta.x` (0.1 = 10% larger).
    Magnify,
}

/// Host-independent input event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub location: Pos2,
    pub delta: Vec2,
    pub modifiers: Modifiers,
    pub click_count: u32,
    /// Seconds on any monotonic clock.
    pub time: f64,
}

impl InputEvent {
    pub fn new(kind: InputKind, location: Pos2, time: f64) -> Self {
        Self {
            kind,
            location,
            delta: Vec2::ZERO,
            modifiers: Modifiers::default(),
            click_count: 1,
            time,
        }
    }

    pub fn down(location: Pos2, time: f64) -> Self {
        Self::new(InputKind::Down, location, time)
    }

    pub fn moved(location: Pos2, time: f64) -> Self {
        Self::new(InputKind::Move, location, time)
    }

    pub fn up(location: Pos2, time: f64) -> Self {
        Self::new(InputKind::Up, location, time)
    }

    pub fn leave(time: f64) -> Self {
        Self::new(InputKind::Leave, Pos2::ZERO, time)
    }

    pub fn scroll(location: Pos2, delta: Vec2, time: f64) -> Self {
        Self {
            delta,
            ..Self::new(InputKind::Scroll, location, time)
        }
    }

    pub fn magnify(location: Pos2, magnification: f32, time: f64) -> Self {
        Self {
            delta: Vec2::new(magnification, 0.0),
            ..Self::new(InputKind::Magnify, location, time)
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn with_click_count(mut self, click_count: u32) -> Self {
        self.click_count = click_count;
        self
    }
}

/// What a resolved gesture asks of the host side of the scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Select { id: String, additive: bool },
    SelectMany { ids: BTreeSet<String>, additive: bool },
    ClearSelection,
    Hover(Option<String>),
    Focus(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// False when the event should go to the host (plain scroll).
    pub consumed: bool,
    pub intents: Vec<Intent>,
}

impl Outcome {
    fn consumed() -> Self {
        Self {
            consumed: true,
            intents: Vec::new(),
        }
    }

    fn with(intent: Intent) -> Self {
        Self {
            consumed: true,
            intents: vec![intent],
        }
    }
}

/// Node lookups in logical view points.
pub trait NodePicker {
    fn pick(&self, point: Pos2) -> Option<String>;
    fn pick_rect(&self, rect: Rect) -> BTreeSet<String>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Idle,
    Determining {
        origin: Pos2,
        shift: bool,
        click_count: u32,
    },
    Panning {
        last: Pos2,
        last_time: f64,
        velocity: Vec2,
    },
    RectSelecting {
        origin: Pos2,
        current: Pos2,
    },
}

pub struct InteractionController {
    config: InteractionConfig,
    gesture: Gesture,
    hovered: Option<String>,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            gesture: Gesture::Idle,
            hovered: None,
        }
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. })
    }

    /// Rubber band in logical points while a rectangle select is in flight.
    pub fn selection_rect(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::RectSelecting { origin, current } => Some(Rect::from_two_pos(origin, current)),
            _ => None,
        }
    }

    /// Forgets the remembered hover so the next move reports afresh.
    pub fn reset_hover(&mut self) {
        self.hovered = None;
    }

    pub fn handle(
        &mut self,
        event: InputEvent,
        camera: &mut Camera,
        picker: &dyn NodePicker,
    ) -> Outcome {
        let event = self.normalize(event, camera);
        if !(event.location.x.is_finite() && event.location.y.is_finite()) {
            return Outcome::default();
        }

        match event.kind {
            InputKind::Down => self.on_down(&event),
            InputKind::Move => self.on_move(&event, camera, picker),
            InputKind::Up => self.on_up(&event, camera, picker),
            InputKind::Leave => self.on_leave(),
            InputKind::Scroll => self.on_scroll(&event, camera),
            InputKind::Magnify => self.on_magnify(&event, camera),
        }
    }

    fn normalize(&self, mut event: InputEvent, camera: &Camera) -> InputEvent {
        if self.config.y_axis == YAxis::Up && event.kind != InputKind::Leave {
            let height = camera.viewport().logical_size().y;
            event.location = pos2(event.location.x, height - event.location.y);
        }
        event
    }

    fn on_down(&mut self, event: &InputEvent) -> Outcome {
        self.gesture = Gesture::Determining {
            origin: event.location,
            shift: event.modifiers.shift,
            click_count: event.click_count.max(1),
        };
        Outcome::consumed()
    }

    fn on_move(&mut self, event: &InputEvent, camera: &mut Camera, picker: &dyn NodePicker) -> Outcome {
        match self.gesture {
            Gesture::Idle => self.update_hover(picker.pick(event.location)),
            Gesture::Determining { origin, shift, .. } => {
                let travelled = event.location - origin;
                if travelled.length() < self.config.drag_threshold {
                    return Outcome::consumed();
                }

                if shift {
                    self.gesture = Gesture::RectSelecting {
                        origin,
                        current: event.location,
                    };
                    tracing::trace!("rectangle select started");
                } else {
                    camera.pan(travelled);
                    self.gesture = Gesture::Panning {
                        last: event.location,
                        last_time: event.time,
                        velocity: Vec2::ZERO,
                    };
                    tracing::trace!("pan started");
                }

                let mut outcome = Outcome::consumed();
                outcome.intents.extend(self.update_hover(None).intents);
                outcome
            }
            Gesture::Panning {
                last,
                last_time,
                velocity,
            } => {
                let step = event.location - last;
                camera.pan(step);

                let dt = (event.time - last_time) as f32;
                let velocity = if dt > 0.0 && dt.is_finite() {
                    let instant = step / dt;
                    if velocity == Vec2::ZERO {
                        instant
                    } else {
                        velocity * 0.5 + instant * 0.5
                    }
                } else {
                    velocity
                };
                self.gesture = Gesture::Panning {
                    last: event.location,
                    last_time: event.time,
                    velocity,
                };
                Outcome::consumed()
            }
            Gesture::RectSelecting { origin, .. } => {
                self.gesture = Gesture::RectSelecting {
                    origin,
                    current: event.location,
                };
                Outcome::consumed()
            }
        }
    }

    fn on_up(&mut self, event: &InputEvent, camera: &mut Camera, picker: &dyn NodePicker) -> Outcome {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Idle => Outcome::default(),
            Gesture::Determining {
                shift, click_count, ..
            } => {
                let hit = picker.pick(event.location);
                let mut outcome = Outcome::consumed();
                match (hit, click_count >= 2) {
                    (Some(id), true) => {
                        outcome.intents.push(Intent::Select {
                            id: id.clone(),
                            additive: false,
                        });
                        outcome.intents.push(Intent::Focus(id));
                    }
                    (Some(id), false) => outcome.intents.push(Intent::Select {
                        id,
                        additive: shift,
                    }),
                    (None, true) => camera.zoom_to_fit(),
                    (None, false) if !shift => outcome.intents.push(Intent::ClearSelection),
                    (None, false) => {}
                }
                outcome
            }
            Gesture::Panning {
                last_time,
                velocity,
                ..
            } => {
                let idle_for = event.time - last_time;
                if idle_for <= 0.1 && velocity.length() >= self.config.fling_min_speed {
                    camera.fling(velocity);
                }
                Outcome::consumed()
            }
            Gesture::RectSelecting { origin, .. } => {
                let rect = Rect::from_two_pos(origin, event.location);
                let ids = picker.pick_rect(rect);
                tracing::debug!(count = ids.len(), "rectangle select");
                Outcome::with(Intent::SelectMany {
                    ids,
                    additive: true,
                })
            }
        }
    }

    fn on_leave(&mut self) -> Outcome {
        self.gesture = Gesture::Idle;
        self.update_hover(None)
    }

    fn on_scroll(&mut self, event: &InputEvent, camera: &mut Camera) -> Outcome {
        if !event.modifiers.zoom || !event.delta.y.is_finite() || event.delta.y == 0.0 {
            return Outcome::default();
        }
        let step = self.config.max_scroll_step.clamp(0.0, 0.95);
        let factor = (1.0 + event.delta.y * self.config.scroll_zoom_rate).clamp(1.0 - step, 1.0 + step);
        camera.zoom(event.location, factor);
        Outcome::consumed()
    }

    fn on_magnify(&mut self, event: &InputEvent, camera: &mut Camera) -> Outcome {
        let magnification = event.delta.x;
        if !magnification.is_finite() {
            return Outcome::default();
        }
        let limit = self.config.max_magnification_delta.clamp(0.0, 0.95);
        camera.zoom(event.location, 1.0 + magnification.clamp(-limit, limit));
        Outcome::consumed()
    }

    fn update_hover(&mut self, hovered: Option<String>) -> Outcome {
        if self.hovered == hovered {
            return Outcome::consumed();
        }
        self.hovered = hovered.clone();
        Outcome::with(Intent::Hover(hovered))
    }
}
