use eframe::egui::{self, Event, InputState, MouseWheelUnit, Pos2, Rect, pos2};
use packet_topo::scene::interaction::{InputEvent, Modifiers};

const DOUBLE_CLICK_SECS: f64 = 0.3;
const DOUBLE_CLICK_SLOP: f32 = 6.0;
const LINE_POINTS: f32 = 40.0;

/// Translates raw egui events inside the scene rectangle into scene input
/// events in view-local logical points.
#[derive(Default)]
pub(super) struct InputBridge {
    captured: bool,
    inside: bool,
    last_press: Option<(f64, Pos2)>,
    last_pointer: Option<Pos2>,
}

impl InputBridge {
    pub(super) fn collect(&mut self, input: &InputState, rect: Rect, hovered: bool) -> Vec<InputEvent> {
        let time = input.time;
        let mut events = Vec::new();

        for event in &input.events {
            match event {
                Event::PointerMoved(pos) => {
                    self.last_pointer = Some(*pos);
                    let inside = hovered && rect.contains(*pos);
                    if inside || self.captured {
                        events.push(
                            InputEvent::moved(local(rect, *pos), time)
                                .with_modifiers(modifiers(&input.modifiers)),
                        );
                    } else if self.inside {
                        events.push(InputEvent::leave(time));
                    }
                    self.inside = inside;
                }
                Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    modifiers: raw,
                } => {
                    if *pressed {
                        if !(hovered && rect.contains(*pos)) {
                            continue;
                        }
                        self.captured = true;
                        let click_count = self.click_count(time, *pos);
                        events.push(
                            InputEvent::down(local(rect, *pos), time)
                                .with_modifiers(modifiers(raw))
                                .with_click_count(click_count),
                        );
                    } else if self.captured {
                        self.captured = false;
                        events.push(
                            InputEvent::up(local(rect, *pos), time).with_modifiers(modifiers(raw)),
                        );
                    }
                }
                Event::PointerGone => {
                    self.captured = false;
                    self.last_pointer = None;
                    if std::mem::take(&mut self.inside) {
                        events.push(InputEvent::leave(time));
                    }
                }
                Event::MouseWheel {
                    unit,
                    delta,
                    modifiers: raw,
                    ..
                } => {
                    let Some(pos) = self.pointer_inside(rect, hovered) else {
                        continue;
                    };
                    let points = match unit {
                        MouseWheelUnit::Point => *delta,
                        MouseWheelUnit::Line => *delta * LINE_POINTS,
                        MouseWheelUnit::Page => *delta * rect.height(),
                    };
                    events.push(
                        InputEvent::scroll(local(rect, pos), points, time)
                            .with_modifiers(modifiers(raw)),
                    );
                }
                Event::Zoom(factor) => {
                    if let Some(pos) = self.pointer_inside(rect, hovered) {
                        events.push(InputEvent::magnify(local(rect, pos), factor - 1.0, time));
                    }
                }
                _ => {}
            }
        }
        events
    }

    fn pointer_inside(&self, rect: Rect, hovered: bool) -> Option<Pos2> {
        self.last_pointer.filter(|pos| hovered && rect.contains(*pos))
    }

    fn click_count(&mut self, time: f64, pos: Pos2) -> u32 {
        let repeated = self.last_press.is_some_and(|(at, where_)| {
            time - at <= DOUBLE_CLICK_SECS && where_.distance(pos) <= DOUBLE_CLICK_SLOP
        });
        // A double click consumes the pair; a third press starts over.
        self.last_press = if repeated { None } else { Some((time, pos)) };
        if repeated { 2 } else { 1 }
    }
}

fn local(rect: Rect, pos: Pos2) -> Pos2 {
    pos2(pos.x - rect.min.x, pos.y - rect.min.y)
}

fn modifiers(raw: &egui::Modifiers) -> Modifiers {
    Modifiers {
        shift: raw.shift,
        zoom: raw.command || raw.ctrl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_press_close_in_time_and_space_is_a_double_click() {
        let mut bridge = InputBridge::default();
        assert_eq!(bridge.click_count(1.0, pos2(10.0, 10.0)), 1);
        assert_eq!(bridge.click_count(1.2, pos2(12.0, 11.0)), 2);
        assert_eq!(bridge.click_count(1.3, pos2(12.0, 11.0)), 1);
        assert_eq!(bridge.click_count(2.0, pos2(80.0, 11.0)), 1);
    }

    #[test]
    fn locations_are_relative_to_the_scene_rect() {
        let rect = Rect::from_min_max(pos2(100.0, 40.0), pos2(500.0, 400.0));
        assert_eq!(local(rect, pos2(150.0, 50.0)), pos2(50.0, 10.0));
    }
}
