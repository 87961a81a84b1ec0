use std::collections::HashSet;

use egui::{Event, PointerButton, Pos2, Rect, TouchPhase};

use super::{PointerEvent, PointerId, PointerSource};
use crate::point::Point;

/// Pointer id used for the mouse; touch contacts keep their platform ids
pub const MOUSE_POINTER: PointerId = PointerId(u64::MAX);

/// Converts raw egui input events into canvas-relative [`PointerEvent`]s.
///
/// egui-winit mirrors the first touch as primary button and pointer-move events right
/// after the matching `Event::Touch`. Presses and moves that arrive while a touch is down
/// are therefore dropped, so a finger never shows up as the mouse.
#[derive(Debug, Clone)]
pub struct EguiPointerBridge {
    canvas_rect: Rect,
    touch_source: PointerSource,
    mouse_down: bool,
    active_touches: HashSet<u64>,
}

impl Default for EguiPointerBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl EguiPointerBridge {
    pub fn new() -> Self {
        Self {
            canvas_rect: Rect::EVERYTHING,
            touch_source: PointerSource::Touch,
            mouse_down: false,
            active_touches: HashSet::new(),
        }
    }

    /// Only contacts starting inside this rect begin a gesture; positions are relative to its corner
    pub fn set_canvas_rect(&mut self, rect: Rect) {
        self.canvas_rect = rect;
    }

    /// egui does not tell a pen from a finger, so the platform integration decides
    pub fn set_touch_source(&mut self, source: PointerSource) {
        self.touch_source = source;
    }

    fn to_canvas(&self, pos: Pos2) -> Point {
        let origin = if self.canvas_rect == Rect::EVERYTHING {
            Pos2::ZERO
        } else {
            self.canvas_rect.min
        };
        Point::new((pos.x - origin.x) as f64, (pos.y - origin.y) as f64)
    }

    /// Translate one frame's worth of egui events
    pub fn translate(&mut self, events: &[Event]) -> Vec<PointerEvent> {
        let mut translated = Vec::new();

        for event in events {
            match event {
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed,
                    ..
                } => {
                    if *pressed && !self.active_touches.is_empty() {
                        continue;
                    }
                    if *pressed && self.canvas_rect.contains(*pos) {
                        self.mouse_down = true;
                        translated.push(PointerEvent::Down {
                            pointer: MOUSE_POINTER,
                            source: PointerSource::Mouse,
                            position: self.to_canvas(*pos),
                        });
                    } else if !*pressed && self.mouse_down {
                        self.mouse_down = false;
                        translated.push(PointerEvent::Up {
                            pointer: MOUSE_POINTER,
                            position: Some(self.to_canvas(*pos)),
                        });
                    }
                }
                Event::PointerMoved(pos) if self.mouse_down && self.active_touches.is_empty() => {
                    translated.push(PointerEvent::Move {
                        pointer: MOUSE_POINTER,
                        position: self.to_canvas(*pos),
                    });
                }
                Event::PointerGone if self.mouse_down => {
                    self.mouse_down = false;
                    translated.push(PointerEvent::Cancel {
                        pointer: MOUSE_POINTER,
                    });
                }
                Event::Touch { id, phase, pos, .. } => {
                    let pointer = PointerId(id.0);
                    let position = self.to_canvas(*pos);
                    match phase {
                        TouchPhase::Start => {
                            self.active_touches.insert(id.0);
                            if self.canvas_rect.contains(*pos) {
                                translated.push(PointerEvent::Down {
                                    pointer,
                                    source: self.touch_source,
                                    position,
                                });
                            }
                        }
                        TouchPhase::Move => {
                            translated.push(PointerEvent::Move { pointer, position });
                        }
                        TouchPhase::End => {
                            self.active_touches.remove(&id.0);
                            translated.push(PointerEvent::Up {
                                pointer,
                                position: Some(position),
                            });
                        }
                        TouchPhase::Cancel => {
                            self.active_touches.remove(&id.0);
                            translated.push(PointerEvent::Cancel { pointer });
                        }
                    }
                }
                _ => {}
            }
        }

        translated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Modifiers, TouchDeviceId, TouchId, pos2};

    fn button(pos: Pos2, pressed: bool) -> Event {
        Event::PointerButton {
            pos,
            button: PointerButton::Primary,
            pressed,
            modifiers: Modifiers::default(),
        }
    }

    fn touch(id: u64, phase: TouchPhase, pos: Pos2) -> Event {
        Event::Touch {
            device_id: TouchDeviceId(0),
            id: TouchId(id),
            phase,
            pos,
            force: None,
        }
    }

    #[test]
    fn test_mouse_drag_relative_to_canvas() {
        let mut bridge = EguiPointerBridge::new();
        bridge.set_canvas_rect(Rect::from_min_size(pos2(100.0, 50.0), egui::vec2(200.0, 200.0)));

        let events = bridge.translate(&[
            button(pos2(110.0, 60.0), true),
            Event::PointerMoved(pos2(120.0, 70.0)),
            button(pos2(120.0, 70.0), false),
        ]);

        assert_eq!(
            events,
            vec![
                PointerEvent::Down {
                    pointer: MOUSE_POINTER,
                    source: PointerSource::Mouse,
                    position: Point::new(10.0, 10.0),
                },
                PointerEvent::Move {
                    pointer: MOUSE_POINTER,
                    position: Point::new(20.0, 20.0),
                },
                PointerEvent::Up {
                    pointer: MOUSE_POINTER,
                    position: Some(Point::new(20.0, 20.0)),
                },
            ]
        );
    }

    #[test]
    fn test_hover_and_outside_presses_are_dropped() {
        let mut bridge = EguiPointerBridge::new();
        bridge.set_canvas_rect(Rect::from_min_size(Pos2::ZERO, egui::vec2(10.0, 10.0)));

        let events = bridge.translate(&[
            Event::PointerMoved(pos2(5.0, 5.0)),
            button(pos2(50.0, 50.0), true),
            Event::PointerMoved(pos2(6.0, 6.0)),
            button(pos2(6.0, 6.0), false),
        ]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_pointer_gone_cancels() {
        let mut bridge = EguiPointerBridge::new();
        let events = bridge.translate(&[button(pos2(1.0, 1.0), true), Event::PointerGone]);
        assert_eq!(events[1], PointerEvent::Cancel { pointer: MOUSE_POINTER });
    }

    #[test]
    fn test_touch_is_not_mirrored_as_mouse() {
        let mut bridge = EguiPointerBridge::new();

        // egui-winit emits the touch followed by its pointer emulation
        let events = bridge.translate(&[
            touch(3, TouchPhase::Start, pos2(5.0, 5.0)),
            Event::PointerMoved(pos2(5.0, 5.0)),
            button(pos2(5.0, 5.0), true),
            touch(3, TouchPhase::Move, pos2(8.0, 8.0)),
            Event::PointerMoved(pos2(8.0, 8.0)),
            touch(3, TouchPhase::End, pos2(8.0, 8.0)),
            button(pos2(8.0, 8.0), false),
            Event::PointerGone,
        ]);

        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|event| event.pointer() == PointerId(3)));

        // A real mouse drag afterwards still comes through
        let events = bridge.translate(&[
            button(pos2(1.0, 1.0), true),
            Event::PointerMoved(pos2(2.0, 2.0)),
            button(pos2(2.0, 2.0), false),
        ]);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|event| event.pointer() == MOUSE_POINTER));
    }

    #[test]
    fn test_touch_uses_configured_source() {
        let mut bridge = EguiPointerBridge::new();
        bridge.set_touch_source(PointerSource::Stylus);

        let events = bridge.translate(&[
            touch(7, TouchPhase::Start, pos2(1.0, 2.0)),
            touch(7, TouchPhase::Move, pos2(3.0, 4.0)),
            touch(7, TouchPhase::End, pos2(3.0, 4.0)),
        ]);

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            PointerEvent::Down {
                pointer: PointerId(7),
                source: PointerSource::Stylus,
                position: Point::new(1.0, 2.0),
            }
        );
        assert_eq!(events[2].pointer(), PointerId(7));
    }
}
