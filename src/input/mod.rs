use serde::{Deserialize, Serialize};

use crate::command::{BrushStyle, StyleCommand};
use crate::config::CanvasConfig;
use crate::document::{DrawingDocumentState, StrokeHandle};
use crate::error::CanvasResult;
use crate::point::Point;

mod egui_bridge;
pub use egui_bridge::{EguiPointerBridge, MOUSE_POINTER};

/// The kind of device that produced a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerSource {
    Stylus,
    Touch,
    Mouse,
}

/// Identifies one pointer contact for the duration of a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

/// Raw pointer input delivered to the capture controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// A contact started
    Down {
        pointer: PointerId,
        source: PointerSource,
        position: Point,
    },
    /// A contact moved
    Move { pointer: PointerId, position: Point },
    /// A contact lifted, with the lift-off location when the platform reports one
    Up {
        pointer: PointerId,
        position: Option<Point>,
    },
    /// The platform took the contact away (e.g. a system gesture)
    Cancel { pointer: PointerId },
}

impl PointerEvent {
    pub fn pointer(&self) -> PointerId {
        match self {
            Self::Down { pointer, .. }
            | Self::Move { pointer, .. }
            | Self::Up { pointer, .. }
            | Self::Cancel { pointer } => *pointer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing { pointer: PointerId },
}

/// What handling a single event did to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Ignored,
    Began(StrokeHandle),
    Extended,
    /// The gesture finished; `None` when the stroke was discarded or already gone
    Ended(Option<StrokeHandle>),
}

/// Turns the pointer event stream into stroke calls on a document.
///
/// Only contacts from the primary source start strokes, and only one contact is tracked
/// at a time; everything else is ignored.
#[derive(Debug, Clone)]
pub struct InputCaptureController {
    primary_source: PointerSource,
    record_contact_point: bool,
    record_lift_off: bool,
    style: BrushStyle,
    state: CaptureState,
}

impl InputCaptureController {
    pub fn new(primary_source: PointerSource, style: BrushStyle) -> Self {
        Self {
            primary_source,
            record_contact_point: true,
            record_lift_off: false,
            style,
            state: CaptureState::Idle,
        }
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        let style = BrushStyle::new(config.default_color, config.default_width, config.background);
        let mut controller = Self::new(config.primary_source, style);
        controller.record_contact_point = config.record_contact_point;
        controller.record_lift_off = config.record_lift_off;
        controller
    }

    /// Whether the location of the initial contact becomes the first point of the stroke
    pub fn set_record_contact_point(&mut self, record: bool) {
        self.record_contact_point = record;
    }

    /// Whether an `Up` location that differs from the last point is appended before ending
    pub fn set_record_lift_off(&mut self, record: bool) {
        self.record_lift_off = record;
    }

    pub fn primary_source(&self) -> PointerSource {
        self.primary_source
    }

    /// Takes effect from the next gesture on
    pub fn set_primary_source(&mut self, source: PointerSource) {
        self.primary_source = source;
    }

    pub fn style(&self) -> &BrushStyle {
        &self.style
    }

    /// Change the style of the next stroke; the active stroke keeps its style
    pub fn apply(&mut self, command: StyleCommand) -> bool {
        self.style.apply(command)
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, CaptureState::Capturing { .. })
    }

    /// Feed one pointer event
    pub fn handle(
        &mut self,
        doc: &mut DrawingDocumentState,
        event: PointerEvent,
    ) -> CanvasResult<CaptureOutcome> {
        match (self.state, event) {
            (
                CaptureState::Idle,
                PointerEvent::Down {
                    pointer,
                    source,
                    position,
                },
            ) => {
                if source != self.primary_source {
                    log::debug!("Ignoring {:?} contact, accepting {:?} only", source, self.primary_source);
                    return Ok(CaptureOutcome::Ignored);
                }
                self.begin(doc, pointer, position)
            }
            (CaptureState::Capturing { pointer: active }, PointerEvent::Move { pointer, position })
                if pointer == active =>
            {
                if !doc.is_capturing() {
                    // The stroke was undone or cleared mid-gesture
                    self.state = CaptureState::Idle;
                    return Ok(CaptureOutcome::Ended(None));
                }
                doc.extend_active_stroke(position)?;
                Ok(CaptureOutcome::Extended)
            }
            (CaptureState::Capturing { pointer: active }, PointerEvent::Up { pointer, position })
                if pointer == active =>
            {
                self.finish(doc, position)
            }
            (CaptureState::Capturing { pointer: active }, PointerEvent::Cancel { pointer })
                if pointer == active =>
            {
                self.finish(doc, None)
            }
            (state, event) => {
                log::debug!("Ignoring {:?} while {:?}", event, state);
                Ok(CaptureOutcome::Ignored)
            }
        }
    }

    /// Abandon any gesture in progress, e.g. before switching documents
    pub fn reset(&mut self, doc: &mut DrawingDocumentState) -> CanvasResult<()> {
        if self.is_capturing() {
            self.finish(doc, None)?;
        }
        Ok(())
    }

    fn begin(
        &mut self,
        doc: &mut DrawingDocumentState,
        pointer: PointerId,
        position: Point,
    ) -> CanvasResult<CaptureOutcome> {
        let handle = doc.begin_stroke(self.style.stroke_color(), self.style.width())?;

        if self.record_contact_point {
            if let Err(err) = doc.extend_active_stroke(position) {
                doc.end_active_stroke()?;
                return Err(err);
            }
        }

        self.state = CaptureState::Capturing { pointer };
        Ok(CaptureOutcome::Began(handle))
    }

    fn finish(
        &mut self,
        doc: &mut DrawingDocumentState,
        lift_off: Option<Point>,
    ) -> CanvasResult<CaptureOutcome> {
        self.state = CaptureState::Idle;
        if !doc.is_capturing() {
            return Ok(CaptureOutcome::Ended(None));
        }

        let lift_off = lift_off.filter(|point| self.record_lift_off && point.is_finite());
        if let Some(position) = lift_off {
            let last = doc.active_stroke().and_then(|stroke| stroke.last_point());
            if last != Some(position) {
                doc.extend_active_stroke(position)?;
            }
        }

        let kept = doc.end_active_stroke()?;
        Ok(CaptureOutcome::Ended(kept))
    }
}
