use egui::{Color32, Rect};

use crate::codec::{DecodeReport, DocumentFormat, StrokeCodec};
use crate::error::{CanvasError, CanvasResult};
use crate::point::Point;
use crate::stroke::{Stroke, is_valid_width};

/// Index of a stroke within its document, valid until the next undo or clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrokeHandle(usize);

impl StrokeHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The ordered strokes of one drawing.
///
/// Insertion order is paint order. At most one stroke is in progress, and when one is it
/// is always the last element.
#[derive(Debug, Clone, Default)]
pub struct DrawingDocumentState {
    strokes: Vec<Stroke>,
    capturing: bool,
    dirty: bool,
    format: DocumentFormat,
}

impl DrawingDocumentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty document that encodes with the given format
    pub fn with_format(format: DocumentFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Start a new stroke with the given style and make it the active stroke
    pub fn begin_stroke(&mut self, color: Color32, width: f64) -> CanvasResult<StrokeHandle> {
        if self.capturing {
            return Err(CanvasError::InvalidState(
                "a stroke is already in progress".into(),
            ));
        }
        if !is_valid_width(width) {
            return Err(CanvasError::InvalidWidth(width));
        }

        self.strokes.push(Stroke::empty(color, width));
        self.capturing = true;
        Ok(StrokeHandle(self.strokes.len() - 1))
    }

    /// Append a point to the active stroke
    pub fn extend_active_stroke(&mut self, point: Point) -> CanvasResult<()> {
        if !point.is_finite() {
            return Err(CanvasError::NonFinitePoint {
                x: point.x,
                y: point.y,
            });
        }

        let stroke = self.active_stroke_mut().ok_or(CanvasError::NoActiveStroke)?;
        stroke.push_point(point);
        self.dirty = true;
        Ok(())
    }

    /// Finish the active stroke.
    ///
    /// A stroke that never received a point is removed again and `None` is returned.
    pub fn end_active_stroke(&mut self) -> CanvasResult<Option<StrokeHandle>> {
        if !self.capturing {
            return Err(CanvasError::NoActiveStroke);
        }
        self.capturing = false;

        let is_empty = self.strokes.last().is_none_or(Stroke::is_empty);
        if is_empty {
            self.strokes.pop();
            return Ok(None);
        }

        Ok(Some(StrokeHandle(self.strokes.len() - 1)))
    }

    /// Remove the most recent stroke, including one still in progress.
    ///
    /// There is no redo; the removed stroke is handed back to the caller.
    pub fn undo(&mut self) -> Option<Stroke> {
        let removed = self.strokes.pop()?;
        self.capturing = false;
        self.dirty = true;
        Some(removed)
    }

    /// Remove every stroke. Not undoable.
    pub fn clear(&mut self) {
        if !self.strokes.is_empty() {
            self.dirty = true;
        }
        self.strokes.clear();
        self.capturing = false;
    }

    /// All strokes in paint order, including the active one
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn stroke(&self, handle: StrokeHandle) -> Option<&Stroke> {
        self.strokes.get(handle.0)
    }

    pub fn active_stroke(&self) -> Option<&Stroke> {
        if self.capturing {
            self.strokes.last()
        } else {
            None
        }
    }

    fn active_stroke_mut(&mut self) -> Option<&mut Stroke> {
        if self.capturing {
            self.strokes.last_mut()
        } else {
            None
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Whether the content changed since the last [`mark_saved`](Self::mark_saved)
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn set_format(&mut self, format: DocumentFormat) {
        self.format = format;
    }

    /// Copy of the finished strokes, safe to hand to a background save
    pub fn snapshot(&self) -> Vec<Stroke> {
        let finished = if self.capturing {
            &self.strokes[..self.strokes.len() - 1]
        } else {
            &self.strokes[..]
        };
        finished.to_vec()
    }

    /// Union of all stroke bounds
    pub fn bounds(&self) -> Option<Rect> {
        self.strokes
            .iter()
            .filter_map(Stroke::bounds)
            .reduce(|acc, rect| acc.union(rect))
    }

    /// Serialize with this document's format
    pub fn encode(&self) -> CanvasResult<Vec<u8>> {
        self.encode_with(self.format)
    }

    pub fn encode_with(&self, format: DocumentFormat) -> CanvasResult<Vec<u8>> {
        StrokeCodec::encode_document(&self.strokes, format)
    }

    /// Rebuild a document from bytes produced by [`encode`](Self::encode)
    pub fn decode(bytes: &[u8]) -> CanvasResult<Self> {
        Self::decode_with_report(bytes).map(|(state, _)| state)
    }

    /// Like [`decode`](Self::decode), also reporting how many records were dropped
    pub fn decode_with_report(bytes: &[u8]) -> CanvasResult<(Self, DecodeReport)> {
        let (strokes, report) = StrokeCodec::decode_document(bytes)?;
        if report.dropped > 0 {
            log::warn!(
                "Decoded drawing with {} unreadable stroke record(s) dropped",
                report.dropped
            );
        }
        log::debug!("Decoded {} stroke(s) from {:?} document", report.kept, report.format);

        let state = Self {
            strokes,
            capturing: false,
            dirty: false,
            format: report.format,
        };
        Ok((state, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(doc: &mut DrawingDocumentState, color: Color32, width: f64, points: &[(f64, f64)]) {
        doc.begin_stroke(color, width).unwrap();
        for &(x, y) in points {
            doc.extend_active_stroke(Point::new(x, y)).unwrap();
        }
        doc.end_active_stroke().unwrap();
    }

    #[test]
    fn test_begin_while_active_is_invalid_state() {
        let mut doc = DrawingDocumentState::new();
        doc.begin_stroke(Color32::BLACK, 5.0).unwrap();

        let err = doc.begin_stroke(Color32::RED, 1.0).unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_extend_without_stroke() {
        let mut doc = DrawingDocumentState::new();
        let err = doc.extend_active_stroke(Point::new(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, CanvasError::NoActiveStroke));
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_end_without_stroke() {
        let mut doc = DrawingDocumentState::new();
        assert!(matches!(
            doc.end_active_stroke(),
            Err(CanvasError::NoActiveStroke)
        ));
    }

    #[test]
    fn test_invalid_inputs() {
        let mut doc = DrawingDocumentState::new();
        assert!(matches!(
            doc.begin_stroke(Color32::BLACK, 0.0),
            Err(CanvasError::InvalidWidth(_))
        ));
        assert!(!doc.is_capturing());

        doc.begin_stroke(Color32::BLACK, 1.0).unwrap();
        assert!(matches!(
            doc.extend_active_stroke(Point::new(f64::NAN, 0.0)),
            Err(CanvasError::NonFinitePoint { .. })
        ));
        assert!(doc.active_stroke().unwrap().is_empty());
    }

    #[test]
    fn test_tap_is_discarded() {
        let mut doc = DrawingDocumentState::new();
        draw(&mut doc, Color32::BLACK, 5.0, &[(1.0, 1.0)]);

        doc.begin_stroke(Color32::BLACK, 5.0).unwrap();
        assert_eq!(doc.end_active_stroke().unwrap(), None);
        assert_eq!(doc.len(), 1);
        assert!(!doc.is_capturing());
    }

    #[test]
    fn test_dot_is_kept() {
        let mut doc = DrawingDocumentState::new();
        doc.begin_stroke(Color32::RED, 1.0).unwrap();
        doc.extend_active_stroke(Point::new(5.0, 5.0)).unwrap();
        let handle = doc.end_active_stroke().unwrap().unwrap();

        let stroke = doc.stroke(handle).unwrap();
        assert!(stroke.is_dot());
        assert_eq!(stroke.points(), &[Point::new(5.0, 5.0)]);
    }

    #[test]
    fn test_undo_is_lifo() {
        let mut doc = DrawingDocumentState::new();
        for i in 0..3 {
            draw(&mut doc, Color32::BLACK, 1.0 + i as f64, &[(i as f64, 0.0)]);
        }

        assert_eq!(doc.undo().unwrap().width(), 3.0);
        assert_eq!(doc.undo().unwrap().width(), 2.0);
        assert_eq!(doc.undo().unwrap().width(), 1.0);
        assert!(doc.is_empty());

        // Undo on an empty document is a no-op
        assert!(doc.undo().is_none());
    }

    #[test]
    fn test_undo_removes_active_stroke() {
        let mut doc = DrawingDocumentState::new();
        doc.begin_stroke(Color32::BLACK, 1.0).unwrap();
        doc.extend_active_stroke(Point::new(0.0, 0.0)).unwrap();

        assert!(doc.undo().is_some());
        assert!(!doc.is_capturing());
        assert!(matches!(
            doc.extend_active_stroke(Point::new(1.0, 1.0)),
            Err(CanvasError::NoActiveStroke)
        ));
    }

    #[test]
    fn test_clear() {
        let mut doc = DrawingDocumentState::new();
        draw(&mut doc, Color32::BLACK, 1.0, &[(0.0, 0.0), (1.0, 1.0)]);
        doc.begin_stroke(Color32::BLACK, 1.0).unwrap();
        doc.mark_saved();

        doc.clear();
        assert!(doc.is_empty());
        assert!(!doc.is_capturing());
        assert!(doc.is_dirty());
    }

    #[test]
    fn test_dirty_tracking() {
        let mut doc = DrawingDocumentState::new();
        assert!(!doc.is_dirty());

        doc.begin_stroke(Color32::BLACK, 1.0).unwrap();
        assert!(!doc.is_dirty());
        doc.extend_active_stroke(Point::new(0.0, 0.0)).unwrap();
        assert!(doc.is_dirty());
        doc.end_active_stroke().unwrap();

        doc.mark_saved();
        assert!(!doc.is_dirty());
        doc.undo();
        assert!(doc.is_dirty());
    }

    #[test]
    fn test_snapshot_excludes_active_stroke() {
        let mut doc = DrawingDocumentState::new();
        draw(&mut doc, Color32::BLACK, 1.0, &[(0.0, 0.0)]);
        doc.begin_stroke(Color32::RED, 2.0).unwrap();
        doc.extend_active_stroke(Point::new(3.0, 3.0)).unwrap();

        let snapshot = doc.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].color(), Color32::BLACK);
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_bounds_union() {
        let mut doc = DrawingDocumentState::new();
        assert!(doc.bounds().is_none());

        draw(&mut doc, Color32::BLACK, 2.0, &[(0.0, 0.0), (10.0, 10.0)]);
        draw(&mut doc, Color32::BLACK, 2.0, &[(50.0, 20.0)]);

        let bounds = doc.bounds().unwrap();
        assert_eq!(bounds.min, egui::pos2(-1.0, -1.0));
        assert_eq!(bounds.max, egui::pos2(51.0, 21.0));
    }

    #[test]
    fn test_decode_keeps_detected_format() {
        let mut doc = DrawingDocumentState::with_format(DocumentFormat::Legacy);
        draw(&mut doc, Color32::BLACK, 1.0, &[(0.0, 0.0)]);

        let decoded = DrawingDocumentState::decode(&doc.encode().unwrap()).unwrap();
        assert_eq!(decoded.format(), DocumentFormat::Legacy);
        assert!(!decoded.is_dirty());
    }
}
