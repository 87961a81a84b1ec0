use egui::{Color32, Pos2, Rect};

use crate::error::{CanvasError, CanvasResult};
use crate::point::Point;

// Opaque colors the pen picker offers
pub const PALETTE: [Color32; 5] = [
    Color32::BLACK,
    Color32::RED,
    Color32::BLUE,
    Color32::GREEN,
    Color32::YELLOW,
];

// Widths the pen picker offers
pub const WIDTHS: [f64; 5] = [1.0, 3.0, 5.0, 10.0, 20.0];

/// One continuous gesture: points in drawing order with a fixed color and width
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
    color: Color32,
    width: f64,
}

impl Stroke {
    /// Create a finished stroke, e.g. when decoding a document.
    ///
    /// The width must be finite and positive and every point finite.
    pub fn new(color: Color32, width: f64, points: Vec<Point>) -> CanvasResult<Self> {
        if !is_valid_width(width) {
            return Err(CanvasError::InvalidWidth(width));
        }
        if let Some(point) = points.iter().find(|point| !point.is_finite()) {
            return Err(CanvasError::NonFinitePoint {
                x: point.x,
                y: point.y,
            });
        }
        Ok(Self {
            points,
            color: opaque(color),
            width,
        })
    }

    // Create an empty stroke that is about to receive points; the document checks the width
    pub(crate) fn empty(color: Color32, width: f64) -> Self {
        Self {
            points: Vec::new(),
            color: opaque(color),
            width,
        }
    }

    // Only the document appends, and only to its active stroke
    pub(crate) fn push_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A stroke with a single sample is drawn as a dot
    pub fn is_dot(&self) -> bool {
        self.points.len() == 1
    }

    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Bounding box of the painted area, padded by half the stroke width
    pub fn bounds(&self) -> Option<Rect> {
        if self.points.is_empty() {
            return None;
        }

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for point in &self.points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        let padding = self.width / 2.0;
        Some(Rect::from_min_max(
            Pos2::new((min_x - padding) as f32, (min_y - padding) as f32),
            Pos2::new((max_x + padding) as f32, (max_y + padding) as f32),
        ))
    }
}

/// Drop the alpha channel; strokes are always painted opaque
pub fn opaque(color: Color32) -> Color32 {
    Color32::from_rgb(color.r(), color.g(), color.b())
}

/// Width values accepted for a stroke
pub fn is_valid_width(width: f64) -> bool {
    width.is_finite() && width > 0.0
}
