// src/renderer.rs
use std::io::Cursor;

use egui::{Color32, Rect};
use image::{ImageFormat, Rgba, RgbaImage};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke as SkiaStroke,
    Transform,
};

use crate::config::CanvasConfig;
use crate::document::DrawingDocumentState;
use crate::error::{CanvasError, CanvasResult};
use crate::stroke::Stroke;

/// Rasterizes a document's strokes, e.g. for document thumbnails
#[derive(Debug, Clone)]
pub struct SnapshotRenderer {
    background: Color32,
}

impl SnapshotRenderer {
    pub fn new(background: Color32) -> Self {
        Self { background }
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::new(config.background)
    }

    pub fn background(&self) -> Color32 {
        self.background
    }

    /// Paint all strokes in order into a bitmap covering `bounds`, one pixel per unit
    pub fn render(&self, state: &DrawingDocumentState, bounds: Rect) -> CanvasResult<RgbaImage> {
        self.render_scaled(state, bounds, 1.0)
    }

    /// Like [`render`](Self::render) with `scale` pixels per canvas unit
    pub fn render_scaled(
        &self,
        state: &DrawingDocumentState,
        bounds: Rect,
        scale: f32,
    ) -> CanvasResult<RgbaImage> {
        let valid = bounds.is_finite()
            && bounds.width() > 0.0
            && bounds.height() > 0.0
            && scale.is_finite()
            && scale > 0.0;
        if !valid {
            return Err(CanvasError::InvalidBounds);
        }

        let width = (bounds.width() * scale).ceil().max(1.0) as u32;
        let height = (bounds.height() * scale).ceil().max(1.0) as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or(CanvasError::InvalidBounds)?;
        pixmap.fill(skia_color(self.background));

        let transform =
            Transform::from_scale(scale, scale).pre_translate(-bounds.min.x, -bounds.min.y);
        for stroke in state.strokes() {
            paint_stroke(&mut pixmap, stroke, transform);
        }

        log::debug!(
            "Rendered {} stroke(s) into {}x{} snapshot",
            state.len(),
            width,
            height
        );
        Ok(to_image(&pixmap))
    }

    /// Render `bounds` scaled so the longer side is `max_side` pixels
    pub fn thumbnail(
        &self,
        state: &DrawingDocumentState,
        bounds: Rect,
        max_side: u32,
    ) -> CanvasResult<RgbaImage> {
        let longest = bounds.width().max(bounds.height());
        if max_side == 0 || longest.is_nan() || longest <= 0.0 {
            return Err(CanvasError::InvalidBounds);
        }
        self.render_scaled(state, bounds, max_side as f32 / longest)
    }

    pub fn encode_png(image: &RgbaImage) -> CanvasResult<Vec<u8>> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

fn skia_color(color: Color32) -> Color {
    Color::from_rgba8(color.r(), color.g(), color.b(), 255)
}

fn paint_stroke(pixmap: &mut Pixmap, stroke: &Stroke, transform: Transform) {
    let points = stroke.points();
    let Some(first) = points.first() else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color(skia_color(stroke.color()));
    paint.anti_alias = true;

    let radius = (stroke.width() / 2.0) as f32;

    // Zero-length paths do not stroke; draw them as a disc of the stroke width
    if points.iter().all(|point| point == first) {
        if let Some(dot) = PathBuilder::from_circle(first.x as f32, first.y as f32, radius) {
            pixmap.fill_path(&dot, &paint, FillRule::Winding, transform, None);
        }
        return;
    }

    let mut builder = PathBuilder::new();
    builder.move_to(first.x as f32, first.y as f32);
    for point in &points[1..] {
        builder.line_to(point.x as f32, point.y as f32);
    }
    let Some(path) = builder.finish() else {
        return;
    };

    let outline = SkiaStroke {
        width: stroke.width() as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..SkiaStroke::default()
    };
    pixmap.stroke_path(&path, &paint, &outline, transform, None);
}

fn to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, out) in pixmap.pixels().iter().zip(image.pixels_mut()) {
        let color = pixel.demultiply();
        *out = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;
    use egui::{pos2, vec2};

    fn rgba(color: Color32) -> Rgba<u8> {
        Rgba([color.r(), color.g(), color.b(), 255])
    }

    fn line(doc: &mut DrawingDocumentState, color: Color32, width: f64, points: &[(f64, f64)]) {
        doc.begin_stroke(color, width).unwrap();
        for &(x, y) in points {
            doc.extend_active_stroke(Point::new(x, y)).unwrap();
        }
        doc.end_active_stroke().unwrap();
    }

    #[test]
    fn test_empty_document_is_background() {
        let renderer = SnapshotRenderer::new(Color32::WHITE);
        let doc = DrawingDocumentState::new();
        let bounds = Rect::from_min_size(pos2(0.0, 0.0), vec2(8.0, 4.0));

        let image = renderer.render(&doc, bounds).unwrap();
        assert_eq!(image.dimensions(), (8, 4));
        assert!(image.pixels().all(|pixel| *pixel == rgba(Color32::WHITE)));
    }

    #[test]
    fn test_later_strokes_paint_over_earlier() {
        let renderer = SnapshotRenderer::new(Color32::WHITE);
        let mut doc = DrawingDocumentState::new();
        line(&mut doc, Color32::BLACK, 4.0, &[(0.0, 10.0), (20.0, 10.0)]);
        line(&mut doc, Color32::RED, 4.0, &[(10.0, 0.0), (10.0, 20.0)]);

        let bounds = Rect::from_min_size(pos2(0.0, 0.0), vec2(20.0, 20.0));
        let image = renderer.render(&doc, bounds).unwrap();

        assert_eq!(*image.get_pixel(3, 10), rgba(Color32::BLACK));
        assert_eq!(*image.get_pixel(10, 10), rgba(Color32::RED));
        assert_eq!(*image.get_pixel(10, 3), rgba(Color32::RED));
        assert_eq!(*image.get_pixel(3, 3), rgba(Color32::WHITE));
    }

    #[test]
    fn test_dot_respects_bounds_origin() {
        let renderer = SnapshotRenderer::new(Color32::WHITE);
        let mut doc = DrawingDocumentState::new();
        line(&mut doc, Color32::BLUE, 6.0, &[(110.0, 110.0)]);

        let bounds = Rect::from_min_size(pos2(100.0, 100.0), vec2(20.0, 20.0));
        let image = renderer.render(&doc, bounds).unwrap();

        assert_eq!(*image.get_pixel(10, 10), rgba(Color32::BLUE));
        assert_eq!(*image.get_pixel(0, 0), rgba(Color32::WHITE));
        assert_eq!(*image.get_pixel(19, 19), rgba(Color32::WHITE));
    }

    #[test]
    fn test_render_does_not_touch_document() {
        let renderer = SnapshotRenderer::new(Color32::WHITE);
        let mut doc = DrawingDocumentState::new();
        line(&mut doc, Color32::BLACK, 2.0, &[(0.0, 0.0), (5.0, 5.0)]);
        doc.mark_saved();
        let before = doc.strokes().to_vec();

        renderer
            .render(&doc, Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 10.0)))
            .unwrap();

        assert_eq!(doc.strokes(), before.as_slice());
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_thumbnail_fits_longest_side() {
        let renderer = SnapshotRenderer::new(Color32::WHITE);
        let doc = DrawingDocumentState::new();
        let bounds = Rect::from_min_size(pos2(0.0, 0.0), vec2(200.0, 100.0));

        let image = renderer.thumbnail(&doc, bounds, 50).unwrap();
        assert_eq!(image.dimensions(), (50, 25));
    }

    #[test]
    fn test_degenerate_bounds() {
        let renderer = SnapshotRenderer::new(Color32::WHITE);
        let doc = DrawingDocumentState::new();

        let flat = Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 0.0));
        assert!(matches!(renderer.render(&doc, flat), Err(CanvasError::InvalidBounds)));
        assert!(matches!(
            renderer.render(&doc, Rect::NOTHING),
            Err(CanvasError::InvalidBounds)
        ));

        let bounds = Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 10.0));
        assert!(matches!(
            renderer.thumbnail(&doc, bounds, 0),
            Err(CanvasError::InvalidBounds)
        ));
    }

    #[test]
    fn test_png_encoding() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let png = SnapshotRenderer::encode_png(&image).unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }
}
