use egui::Color32;

use crate::stroke::{is_valid_width, opaque};

/// Style changes sent by the pen picker to the capture controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleCommand {
    /// Use this color for the next strokes and leave eraser mode
    SetColor(Color32),
    /// Use this width for the next strokes
    SetWidth(f64),
    /// Paint with the canvas background color
    SelectEraser,
}

/// The style applied to the next stroke that begins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushStyle {
    color: Color32,
    width: f64,
    background: Color32,
    eraser: bool,
}

impl BrushStyle {
    pub fn new(color: Color32, width: f64, background: Color32) -> Self {
        Self {
            color: opaque(color),
            width,
            background: opaque(background),
            eraser: false,
        }
    }

    /// Apply a style command. Returns false when the command was rejected.
    pub fn apply(&mut self, command: StyleCommand) -> bool {
        match command {
            StyleCommand::SetColor(color) => {
                self.color = opaque(color);
                self.eraser = false;
            }
            StyleCommand::SetWidth(width) => {
                if !is_valid_width(width) {
                    log::warn!("Ignoring invalid brush width {}", width);
                    return false;
                }
                self.width = width;
            }
            StyleCommand::SelectEraser => {
                self.eraser = true;
            }
        }
        true
    }

    /// Color the next stroke is painted with
    pub fn stroke_color(&self) -> Color32 {
        if self.eraser {
            self.background
        } else {
            self.color
        }
    }

    /// Last color picked, regardless of eraser mode
    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn is_eraser(&self) -> bool {
        self.eraser
    }
}
