use std::path::PathBuf;

use egui::{Color32, Pos2, Rect, Sense, Shape, Vec2};

use crate::command::StyleCommand;
use crate::config::CanvasConfig;
use crate::document::DrawingDocumentState;
use crate::input::{EguiPointerBridge, InputCaptureController};
use crate::persistence::DocumentStore;
use crate::stroke::{PALETTE, Stroke, WIDTHS};

/// What survives a restart. The drawing itself lives in the document store.
#[derive(serde::Deserialize, serde::Serialize, Debug)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
struct PersistedState {
    document_name: String,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            document_name: "Untitled".to_owned(),
        }
    }
}

/// Minimal drawing window: a pen picker toolbar above one canvas
pub struct PencilApp {
    config: CanvasConfig,
    store: DocumentStore,
    document_name: String,
    document: DrawingDocumentState,
    input: InputCaptureController,
    bridge: EguiPointerBridge,
    canvas_size: Vec2,
    status: String,
}

impl PencilApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, config: CanvasConfig, store_dir: PathBuf) -> Self {
        let persisted: PersistedState = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        let store = DocumentStore::new(store_dir, &config);
        let mut bridge = EguiPointerBridge::new();
        bridge.set_touch_source(config.primary_source);

        let mut app = Self {
            input: InputCaptureController::from_config(&config),
            store,
            document_name: String::new(),
            document: DrawingDocumentState::with_format(config.document_format),
            bridge,
            canvas_size: Vec2::ZERO,
            status: String::new(),
            config,
        };
        app.open(&persisted.document_name);
        app
    }

    fn open(&mut self, name: &str) {
        if let Err(err) = self.input.reset(&mut self.document) {
            log::error!("Failed to finish gesture before switching documents: {}", err);
        }

        match self.store.open_or_new(name) {
            Ok(document) => {
                self.document = document;
                self.document_name = name.to_owned();
                self.status = format!("Opened {}", name);
            }
            Err(err) => {
                log::error!("Failed to open {:?}: {}", name, err);
                self.status = format!("Could not open {}: {}", name, err);
            }
        }
    }

    fn save(&mut self) {
        let bounds = Rect::from_min_size(Pos2::ZERO, self.canvas_size);
        let bounds = (bounds.area() > 0.0).then_some(bounds);

        match self.store.save(&self.document_name, &mut self.document, bounds) {
            Ok(()) => self.status = "Document saved!".to_owned(),
            Err(err) => {
                log::error!("Failed to save {:?}: {}", self.document_name, err);
                self.status = format!("Save failed: {}", err);
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for color in PALETTE {
                let selected = !self.input.style().is_eraser() && self.input.style().color() == color;
                let button = egui::Button::new("")
                    .fill(color)
                    .stroke(egui::Stroke::new(if selected { 2.0 } else { 0.5 }, Color32::GRAY))
                    .min_size(egui::vec2(24.0, 24.0));
                if ui.add(button).clicked() {
                    self.input.apply(StyleCommand::SetColor(color));
                }
            }

            ui.separator();
            for width in WIDTHS {
                let selected = self.input.style().width() == width;
                if ui.selectable_label(selected, format!("{}", width)).clicked() {
                    self.input.apply(StyleCommand::SetWidth(width));
                }
            }

            ui.separator();
            if ui.selectable_label(self.input.style().is_eraser(), "Eraser").clicked() {
                self.input.apply(StyleCommand::SelectEraser);
            }

            ui.separator();
            if ui.button("Undo").clicked() {
                self.document.undo();
            }
            if ui.button("Clear").clicked() {
                self.document.clear();
            }
            if ui.button("Save").clicked() {
                self.save();
            }

            ui.separator();
            let dirty = if self.document.is_dirty() { " *" } else { "" };
            ui.label(format!("{}{}", self.document_name, dirty));
            ui.label(&self.status);
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::drag());
        let rect = response.rect;
        self.canvas_size = rect.size();
        self.bridge.set_canvas_rect(rect);

        let events = ui.ctx().input(|input| input.events.clone());
        for event in self.bridge.translate(&events) {
            if let Err(err) = self.input.handle(&mut self.document, event) {
                log::error!("Dropped pointer event {:?}: {}", event, err);
            }
        }

        painter.rect_filled(rect, 0.0, self.config.background);
        for stroke in self.document.strokes() {
            painter.add(stroke_shape(stroke, rect.min));
        }

        if self.input.is_capturing() {
            ui.ctx().request_repaint();
        }
    }
}

fn stroke_shape(stroke: &Stroke, origin: Pos2) -> Shape {
    let points: Vec<Pos2> = stroke
        .points()
        .iter()
        .map(|point| origin + Pos2::from(*point).to_vec2())
        .collect();
    let width = stroke.width() as f32;

    match points.len() {
        0 => Shape::Noop,
        1 => Shape::circle_filled(points[0], width / 2.0, stroke.color()),
        _ => Shape::line(points, egui::Stroke::new(width, stroke.color())),
    }
}

impl eframe::App for PencilApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let state = PersistedState {
            document_name: self.document_name.clone(),
        };
        eframe::set_value(storage, eframe::APP_KEY, &state);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("pen_picker").show(ctx, |ui| {
            self.toolbar(ui);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.canvas(ui);
            });
    }
}
