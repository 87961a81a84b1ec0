#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::path::PathBuf;

use pencil_canvas::{CanvasConfig, PencilApp, PointerSource};

fn load_config() -> CanvasConfig {
    match std::env::var_os("PENCIL_CANVAS_CONFIG") {
        Some(path) => match CanvasConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Ignoring config {:?}: {}", path, err);
                CanvasConfig::default()
            }
        },
        // Without a config file assume a desktop session drawn with the mouse
        None => CanvasConfig {
            primary_source: PointerSource::Mouse,
            ..CanvasConfig::default()
        },
    }
}

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let config = load_config();
    let store_dir = std::env::var_os("PENCIL_CANVAS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("drawings"));

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Pencil Canvas",
        native_options,
        Box::new(move |cc| Ok(Box::new(PencilApp::new(cc, config, store_dir)))),
    )
}
