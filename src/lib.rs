#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod codec;
pub mod command;
pub mod config;
pub mod document;
pub mod error;
pub mod input;
pub mod persistence;
pub mod point;
pub mod renderer;
pub mod stroke;

pub use app::PencilApp;
pub use codec::{DecodeReport, DocumentFormat, StrokeCodec};
pub use command::{BrushStyle, StyleCommand};
pub use config::{CanvasConfig, ConfigError};
pub use document::{DrawingDocumentState, StrokeHandle};
pub use error::{CanvasError, CanvasResult};
pub use input::{CaptureOutcome, CaptureState, InputCaptureController, PointerEvent, PointerId, PointerSource};
pub use persistence::DocumentStore;
pub use point::Point;
pub use renderer::SnapshotRenderer;
pub use stroke::Stroke;
