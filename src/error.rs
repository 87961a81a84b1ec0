use thiserror::Error;

/// Errors produced by the stroke model, the document codec and the snapshot renderer
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Operation attempted in the wrong lifecycle phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Extend or end was called while no stroke is in progress
    #[error("No stroke is in progress")]
    NoActiveStroke,

    #[error("Stroke width must be finite and positive, got {0}")]
    InvalidWidth(f64),

    #[error("Point coordinates must be finite, got ({x}, {y})")]
    NonFinitePoint { x: f64, y: f64 },

    /// The outer document buffer could not be decoded
    #[error("Corrupt drawing data: {0}")]
    CorruptData(String),

    #[error("Snapshot bounds must have a positive, finite size")]
    InvalidBounds,

    #[error("Invalid document name {0:?}")]
    InvalidName(String),

    #[error("A document named {0:?} already exists")]
    NameTaken(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CanvasError {
    /// True for programmer errors: calls made in the wrong stroke lifecycle phase
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_) | Self::NoActiveStroke)
    }

    /// True when a document buffer was rejected as a whole
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData(_))
    }
}

/// Result type for canvas operations
pub type CanvasResult<T> = Result<T, CanvasError>;
