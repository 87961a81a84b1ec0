//! Persisted drawing format.
//!
//! Two document shapes are understood:
//!
//! * legacy (version 0): a bare JSON array of `{ "path", "color", "width" }` records where
//!   `path` is base64 of the point blob (little-endian `f64` x/y pairs, 16 bytes per point)
//! * versioned: `{ "version": 1, "strokes": [{ "points": [[x, y], ...], "color", "width" }] }`
//!
//! Individual records that cannot be read are dropped; only a buffer whose outer shape is
//! wrong fails with [`CanvasError::CorruptData`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use egui::Color32;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{CanvasError, CanvasResult};
use crate::point::Point;
use crate::stroke::{Stroke, is_valid_width};

/// Version written into versioned documents
pub const CURRENT_VERSION: u64 = 1;

const POINT_BLOB_SIZE: usize = 16;

/// Which document shape `encode` writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// Unversioned array of base64 path records
    Legacy,
    /// Versioned envelope with explicit point lists
    #[default]
    Versioned,
}

/// What `decode` found in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeReport {
    pub format: DocumentFormat,
    pub kept: usize,
    pub dropped: usize,
}

/// Why a single stroke record was skipped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("unparsable color {0:?}")]
    BadColor(String),
    #[error("width is not a positive number")]
    BadWidth,
    #[error("malformed path payload")]
    BadPath,
    #[error("malformed point list")]
    BadPoints,
    #[error("stroke has no points")]
    NoPoints,
}

#[derive(Serialize)]
struct LegacyRecord {
    path: String,
    color: String,
    width: f64,
}

#[derive(Serialize)]
struct VersionedRecord<'a> {
    points: &'a [Point],
    color: String,
    width: f64,
}

#[derive(Serialize)]
struct Envelope<'a> {
    version: u64,
    strokes: Vec<VersionedRecord<'a>>,
}

/// Per-stroke encoding and decoding
pub struct StrokeCodec;

impl StrokeCodec {
    /// Encode a whole stroke list. Strokes without points are not written.
    pub fn encode_document(strokes: &[Stroke], format: DocumentFormat) -> CanvasResult<Vec<u8>> {
        let written = strokes.iter().filter(|stroke| !stroke.is_empty());

        let bytes = match format {
            DocumentFormat::Legacy => {
                let records: Vec<LegacyRecord> = written
                    .map(|stroke| LegacyRecord {
                        path: encode_path(stroke.points()),
                        color: color_to_hex(stroke.color()),
                        width: stroke.width(),
                    })
                    .collect();
                serde_json::to_vec(&records)?
            }
            DocumentFormat::Versioned => {
                let envelope = Envelope {
                    version: CURRENT_VERSION,
                    strokes: written
                        .map(|stroke| VersionedRecord {
                            points: stroke.points(),
                            color: color_to_hex(stroke.color()),
                            width: stroke.width(),
                        })
                        .collect(),
                };
                serde_json::to_vec(&envelope)?
            }
        };

        Ok(bytes)
    }

    /// Decode a whole document, dropping unreadable stroke records
    pub fn decode_document(bytes: &[u8]) -> CanvasResult<(Vec<Stroke>, DecodeReport)> {
        let root: Value = serde_json::from_slice(bytes)
            .map_err(|err| CanvasError::CorruptData(format!("not valid JSON: {}", err)))?;

        let (format, records) = match root {
            Value::Array(records) => (DocumentFormat::Legacy, records),
            Value::Object(mut envelope) => {
                let version = envelope
                    .get("version")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| CanvasError::CorruptData("missing format version".into()))?;
                if version != CURRENT_VERSION {
                    return Err(CanvasError::CorruptData(format!(
                        "unsupported format version {}",
                        version
                    )));
                }
                match envelope.remove("strokes") {
                    Some(Value::Array(records)) => (DocumentFormat::Versioned, records),
                    _ => {
                        return Err(CanvasError::CorruptData(
                            "versioned document has no stroke array".into(),
                        ));
                    }
                }
            }
            _ => {
                return Err(CanvasError::CorruptData(
                    "expected an array of stroke records".into(),
                ));
            }
        };

        let mut strokes = Vec::with_capacity(records.len());
        let mut dropped = 0;

        for (index, record) in records.iter().enumerate() {
            let Value::Object(fields) = record else {
                return Err(CanvasError::CorruptData(format!(
                    "stroke record {} is not an object",
                    index
                )));
            };

            match Self::decode_record(fields) {
                Ok(stroke) => strokes.push(stroke),
                Err(err) => {
                    log::debug!("Dropping stroke record {}: {}", index, err);
                    dropped += 1;
                }
            }
        }

        let report = DecodeReport {
            format,
            kept: strokes.len(),
            dropped,
        };
        Ok((strokes, report))
    }

    /// Read one stroke record. `points` wins over `path` when both are present.
    pub fn decode_record(fields: &Map<String, Value>) -> Result<Stroke, RecordError> {
        let color = match fields.get("color") {
            Some(Value::String(hex)) => {
                color_from_hex(hex).ok_or_else(|| RecordError::BadColor(hex.clone()))?
            }
            Some(other) => return Err(RecordError::BadColor(other.to_string())),
            None => return Err(RecordError::MissingField("color")),
        };

        let width = fields
            .get("width")
            .ok_or(RecordError::MissingField("width"))?
            .as_f64()
            .filter(|width| is_valid_width(*width))
            .ok_or(RecordError::BadWidth)?;

        let points = if let Some(points) = fields.get("points") {
            serde_json::from_value::<Vec<Point>>(points.clone())
                .map_err(|_| RecordError::BadPoints)?
        } else if let Some(path) = fields.get("path") {
            let encoded = path.as_str().ok_or(RecordError::BadPath)?;
            decode_path(encoded)?
        } else {
            return Err(RecordError::MissingField("path"));
        };

        if points.is_empty() {
            return Err(RecordError::NoPoints);
        }

        Stroke::new(color, width, points).map_err(|err| match err {
            CanvasError::InvalidWidth(_) => RecordError::BadWidth,
            _ => RecordError::BadPoints,
        })
    }
}

/// Base64 of the point blob: `x` then `y` as little-endian `f64`
pub fn encode_path(points: &[Point]) -> String {
    let mut blob = Vec::with_capacity(points.len() * POINT_BLOB_SIZE);
    for point in points {
        blob.extend_from_slice(&point.x.to_le_bytes());
        blob.extend_from_slice(&point.y.to_le_bytes());
    }
    STANDARD.encode(blob)
}

/// Inverse of [`encode_path`]
pub fn decode_path(encoded: &str) -> Result<Vec<Point>, RecordError> {
    let blob = STANDARD.decode(encoded).map_err(|_| RecordError::BadPath)?;
    if blob.len() % POINT_BLOB_SIZE != 0 {
        return Err(RecordError::BadPath);
    }

    blob.chunks_exact(POINT_BLOB_SIZE)
        .map(|chunk| {
            let (x, y) = chunk.split_at(POINT_BLOB_SIZE / 2);
            let x = x.try_into().map_err(|_| RecordError::BadPath)?;
            let y = y.try_into().map_err(|_| RecordError::BadPath)?;
            Ok(Point::new(f64::from_le_bytes(x), f64::from_le_bytes(y)))
        })
        .collect()
}

/// `#RRGGBB`, upper-case, alpha ignored
pub fn color_to_hex(color: Color32) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r(), color.g(), color.b())
}

/// Parse exactly six hex digits with an optional leading `#`
pub fn color_from_hex(hex: &str) -> Option<Color32> {
    let trimmed = hex.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let rgb = u32::from_str_radix(digits, 16).ok()?;
    Some(Color32::from_rgb(
        ((rgb >> 16) & 0xFF) as u8,
        ((rgb >> 8) & 0xFF) as u8,
        (rgb & 0xFF) as u8,
    ))
}

/// Serde adapter storing a [`Color32`] as `#RRGGBB`
pub mod hex_color {
    use egui::Color32;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::color_to_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let hex = String::deserialize(deserializer)?;
        super::color_from_hex(&hex)
            .ok_or_else(|| D::Error::custom(format!("invalid color {:?}", hex)))
    }
}
