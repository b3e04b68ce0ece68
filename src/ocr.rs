//! OCR boundary. Recognition itself is an external engine; this module only turns its
//! output into classifier input. A failed recognition is an empty text, not an error.

use crate::error::OcrError;
use tracing::warn;

/// Screenshot bytes as uploaded (PNG/JPEG); decoding is the engine's concern.
#[derive(Debug, Clone, Copy)]
pub struct ImageInput<'a> {
    pub bytes: &'a [u8],
}

/// External text recognizer; returns recognized lines in reading order.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &ImageInput<'_>) -> Result<Vec<String>, OcrError>;
}

/// Recognized lines joined by single spaces and trimmed; `""` on any failure.
pub fn extract_text(engine: &dyn OcrEngine, image: &ImageInput<'_>) -> String {
    match engine.recognize(image) {
        Ok(lines) => lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Err(e) => {
            warn!(error = %e, bytes = image.bytes.len(), "OCR failed; continuing with empty text");
            String::new()
        }
    }
}
